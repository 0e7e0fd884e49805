//! Processing log store backed by sled
//!
//! One durable record per file path, plus a secondary index ordered by
//! `createdAt` so the most recent decision can be found without a scan.
//!
//! # Layout
//!
//! - `records`: file path -> JSON [`StoredEntry`]
//! - `created_at_index`: [`created_at_key`] -> file path
//!
//! Both trees are updated in a single sled transaction, so an overwritten
//! record never leaves a stale index entry behind. Every sled call, reads
//! included, runs on the blocking pool.

use super::types::{created_at_key, LogRecord};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;
use std::path::PathBuf;
use tokio::sync::OnceCell;
use tracing::{debug, info, trace, warn};

const RECORDS_TREE: &str = "records";
const INDEX_TREE: &str = "created_at_index";

/// Durable file -> outcome store driving the processing queue
///
/// Implementations must make `insert` durable before returning, and must be
/// consistent with themselves within one process.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// True iff no record exists for `file`
    async fn needs_processing(&self, file: &str) -> Result<bool>;

    /// Upsert `record` under `record.file`
    async fn insert(&self, record: LogRecord) -> Result<()>;

    /// Record with the greatest `createdAt` (later write wins on ties)
    async fn last_inserted(&self) -> Result<Option<LogRecord>>;
}

/// Record as persisted, with the sequence number used in its index key
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    #[serde(flatten)]
    record: LogRecord,
    seq: u64,
}

/// Open database handles (cheap to clone, sled types are reference counted)
#[derive(Clone)]
struct LogTrees {
    db: sled::Db,
    records: sled::Tree,
    index: sled::Tree,
}

impl LogTrees {
    fn open(path: &std::path::Path) -> Result<Self> {
        let db = sled::open(path)
            .with_context(|| format!("Failed to open log store at: {}", path.display()))?;
        let records = db
            .open_tree(RECORDS_TREE)
            .context("Failed to open log records tree")?;
        let index = db
            .open_tree(INDEX_TREE)
            .context("Failed to open log createdAt index")?;

        info!(
            "Log store opened at {} ({} record(s))",
            path.display(),
            records.len()
        );

        Ok(Self { db, records, index })
    }

    fn upsert(&self, record: &LogRecord) -> Result<()> {
        let seq = self
            .db
            .generate_id()
            .context("Failed to allocate log sequence number")?;
        let value = serde_json::to_vec(&StoredEntry {
            record: record.clone(),
            seq,
        })
        .context("Failed to serialize log record")?;
        let index_key = created_at_key(record.created_at, seq);
        let file = record.file.as_bytes();

        (&self.records, &self.index)
            .transaction(|(records, index)| {
                if let Some(previous) = records.insert(file, value.clone())? {
                    let previous: StoredEntry =
                        serde_json::from_slice(&previous).map_err(|e| {
                            ConflictableTransactionError::Abort(format!(
                                "corrupt stored record: {}",
                                e
                            ))
                        })?;
                    let stale = created_at_key(previous.record.created_at, previous.seq);
                    index.remove(&stale[..])?;
                }
                index.insert(&index_key[..], file)?;
                Ok(())
            })
            .map_err(|e: TransactionError<String>| {
                anyhow!("Failed to upsert log record for {}: {}", record.file, e)
            })?;

        self.db.flush().context("Failed to flush log store")?;
        Ok(())
    }

    fn get(&self, file: &[u8]) -> Result<Option<LogRecord>> {
        let Some(raw) = self.records.get(file).context("Failed to read log record")? else {
            return Ok(None);
        };
        let entry: StoredEntry =
            serde_json::from_slice(&raw).context("Failed to parse stored log record")?;
        Ok(Some(entry.record))
    }
}

/// [`LogStore`] persisted in an embedded sled database
///
/// The database is opened lazily on first use and the handle is kept for the
/// lifetime of the store.
pub struct SledLogStore {
    path: PathBuf,
    trees: OnceCell<LogTrees>,
}

impl SledLogStore {
    /// Create a store that will open the database at `path` on first use
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            trees: OnceCell::new(),
        }
    }

    /// Path of the sled database directory
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn trees(&self) -> Result<&LogTrees> {
        self.trees
            .get_or_try_init(|| async {
                let path = self.path.clone();
                tokio::task::spawn_blocking(move || LogTrees::open(&path))
                    .await
                    .context("Log store open task panicked")?
            })
            .await
    }

    /// Run `op` against the open trees on the blocking pool
    async fn blocking<T, F>(&self, what: &'static str, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(LogTrees) -> Result<T> + Send + 'static,
    {
        let trees = self.trees().await?.clone();
        tokio::task::spawn_blocking(move || op(trees))
            .await
            .with_context(|| format!("Log store {} task panicked", what))?
    }

    /// All records ordered by `createdAt`, oldest first
    pub async fn records(&self) -> Result<Vec<LogRecord>> {
        self.blocking("scan", |trees| {
            let mut out = Vec::with_capacity(trees.index.len());
            for item in trees.index.iter() {
                let (_, file) = item.context("Failed to iterate log index")?;
                match trees.get(&file)? {
                    Some(record) => out.push(record),
                    None => warn!(
                        "Log index points at missing record: {}",
                        String::from_utf8_lossy(&file)
                    ),
                }
            }
            Ok(out)
        })
        .await
    }

    /// Remove every record
    pub async fn clear(&self) -> Result<usize> {
        let removed = self
            .blocking("clear", |trees| {
                let removed = trees.records.len();
                trees.records.clear()?;
                trees.index.clear()?;
                trees.db.flush()?;
                Ok(removed)
            })
            .await
            .context("Failed to clear log store")?;

        info!("Log store cleared ({} record(s) removed)", removed);
        Ok(removed)
    }
}

#[async_trait]
impl LogStore for SledLogStore {
    async fn needs_processing(&self, file: &str) -> Result<bool> {
        let key = file.to_string();
        let exists = self
            .blocking("lookup", move |trees| {
                trees
                    .records
                    .contains_key(key.as_bytes())
                    .context("Failed to look up log record")
            })
            .await?;
        trace!("needs_processing({}) = {}", file, !exists);
        Ok(!exists)
    }

    async fn insert(&self, record: LogRecord) -> Result<()> {
        let file = record.file.clone();
        let status = record.status;

        // Durable write off the async runtime
        self.blocking("write", move |trees| trees.upsert(&record))
            .await?;

        debug!("Logged {} as {}", file, status);
        Ok(())
    }

    async fn last_inserted(&self) -> Result<Option<LogRecord>> {
        self.blocking("read", |trees| {
            let Some((_, file)) = trees.index.last().context("Failed to read log index")? else {
                return Ok(None);
            };
            let record = trees.get(&file)?;
            if record.is_none() {
                warn!(
                    "Log index points at missing record: {}",
                    String::from_utf8_lossy(&file)
                );
            }
            Ok(record)
        })
        .await
    }
}
