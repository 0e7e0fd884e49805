//! Tests for the queue walker

use super::*;
use crate::annotation::Region;
use crate::state::SledLogStore;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::{tempdir, TempDir};

/// Sink that records deliveries and can be told to fail
#[derive(Default)]
struct RecordingSink {
    delivered: Mutex<Vec<Annotation>>,
    fail: AtomicBool,
}

#[async_trait]
impl AnnotationSink for RecordingSink {
    async fn deliver(&self, annotation: &Annotation) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("backend unavailable"));
        }
        self.delivered.lock().push(annotation.clone());
        Ok(())
    }
}

/// Store whose operations can be switched to fail
struct FlakyStore {
    inner: SledLogStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    /// Start failing reads as soon as one write succeeds
    fail_reads_after_write: AtomicBool,
}

#[async_trait]
impl LogStore for FlakyStore {
    async fn needs_processing(&self, file: &str) -> Result<bool> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("read failed"));
        }
        self.inner.needs_processing(file).await
    }

    async fn insert(&self, record: LogRecord) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("write failed"));
        }
        self.inner.insert(record).await?;
        if self.fail_reads_after_write.load(Ordering::SeqCst) {
            self.fail_reads.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn last_inserted(&self) -> Result<Option<LogRecord>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("read failed"));
        }
        self.inner.last_inserted().await
    }
}

struct Fixture {
    _temp: TempDir,
    store: Arc<FlakyStore>,
    sink: Arc<RecordingSink>,
    walker: QueueWalker,
}

fn make_fixture(files: &[&str]) -> Fixture {
    let temp = tempdir().unwrap();
    let store = Arc::new(FlakyStore {
        inner: SledLogStore::new(temp.path().join("log.sled")),
        fail_reads: AtomicBool::new(false),
        fail_writes: AtomicBool::new(false),
        fail_reads_after_write: AtomicBool::new(false),
    });
    let sink = Arc::new(RecordingSink::default());
    let mut walker = QueueWalker::new(store.clone(), sink.clone());
    walker.set_candidates(files.iter().map(|f| f.to_string()).collect());
    Fixture {
        _temp: temp,
        store,
        sink,
        walker,
    }
}

fn annotation(file: &str) -> Annotation {
    Annotation {
        file_path: file.to_string(),
        entire: Region::new(0.5, 3.0),
        point: Region::new(1.0, 1.25),
    }
}

fn list(files: &[&str]) -> VecDeque<String> {
    files.iter().map(|f| f.to_string()).collect()
}

#[tokio::test]
async fn test_advance_returns_first_unhandled() {
    let mut fx = make_fixture(&["a.mp3", "b.wav"]);

    assert_eq!(fx.walker.advance().await.unwrap().as_deref(), Some("a.mp3"));
    assert_eq!(fx.walker.current(), Some("a.mp3"));
    assert_eq!(fx.walker.remaining().collect::<Vec<_>>(), vec!["b.wav"]);
}

#[tokio::test]
async fn test_advance_is_idempotent_without_insert() {
    let fx = make_fixture(&[]);
    let files = list(&["a.mp3", "b.wav"]);

    let (first, rest_first) = advance(fx.store.as_ref(), files.clone()).await.unwrap();
    let (second, rest_second) = advance(fx.store.as_ref(), files).await.unwrap();

    assert_eq!(first.as_deref(), Some("a.mp3"));
    assert_eq!(first, second);
    assert_eq!(rest_first, rest_second);
}

#[tokio::test]
async fn test_advance_skips_logged_files() {
    let fx = make_fixture(&[]);
    fx.store
        .insert(LogRecord::now("a.mp3", LogStatus::Skipped))
        .await
        .unwrap();
    fx.store
        .insert(LogRecord::now("b.wav", LogStatus::Processed))
        .await
        .unwrap();

    let (next, rest) = advance(fx.store.as_ref(), list(&["a.mp3", "b.wav", "c.ogg", "d.mp3"]))
        .await
        .unwrap();
    assert_eq!(next.as_deref(), Some("c.ogg"));
    assert_eq!(rest, list(&["d.mp3"]));
}

#[tokio::test]
async fn test_advance_exhausts_list() {
    let fx = make_fixture(&[]);
    fx.store
        .insert(LogRecord::now("a.mp3", LogStatus::Processed))
        .await
        .unwrap();

    let (next, rest) = advance(fx.store.as_ref(), list(&["a.mp3"])).await.unwrap();
    assert!(next.is_none());
    assert!(rest.is_empty());
}

#[tokio::test]
async fn test_accept_then_next() {
    let mut fx = make_fixture(&["a.mp3", "b.wav"]);
    assert_eq!(fx.walker.advance().await.unwrap().as_deref(), Some("a.mp3"));

    let next = fx.walker.accept("a.mp3", &annotation("a.mp3")).await.unwrap();
    assert_eq!(next.as_deref(), Some("b.wav"));
    assert_eq!(fx.sink.delivered.lock().len(), 1);
    assert!(!fx.store.needs_processing("a.mp3").await.unwrap());

    let last = fx.store.last_inserted().await.unwrap().unwrap();
    assert_eq!(last.file, "a.mp3");
    assert_eq!(last.status, LogStatus::Processed);
}

#[tokio::test]
async fn test_prev_returns_last_decision() {
    let mut fx = make_fixture(&["a.mp3", "b.wav"]);
    fx.walker.advance().await.unwrap();
    fx.walker.accept("a.mp3", &annotation("a.mp3")).await.unwrap();
    assert_eq!(fx.walker.current(), Some("b.wav"));

    assert_eq!(fx.walker.prev().await.unwrap().as_deref(), Some("a.mp3"));
    assert_eq!(fx.walker.current(), Some("a.mp3"));
    // The candidate list is not restored
    assert_eq!(fx.walker.remaining_len(), 0);

    // Repeating prev stays on the same record
    assert_eq!(fx.walker.prev().await.unwrap().as_deref(), Some("a.mp3"));
}

#[tokio::test]
async fn test_prev_without_history() {
    let mut fx = make_fixture(&["a.mp3"]);
    fx.walker.advance().await.unwrap();

    assert_eq!(fx.walker.prev().await.unwrap(), None);
    assert_eq!(fx.walker.current(), Some("a.mp3"));
}

#[tokio::test]
async fn test_skip_last_file_exhausts_queue() {
    let mut fx = make_fixture(&["b.wav"]);
    fx.walker.advance().await.unwrap();

    assert_eq!(fx.walker.skip("b.wav").await.unwrap(), None);
    assert_eq!(fx.walker.current(), None);
    assert!(fx.sink.delivered.lock().is_empty());

    let last = fx.store.last_inserted().await.unwrap().unwrap();
    assert_eq!(last.status, LogStatus::Skipped);
}

#[tokio::test]
async fn test_sink_failure_leaves_file_pending() {
    let mut fx = make_fixture(&["a.mp3", "b.wav"]);
    fx.walker.advance().await.unwrap();
    fx.sink.fail.store(true, Ordering::SeqCst);

    let err = fx
        .walker
        .accept("a.mp3", &annotation("a.mp3"))
        .await
        .unwrap_err();
    assert!(matches!(err, QueueError::Sink(_)));
    assert!(err.to_string().contains("backend unavailable"));

    assert!(fx.store.needs_processing("a.mp3").await.unwrap());
    assert_eq!(fx.walker.current(), Some("a.mp3"));
    assert_eq!(fx.walker.remaining().collect::<Vec<_>>(), vec!["b.wav"]);
}

#[tokio::test]
async fn test_accept_with_foreign_annotation_is_rejected() {
    let mut fx = make_fixture(&["a.mp3", "b.wav"]);
    fx.walker.advance().await.unwrap();

    let err = fx
        .walker
        .accept("a.mp3", &annotation("b.wav"))
        .await
        .unwrap_err();
    assert!(matches!(err, QueueError::FileMismatch { .. }));

    assert!(fx.sink.delivered.lock().is_empty());
    assert!(fx.store.needs_processing("a.mp3").await.unwrap());
    assert!(fx.store.needs_processing("b.wav").await.unwrap());
    assert_eq!(fx.walker.current(), Some("a.mp3"));
}

#[tokio::test]
async fn test_read_failure_after_logging_accept_does_not_redeliver() {
    let mut fx = make_fixture(&["a.mp3", "b.wav"]);
    fx.walker.advance().await.unwrap();
    fx.store.fail_reads_after_write.store(true, Ordering::SeqCst);

    let err = fx
        .walker
        .accept("a.mp3", &annotation("a.mp3"))
        .await
        .unwrap_err();
    assert!(matches!(err, QueueError::Recorded { ref file, .. } if file == "a.mp3"));
    assert_eq!(fx.sink.delivered.lock().len(), 1);

    // The logged file is no longer targeted, so it cannot be accepted twice
    assert_eq!(fx.walker.current(), None);
    assert_eq!(fx.walker.remaining().collect::<Vec<_>>(), vec!["b.wav"]);

    fx.store.fail_reads_after_write.store(false, Ordering::SeqCst);
    fx.store.fail_reads.store(false, Ordering::SeqCst);
    assert!(!fx.store.needs_processing("a.mp3").await.unwrap());
    assert_eq!(fx.walker.advance().await.unwrap().as_deref(), Some("b.wav"));
    assert_eq!(fx.sink.delivered.lock().len(), 1);
}

#[tokio::test]
async fn test_read_failure_after_logging_skip_clears_target() {
    let mut fx = make_fixture(&["a.mp3", "b.wav"]);
    fx.walker.advance().await.unwrap();
    fx.store.fail_reads_after_write.store(true, Ordering::SeqCst);

    assert!(matches!(
        fx.walker.skip("a.mp3").await,
        Err(QueueError::Recorded { .. })
    ));
    assert_eq!(fx.walker.current(), None);
    assert_eq!(fx.walker.remaining_len(), 1);
}

#[tokio::test]
async fn test_store_write_failure_does_not_advance() {
    let mut fx = make_fixture(&["a.mp3", "b.wav"]);
    fx.walker.advance().await.unwrap();
    fx.store.fail_writes.store(true, Ordering::SeqCst);

    let err = fx.walker.skip("a.mp3").await.unwrap_err();
    assert!(matches!(err, QueueError::Store(_)));
    assert_eq!(fx.walker.current(), Some("a.mp3"));
    assert_eq!(fx.walker.remaining_len(), 1);
}

#[tokio::test]
async fn test_store_read_failure_keeps_remaining() {
    let mut fx = make_fixture(&["a.mp3", "b.wav"]);
    fx.store.fail_reads.store(true, Ordering::SeqCst);

    assert!(matches!(
        fx.walker.advance().await,
        Err(QueueError::Store(_))
    ));
    assert_eq!(fx.walker.remaining_len(), 2);
    assert_eq!(fx.walker.current(), None);

    fx.store.fail_reads.store(false, Ordering::SeqCst);
    assert_eq!(fx.walker.advance().await.unwrap().as_deref(), Some("a.mp3"));
}

#[tokio::test]
async fn test_resume_after_restart() {
    let temp = tempdir().unwrap();
    let db_path = temp.path().join("log.sled");
    let files = vec!["a.mp3".to_string(), "b.wav".to_string(), "c.ogg".to_string()];

    {
        let store = Arc::new(SledLogStore::new(&db_path));
        let mut walker = QueueWalker::new(store, Arc::new(RecordingSink::default()));
        walker.set_candidates(files.clone());
        walker.advance().await.unwrap();
        walker.accept("a.mp3", &annotation("a.mp3")).await.unwrap();
        walker.skip("b.wav").await.unwrap();
    }

    let store = Arc::new(SledLogStore::new(&db_path));
    let mut walker = QueueWalker::new(store, Arc::new(RecordingSink::default()));
    walker.set_candidates(files);
    assert_eq!(walker.advance().await.unwrap().as_deref(), Some("c.ogg"));
    assert_eq!(walker.prev().await.unwrap().as_deref(), Some("b.wav"));
}
