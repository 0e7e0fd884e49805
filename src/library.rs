//! Audio library discovery - recursive folder listing and extension filtering

use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extensions accepted when no configuration overrides them
pub const DEFAULT_EXTENSIONS: &[&str] = &[".mp3", ".wav", ".ogg"];

/// Lowercased extension of the last path component, including the dot
fn extension_of(path: &str) -> Option<String> {
    let name = Path::new(path).file_name()?.to_str()?;
    name.rfind('.').map(|idx| name[idx..].to_lowercase())
}

/// Keep the paths whose extension is in `extensions` (case-insensitive), in order
pub fn filter_supported<I, S>(paths: I, extensions: &[String]) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    paths
        .into_iter()
        .map(Into::into)
        .filter(|path| {
            extension_of(path)
                .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
                .unwrap_or(false)
        })
        .collect()
}

/// Every file below `folder`, depth-first in file-name order.
///
/// Unreadable entries are logged and skipped; an unreadable root yields an
/// empty list.
pub fn list_files_recursive(folder: &Path) -> Vec<String> {
    let mut files = Vec::new();
    for entry in WalkDir::new(folder).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                files.push(entry.path().to_string_lossy().into_owned());
            }
            Ok(_) => {}
            Err(e) => warn!("Skipping unreadable entry under {}: {}", folder.display(), e),
        }
    }
    debug!("Listed {} file(s) under {}", files.len(), folder.display());
    files
}

/// Candidate audio files for a folder selection
pub fn candidate_files(folder: &Path, extensions: &[String]) -> Vec<String> {
    let files = filter_supported(list_files_recursive(folder), extensions);
    info!(
        "Found {} supported audio file(s) in {}",
        files.len(),
        folder.display()
    );
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn default_exts() -> Vec<String> {
        DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_filter_keeps_supported_in_order() {
        let files = filter_supported(["a.mp3", "b.wav", "c.txt"], &default_exts());
        assert_eq!(files, vec!["a.mp3", "b.wav"]);
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let files = filter_supported(
            ["/x/LOUD.MP3", "/x/quiet.Ogg", "/x/noext", "/x.wav/readme"],
            &default_exts(),
        );
        assert_eq!(files, vec!["/x/LOUD.MP3", "/x/quiet.Ogg"]);
    }

    #[test]
    fn test_candidate_files_recurses() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("set1");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join("a.mp3"), b"").unwrap();
        std::fs::write(nested.join("b.wav"), b"").unwrap();
        std::fs::write(nested.join("notes.txt"), b"").unwrap();

        let files = candidate_files(temp.path(), &default_exts());
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.mp3"));
        assert!(files[1].ends_with("b.wav"));
    }

    #[test]
    fn test_missing_folder_is_empty() {
        let temp = tempdir().unwrap();
        assert!(candidate_files(&temp.path().join("nope"), &default_exts()).is_empty());
    }
}
