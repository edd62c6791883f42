//! Local fallback save for failed or endpoint-less submissions.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Copies `source` into `dir` under the renamed filename and returns the
/// destination path.
///
/// Runs strictly after a session has ended (or when no endpoint is
/// configured), never alongside an active transport session. A filesystem
/// error is logged and reported as `None` — the caller treats the save as
/// best-effort.
pub fn save_fallback(source: &Path, filename: &str, dir: &Path) -> Option<PathBuf> {
    let dest = dir.join(filename);
    let result = std::fs::create_dir_all(dir).and_then(|()| std::fs::copy(source, &dest));
    match result {
        Ok(bytes) => {
            debug!(path = %dest.display(), bytes, "saved fallback copy");
            Some(dest)
        }
        Err(e) => {
            warn!(path = %dest.display(), error = %e, "fallback save failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn copies_under_new_name() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("raw.bin");
        std::fs::write(&source, b"movie bytes").unwrap();

        let out_dir = dir.path().join("saved");
        let dest = save_fallback(&source, "Maria Perez - week 3.mp4", &out_dir).unwrap();
        assert_eq!(dest, out_dir.join("Maria Perez - week 3.mp4"));
        assert_eq!(std::fs::read(&dest).unwrap(), b"movie bytes");
    }

    #[test]
    fn creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("raw.bin");
        std::fs::write(&source, b"x").unwrap();

        let nested = dir.path().join("a/b/c");
        assert!(save_fallback(&source, "clip.mp4", &nested).is_some());
        assert!(nested.join("clip.mp4").exists());
    }

    #[test]
    fn missing_source_reports_none() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone.bin");
        assert!(save_fallback(&missing, "clip.mp4", dir.path()).is_none());
    }
}
