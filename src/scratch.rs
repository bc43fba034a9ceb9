use std::path::{Path, PathBuf};

use tracing::debug;

/// A file that only lives for one video build. Removed when dropped;
/// removal failures are logged and otherwise ignored.
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            debug!("Could not remove temporary {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_file_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tip.wav");
        std::fs::write(&path, b"data").unwrap();

        {
            let artifact = TempArtifact::new(&path);
            assert!(artifact.path().exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        drop(TempArtifact::new(dir.path().join("never-written.ass")));
    }
}
