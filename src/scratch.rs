use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::Result;

/// Default prefix for scratch directory names.
pub const DEFAULT_PREFIX: &str = "narrate_tts_";

/// A uniquely named temporary directory holding the chunk files of one run.
///
/// Dropping the area removes the directory and every chunk file in it;
/// removal errors are ignored. Call [`retain`](ScratchArea::retain) to keep
/// the files and take ownership of the path instead.
pub struct ScratchArea {
    dir: TempDir,
    files: Vec<PathBuf>,
}

impl ScratchArea {
    /// Create a scratch directory under the system temp dir.
    pub fn new(prefix: &str) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        log::debug!("Created scratch area {}", dir.path().display());
        Ok(Self {
            dir,
            files: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path for the chunk with the given ordinal, e.g. `chunk_0007.wav`.
    pub fn chunk_path(&self, index: usize) -> PathBuf {
        self.dir.path().join(format!("chunk_{index:04}.wav"))
    }

    /// Record a file that now lives in this area.
    pub fn track(&mut self, path: PathBuf) {
        self.files.push(path);
    }

    /// Files recorded so far, in the order they were added.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Keep the directory on disk and hand its path to the caller.
    pub fn retain(self) -> PathBuf {
        let path = self.dir.keep();
        log::info!("Temporary files kept in: {}", path.display());
        path
    }

    /// Remove every tracked file and then the directory.
    ///
    /// Failures are logged and otherwise ignored.
    pub fn release(self) {
        for file in &self.files {
            if let Err(e) = fs::remove_file(file) {
                log::debug!("Could not remove {}: {e}", file.display());
            }
        }
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            log::debug!("Could not remove {}: {e}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_paths_are_zero_padded() {
        let area = ScratchArea::new(DEFAULT_PREFIX).unwrap();
        assert!(area.chunk_path(7).ends_with("chunk_0007.wav"));
        assert!(area.chunk_path(1234).ends_with("chunk_1234.wav"));
        assert!(area
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(DEFAULT_PREFIX));
    }

    #[test]
    fn release_removes_directory_and_files() {
        let mut area = ScratchArea::new(DEFAULT_PREFIX).unwrap();
        let file = area.chunk_path(0);
        fs::write(&file, b"data").unwrap();
        area.track(file.clone());
        let dir = area.path().to_path_buf();

        area.release();
        assert!(!file.exists());
        assert!(!dir.exists());
    }

    #[test]
    fn release_tolerates_missing_files() {
        let mut area = ScratchArea::new(DEFAULT_PREFIX).unwrap();
        let file = area.chunk_path(0);
        fs::write(&file, b"data").unwrap();
        area.track(file.clone());
        fs::remove_file(&file).unwrap();
        let dir = area.path().to_path_buf();

        area.release();
        assert!(!dir.exists());
    }

    #[test]
    fn drop_removes_directory() {
        let area = ScratchArea::new(DEFAULT_PREFIX).unwrap();
        fs::write(area.chunk_path(0), b"data").unwrap();
        let dir = area.path().to_path_buf();
        drop(area);
        assert!(!dir.exists());
    }

    #[test]
    fn retain_keeps_files() {
        let mut area = ScratchArea::new(DEFAULT_PREFIX).unwrap();
        let file = area.chunk_path(0);
        fs::write(&file, b"data").unwrap();
        area.track(file.clone());

        let dir = area.retain();
        assert!(dir.exists());
        assert!(file.exists());
        fs::remove_dir_all(dir).unwrap();
    }
}
