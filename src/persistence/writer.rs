//! Append-only log writer.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::persistence::{LogRecord, DEFAULT_LOG_PATH};

/// Appends records to the log file, one JSON line each.
///
/// The file is reopened in append mode for every record and nothing is
/// buffered between calls, so each record reaches the OS before `append`
/// returns.
#[derive(Debug, Clone)]
pub struct AofWriter {
    path: PathBuf,
}

impl AofWriter {
    /// An empty path falls back to [`DEFAULT_LOG_PATH`].
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let path = if path.as_os_str().is_empty() {
            PathBuf::from(DEFAULT_LOG_PATH)
        } else {
            path.to_path_buf()
        };
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &LogRecord) -> Result<()> {
        let line = record.to_line()?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

impl Default for AofWriter {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_PATH)
    }
}
