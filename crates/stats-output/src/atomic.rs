use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use stats_core::{Result, StatsError};
use tempfile::NamedTempFile;
use tracing::debug;

/// File written next to its destination and renamed into place on commit
pub struct AtomicFile {
    path: PathBuf,
    writer: BufWriter<NamedTempFile>,
}

impl AtomicFile {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let tmp = NamedTempFile::new_in(&dir)?;
        debug!(path = %path.display(), tmp = %tmp.path().display(), "Opened temporary output");
        Ok(Self {
            path,
            writer: BufWriter::new(tmp),
        })
    }

    pub fn writer(&mut self) -> &mut BufWriter<NamedTempFile> {
        &mut self.writer
    }

    /// Flush and move the file to its destination, replacing any existing file
    pub fn commit(self) -> Result<PathBuf> {
        let tmp = self
            .writer
            .into_inner()
            .map_err(|e| StatsError::Io(e.into_error()))?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| StatsError::Output(format!("{}: {}", self.path.display(), e.error)))?;
        Ok(self.path)
    }
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}
