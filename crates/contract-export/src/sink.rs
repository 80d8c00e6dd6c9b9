//! Output files that either appear complete or not at all

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{ExportError, Result};

/// Writes export artifacts into one directory
#[derive(Debug, Clone)]
pub struct ExportSink {
    dir: PathBuf,
}

impl ExportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` to `name` inside the sink directory.
    ///
    /// The data goes to a temporary file in the same directory first and is
    /// renamed into place once fully written.
    pub fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        validate_name(name)?;
        std::fs::create_dir_all(&self.dir)?;

        let target = self.dir.join(name);
        let mut file = NamedTempFile::new_in(&self.dir)?;
        file.write_all(bytes)?;
        file.as_file().sync_all()?;
        file.persist(&target).map_err(|e| ExportError::Io(e.error))?;

        tracing::info!(path = %target.display(), bytes = bytes.len(), "Wrote export");
        Ok(target)
    }

    /// Run `produce` and write its output; nothing is written when it fails
    pub fn write_with<F>(&self, name: &str, produce: F) -> Result<PathBuf>
    where
        F: FnOnce() -> Result<Vec<u8>>,
    {
        validate_name(name)?;
        let bytes = produce().map_err(|e| {
            tracing::error!(name, "Export failed: {}", e);
            e
        })?;
        self.write(name, &bytes)
    }
}

fn validate_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0');
    if invalid {
        return Err(ExportError::InvalidName(name.to_string()));
    }
    Ok(())
}
