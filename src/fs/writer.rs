//! Atomic, non-clobbering file writes.

use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};

/// Prefix of in-flight temporary files, ignored when counting entries.
pub const TEMP_PREFIX: &str = ".classroom-sync-";

/// A file being written in chunks to a path that must not exist yet.
///
/// Content goes to a temporary file next to the target and is linked into
/// place by [`NewFile::persist`] without replacing anything, so the final
/// name only ever holds complete content. Dropping a `NewFile` without
/// persisting it removes the temporary file.
pub struct NewFile {
    path: PathBuf,
    temp: NamedTempFile,
    file: tokio::fs::File,
    written: u64,
}

impl NewFile {
    /// Create the parent directories and a temporary file beside `path`.
    ///
    /// An existing target yields [`Error::FileExists`].
    pub async fn create(path: &Path) -> Result<Self> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        tokio::fs::create_dir_all(parent).await?;

        if tokio::fs::try_exists(path).await? {
            return Err(Error::FileExists(path.to_path_buf()));
        }

        let temp = Builder::new().prefix(TEMP_PREFIX).tempfile_in(parent)?;
        let file = tokio::fs::File::from_std(temp.as_file().try_clone()?);

        Ok(Self {
            path: path.to_path_buf(),
            temp,
            file,
            written: 0,
        })
    }

    pub async fn write(&mut self, chunk: &[u8]) -> Result<()> {
        self.file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush to disk and move into place; returns the number of bytes.
    ///
    /// A target that appeared in the meantime yields [`Error::FileExists`]
    /// and is left untouched.
    pub async fn persist(self) -> Result<u64> {
        let Self {
            path,
            temp,
            mut file,
            written,
        } = self;

        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        match temp.persist_noclobber(&path) {
            Ok(_) => Ok(written),
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(Error::FileExists(path))
            }
            Err(e) => Err(Error::Io(e.error)),
        }
    }
}
