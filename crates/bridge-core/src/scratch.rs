//! Scoped scratch resources.
//!
//! [`ScratchFile`] and [`WorkDir`] are drop guards: whatever path a compile
//! operation leaves through (success, compile error, early return, `?`, or a
//! cancelled future), the guard removes what it created. Removal is best-effort;
//! failures are logged at `debug` and never surface to the caller.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::id::ScratchToken;

/// Creates the scratch root if it does not exist yet.
///
/// Returns `true` when the directory was created by this call.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_scratch_root(dir: &Path) -> Result<bool> {
    if dir.is_dir() {
        return Ok(false);
    }
    std::fs::create_dir_all(dir)
        .map_err(|e| Error::io("failed to create scratch directory", dir, e))?;
    Ok(true)
}

/// A per-request file holding submitted source text.
///
/// Created with `create_new` semantics, so two requests can never share one.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    token: ScratchToken,
}

impl ScratchFile {
    /// Writes `contents` to `<dir>/input_<token>.txt`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file already exists or cannot be written. A
    /// partially written file is removed before returning.
    pub async fn create(dir: &Path, token: ScratchToken, contents: &str) -> Result<Self> {
        let path = dir.join(token.scratch_file_name());
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| Error::io("failed to create scratch file", &path, e))?;

        // Guard exists from here on, so a failed write still cleans up.
        let guard = Self { path, token };

        file.write_all(contents.as_bytes())
            .await
            .map_err(|e| Error::io("failed to write scratch file", &guard.path, e))?;
        file.flush()
            .await
            .map_err(|e| Error::io("failed to flush scratch file", &guard.path, e))?;

        Ok(guard)
    }

    /// Returns the scratch file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the token that names this file.
    #[must_use]
    pub const fn token(&self) -> ScratchToken {
        self.token
    }

    /// Opens the file for reading, for use as a subprocess's stdin.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open_for_stdin(&self) -> Result<std::fs::File> {
        std::fs::File::open(&self.path)
            .map_err(|e| Error::io("failed to open scratch file", &self.path, e))
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::trace!(path = %self.path.display(), "scratch file removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "scratch file removal failed");
            }
        }
    }
}

/// Working directory for one compiler invocation.
///
/// Owned directories are created fresh per request and removed on drop.
/// Shared directories (the deployment directory) are never removed.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    owned: bool,
}

impl WorkDir {
    /// Creates `<root>/run_<token>/`, owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory already exists or cannot be created.
    pub async fn create(root: &Path, token: ScratchToken) -> Result<Self> {
        let path = root.join(token.work_dir_name());
        tokio::fs::create_dir(&path)
            .await
            .map_err(|e| Error::io("failed to create invocation directory", &path, e))?;
        Ok(Self { path, owned: true })
    }

    /// Wraps an existing directory that must outlive the invocation.
    #[must_use]
    pub fn shared(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            owned: false,
        }
    }

    /// Returns the directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true when the directory is removed on drop.
    #[must_use]
    pub const fn is_owned(&self) -> bool {
        self.owned
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if !self.owned {
            return;
        }
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => tracing::trace!(path = %self.path.display(), "invocation directory removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "invocation directory removal failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[tokio::test]
    async fn scratch_file_is_removed_on_drop() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let token = ScratchToken::generate();
        let scratch = ScratchFile::create(dir.path(), token, "dhoro x = 10;").await?;
        let path = scratch.path().to_path_buf();

        assert_eq!(std::fs::read_to_string(&path)?, "dhoro x = 10;");
        assert_eq!(scratch.token(), token);

        drop(scratch);
        assert!(!path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn scratch_file_refuses_existing_name() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let token = ScratchToken::generate();
        let _first = ScratchFile::create(dir.path(), token, "a").await?;

        let err = ScratchFile::create(dir.path(), token, "b").await.unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        // The losing request must not delete the winner's file.
        assert!(dir.path().join(token.scratch_file_name()).exists());
        Ok(())
    }

    #[tokio::test]
    async fn scratch_file_in_missing_directory_fails() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let missing = dir.path().join("nope");
        let err = ScratchFile::create(&missing, ScratchToken::generate(), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn drop_tolerates_already_deleted_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let scratch = ScratchFile::create(dir.path(), ScratchToken::generate(), "x").await?;
        std::fs::remove_file(scratch.path())?;
        drop(scratch);
        Ok(())
    }

    #[tokio::test]
    async fn owned_work_dir_is_removed_with_contents() -> Result<()> {
        let root = tempfile::tempdir()?;
        let work = WorkDir::create(root.path(), ScratchToken::generate()).await?;
        let path = work.path().to_path_buf();
        std::fs::write(path.join("output.asm"), "MOV x, 10")?;
        assert!(work.is_owned());

        drop(work);
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn shared_work_dir_is_kept() -> Result<()> {
        let root = tempfile::tempdir()?;
        let work = WorkDir::shared(root.path());
        assert!(!work.is_owned());
        drop(work);
        assert!(root.path().exists());
        Ok(())
    }

    #[test]
    fn ensure_scratch_root_creates_once() -> Result<()> {
        let root = tempfile::tempdir()?;
        let scratch = root.path().join("temp");
        assert!(ensure_scratch_root(&scratch)?);
        assert!(!ensure_scratch_root(&scratch)?);
        assert!(scratch.is_dir());
        Ok(())
    }
}
