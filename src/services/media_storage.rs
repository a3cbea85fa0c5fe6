use crate::models::UploadedFile;
use crate::utils::validation::upload_extension;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWriteExt};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Failed to write upload {filename}: {source}")]
    Write {
        filename: String,
        #[source]
        source: io::Error,
    },
}

/// A recoverable delete that could not be confirmed. Any of these leaves the
/// media directories in a state that needs an operator, so callers must not
/// go on to delete the owning document.
#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("Media file {0} does not exist in the uploads directory")]
    SourceMissing(String),

    #[error("Recovery directory already holds a file named {0}")]
    TargetExists(String),

    #[error("Failed to move {filename} to the recovery directory: {source}")]
    Move {
        filename: String,
        #[source]
        source: io::Error,
    },

    #[error("Recovered file {filename} is not readable and writable: {source}")]
    TargetInaccessible {
        filename: String,
        #[source]
        source: io::Error,
    },

    #[error("Media file {0} is still present after being moved")]
    SourceRemains(String),
}

#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Streams an uploaded part to disk under a freshly generated name.
    async fn store_upload<'a>(
        &self,
        original_name: &str,
        mimetype: &str,
        reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<UploadedFile, UploadError>;

    /// Moves a media file into the recovery directory and verifies the move.
    async fn recoverable_delete(&self, filename: &str) -> Result<(), RecoveryError>;
}

/// Media kept on the local filesystem, with deletions parked in a sibling
/// recovery directory instead of being unlinked.
pub struct LocalMediaStorage {
    uploads_dir: PathBuf,
    recovery_dir: PathBuf,
}

impl LocalMediaStorage {
    pub fn new(uploads_dir: impl Into<PathBuf>, recovery_dir: impl Into<PathBuf>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
            recovery_dir: recovery_dir.into(),
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub async fn ensure_directories(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.uploads_dir).await?;
        tokio::fs::create_dir_all(&self.recovery_dir).await
    }

    async fn move_file(source: &Path, target: &Path) -> io::Result<()> {
        if tokio::fs::rename(source, target).await.is_ok() {
            return Ok(());
        }
        // rename fails across filesystems
        tokio::fs::copy(source, target).await?;
        tokio::fs::remove_file(source).await
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn store_upload<'a>(
        &self,
        original_name: &str,
        mimetype: &str,
        mut reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<UploadedFile, UploadError> {
        let filename = format!("{}{}", Uuid::new_v4(), upload_extension(original_name));
        let path = self.uploads_dir.join(&filename);

        let write = async {
            let mut file = tokio::fs::File::create(&path).await?;
            let written = tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await?;
            Ok::<u64, io::Error>(written)
        };

        match write.await {
            Ok(written) => {
                tracing::debug!(
                    "Stored upload {} as {} ({} bytes)",
                    original_name,
                    filename,
                    written
                );
                Ok(UploadedFile {
                    originalname: original_name.to_string(),
                    filename,
                    mimetype: mimetype.to_string(),
                    path,
                })
            }
            Err(source) => {
                let _ = tokio::fs::remove_file(&path).await;
                Err(UploadError::Write { filename, source })
            }
        }
    }

    async fn recoverable_delete(&self, filename: &str) -> Result<(), RecoveryError> {
        let source = self.uploads_dir.join(filename);
        let target = self.recovery_dir.join(filename);

        if !tokio::fs::try_exists(&source).await.unwrap_or(false) {
            return Err(RecoveryError::SourceMissing(filename.to_string()));
        }
        if tokio::fs::try_exists(&target).await.unwrap_or(true) {
            return Err(RecoveryError::TargetExists(filename.to_string()));
        }

        Self::move_file(&source, &target)
            .await
            .map_err(|source| RecoveryError::Move {
                filename: filename.to_string(),
                source,
            })?;

        tokio::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(&target)
            .await
            .map_err(|source| RecoveryError::TargetInaccessible {
                filename: filename.to_string(),
                source,
            })?;

        if tokio::fs::try_exists(&source).await.unwrap_or(true) {
            return Err(RecoveryError::SourceRemains(filename.to_string()));
        }

        tracing::info!(
            "Moved {} to recovery directory {}",
            filename,
            self.recovery_dir.display()
        );
        Ok(())
    }
}
