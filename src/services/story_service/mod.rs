use crate::config::AppConfig;
use crate::services::media_storage::{MediaStorage, RecoveryError, UploadError};
use crate::services::orientation::{ImageRotator, RotationFailure};
use crate::services::story_store::{StoreError, StoryStore};
use std::sync::Arc;
use thiserror::Error;

pub mod delete;
pub mod read;
pub mod save;
pub mod types;

pub use delete::files_to_delete;
pub use types::{BrowseResponse, DeleteStoryResponse, SaveStoryResponse};

#[derive(Debug, Error)]
pub enum StoryError {
    #[error("Saving is currently disabled.")]
    AuthoringDisabled,

    #[error("Invalid story model: {0}")]
    InvalidModel(String),

    #[error(transparent)]
    Rotation(#[from] RotationFailure),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Story {0} not found")]
    NotFound(String),

    #[error("Document update conflict for story {0}")]
    Conflict(String),

    #[error(transparent)]
    Store(StoreError),

    #[error("Failed to save story: {0}")]
    SaveFailed(StoreError),

    #[error(transparent)]
    Recovery(#[from] RecoveryError),
}

impl From<StoreError> for StoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => StoryError::NotFound(id),
            StoreError::Conflict(id) => StoryError::Conflict(id),
            other => StoryError::Store(other),
        }
    }
}

/// Coordinates the document store, media storage and image rotation for
/// saving, reading and deleting stories.
pub struct StoryService {
    store: Arc<dyn StoryStore>,
    media: Arc<dyn MediaStorage>,
    rotator: Arc<dyn ImageRotator>,
    config: Arc<AppConfig>,
}

impl StoryService {
    pub fn new(
        store: Arc<dyn StoryStore>,
        media: Arc<dyn MediaStorage>,
        rotator: Arc<dyn ImageRotator>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            media,
            rotator,
            config,
        }
    }

    pub fn media(&self) -> &Arc<dyn MediaStorage> {
        &self.media
    }

    pub fn authoring_enabled(&self) -> bool {
        self.config.authoring_enabled
    }
}
