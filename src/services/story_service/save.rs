use crate::models::{StoryDocument, UploadedFile};
use crate::services::orientation::rotate_image_from_exif;
use crate::services::rename_map::build_binary_rename_map;
use crate::services::story_store::StoreError;
use std::time::Duration;
use uuid::Uuid;

use super::{SaveStoryResponse, StoryError, StoryService};

impl StoryService {
    /// Persists a story along with the media uploaded for it.
    ///
    /// Images are orientation-corrected one at a time before the model is
    /// touched; the first rotation failure aborts the save. Media blocks are
    /// then pointed at their generated filenames and the story is stored
    /// under a new id.
    pub async fn save_story_with_binaries(
        &self,
        model: &str,
        files: &[UploadedFile],
    ) -> Result<SaveStoryResponse, StoryError> {
        if !self.config.authoring_enabled {
            tracing::warn!("Rejected story save: authoring is disabled");
            return Err(StoryError::AuthoringDisabled);
        }

        let timeout = Duration::from_secs(self.config.rotation_timeout_secs);
        for file in files.iter().filter(|file| file.is_image()) {
            rotate_image_from_exif(self.rotator.clone(), file, timeout).await?;
        }

        let mut story: StoryDocument =
            serde_json::from_str(model).map_err(|e| StoryError::InvalidModel(e.to_string()))?;

        let binary_rename_map = build_binary_rename_map(&mut story.content, files);

        let id = Uuid::new_v4().to_string();
        let written = self.store.put(&id, &story).await.map_err(|e| {
            tracing::error!("Failed to save story {}: {}", id, e);
            match e {
                StoreError::Conflict(id) => StoryError::Conflict(id),
                other => StoryError::SaveFailed(other),
            }
        })?;

        tracing::info!(
            "Saved story {} (rev {}) with {} media file(s)",
            written.id,
            written.rev,
            binary_rename_map.len()
        );

        Ok(SaveStoryResponse {
            ok: written.ok,
            id: written.id,
            rev: written.rev,
            binary_rename_map,
        })
    }
}
