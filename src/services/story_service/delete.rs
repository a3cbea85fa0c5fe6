use crate::models::StoryDocument;
use crate::utils::validation::is_valid_media_filename;
use std::collections::HashSet;

use super::{DeleteStoryResponse, StoryError, StoryService};

impl StoryService {
    /// Deletes a story and parks its media in the recovery directory.
    ///
    /// Every file is moved and verified before the document delete is
    /// issued, so a failed move leaves the story in place.
    pub async fn delete_story(&self, id: &str) -> Result<DeleteStoryResponse, StoryError> {
        let stored = self.store.get(id).await?;

        let filenames = files_to_delete(&stored.story);
        tracing::debug!("Story {} references {} media file(s)", id, filenames.len());

        for filename in &filenames {
            self.media.recoverable_delete(filename).await.map_err(|e| {
                tracing::error!("Recoverable delete failed for story {}: {}", id, e);
                StoryError::from(e)
            })?;
        }

        self.store.delete(id, &stored.rev).await?;
        tracing::info!("Deleted story {} (rev {})", id, stored.rev);

        Ok(DeleteStoryResponse {
            message: format!(
                "DELETE request received successfully for story with id: {}",
                id
            ),
        })
    }
}

/// Media filenames a story owns, in content order without duplicates.
/// Anything that is not a generated media name is logged and left alone.
pub fn files_to_delete(story: &StoryDocument) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut filenames = Vec::new();

    for block in story.content.iter().filter(|b| b.block_type.is_media()) {
        let url = block.resolved_url();
        if !is_valid_media_filename(url) {
            tracing::warn!(
                "Skipping invalid media filename {:?} in {} block",
                url,
                block.block_type.as_str()
            );
            continue;
        }
        if let Some(name) = url {
            if seen.insert(name) {
                filenames.push(name.to_string());
            }
        }
    }

    filenames
}
