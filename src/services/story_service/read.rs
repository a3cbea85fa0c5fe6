use crate::models::StoryDocument;
use serde_json::{Map, Value};

use super::{BrowseResponse, StoryError, StoryService};

impl StoryService {
    /// A stored story with `_id`/`_rev` and media urls resolved to the path
    /// uploads are served under.
    pub async fn get_story(&self, id: &str) -> Result<Value, StoryError> {
        let stored = self.store.get(id).await?;

        let mut story = stored.story;
        prefix_media_urls(&mut story, &self.config.uploaded_files_handler_path);

        let mut document = to_object(&story)?;
        document.insert("_id".to_string(), Value::String(stored.id));
        document.insert("_rev".to_string(), Value::String(stored.rev));
        Ok(Value::Object(document))
    }

    pub async fn browse_stories(&self) -> Result<BrowseResponse, StoryError> {
        let stored = self.store.list().await?;

        let mut stories = Map::new();
        for entry in &stored {
            let mut summary = to_object(&entry.story)?;
            summary.remove("content");
            summary.insert("contentTypes".to_string(), content_types(&entry.story));
            stories.insert(entry.id.clone(), Value::Object(summary));
        }

        Ok(BrowseResponse {
            total_results: stored.len(),
            offset: 0,
            stories,
        })
    }
}

fn to_object(story: &StoryDocument) -> Result<Map<String, Value>, StoryError> {
    match serde_json::to_value(story) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Ok(Map::new()),
        Err(e) => Err(StoryError::InvalidModel(e.to_string())),
    }
}

fn prefix_media_urls(story: &mut StoryDocument, handler_path: &str) {
    let prefix = handler_path.trim_end_matches('/');
    for block in story.content.iter_mut() {
        let prefixed = block
            .resolved_url()
            .filter(|url| !url.is_empty())
            .map(|url| format!("{}/{}", prefix, url));
        if prefixed.is_some() {
            block.set_media_url(prefixed);
        }
    }
}

/// Distinct block types, in the order they first appear.
fn content_types(story: &StoryDocument) -> Value {
    let mut types: Vec<&str> = Vec::new();
    for block in story.content.iter().filter(|b| !b.block_type.is_unset()) {
        let name = block.block_type.as_str();
        if !types.contains(&name) {
            types.push(name);
        }
    }
    Value::from(types)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockType, ContentBlock};

    #[test]
    fn test_prefixes_only_present_urls() {
        let mut image = ContentBlock::new(BlockType::Image);
        image.image_url = Some("3b1f2a9e-4c5d-11ee-be56-0242ac120002.jpg".to_string());
        let mut empty = ContentBlock::new(BlockType::Audio);
        empty.media_url = Some(String::new());
        let mut story = StoryDocument {
            content: vec![image, empty, ContentBlock::new(BlockType::Video)],
            ..StoryDocument::default()
        };

        prefix_media_urls(&mut story, "/uploads");

        assert_eq!(
            story.content[0].image_url.as_deref(),
            Some("/uploads/3b1f2a9e-4c5d-11ee-be56-0242ac120002.jpg")
        );
        assert_eq!(story.content[1].media_url.as_deref(), Some(""));
        assert!(story.content[2].media_url.is_none());
    }

    #[test]
    fn test_content_types_first_seen_order() {
        let story = StoryDocument {
            content: vec![
                ContentBlock::new(BlockType::Text),
                ContentBlock::new(BlockType::Image),
                ContentBlock::new(BlockType::Text),
                ContentBlock::new(BlockType::Other("map".to_string())),
                ContentBlock::new(BlockType::default()),
            ],
            ..StoryDocument::default()
        };

        assert_eq!(
            content_types(&story),
            serde_json::json!(["text", "image", "map"])
        );
    }
}
