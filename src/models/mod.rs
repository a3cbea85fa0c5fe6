use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use utoipa::ToSchema;

/// Original upload name mapped to the generated on-disk name.
pub type BinaryRenameMap = BTreeMap<String, String>;

/// A story as authored by the client.
///
/// Fields the server does not interpret are kept in `extra` so that a
/// round trip through the store never drops client data. That includes
/// `tags` and `categories`, which clients send as arrays, scalars or null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Canonical render and edit order.
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Text,
    Image,
    Audio,
    Video,
    #[serde(untagged)]
    Other(String),
}

impl BlockType {
    pub fn as_str(&self) -> &str {
        match self {
            BlockType::Text => "text",
            BlockType::Image => "image",
            BlockType::Audio => "audio",
            BlockType::Video => "video",
            BlockType::Other(name) => name,
        }
    }

    pub fn is_media(&self) -> bool {
        matches!(self, BlockType::Image | BlockType::Audio | BlockType::Video)
    }

    /// True for a block that arrived without a `blockType`.
    pub fn is_unset(&self) -> bool {
        matches!(self, BlockType::Other(name) if name.is_empty())
    }
}

impl Default for BlockType {
    fn default() -> Self {
        BlockType::Other(String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    #[serde(default)]
    pub block_type: BlockType,
    #[serde(default)]
    pub file_details: Option<FileDetails>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentBlock {
    pub fn new(block_type: BlockType) -> Self {
        Self {
            block_type,
            file_details: None,
            image_url: None,
            media_url: None,
            extra: Map::new(),
        }
    }

    /// The url field that is meaningful for this block's type.
    pub fn resolved_url(&self) -> Option<&str> {
        match self.block_type {
            BlockType::Image => self.image_url.as_deref(),
            BlockType::Audio | BlockType::Video => self.media_url.as_deref(),
            _ => None,
        }
    }

    /// Sets (or clears, with `None`) the url field matching the block's type.
    /// Non-media blocks are left untouched.
    pub fn set_media_url(&mut self, url: Option<String>) {
        match self.block_type {
            BlockType::Image => self.image_url = url,
            BlockType::Audio | BlockType::Video => self.media_url = url,
            _ => {}
        }
    }
}

/// Media blocks always carry the url field for their type, written as
/// `null` once it has been cleared. Other url fields appear only when set.
impl Serialize for ContentBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if !self.block_type.is_unset() {
            map.serialize_entry("blockType", &self.block_type)?;
        }
        if let Some(details) = &self.file_details {
            map.serialize_entry("fileDetails", details)?;
        }
        if self.image_url.is_some() || self.block_type == BlockType::Image {
            map.serialize_entry("imageUrl", &self.image_url)?;
        }
        if self.media_url.is_some()
            || matches!(self.block_type, BlockType::Audio | BlockType::Video)
        {
            map.serialize_entry("mediaUrl", &self.media_url)?;
        }
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Browser-provided details about the file a media block was authored with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDetails {
    /// Missing on some clients; such a block never matches an upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A file part accepted from a multipart save request and written to disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedFile {
    pub originalname: String,
    pub filename: String,
    pub mimetype: String,
    pub path: PathBuf,
}

impl UploadedFile {
    pub fn is_image(&self) -> bool {
        self.mimetype.starts_with("image")
    }
}

/// A story as held by the document store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredStory {
    pub id: String,
    pub rev: String,
    pub story: StoryDocument,
}

/// Acknowledgement of a store write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WriteResponse {
    pub ok: bool,
    pub id: String,
    pub rev: String,
}
