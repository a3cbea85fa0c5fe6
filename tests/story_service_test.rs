use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use storytelling_server::config::AppConfig;
use storytelling_server::models::{StoredStory, StoryDocument, UploadedFile, WriteResponse};
use storytelling_server::services::media_storage::{MediaStorage, RecoveryError, UploadError};
use storytelling_server::services::orientation::{ImageRotator, RotationError};
use storytelling_server::services::story_service::{StoryError, StoryService};
use storytelling_server::services::story_store::{StoreError, StoryStore};
use storytelling_server::utils::validation::is_valid_media_filename;
use tokio::io::{AsyncRead, AsyncReadExt};

const PHOTO: &str = "3b1f2a9e-4c5d-11ee-be56-0242ac120002.jpg";
const SONG: &str = "7c9e6679-7425-40de-944b-e07fc1f90ae7.mp3";

#[derive(Default)]
struct MockStore {
    stories: Mutex<HashMap<String, StoredStory>>,
    puts: Mutex<Vec<String>>,
    deletes: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl StoryStore for MockStore {
    async fn get(&self, id: &str) -> Result<StoredStory, StoreError> {
        self.stories
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn put(&self, id: &str, story: &StoryDocument) -> Result<WriteResponse, StoreError> {
        self.puts.lock().unwrap().push(id.to_string());
        let rev = "1-abc".to_string();
        self.stories.lock().unwrap().insert(
            id.to_string(),
            StoredStory {
                id: id.to_string(),
                rev: rev.clone(),
                story: story.clone(),
            },
        );
        Ok(WriteResponse {
            ok: true,
            id: id.to_string(),
            rev,
        })
    }

    async fn delete(&self, id: &str, rev: &str) -> Result<WriteResponse, StoreError> {
        self.deletes
            .lock()
            .unwrap()
            .push((id.to_string(), rev.to_string()));
        self.stories.lock().unwrap().remove(id);
        Ok(WriteResponse {
            ok: true,
            id: id.to_string(),
            rev: "2-def".to_string(),
        })
    }

    async fn list(&self) -> Result<Vec<StoredStory>, StoreError> {
        Ok(self.stories.lock().unwrap().values().cloned().collect())
    }
}

#[derive(Default)]
struct MockMedia {
    recovered: Mutex<Vec<String>>,
    fail_on: Option<String>,
}

#[async_trait]
impl MediaStorage for MockMedia {
    async fn store_upload<'a>(
        &self,
        original_name: &str,
        mimetype: &str,
        mut reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<UploadedFile, UploadError> {
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .await
            .map_err(|source| UploadError::Write {
                filename: original_name.to_string(),
                source,
            })?;
        Ok(UploadedFile {
            originalname: original_name.to_string(),
            filename: PHOTO.to_string(),
            mimetype: mimetype.to_string(),
            path: PathBuf::from(PHOTO),
        })
    }

    async fn recoverable_delete(&self, filename: &str) -> Result<(), RecoveryError> {
        if self.fail_on.as_deref() == Some(filename) {
            return Err(RecoveryError::SourceRemains(filename.to_string()));
        }
        self.recovered.lock().unwrap().push(filename.to_string());
        Ok(())
    }
}

type RotateFn = dyn Fn(&Path) -> Result<Vec<u8>, RotationError> + Send + Sync;

struct MockRotator {
    calls: Mutex<Vec<PathBuf>>,
    outcome: Box<RotateFn>,
}

impl MockRotator {
    fn new(outcome: impl Fn(&Path) -> Result<Vec<u8>, RotationError> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            outcome: Box::new(outcome),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ImageRotator for MockRotator {
    fn rotate(&self, path: &Path) -> Result<Vec<u8>, RotationError> {
        self.calls.lock().unwrap().push(path.to_path_buf());
        (self.outcome)(path)
    }
}

struct Harness {
    service: StoryService,
    store: Arc<MockStore>,
    media: Arc<MockMedia>,
    rotator: Arc<MockRotator>,
    dir: tempfile::TempDir,
}

fn harness(config: AppConfig, media: MockMedia, rotator: Arc<MockRotator>) -> Harness {
    let store = Arc::new(MockStore::default());
    let media = Arc::new(media);
    let service = StoryService::new(
        store.clone(),
        media.clone(),
        rotator.clone(),
        Arc::new(config),
    );
    Harness {
        service,
        store,
        media,
        rotator,
        dir: tempfile::tempdir().unwrap(),
    }
}

fn upload_on_disk(dir: &Path, original: &str, generated: &str, mimetype: &str) -> UploadedFile {
    let path = dir.join(generated);
    std::fs::write(&path, b"media bytes").unwrap();
    UploadedFile {
        originalname: original.to_string(),
        filename: generated.to_string(),
        mimetype: mimetype.to_string(),
        path,
    }
}

#[tokio::test]
async fn test_save_resolves_uploaded_photo() {
    let h = harness(
        AppConfig::development(),
        MockMedia::default(),
        MockRotator::new(|_| Err(RotationError::NoOrientation)),
    );
    let files = vec![upload_on_disk(h.dir.path(), "photo.jpg", PHOTO, "image/jpeg")];
    let model = r#"{
        "title": "Our garden",
        "content": [
            {"blockType": "text", "text": "We planted beans."},
            {"blockType": "image", "fileDetails": {"name": "photo.jpg"}, "imageUrl": "blob:http://localhost/1"}
        ]
    }"#;

    let saved = h
        .service
        .save_story_with_binaries(model, &files)
        .await
        .unwrap();

    assert!(saved.ok);
    assert_eq!(saved.binary_rename_map.get("photo.jpg").map(String::as_str), Some(PHOTO));
    assert_eq!(h.rotator.call_count(), 1);

    let stored = h.store.get(&saved.id).await.unwrap();
    assert_eq!(stored.story.content[1].image_url.as_deref(), Some(PHOTO));
    assert_eq!(stored.story.title.as_deref(), Some("Our garden"));
}

#[tokio::test]
async fn test_save_accepts_loosely_shaped_models() {
    let h = harness(
        AppConfig::development(),
        MockMedia::default(),
        MockRotator::new(|_| Err(RotationError::NoOrientation)),
    );
    let model = r#"{
        "tags": null,
        "categories": "community",
        "content": [
            {"blockType": "image", "fileDetails": {}, "imageUrl": "blob:http://localhost/1"},
            {"text": "no type"}
        ]
    }"#;

    let saved = h
        .service
        .save_story_with_binaries(model, &[])
        .await
        .unwrap();

    assert!(saved.binary_rename_map.is_empty());
    let stored = h.store.get(&saved.id).await.unwrap();
    assert!(stored.story.content[0].image_url.is_none());
    assert_eq!(stored.story.extra["tags"], serde_json::Value::Null);
    assert_eq!(stored.story.extra["categories"], "community");
}

#[tokio::test]
async fn test_save_with_authoring_disabled_does_no_work() {
    let config = AppConfig {
        authoring_enabled: false,
        ..AppConfig::development()
    };
    let h = harness(
        config,
        MockMedia::default(),
        MockRotator::new(|_| Ok(Vec::new())),
    );
    let files = vec![upload_on_disk(h.dir.path(), "photo.jpg", PHOTO, "image/jpeg")];

    let err = h
        .service
        .save_story_with_binaries(r#"{"content": []}"#, &files)
        .await
        .unwrap_err();

    assert!(matches!(err, StoryError::AuthoringDisabled));
    assert_eq!(err.to_string(), "Saving is currently disabled.");
    assert_eq!(h.rotator.call_count(), 0);
    assert!(h.store.puts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_first_rotation_failure_aborts_save() {
    let h = harness(
        AppConfig::development(),
        MockMedia::default(),
        MockRotator::new(|_| Err(RotationError::UnknownOrientation(9))),
    );
    let files = vec![
        upload_on_disk(h.dir.path(), "a.jpg", PHOTO, "image/jpeg"),
        upload_on_disk(
            h.dir.path(),
            "b.jpg",
            "9b2d1c1e-0000-4000-8000-000000000001.jpg",
            "image/jpeg",
        ),
    ];

    let err = h
        .service
        .save_story_with_binaries(r#"{"content": []}"#, &files)
        .await
        .unwrap_err();

    match err {
        StoryError::Rotation(failure) => {
            assert_eq!(failure.error_code.as_deref(), Some("unknown_orientation"));
            assert_eq!(failure.filename, PHOTO);
        }
        other => panic!("expected rotation failure, got {other:?}"),
    }
    assert_eq!(h.rotator.call_count(), 1);
    assert!(h.store.puts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_only_images_are_rotated() {
    let h = harness(
        AppConfig::development(),
        MockMedia::default(),
        MockRotator::new(|_| Err(RotationError::CorrectOrientation)),
    );
    let files = vec![
        upload_on_disk(h.dir.path(), "song.mp3", SONG, "audio/mpeg"),
        upload_on_disk(h.dir.path(), "photo.jpg", PHOTO, "image/jpeg"),
    ];

    h.service
        .save_story_with_binaries(r#"{"content": []}"#, &files)
        .await
        .unwrap();

    let calls = h.rotator.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].ends_with(PHOTO));
}

#[tokio::test]
async fn test_malformed_model_is_rejected() {
    let h = harness(
        AppConfig::development(),
        MockMedia::default(),
        MockRotator::new(|_| Ok(Vec::new())),
    );

    let err = h
        .service
        .save_story_with_binaries("{not json", &[])
        .await
        .unwrap_err();

    assert!(matches!(err, StoryError::InvalidModel(_)));
    assert!(h.store.puts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_saved_ids_are_unique() {
    let h = harness(
        AppConfig::development(),
        MockMedia::default(),
        MockRotator::new(|_| Ok(Vec::new())),
    );

    let first = h
        .service
        .save_story_with_binaries(r#"{"content": []}"#, &[])
        .await
        .unwrap();
    let second = h
        .service
        .save_story_with_binaries(r#"{"content": []}"#, &[])
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert!(first.binary_rename_map.is_empty());
}

async fn seed_story(store: &MockStore, id: &str, content: serde_json::Value) {
    let story: StoryDocument = serde_json::from_value(serde_json::json!({ "content": content })).unwrap();
    store.stories.lock().unwrap().insert(
        id.to_string(),
        StoredStory {
            id: id.to_string(),
            rev: "3-current".to_string(),
            story,
        },
    );
}

#[tokio::test]
async fn test_delete_moves_each_file_once_then_deletes_with_rev() {
    let h = harness(
        AppConfig::development(),
        MockMedia::default(),
        MockRotator::new(|_| Ok(Vec::new())),
    );
    seed_story(
        &h.store,
        "story-1",
        serde_json::json!([
            {"blockType": "image", "imageUrl": PHOTO},
            {"blockType": "audio", "mediaUrl": SONG},
            {"blockType": "image", "imageUrl": PHOTO},
            {"blockType": "image", "imageUrl": "../../etc/passwd"},
            {"blockType": "video"},
            {"blockType": "text", "text": "The end."}
        ]),
    )
    .await;

    let response = h.service.delete_story("story-1").await.unwrap();

    assert_eq!(
        response.message,
        "DELETE request received successfully for story with id: story-1"
    );
    assert_eq!(*h.media.recovered.lock().unwrap(), vec![PHOTO, SONG]);
    assert_eq!(
        *h.store.deletes.lock().unwrap(),
        vec![("story-1".to_string(), "3-current".to_string())]
    );
    assert!(h.media.recovered.lock().unwrap().iter().all(|f| is_valid_media_filename(Some(f))));
}

#[tokio::test]
async fn test_failed_recovery_keeps_document() {
    let media = MockMedia {
        fail_on: Some(SONG.to_string()),
        ..MockMedia::default()
    };
    let h = harness(
        AppConfig::development(),
        media,
        MockRotator::new(|_| Ok(Vec::new())),
    );
    seed_story(
        &h.store,
        "story-1",
        serde_json::json!([
            {"blockType": "image", "imageUrl": PHOTO},
            {"blockType": "audio", "mediaUrl": SONG}
        ]),
    )
    .await;

    let err = h.service.delete_story("story-1").await.unwrap_err();

    assert!(matches!(err, StoryError::Recovery(_)));
    assert!(h.store.deletes.lock().unwrap().is_empty());
    assert!(h.store.get("story-1").await.is_ok());
}

#[tokio::test]
async fn test_delete_unknown_story() {
    let h = harness(
        AppConfig::development(),
        MockMedia::default(),
        MockRotator::new(|_| Ok(Vec::new())),
    );

    let err = h.service.delete_story("missing").await.unwrap_err();

    assert!(matches!(err, StoryError::NotFound(_)));
    assert!(h.media.recovered.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_story_prefixes_media_urls() {
    let h = harness(
        AppConfig::development(),
        MockMedia::default(),
        MockRotator::new(|_| Ok(Vec::new())),
    );
    seed_story(
        &h.store,
        "story-1",
        serde_json::json!([
            {"blockType": "image", "imageUrl": PHOTO},
            {"blockType": "video", "mediaUrl": ""}
        ]),
    )
    .await;

    let story = h.service.get_story("story-1").await.unwrap();

    assert_eq!(story["_id"], "story-1");
    assert_eq!(story["_rev"], "3-current");
    assert_eq!(story["content"][0]["imageUrl"], format!("/uploads/{PHOTO}"));
    assert_eq!(story["content"][1]["mediaUrl"], "");
}
