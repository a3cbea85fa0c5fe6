use crate::entities::{prelude::*, stories};
use crate::models::{StoredStory, StoryDocument, WriteResponse};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde_json::Value;
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Story {0} not found")]
    NotFound(String),

    #[error("Document update conflict for story {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Backend(#[from] DbErr),

    #[error("Malformed story document: {0}")]
    Document(#[from] serde_json::Error),
}

/// Document store holding stories under an id with a revision token.
#[async_trait]
pub trait StoryStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<StoredStory, StoreError>;

    /// Creates a new document. Fails with `Conflict` if `id` is taken.
    async fn put(&self, id: &str, story: &StoryDocument) -> Result<WriteResponse, StoreError>;

    /// Removes a document, provided `rev` is still its current revision.
    async fn delete(&self, id: &str, rev: &str) -> Result<WriteResponse, StoreError>;

    async fn list(&self) -> Result<Vec<StoredStory>, StoreError>;
}

pub struct SeaOrmStoryStore {
    db: DatabaseConnection,
}

impl SeaOrmStoryStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Revision tokens look like `<generation>-<32 hex>`.
fn next_rev(previous: Option<&str>) -> String {
    let generation = previous
        .and_then(|rev| rev.split_once('-'))
        .and_then(|(generation, _)| generation.parse::<u64>().ok())
        .unwrap_or(0);
    format!("{}-{}", generation + 1, Uuid::new_v4().simple())
}

fn to_stored(model: stories::Model) -> Result<StoredStory, StoreError> {
    Ok(StoredStory {
        story: serde_json::from_value(model.document)?,
        id: model.id,
        rev: model.rev,
    })
}

#[async_trait]
impl StoryStore for SeaOrmStoryStore {
    async fn get(&self, id: &str) -> Result<StoredStory, StoreError> {
        let model = Stories::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        to_stored(model)
    }

    async fn put(&self, id: &str, story: &StoryDocument) -> Result<WriteResponse, StoreError> {
        let started = Instant::now();

        if Stories::find_by_id(id).one(&self.db).await?.is_some() {
            return Err(StoreError::Conflict(id.to_string()));
        }

        let mut document = serde_json::to_value(story)?;
        if let Value::Object(fields) = &mut document {
            fields.remove("_id");
            fields.remove("_rev");
        }

        let now = chrono::Utc::now();
        let rev = next_rev(None);
        let model = stories::ActiveModel {
            id: Set(id.to_string()),
            rev: Set(rev.clone()),
            title: Set(story.title.clone()),
            document: Set(document),
            created_at: Set(now),
            updated_at: Set(now),
        };
        model.insert(&self.db).await?;

        tracing::debug!("Stored story {} in {:?}", id, started.elapsed());

        Ok(WriteResponse {
            ok: true,
            id: id.to_string(),
            rev,
        })
    }

    async fn delete(&self, id: &str, rev: &str) -> Result<WriteResponse, StoreError> {
        let started = Instant::now();

        let result = Stories::delete_many()
            .filter(stories::Column::Id.eq(id))
            .filter(stories::Column::Rev.eq(rev))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return match Stories::find_by_id(id).one(&self.db).await? {
                Some(current) => {
                    tracing::warn!(
                        "Stale revision for story {}: got {}, current {}",
                        id,
                        rev,
                        current.rev
                    );
                    Err(StoreError::Conflict(id.to_string()))
                }
                None => Err(StoreError::NotFound(id.to_string())),
            };
        }

        tracing::debug!("Deleted story {} in {:?}", id, started.elapsed());

        Ok(WriteResponse {
            ok: true,
            id: id.to_string(),
            rev: next_rev(Some(rev)),
        })
    }

    async fn list(&self) -> Result<Vec<StoredStory>, StoreError> {
        Stories::find()
            .order_by_asc(stories::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(to_stored)
            .collect()
    }
}
