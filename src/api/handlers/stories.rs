use crate::AppState;
use crate::api::error::AppError;
use crate::services::story_service::{
    BrowseResponse, DeleteStoryResponse, SaveStoryResponse, StoryError,
};
use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
};
use futures::TryStreamExt;
use serde_json::Value;
use tokio_util::io::StreamReader;

fn multipart_error(e: MultipartError) -> AppError {
    let err_msg = e.to_string();
    if err_msg.contains("length limit exceeded") {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadRequest(err_msg)
    }
}

#[utoipa::path(
    post,
    path = "/stories",
    request_body(
        content = Multipart,
        description = "A `model` field holding the story JSON, plus zero or more `file` parts"
    ),
    responses(
        (status = 200, description = "Story saved", body = SaveStoryResponse),
        (status = 400, description = "Missing or malformed story model"),
        (status = 403, description = "Saving is currently disabled"),
        (status = 413, description = "Request body too large"),
        (status = 500, description = "Image rotation or database failure")
    ),
    tag = "stories"
)]
pub async fn save_story(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SaveStoryResponse>, AppError> {
    let result: Result<Json<SaveStoryResponse>, AppError> = async {
        // refuse before any upload reaches the disk
        if !state.story_service.authoring_enabled() {
            return Err(StoryError::AuthoringDisabled.into());
        }

        let mut model: Option<String> = None;
        let mut files = Vec::new();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();

            if name == "file" {
                let original_name = field.file_name().unwrap_or("unnamed").to_string();
                let mimetype = field
                    .content_type()
                    .unwrap_or(mime::APPLICATION_OCTET_STREAM.essence_str())
                    .to_string();

                let reader = StreamReader::new(field.map_err(std::io::Error::other));
                let uploaded = state
                    .story_service
                    .media()
                    .store_upload(&original_name, &mimetype, Box::new(reader))
                    .await
                    .map_err(StoryError::from)?;
                files.push(uploaded);
            } else if name == "model" {
                model = Some(field.text().await.map_err(multipart_error)?);
            } else {
                tracing::debug!("Ignoring multipart field {:?}", name);
            }
        }

        let model =
            model.ok_or_else(|| AppError::BadRequest("Missing story model.".to_string()))?;

        let saved = state
            .story_service
            .save_story_with_binaries(&model, &files)
            .await?;

        Ok(Json(saved))
    }
    .await;

    match result {
        Ok(res) => Ok(res),
        Err(e) => {
            // Drain the rest of the body so the client sees the error instead of a reset connection
            tracing::warn!("Story save failed: {}. Consuming remaining stream...", e);
            while let Ok(Some(mut field)) = multipart.next_field().await {
                while let Ok(Some(_)) = field.chunk().await {}
            }
            Err(e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/stories/{id}",
    params(("id" = String, Path, description = "Story id")),
    responses(
        (status = 200, description = "Story with media urls resolved", body = Object),
        (status = 404, description = "Story not found")
    ),
    tag = "stories"
)]
pub async fn get_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.story_service.get_story(&id).await?))
}

#[utoipa::path(
    get,
    path = "/stories",
    responses(
        (status = 200, description = "Summaries of all stories", body = BrowseResponse)
    ),
    tag = "stories"
)]
pub async fn browse_stories(
    State(state): State<AppState>,
) -> Result<Json<BrowseResponse>, AppError> {
    Ok(Json(state.story_service.browse_stories().await?))
}

#[utoipa::path(
    delete,
    path = "/stories/{id}",
    params(("id" = String, Path, description = "Story id")),
    responses(
        (status = 200, description = "Story deleted, media moved to recovery", body = DeleteStoryResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Story not found"),
        (status = 409, description = "Story changed while deleting"),
        (status = 500, description = "Media could not be moved to recovery")
    ),
    security(
        ("basic_auth" = [])
    ),
    tag = "stories"
)]
pub async fn delete_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteStoryResponse>, AppError> {
    Ok(Json(state.story_service.delete_story(&id).await?))
}
