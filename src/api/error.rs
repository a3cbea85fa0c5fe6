use crate::services::story_service::StoryError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

pub const UNKNOWN_ROTATION_ERROR: &str = "Unknown error in image rotation.";
pub const UNSPECIFIED_SAVE_ERROR: &str = "Unspecified server error saving story to database.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Image rotation failed: {message}")]
    Rotation {
        error_code: Option<String>,
        message: String,
    },

    /// `public` goes to the client, `detail` only to the log.
    #[error("Internal Server Error: {detail}")]
    Internal { public: String, detail: String },
}

impl AppError {
    pub fn internal(detail: impl ToString) -> Self {
        AppError::Internal {
            public: "Internal Server Error".to_string(),
            detail: detail.to_string(),
        }
    }
}

impl From<StoryError> for AppError {
    fn from(err: StoryError) -> Self {
        match err {
            StoryError::AuthoringDisabled => {
                AppError::Forbidden(StoryError::AuthoringDisabled.to_string())
            }
            StoryError::InvalidModel(msg) => AppError::BadRequest(msg),
            StoryError::Rotation(failure) => AppError::Rotation {
                error_code: failure.error_code,
                message: failure
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| UNKNOWN_ROTATION_ERROR.to_string()),
            },
            StoryError::NotFound(id) => AppError::NotFound(format!("Story {} not found", id)),
            StoryError::Conflict(_) => AppError::Conflict("Document update conflict.".to_string()),
            StoryError::SaveFailed(e) => AppError::Internal {
                public: UNSPECIFIED_SAVE_ERROR.to_string(),
                detail: e.to_string(),
            },
            StoryError::Recovery(e) => AppError::Internal {
                public: "Story media could not be moved to recovery; the story was not deleted."
                    .to_string(),
                detail: e.to_string(),
            },
            StoryError::Upload(e) => AppError::Internal {
                public: "Failed to store uploaded file.".to_string(),
                detail: e.to_string(),
            },
            StoryError::Store(e) => AppError::internal(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut error_code = None;
        let (status, message) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Rotation {
                error_code: code,
                message,
            } => {
                error_code = code;
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            AppError::Internal { public, detail } => {
                tracing::error!("Internal error: {}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, public)
            }
        };

        let mut body = json!({
            "isError": true,
            "message": message
        });
        if let Some(code) = error_code {
            body["errorCode"] = json!(code);
        }

        (status, Json(body)).into_response()
    }
}
