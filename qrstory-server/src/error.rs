use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use qrstory_service::StoryError;

/// Boundary wrapper that renders a [`StoryError`] as status + JSON body.
///
/// Only `InvalidInput` and `NotFound` expose their message; internal
/// failures are logged with their source chain and answered generically.
#[derive(Debug)]
pub struct ApiError(pub StoryError);

impl From<StoryError> for ApiError {
    fn from(err: StoryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            StoryError::InvalidInput { message } => (StatusCode::BAD_REQUEST, message.clone()),
            StoryError::NotFound { .. } => (StatusCode::NOT_FOUND, self.0.to_string()),
            StoryError::StorageWrite { .. }
            | StoryError::StorageRead { .. }
            | StoryError::MetadataWrite { .. }
            | StoryError::MetadataRead { .. } => {
                error!(error = ?self.0, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = json!({
            "success": false,
            "error": message,
            "code": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
