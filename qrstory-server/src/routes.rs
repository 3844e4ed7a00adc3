use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use qrstory_service::CreateStory;

use crate::{ApiError, AppState};

/// Build the application router over a configured state
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/stories", post(create_story))
        .route("/api/stories/{id}", get(get_story))
        .route("/api/images/{id}", get(get_image))
        .route("/view/{id}", get(view_story))
        .with_state(state)
}

async fn root() -> &'static str {
    "qrstory backend running"
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateStoryBody {
    #[serde(default)]
    image_data: String,
    story_id: Option<String>,
    content_type: Option<String>,
}

async fn create_story(
    State(state): State<AppState>,
    Json(body): Json<CreateStoryBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let outcome = state
        .service
        .create(CreateStory {
            image_data: body.image_data,
            story_id: body.story_id,
            content_type: body.content_type,
        })
        .await?;

    info!(story_id = %outcome.public_id, deduplicated = outcome.deduplicated, "story saved");

    Ok(Json(json!({
        "success": true,
        "storyId": outcome.public_id,
        "url": format!("/api/images/{}", outcome.public_id),
    })))
}

async fn get_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let record = state.service.get_metadata(&id).await?;

    Ok(Json(json!({
        "storyId": record.public_id,
        "contentType": record.content_type,
        "size": record.size_bytes,
        "createdAt": record.created_at.to_rfc3339(),
        "views": record.views,
    })))
}

/// Stream blob bytes. `{id}` may be a public story ID or a direct blob
/// handle. Once headers are out, a mid-stream read failure can only
/// terminate the connection; the client observes a truncated transfer.
async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let opened = state.service.open_blob_stream(&id).await?;

    let mut headers = HeaderMap::new();
    if let Some(ct) = opened
        .content_type
        .as_deref()
        .and_then(|v| HeaderValue::from_str(v).ok())
    {
        headers.insert(header::CONTENT_TYPE, ct);
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(opened.size_bytes));

    Ok((StatusCode::OK, headers, Body::from_stream(opened.stream)).into_response())
}

/// Redirect to the reveal page for a story. Resolves the record first so an
/// unknown ID is a 404 here rather than a broken page, and does not count a
/// view; the page's own metadata fetch is the counted read.
async fn view_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, ApiError> {
    let record = state.service.peek_metadata(&id).await?;

    let separator = if state.reveal_page.contains('?') { '&' } else { '?' };
    let target = format!(
        "{}{}story={}&img=/api/images/{}",
        state.reveal_page, separator, record.public_id, record.blob_handle
    );

    Ok(Redirect::temporary(&target))
}
