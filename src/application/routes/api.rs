use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::{info, warn};

use crate::application::errors::{ApiError, AppError};
use crate::application::routes::support;
use crate::application::state::AppState;
use crate::domain::history::HistoryEntry;
use crate::domain::posts::GenerationRequest;
use crate::infrastructure::images::{DecodedImage, decode_data_uri};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/history", get(list_history).delete(clear_history))
        .route("/history/{id}", get(get_history_entry))
        .route("/history/{id}/cover", get(download_cover))
        .route("/history/{id}/images/{index}", get(download_image))
}

pub(crate) fn generate_router() -> Router<AppState> {
    Router::new().route("/generate", post(generate))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    entry: HistoryEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    persist_warning: Option<String>,
}

#[tracing::instrument(skip(state, payload))]
pub(crate) async fn generate(
    State(state): State<AppState>,
    Json(payload): Json<GenerationRequest>,
) -> Result<Response, ApiError> {
    let request = payload.normalize();
    request.validate().map_err(AppError::validation)?;

    let request = support::with_scraped_context(request);
    let post = support::run_generation(&state, &request).await?;

    let outcome = state.history.record(&request.book_title, post).await;
    info!(
        entry_id = %outcome.entry.id,
        book_title = %outcome.entry.book_title,
        "generated post"
    );

    let body = GenerateResponse {
        entry: outcome.entry,
        persist_warning: outcome.persist_error,
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

#[tracing::instrument(skip(state))]
pub(crate) async fn list_history(State(state): State<AppState>) -> Json<Vec<HistoryEntry>> {
    Json(state.history.list().await)
}

#[tracing::instrument(skip(state))]
pub(crate) async fn get_history_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryEntry>, ApiError> {
    let entry = load_entry(&state, &id).await?;
    Ok(Json(entry))
}

#[tracing::instrument(skip(state))]
pub(crate) async fn clear_history(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state
        .history
        .clear()
        .await
        .map_err(AppError::from)
        .map_err(ApiError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state))]
pub(crate) async fn download_cover(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let entry = load_entry(&state, &id).await?;

    let uri = entry
        .generated_content
        .cover_image_url
        .as_deref()
        .ok_or_else(|| AppError::not_found("entry has no cover image"))?;

    let image = decode_image(uri, &entry.id, "cover")?;
    Ok(attachment_response(&image, &entry.id, "cover"))
}

#[tracing::instrument(skip(state))]
pub(crate) async fn download_image(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, usize)>,
) -> Result<Response, ApiError> {
    let entry = load_entry(&state, &id).await?;

    let uri = entry
        .generated_content
        .image_urls
        .get(index)
        .ok_or_else(|| AppError::not_found(format!("entry has no image at index {index}")))?;

    let label = format!("image-{}", index + 1);
    let image = decode_image(uri, &entry.id, &label)?;
    Ok(attachment_response(&image, &entry.id, &label))
}

async fn load_entry(state: &AppState, id: &str) -> Result<HistoryEntry, ApiError> {
    state
        .history
        .get(id)
        .await
        .ok_or_else(|| AppError::not_found(format!("history entry {id} not found")).into())
}

/// Decode a stored data URI, skipping the image with a warning when it is
/// malformed rather than surfacing an internal error.
fn decode_image(uri: &str, entry_id: &str, label: &str) -> Result<DecodedImage, ApiError> {
    decode_data_uri(uri).ok_or_else(|| {
        warn!(entry_id, label, "skipping image with invalid data URI");
        AppError::not_found(format!("{label} is not a downloadable image")).into()
    })
}

fn attachment_response(image: &DecodedImage, entry_id: &str, label: &str) -> Response {
    let short_id = entry_id.get(..8).unwrap_or(entry_id);
    let filename = format!("redbookify-{short_id}-{label}.{}", image.extension());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &image.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from(image.bytes.clone()))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
