//! Feed and chirp action handlers.
//!
//! Every handler resolves the viewer's `FeedView`, runs the component
//! operation off the async runtime (rusqlite is blocking), and responds
//! with the re-rendered feed fragment.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
};
use tracing::error;
use uuid::Uuid;

use chirp_feed::{FeedError, FeedView};
use chirp_types::api::{Claims, CreateChirpRequest, UpdateChirpRequest};
use chirp_types::events::CHIRP_EDIT_CANCELED;

use crate::auth::AppState;

const MAX_BODY_CHARS: usize = 255;

/// GET /feed - rehydrate the viewer's feed and return the fragment.
pub async fn get_feed(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let view = state.views.view_for(&state.db, claims.sub).await;
    let viewer = claims.sub;

    let html = run_view(view, move |view| {
        view.load()?;
        Ok(view.render(viewer))
    })
    .await?;

    Ok(Html(html))
}

/// POST /chirps - post a new chirp.
pub async fn create_chirp(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateChirpRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let body = validate_body(&req.body)?;
    let view = state.views.view_for(&state.db, claims.sub).await;
    let viewer = claims.sub;

    let html = run_view(view, move |view| {
        view.create(viewer, &body)?;
        Ok(view.render(viewer))
    })
    .await?;

    Ok((StatusCode::CREATED, Html(html)))
}

/// PATCH /chirps/{chirp_id} - save an edited body.
pub async fn update_chirp(
    State(state): State<AppState>,
    Path(chirp_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateChirpRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let body = validate_body(&req.body)?;
    let view = state.views.view_for(&state.db, claims.sub).await;
    let viewer = claims.sub;

    let html = run_view(view, move |view| {
        view.update(viewer, chirp_id, &body)?;
        Ok(view.render(viewer))
    })
    .await?;

    Ok(Html(html))
}

/// DELETE /chirps/{chirp_id}.
pub async fn delete_chirp(
    State(state): State<AppState>,
    Path(chirp_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let view = state.views.view_for(&state.db, claims.sub).await;
    let viewer = claims.sub;

    let html = run_view(view, move |view| {
        view.delete(viewer, chirp_id)?;
        Ok(view.render(viewer))
    })
    .await?;

    Ok(Html(html))
}

/// POST /chirps/{chirp_id}/edit - open the inline edit sub-view.
pub async fn begin_edit(
    State(state): State<AppState>,
    Path(chirp_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let view = state.views.view_for(&state.db, claims.sub).await;
    let viewer = claims.sub;

    let html = run_view(view, move |view| {
        view.begin_edit(viewer, chirp_id)?;
        Ok(view.render(viewer))
    })
    .await?;

    Ok(Html(html))
}

/// POST /edit/cancel - abandon the inline edit, if any.
pub async fn cancel_edit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let view = state.views.view_for(&state.db, claims.sub).await;
    let viewer = claims.sub;

    let html = run_view(view, move |view| {
        // Cross-component notification, not a direct end_edit() call
        view.bus().publish(CHIRP_EDIT_CANCELED);
        Ok(view.render(viewer))
    })
    .await?;

    Ok(Html(html))
}

/// Trim and bounds-check a chirp body.
fn validate_body(body: &str) -> Result<String, StatusCode> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_BODY_CHARS {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(trimmed.to_string())
}

/// Run a view operation off the async runtime and map its errors onto
/// response statuses.
async fn run_view<F>(view: Arc<FeedView>, f: F) -> Result<String, StatusCode>
where
    F: FnOnce(&FeedView) -> Result<String, FeedError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&view))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| feed_status(&e))
}

fn feed_status(err: &FeedError) -> StatusCode {
    match err {
        FeedError::Unauthorized => StatusCode::FORBIDDEN,
        FeedError::NotFound => StatusCode::NOT_FOUND,
        FeedError::Store(e) => {
            error!("feed store failure: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_validation() {
        assert!(validate_body("hello").is_ok());
        assert_eq!(validate_body("  padded  ").unwrap(), "padded");
        assert!(validate_body("").is_err());
        assert!(validate_body("   \n\t ").is_err());
        assert!(validate_body(&"x".repeat(255)).is_ok());
        assert!(validate_body(&"x".repeat(256)).is_err());
    }
}
