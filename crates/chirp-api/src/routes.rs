use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::{self, AppState};
use crate::chirps;
use crate::middleware::require_auth;

/// Build the application router. The server binary layers static file
/// serving, CORS, and tracing on top; the integration tests drive this
/// router directly.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/feed", get(chirps::get_feed))
        .route("/chirps", post(chirps::create_chirp))
        .route(
            "/chirps/{chirp_id}",
            axum::routing::patch(chirps::update_chirp).delete(chirps::delete_chirp),
        )
        .route("/chirps/{chirp_id}/edit", post(chirps::begin_edit))
        .route("/edit/cancel", post(chirps::cancel_edit))
        .layer(middleware::from_fn(require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
