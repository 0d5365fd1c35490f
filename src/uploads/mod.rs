pub mod handlers;

use axum::{extract::DefaultBodyLimit, routing::post, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(handlers::upload_image))
        // Headroom over the file limit for multipart framing.
        .layer(DefaultBodyLimit::max(handlers::MAX_UPLOAD_BYTES + 1024 * 1024))
}
