use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::news::NewsService;

pub struct AppState {
    pub news: Arc<NewsService>,
}

/// Build the application router. `static_dir` holds `index.html` and the
/// assets it references.
pub fn router(state: Arc<AppState>, static_dir: impl AsRef<Path>) -> Router {
    let static_dir = static_dir.as_ref();

    Router::new()
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .route("/news", get(news))
        .route("/health", get(health))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Route handlers
pub async fn news(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let batch = state.news.next_batch().await;
    let status = if batch.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (status, Json(batch))
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}
