use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

pub mod app_state;
pub mod config;
pub mod error;
pub mod gemini;
pub mod generate;
pub mod generation;
pub mod imgbb;
pub mod keepalive;
pub mod overlay;
pub mod pipeline;
pub mod prompt;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(generate::get_root))
        .route("/generate", post(generate::generate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
