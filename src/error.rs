use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use static_assertions::assert_impl_all;
use tracing::{event, Level};

#[derive(thiserror::Error, Debug)]
pub enum Error
where
    Self: Send + Sync,
{
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Generation error: {0}")]
    Generation(String),
    #[error("Upload error: {0}")]
    Upload(String),
    #[error("Overlay error: {0}")]
    Overlay(String),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

assert_impl_all!(Error: Send, Sync);

pub type Result<T> = std::result::Result<T, Error>;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        event!(Level::ERROR, "{}", self);
        let status = match self {
            Error::Validation(_) => http::StatusCode::UNPROCESSABLE_ENTITY,
            _ => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
