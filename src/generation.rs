use std::fmt::Debug;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures::future::BoxFuture;
use serde::Deserialize;

use crate::error::Error;

/// One unit of a model response: either text or inline binary data.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub text: Option<String>,
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// Base64 payload as sent on the wire.
    pub data: String,
}

/// Decoded image bytes together with the mime type the model declared for
/// them. The overlay stage replaces this with a PNG re-encode.
#[derive(Debug, Clone, PartialEq)]
pub struct RawImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

pub trait TextModel: Debug + Send + Sync {
    fn generate_text(&self, prompt: String) -> BoxFuture<'_, Result<String, Error>>;
}

/// A generation backend that yields response parts in arrival order. Both
/// the unary and the streaming transport implement this, so callers never
/// branch on the response shape.
pub trait ImageModel: Debug + Send + Sync {
    fn generate_parts(&self, prompt: String) -> BoxFuture<'_, Result<Vec<Part>, Error>>;
}

/// Scans parts in order and decodes the first one carrying binary image
/// data. Text-only parts and empty payloads are skipped.
pub fn extract_image(parts: &[Part]) -> Result<RawImage, Error> {
    for part in parts {
        if let Some(inline) = &part.inline_data {
            if inline.data.is_empty() {
                continue;
            }
            let bytes = STANDARD
                .decode(&inline.data)
                .map_err(|e| Error::Generation(format!("Failed to decode image data: {}", e)))?;
            return Ok(RawImage {
                bytes,
                mime: inline.mime_type.clone(),
            });
        }
    }
    Err(Error::Generation("no image returned by the model".into()))
}
