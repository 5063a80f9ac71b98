use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::generation::RawImage;

static FALLBACK_ERROR: &str = "Image host rejected the upload";

/// Form-data uploader for the imgbb hosting API. The key comes from the
/// request headers, so one instance lives for one pipeline run.
#[derive(Debug, Clone)]
pub struct ImgbbUploader {
    reqwest: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl ImgbbUploader {
    pub fn new(reqwest: reqwest::Client, endpoint: String, api_key: String) -> Self {
        Self {
            reqwest,
            endpoint,
            api_key,
        }
    }

    pub async fn upload(&self, image: &RawImage) -> Result<String, Error> {
        let encoded = STANDARD.encode(&image.bytes);
        let resp = self
            .reqwest
            .post(&self.endpoint)
            .multipart(
                reqwest::multipart::Form::new()
                    .text("key", self.api_key.clone())
                    .text("image", encoded),
            )
            .send()
            .await
            .map_err(|e| Error::Upload(format!("Failed to send upload request: {}", e)))?;
        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .map_err(|e| Error::Upload(format!("Failed to parse upload response: {}", e)))?;
        debug!(status = %status, "Image host answered");
        parse_upload_response(&body)
    }
}

/// The host answers `{"success": true, "data": {"url": ...}}` on success
/// and an `error.message` otherwise.
pub fn parse_upload_response(body: &Value) -> Result<String, Error> {
    if body["success"].as_bool() == Some(true) {
        if let Some(url) = body["data"]["url"].as_str() {
            return Ok(url.to_string());
        }
    }
    let message = body
        .pointer("/error/message")
        .and_then(|m| m.as_str())
        .unwrap_or(FALLBACK_ERROR);
    Err(Error::Upload(message.to_string()))
}

pub fn data_uri(image: &RawImage) -> String {
    format!("data:{};base64,{}", image.mime, STANDARD.encode(&image.bytes))
}
