use futures::future::BoxFuture;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::error::Error;
use crate::generation::{ImageModel, Part, TextModel};

/// Raw client for the Gemini REST API. Credentials arrive per request, so
/// instances are built around the shared HTTP client for each call.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    reqwest: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

impl GenerateContentResponse {
    fn into_parts(self) -> Vec<Part> {
        self.candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .collect()
    }
}

fn image_request_body(prompt: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }]
        }],
        "generationConfig": {
            "responseModalities": ["IMAGE"],
            "imageConfig": {
                "aspectRatio": "1:1",
                "imageSize": "1K"
            }
        }
    })
}

/// Pulls the human-readable message out of a Gemini error body, falling
/// back to the status code and a truncated body when there is none.
fn upstream_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value.pointer("/error/message").and_then(|m| m.as_str()) {
            return message.to_string();
        }
    }
    let truncated: String = body.chars().take(500).collect();
    format!("HTTP {}: {}", status, truncated)
}

impl GeminiClient {
    pub fn new(reqwest: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            reqwest,
            base_url,
            api_key,
        }
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}",
            self.base_url.trim_end_matches('/'),
            model,
            method
        )
    }

    async fn post(&self, url: &str, body: &Value) -> Result<reqwest::Response, Error> {
        trace!(body = ?body, "Sending request");
        let resp = self
            .reqwest
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Generation(format!("Failed to send request: {}", e)))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Generation(upstream_message(status.as_u16(), &body)));
        }
        Ok(resp)
    }

    pub async fn generate_text(&self, model: &str, prompt: &str) -> Result<String, Error> {
        let url = self.model_url(model, "generateContent");
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }]
        });
        let resp: GenerateContentResponse = self
            .post(&url, &body)
            .await?
            .json()
            .await
            .map_err(|e| Error::Generation(format!("Failed to parse response: {}", e)))?;
        for part in resp.into_parts() {
            if let Some(text) = part.text {
                if !text.trim().is_empty() {
                    return Ok(text);
                }
            }
        }
        Err(Error::Generation("no text returned by the model".into()))
    }

    pub async fn generate_parts(&self, model: &str, prompt: &str) -> Result<Vec<Part>, Error> {
        let url = self.model_url(model, "generateContent");
        let resp: GenerateContentResponse = self
            .post(&url, &image_request_body(prompt))
            .await?
            .json()
            .await
            .map_err(|e| Error::Generation(format!("Failed to parse response: {}", e)))?;
        Ok(resp.into_parts())
    }

    pub async fn stream_parts(&self, model: &str, prompt: &str) -> Result<Vec<Part>, Error> {
        let url = format!("{}?alt=sse", self.model_url(model, "streamGenerateContent"));
        let resp = self.post(&url, &image_request_body(prompt)).await?;
        let mut parser = SseParser::default();
        let mut parts = Vec::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| Error::Generation(format!("Failed to read stream: {}", e)))?;
            for payload in parser.push(&chunk) {
                parts.extend(parse_chunk(&payload)?);
            }
        }
        for payload in parser.finish() {
            parts.extend(parse_chunk(&payload)?);
        }
        debug!(parts = parts.len(), "Stream finished");
        Ok(parts)
    }
}

fn parse_chunk(payload: &str) -> Result<Vec<Part>, Error> {
    let resp: GenerateContentResponse = serde_json::from_str(payload).map_err(|e| {
        Error::Generation(format!(
            "Failed to parse stream chunk: {}\nChunk: {}",
            e, payload
        ))
    })?;
    Ok(resp.into_parts())
}

/// Reassembles server-sent event payloads from network chunks that may
/// split lines anywhere.
#[derive(Debug, Default)]
struct SseParser {
    buffer: String,
}

impl SseParser {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));
        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line = self.buffer[..pos].to_string();
            self.buffer = self.buffer[pos + 1..].to_string();
            if let Some(payload) = data_payload(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    fn finish(&mut self) -> Vec<String> {
        let line = std::mem::take(&mut self.buffer);
        data_payload(&line).into_iter().collect()
    }
}

fn data_payload(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(':') || trimmed.starts_with("event:") {
        return None;
    }
    // the alt=sse endpoint sends "data: {json}" lines, plain NDJSON otherwise
    let payload = trimmed.strip_prefix("data:").unwrap_or(trimmed).trim_start();
    Some(payload.to_string())
}

#[derive(Debug, Clone)]
pub struct GeminiText {
    client: GeminiClient,
    model: String,
}

impl GeminiText {
    pub fn new(client: GeminiClient, model: String) -> Self {
        Self { client, model }
    }
}

impl TextModel for GeminiText {
    fn generate_text(&self, prompt: String) -> BoxFuture<'_, Result<String, Error>> {
        Box::pin(async move { self.client.generate_text(&self.model, &prompt).await })
    }
}

#[derive(Debug, Clone)]
pub struct GeminiUnaryImages {
    client: GeminiClient,
    model: String,
}

impl GeminiUnaryImages {
    pub fn new(client: GeminiClient, model: String) -> Self {
        Self { client, model }
    }
}

impl ImageModel for GeminiUnaryImages {
    fn generate_parts(&self, prompt: String) -> BoxFuture<'_, Result<Vec<Part>, Error>> {
        Box::pin(async move { self.client.generate_parts(&self.model, &prompt).await })
    }
}

#[derive(Debug, Clone)]
pub struct GeminiStreamingImages {
    client: GeminiClient,
    model: String,
}

impl GeminiStreamingImages {
    pub fn new(client: GeminiClient, model: String) -> Self {
        Self { client, model }
    }
}

impl ImageModel for GeminiStreamingImages {
    fn generate_parts(&self, prompt: String) -> BoxFuture<'_, Result<Vec<Part>, Error>> {
        Box::pin(async move { self.client.stream_parts(&self.model, &prompt).await })
    }
}
