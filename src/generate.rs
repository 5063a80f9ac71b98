use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{event, Instrument, Level};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::Error;
use crate::gemini::{GeminiClient, GeminiStreamingImages, GeminiText, GeminiUnaryImages};
use crate::generation::ImageModel;
use crate::imgbb::ImgbbUploader;
use crate::pipeline::{Delivery, DeliveryTarget, GenerationRequest, Pipeline};

static GEMINI_KEY_HEADER: &str = "x-gemini-api-key";
static IMGBB_KEY_HEADER: &str = "x-imgbb-api-key";

pub async fn get_root() -> Json<Value> {
    Json(json!({
        "message": "Covergen API is running!",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Serialize, Debug)]
pub struct GenerateResponse {
    pub image_url: String,
    pub enhanced_prompt: String,
}

pub async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<GenerateResponse>, Error> {
    if request.title.trim().is_empty() || request.description.trim().is_empty() {
        return Err(Error::Validation(
            "title and description must not be empty".into(),
        ));
    }
    let gemini_key = header_value(&headers, GEMINI_KEY_HEADER)?;
    let uploader = if request.upload_to_host {
        let imgbb_key = header_value(&headers, IMGBB_KEY_HEADER)?;
        Some(ImgbbUploader::new(
            state.reqwest.clone(),
            state.config.imgbb_url.clone(),
            imgbb_key,
        ))
    } else {
        None
    };

    let client = GeminiClient::new(
        state.reqwest.clone(),
        state.config.gemini_base_url.clone(),
        gemini_key,
    );
    let text_model = GeminiText::new(client.clone(), state.config.text_model.clone());
    let image_model: Box<dyn ImageModel> = if state.config.image_transport == "unary" {
        Box::new(GeminiUnaryImages::new(
            client,
            state.config.image_model.clone(),
        ))
    } else {
        Box::new(GeminiStreamingImages::new(
            client,
            state.config.image_model.clone(),
        ))
    };
    let target = match &uploader {
        Some(uploader) => DeliveryTarget::Host(uploader),
        None => DeliveryTarget::Inline,
    };
    let pipeline = Pipeline {
        text_model: &text_model,
        image_model: image_model.as_ref(),
        overlay: state.overlay.as_ref(),
        target,
    };

    let id = Uuid::new_v4().to_string();
    let output = async {
        event!(Level::INFO, title = %request.title, "Generating image");
        pipeline.run(&request).await
    }
    .instrument(tracing::info_span!("generate", id = %id))
    .await?;

    let image_url = match output.delivery {
        Delivery::Hosted { url } => url,
        Delivery::Inline { data_uri } => data_uri,
    };
    Ok(Json(GenerateResponse {
        image_url,
        enhanced_prompt: output.enhanced_prompt,
    }))
}

fn header_value(headers: &HeaderMap, name: &str) -> Result<String, Error> {
    let value = headers
        .get(name)
        .ok_or_else(|| Error::Validation(format!("Missing required header: {}", name)))?;
    let value = value
        .to_str()
        .map_err(|_| Error::Validation(format!("Invalid value for header: {}", name)))?;
    Ok(value.to_string())
}
