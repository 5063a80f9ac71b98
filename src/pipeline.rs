use serde::Deserialize;
use tracing::{debug, info};

use crate::error::Error;
use crate::generation::{extract_image, ImageModel, TextModel};
use crate::imgbb::{self, ImgbbUploader};
use crate::overlay::Overlay;
use crate::prompt;

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub add_text_overlay: bool,
    #[serde(default = "default_true")]
    pub enhance_prompt: bool,
    #[serde(default = "default_true")]
    pub upload_to_host: bool,
}

fn default_true() -> bool {
    true
}

/// Where the final image goes. An uploader only exists when the caller
/// asked for hosting and supplied a key for it.
pub enum DeliveryTarget<'a> {
    Host(&'a ImgbbUploader),
    Inline,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Hosted { url: String },
    Inline { data_uri: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub enhanced_prompt: String,
    pub delivery: Delivery,
}

/// Runs the stages in order: prompt, image, optional banner, delivery.
/// Only the banner stage is allowed to fail without aborting the run.
pub struct Pipeline<'a> {
    pub text_model: &'a dyn TextModel,
    pub image_model: &'a dyn ImageModel,
    pub overlay: &'a Overlay,
    pub target: DeliveryTarget<'a>,
}

impl Pipeline<'_> {
    pub async fn run(&self, request: &GenerationRequest) -> Result<PipelineOutput, Error> {
        let enhanced_prompt = self.enhance(request).await?;
        debug!("Using prompt: {}", enhanced_prompt);

        let parts = self
            .image_model
            .generate_parts(enhanced_prompt.clone())
            .await?;
        let mut image = extract_image(&parts)?;
        info!(bytes = image.bytes.len(), mime = %image.mime, "Image generated");

        if request.add_text_overlay {
            image = self
                .overlay
                .apply(image, &request.title, &request.description);
        }

        let delivery = match &self.target {
            DeliveryTarget::Host(uploader) => {
                let url = uploader.upload(&image).await?;
                info!("Image hosted at {}", url);
                Delivery::Hosted { url }
            }
            DeliveryTarget::Inline => Delivery::Inline {
                data_uri: imgbb::data_uri(&image),
            },
        };
        Ok(PipelineOutput {
            enhanced_prompt,
            delivery,
        })
    }

    async fn enhance(&self, request: &GenerationRequest) -> Result<String, Error> {
        if !request.enhance_prompt {
            return Ok(prompt::direct_prompt(
                &request.title,
                &request.description,
                request.add_text_overlay,
            ));
        }
        let instructions = prompt::enhancement_instructions(
            &request.title,
            &request.description,
            request.add_text_overlay,
        );
        let enhanced = self.text_model.generate_text(instructions).await?;
        let enhanced = enhanced.trim().to_string();
        if enhanced.is_empty() {
            return Err(Error::Generation(
                "the text model returned an empty prompt".into(),
            ));
        }
        Ok(enhanced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::generation::{InlineData, Part};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use futures::future::BoxFuture;

    #[derive(Debug)]
    struct FixedText(&'static str);

    impl TextModel for FixedText {
        fn generate_text(&self, _prompt: String) -> BoxFuture<'_, Result<String, Error>> {
            let reply = self.0.to_string();
            Box::pin(async move { Ok(reply) })
        }
    }

    #[derive(Debug)]
    struct FixedParts(Vec<Part>);

    impl ImageModel for FixedParts {
        fn generate_parts(&self, _prompt: String) -> BoxFuture<'_, Result<Vec<Part>, Error>> {
            let parts = self.0.clone();
            Box::pin(async move { Ok(parts) })
        }
    }

    fn image_part(bytes: &[u8]) -> Part {
        Part {
            text: None,
            inline_data: Some(InlineData {
                mime_type: "image/png".to_string(),
                data: STANDARD.encode(bytes),
            }),
        }
    }

    fn request(enhance: bool, overlay: bool) -> GenerationRequest {
        GenerationRequest {
            title: "A flying car".to_string(),
            description: "Neon cyberpunk city".to_string(),
            add_text_overlay: overlay,
            enhance_prompt: enhance,
            upload_to_host: false,
        }
    }

    fn test_overlay() -> Overlay {
        Overlay::from_config(&Config::default())
    }

    #[tokio::test]
    async fn skipping_enhancement_uses_the_direct_prompt() {
        let text = FixedText("should not be called");
        let images = FixedParts(vec![image_part(&[1, 2, 3])]);
        let overlay = test_overlay();
        let pipeline = Pipeline {
            text_model: &text,
            image_model: &images,
            overlay: &overlay,
            target: DeliveryTarget::Inline,
        };
        let output = pipeline.run(&request(false, false)).await.unwrap();
        assert_eq!(output.enhanced_prompt, "A flying car, Neon cyberpunk city");
    }

    #[tokio::test]
    async fn direct_prompt_carries_the_overlay_suffix() {
        let text = FixedText("unused");
        let images = FixedParts(vec![image_part(&png_fixture())]);
        let overlay = test_overlay();
        let pipeline = Pipeline {
            text_model: &text,
            image_model: &images,
            overlay: &overlay,
            target: DeliveryTarget::Inline,
        };
        let output = pipeline.run(&request(false, true)).await.unwrap();
        assert_eq!(
            output.enhanced_prompt,
            "A flying car, Neon cyberpunk city Text overlay: 'A flying car'"
        );
    }

    #[tokio::test]
    async fn the_model_reply_is_trimmed() {
        let text = FixedText("  a cinematic shot of a flying car  \n");
        let images = FixedParts(vec![image_part(&[7])]);
        let overlay = test_overlay();
        let pipeline = Pipeline {
            text_model: &text,
            image_model: &images,
            overlay: &overlay,
            target: DeliveryTarget::Inline,
        };
        let output = pipeline.run(&request(true, false)).await.unwrap();
        assert_eq!(output.enhanced_prompt, "a cinematic shot of a flying car");
    }

    #[tokio::test]
    async fn a_blank_model_reply_fails_before_the_image_stage() {
        let text = FixedText("   \n\t");
        let images = FixedParts(vec![image_part(&[7])]);
        let overlay = test_overlay();
        let pipeline = Pipeline {
            text_model: &text,
            image_model: &images,
            overlay: &overlay,
            target: DeliveryTarget::Inline,
        };
        let err = pipeline.run(&request(true, false)).await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
        assert!(err.to_string().contains("empty prompt"));
    }

    #[tokio::test]
    async fn inline_delivery_reconstructs_the_exact_bytes() {
        let bytes: Vec<u8> = (0u8..64).collect();
        let text = FixedText("unused");
        let images = FixedParts(vec![image_part(&bytes)]);
        let overlay = test_overlay();
        let pipeline = Pipeline {
            text_model: &text,
            image_model: &images,
            overlay: &overlay,
            target: DeliveryTarget::Inline,
        };
        let output = pipeline.run(&request(false, false)).await.unwrap();
        let data_uri = match output.delivery {
            Delivery::Inline { data_uri } => data_uri,
            other => panic!("expected inline delivery, got {:?}", other),
        };
        let payload = data_uri.strip_prefix("data:image/png;base64,").unwrap();
        assert_eq!(STANDARD.decode(payload).unwrap(), bytes);
    }

    #[tokio::test]
    async fn reruns_with_the_same_inputs_are_identical() {
        let text = FixedText("a cinematic shot");
        let images = FixedParts(vec![image_part(&[5, 5, 5])]);
        let overlay = test_overlay();
        let pipeline = Pipeline {
            text_model: &text,
            image_model: &images,
            overlay: &overlay,
            target: DeliveryTarget::Inline,
        };
        let first = pipeline.run(&request(true, false)).await.unwrap();
        let second = pipeline.run(&request(true, false)).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn an_empty_part_list_is_a_generation_error() {
        let text = FixedText("unused");
        let images = FixedParts(Vec::new());
        let overlay = test_overlay();
        let pipeline = Pipeline {
            text_model: &text,
            image_model: &images,
            overlay: &overlay,
            target: DeliveryTarget::Inline,
        };
        let err = pipeline.run(&request(false, false)).await.unwrap_err();
        assert!(err.to_string().contains("no image returned"));
    }

    #[test]
    fn flags_default_to_the_documented_values() {
        let request: GenerationRequest =
            serde_json::from_str(r#"{"title": "t", "description": "d"}"#).unwrap();
        assert!(!request.add_text_overlay);
        assert!(request.enhance_prompt);
        assert!(request.upload_to_host);
    }

    #[test]
    fn flags_use_camel_case_names() {
        let request: GenerationRequest = serde_json::from_str(
            r#"{"title": "t", "description": "d",
                "addTextOverlay": true, "enhancePrompt": false, "uploadToHost": false}"#,
        )
        .unwrap();
        assert!(request.add_text_overlay);
        assert!(!request.enhance_prompt);
        assert!(!request.upload_to_host);
    }

    fn png_fixture() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(16, 16, image::Rgba([10, 20, 30, 255]));
        let mut buffer = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buffer, image::ImageFormat::Png).unwrap();
        buffer.into_inner()
    }
}
