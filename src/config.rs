use std::env;

/// Runtime settings. Every knob has a default so the service starts with
/// nothing but the per-request API keys supplied by callers.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub gemini_base_url: String,
    pub text_model: String,
    pub image_model: String,
    /// "stream" or "unary" response shape for the image model.
    pub image_transport: String,
    pub imgbb_url: String,
    pub overlay_font: Option<String>,
    pub keep_alive_url: Option<String>,
    pub keep_alive_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            image_model: "gemini-3-pro-image-preview".to_string(),
            image_transport: "stream".to_string(),
            imgbb_url: "https://api.imgbb.com/1/upload".to_string(),
            overlay_font: None,
            keep_alive_url: None,
            keep_alive_interval_secs: 780,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            gemini_base_url: env::var("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            text_model: env::var("TEXT_MODEL").unwrap_or(defaults.text_model),
            image_model: env::var("IMAGE_MODEL").unwrap_or(defaults.image_model),
            image_transport: env::var("IMAGE_TRANSPORT").unwrap_or(defaults.image_transport),
            imgbb_url: env::var("IMGBB_URL").unwrap_or(defaults.imgbb_url),
            overlay_font: env::var("OVERLAY_FONT").ok(),
            keep_alive_url: env::var("KEEP_ALIVE_URL").ok(),
            keep_alive_interval_secs: env::var("KEEP_ALIVE_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.keep_alive_interval_secs),
        }
    }
}
