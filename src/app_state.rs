use std::sync::Arc;

use crate::config::Config;
use crate::overlay::Overlay;

/// Shared per-process state. Provider clients are not kept here because
/// their credentials arrive with each request; handlers build them around
/// the shared HTTP client.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub reqwest: reqwest::Client,
    pub overlay: Arc<Overlay>,
}

impl AppState {
    pub fn init(config: Config) -> Self {
        let overlay = Overlay::from_config(&config);
        Self {
            config: Arc::new(config),
            reqwest: reqwest::Client::new(),
            overlay: Arc::new(overlay),
        }
    }
}
