use std::sync::Arc;

use crate::config::Config;
use crate::mail::{Mailer, ProviderHealth};
use crate::render::Renderer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub renderer: Arc<Renderer>,
    pub mailer: Mailer,
    pub provider_health: ProviderHealth,
}

impl AppState {
    pub fn new(config: Config, mailer: Mailer, provider_health: ProviderHealth) -> Self {
        let renderer = Renderer::new(config.links.clone(), config.service_name.clone());

        Self {
            config: Arc::new(config),
            renderer: Arc::new(renderer),
            mailer,
            provider_health,
        }
    }
}
