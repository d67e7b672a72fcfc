use config::Config;
use log::info;
use sse::Manager;
use std::sync::Arc;

pub mod config;
pub mod logging;

/// Builds the SSE manager with the configured send timeout.
pub fn init_sse_manager(config: &Config) -> Manager {
    let send_timeout = config.send_timeout();
    match send_timeout {
        Some(limit) => info!("SSE send timeout: {}ms", limit.as_millis()),
        None => info!("SSE send timeout disabled, sends wait for their handler"),
    }
    Manager::with_send_timeout(send_timeout)
}

// Service-level state containing only infrastructure concerns
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub sse_manager: Arc<Manager>,
    pub config: Config,
}

impl AppState {
    pub fn new(app_config: Config, sse_manager: &Arc<Manager>) -> Self {
        Self {
            sse_manager: Arc::clone(sse_manager),
            config: app_config,
        }
    }
}
