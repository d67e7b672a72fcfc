use log::*;
use service::{config::Config, init_sse_manager, logging::Logger, AppState};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = get_config();

    Logger::init_logger(&config);

    info!(
        "Starting push relay ({} environment)",
        config.runtime_env()
    );

    let sse_manager = Arc::new(init_sse_manager(&config));
    let app_state = AppState::new(config, &sse_manager);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server exited with error: {e}");
        std::process::exit(1);
    }
}

fn get_config() -> Config {
    Config::new()
}
