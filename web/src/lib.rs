use log::*;
use service::config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use axum::http::{header, HeaderValue, Method};

pub use self::error::{Error, Result};
pub use service::AppState;

mod controller;
mod error;
mod params;
pub mod router;
pub mod shutdown;
mod sse;

pub async fn init_server(app_state: AppState) -> core::result::Result<(), ::sse::error::Error> {
    let sse_manager = Arc::clone(&app_state.sse_manager);
    let listen_addr = app_state.config.listen_addr();

    let termination = shutdown::termination_signal()?;
    #[cfg(unix)]
    shutdown::spawn_registry_report(Arc::clone(&sse_manager))?;

    let cors_layer = cors_layer(&app_state.config);
    let router = router::define_routes(app_state).layer(cors_layer);

    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Server starting... listening for connections on http://{listen_addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown::close_on(termination, sse_manager))
        .await?;

    info!("Server stopped");
    Ok(())
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}
