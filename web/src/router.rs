use crate::{
    controller::{health_check_controller, send_controller},
    params, sse, AppState,
};
use axum::{
    routing::{get, post},
    Json, Router,
};
use utoipa::OpenApi;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Push Relay API"
        ),
        paths(
            health_check_controller::health_check,
            send_controller::send,
            sse::handler::sse_handler,
        ),
        components(
            schemas(
                health_check_controller::HealthStatus,
                params::send::SendParams,
            )
        ),
        tags(
            (name = "push_relay", description = "Server-pushed messages over per-client event streams")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes(app_state.clone()))
        .merge(event_stream_routes(app_state.clone()))
        .merge(send_routes(app_state))
        .merge(api_doc_routes())
}

fn health_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check_controller::health_check))
        .with_state(app_state)
}

fn event_stream_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/events/:client_id", get(sse::handler::sse_handler))
        .with_state(app_state)
}

fn send_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/send", post(send_controller::send))
        .with_state(app_state)
}

fn api_doc_routes() -> Router {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}
