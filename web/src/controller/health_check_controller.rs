use crate::controller::ApiResponse;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct HealthStatus {
    /// Number of live streaming connections.
    connections: usize,
}

/// GET liveness and the number of open streaming connections
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server is up and responding to requests", body = HealthStatus),
    )
)]
pub async fn health_check(State(app_state): State<AppState>) -> impl IntoResponse {
    let status = HealthStatus {
        connections: app_state.sse_manager.connection_count(),
    };
    (
        StatusCode::OK,
        Json(ApiResponse::new(StatusCode::OK.into(), status)),
    )
}
