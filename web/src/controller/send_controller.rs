use crate::controller::ApiResponse;
use crate::params::send::SendParams;
use crate::{AppState, Error};
use ::sse::{ClientId, Delivery};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use log::*;

/// POST push a message to the streaming connection bound to a client id.
///
/// Always answers 202 for a valid id: whether anyone was listening is not reported.
#[utoipa::path(
    post,
    path = "/send",
    request_body = SendParams,
    responses(
        (status = 202, description = "Message handed to the registry"),
        (status = 422, description = "Invalid client id"),
    )
)]
pub async fn send(
    State(app_state): State<AppState>,
    Json(params): Json<SendParams>,
) -> Result<impl IntoResponse, Error> {
    let client_id = ClientId::try_from(params.id)?;
    debug!("POST send to client {client_id}");

    match app_state.sse_manager.send(&client_id, params.message).await {
        Delivery::Delivered => debug!("Message delivered to client {client_id}"),
        outcome => debug!("Message for client {client_id} not delivered: {outcome:?}"),
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::<()>::no_content(StatusCode::ACCEPTED.into())),
    ))
}
