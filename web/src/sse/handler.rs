use crate::{AppState, Error};
use ::sse::handler::event_stream;
use ::sse::{message, ClientId};
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use log::*;

/// Opens a long-lived event stream for `client_id`.
///
/// Any earlier stream for the same id is closed. The body ends when the
/// registry closes the channel; if the peer disconnects first, hyper drops the
/// body and the subscription removes its own registry entry.
#[utoipa::path(
    get,
    path = "/events/{client_id}",
    params(
        ("client_id" = String, Path, description = "Client id to bind this stream to")
    ),
    responses(
        (status = 200, description = "Event stream of `data: <message>` frames", body = String, content_type = "text/event-stream"),
        (status = 422, description = "Invalid client id"),
    )
)]
pub(crate) async fn sse_handler(
    State(app_state): State<AppState>,
    Path(client_id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let client_id = ClientId::try_from(client_id)?;
    debug!("Establishing SSE connection for client {client_id}");

    let subscription = app_state.sse_manager.register_connection(client_id);

    Ok((
        [
            (header::CONTENT_TYPE, message::CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(event_stream(subscription)),
    ))
}
