use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct SendParams {
    /// Client id the message is addressed to.
    pub(crate) id: String,
    /// Text payload, framed verbatim as `data: <message>`.
    pub(crate) message: String,
}
