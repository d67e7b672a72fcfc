use crate::connection::ClientId;

/// Content type of the streaming response.
pub const CONTENT_TYPE: &str = "text/event-stream";

/// A text payload addressed to one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub client_id: ClientId,
    pub payload: String,
}

/// Frames `payload` as a single event: `data: <payload>\n\n`.
///
/// The payload is written verbatim. Embedded newlines are not split into
/// repeated `data:` lines, so a multi-line payload reaches the client as
/// several lines of one event followed by whatever the client makes of them.
pub fn frame(payload: &str) -> String {
    format!("data: {payload}\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_wraps_payload() {
        assert_eq!(frame("x"), "data: x\n\n");
        assert_eq!(frame(""), "data: \n\n");
    }

    #[test]
    fn test_frame_keeps_utf8_and_newlines_verbatim() {
        assert_eq!(frame("안녕?"), "data: 안녕?\n\n");
        assert_eq!(frame("a\nb"), "data: a\nb\n\n");
    }
}
