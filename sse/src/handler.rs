use crate::message;
use crate::subscription::Subscription;
use async_stream::stream;
use futures::Stream;
use log::*;
use std::convert::Infallible;

/// Drains `subscription` into a stream of framed events.
///
/// The stream ends without further output once the registry closes the channel
/// (superseded, removed, or shut down). If the transport drops the stream
/// first, dropping the subscription releases the registry entry.
pub fn event_stream(mut subscription: Subscription) -> impl Stream<Item = Result<String, Infallible>> {
    stream! {
        while let Some(payload) = subscription.recv().await {
            trace!(
                "Emitting event on SSE connection {}",
                subscription.connection_id().as_str()
            );
            yield Ok(message::frame(&payload));
        }

        debug!(
            "SSE connection {} for client {} closed: {:?}",
            subscription.connection_id().as_str(),
            subscription.client_id(),
            subscription.close_reason()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ChannelTable, ClientId};
    use futures::StreamExt;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_stream_ends_on_shutdown_without_output() {
        let table = Arc::new(ChannelTable::new());
        let subscription = table.register(ClientId::try_from("a").unwrap());
        let mut events = Box::pin(event_stream(subscription));

        table.close_all();

        assert_eq!(events.next().await, None);
    }

    #[tokio::test]
    async fn test_dropping_stream_releases_entry() {
        let table = Arc::new(ChannelTable::new());
        let subscription = table.register(ClientId::try_from("a").unwrap());
        let events = Box::pin(event_stream(subscription));

        drop(events);

        assert!(table.is_empty());
    }
}
