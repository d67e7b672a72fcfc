use crate::connection::{ChannelTable, ClientId, CloseReason, ConnectionId, Envelope};
use log::*;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Consumer half of a delivery channel, owned by exactly one connection handler.
///
/// Dropping a `Subscription` releases its registry entry if the entry still
/// belongs to it. This runs on every exit path, including the transport
/// dropping the response body when the peer goes away.
pub struct Subscription {
    table: Arc<ChannelTable>,
    client_id: ClientId,
    connection_id: ConnectionId,
    receiver: mpsc::Receiver<Envelope>,
    closed: oneshot::Receiver<CloseReason>,
    close_reason: Option<CloseReason>,
}

impl Subscription {
    pub(crate) fn new(
        table: Arc<ChannelTable>,
        client_id: ClientId,
        connection_id: ConnectionId,
        receiver: mpsc::Receiver<Envelope>,
        closed: oneshot::Receiver<CloseReason>,
    ) -> Self {
        Self {
            table,
            client_id,
            connection_id,
            receiver,
            closed,
            close_reason: None,
        }
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    /// Why the registry closed this channel, once `recv` has returned `None`.
    pub fn close_reason(&self) -> Option<CloseReason> {
        self.close_reason
    }

    /// Waits for the next message, or `None` once the channel is closed.
    ///
    /// A close wins over a pending message: nothing is handed out after the
    /// registry has closed the channel. Messages whose sender already gave up
    /// (timed out) are skipped.
    pub async fn recv(&mut self) -> Option<String> {
        if self.close_reason.is_some() {
            return None;
        }

        loop {
            tokio::select! {
                biased;

                reason = &mut self.closed => {
                    // A dropped close signal means the entry left the table without a reason.
                    self.close_reason = Some(reason.unwrap_or(CloseReason::Removed));
                    return None;
                }

                envelope = self.receiver.recv() => {
                    let Some(Envelope { payload, ack }) = envelope else {
                        self.close_reason = Some(CloseReason::Removed);
                        return None;
                    };
                    if ack.send(()).is_ok() {
                        return Some(payload);
                    }
                    trace!(
                        "Skipping message for client {} abandoned by its sender",
                        self.client_id
                    );
                }
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.table.release(&self.client_id, &self.connection_id) {
            debug!(
                "SSE connection {} for client {} went away, removed its entry",
                self.connection_id.as_str(),
                self.client_id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Delivery;
    use std::time::Duration;

    fn client(id: &str) -> ClientId {
        ClientId::try_from(id).unwrap()
    }

    #[tokio::test]
    async fn test_recv_returns_payload_and_acknowledges_sender() {
        let table = Arc::new(ChannelTable::new());
        let mut subscription = table.register(client("a"));
        let channel = table.lookup(&client("a")).unwrap();

        let sender = tokio::spawn(async move { channel.deliver("hello".to_string()).await });

        assert_eq!(subscription.recv().await, Some("hello".to_string()));
        assert_eq!(sender.await.unwrap(), Delivery::Delivered);
    }

    #[tokio::test]
    async fn test_recv_reports_superseded() {
        let table = Arc::new(ChannelTable::new());
        let mut first = table.register(client("a"));
        let _second = table.register(client("a"));

        assert_eq!(first.recv().await, None);
        assert_eq!(first.close_reason(), Some(CloseReason::Superseded));
        // Stays closed.
        assert_eq!(first.recv().await, None);
    }

    #[tokio::test]
    async fn test_recv_reports_removed() {
        let table = Arc::new(ChannelTable::new());
        let mut subscription = table.register(client("a"));
        table.remove(&client("a"));

        assert_eq!(subscription.recv().await, None);
        assert_eq!(subscription.close_reason(), Some(CloseReason::Removed));
    }

    #[tokio::test]
    async fn test_recv_skips_abandoned_message() {
        let table = Arc::new(ChannelTable::new());
        let mut subscription = table.register(client("a"));
        let channel = table.lookup(&client("a")).unwrap();

        let abandoned =
            tokio::time::timeout(Duration::from_millis(20), channel.deliver("stale".into())).await;
        assert!(abandoned.is_err());

        let next = tokio::time::timeout(Duration::from_millis(50), subscription.recv()).await;
        assert!(next.is_err(), "abandoned message must not be handed out");
    }

    #[tokio::test]
    async fn test_drop_releases_own_entry() {
        let table = Arc::new(ChannelTable::new());
        let subscription = table.register(client("a"));
        drop(subscription);
        assert!(!table.contains(&client("a")));
    }

    #[tokio::test]
    async fn test_drop_of_superseded_subscription_keeps_successor() {
        let table = Arc::new(ChannelTable::new());
        let first = table.register(client("a"));
        let second = table.register(client("a"));
        drop(first);

        let bound = table.lookup(&client("a")).unwrap();
        assert_eq!(bound.connection_id(), second.connection_id());
    }
}
