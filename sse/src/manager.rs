use crate::connection::{ChannelTable, ClientId, Delivery, DeliveryChannel};
use crate::message::Message;
use crate::subscription::Subscription;
use log::*;
use std::sync::Arc;
use std::time::Duration;

/// How long a send waits for the bound handler unless configured otherwise.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Manager {
    table: Arc<ChannelTable>,
    send_timeout: Option<Duration>,
}

impl Manager {
    pub fn new() -> Self {
        Self::with_send_timeout(Some(DEFAULT_SEND_TIMEOUT))
    }

    /// `None` makes every send wait for the handler for as long as it takes.
    pub fn with_send_timeout(send_timeout: Option<Duration>) -> Self {
        Self {
            table: Arc::new(ChannelTable::new()),
            send_timeout,
        }
    }

    /// Bind `client_id` to a fresh channel, superseding any existing connection for it
    pub fn register_connection(&self, client_id: ClientId) -> Subscription {
        let subscription = self.table.register(client_id);
        info!(
            "Registered SSE connection {} for client {}",
            subscription.connection_id().as_str(),
            subscription.client_id()
        );
        subscription
    }

    pub fn lookup(&self, client_id: &ClientId) -> Option<DeliveryChannel> {
        self.table.lookup(client_id)
    }

    /// Close and forget the connection for `client_id`, if there is one
    pub fn remove_connection(&self, client_id: &ClientId) -> bool {
        self.table.remove(client_id)
    }

    /// Hand `payload` to the handler bound to `client_id`.
    ///
    /// The registry lock is held only for the lookup; the hand-off itself waits
    /// outside it. Sending to an unknown client is a silent no-op.
    pub async fn send(&self, client_id: &ClientId, payload: impl Into<String>) -> Delivery {
        let Some(channel) = self.table.lookup(client_id) else {
            debug!("No SSE connection for client {client_id}, dropping message");
            return Delivery::NoRecipient;
        };

        let delivery = channel.deliver(payload.into());
        let outcome = match self.send_timeout {
            Some(limit) => tokio::time::timeout(limit, delivery)
                .await
                .unwrap_or(Delivery::TimedOut),
            None => delivery.await,
        };

        match outcome {
            Delivery::TimedOut => warn!(
                "SSE connection {} for client {} did not take a message within {:?}",
                channel.connection_id().as_str(),
                client_id,
                self.send_timeout.unwrap_or_default()
            ),
            Delivery::Closed => debug!("SSE connection for client {client_id} closed mid-send"),
            _ => trace!("Delivered message to client {client_id}"),
        }
        outcome
    }

    pub async fn send_message(&self, message: Message) -> Delivery {
        self.send(&message.client_id, message.payload).await
    }

    /// Close every connection and clear the registry. Safe to call repeatedly.
    pub fn close_all(&self) -> usize {
        let closed = self.table.close_all();
        info!("Closed {closed} SSE connection(s)");
        closed
    }

    /// Close every connection and refuse any that arrive afterwards.
    ///
    /// Streams opened once this has run end at once with `CloseReason::Shutdown`,
    /// so nothing registered while the server drains can hold it open.
    pub fn shutdown(&self) -> usize {
        let closed = self.table.close_all_and_refuse();
        info!("Shutting down: closed {closed} SSE connection(s), refusing new ones");
        closed
    }

    pub fn is_shutting_down(&self) -> bool {
        self.table.is_draining()
    }

    pub fn connection_count(&self) -> usize {
        self.table.len()
    }

    pub fn client_ids(&self) -> Vec<ClientId> {
        self.table.client_ids()
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}
