use crate::error::Error;
use crate::subscription::Subscription;
use log::*;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, oneshot};

/// Externally supplied identifier addressing one streaming connection.
///
/// Uniqueness is enforced by the registry, not by callers: registering an id
/// that is already bound supersedes the earlier connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(String);

impl ClientId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ClientId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() || value.chars().any(char::is_control) {
            return Err(Error::invalid_client_id());
        }
        Ok(Self(value))
    }
}

impl TryFrom<&str> for ClientId {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_string())
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for one registration of a client id (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Why the registry closed a delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// A newer registration for the same client id replaced this one.
    Superseded,
    /// Every channel was closed by `close_all`.
    Shutdown,
    /// The entry was removed explicitly, or dropped from the table.
    Removed,
}

/// Outcome of handing one message to a delivery channel.
///
/// None of these are errors: a missing or departed recipient simply loses the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The bound handler took the message.
    Delivered,
    /// No channel is registered for the client id.
    NoRecipient,
    /// The channel closed before the handler took the message.
    Closed,
    /// The handler did not take the message within the send timeout.
    TimedOut,
}

/// A message in flight, paired with the acknowledgement its sender is waiting on.
#[derive(Debug)]
pub(crate) struct Envelope {
    pub(crate) payload: String,
    pub(crate) ack: oneshot::Sender<()>,
}

/// Producer half of a delivery channel.
///
/// Clones are handed out by `lookup`; holding one never keeps the channel open,
/// only the registry entry does.
#[derive(Debug, Clone)]
pub struct DeliveryChannel {
    connection_id: ConnectionId,
    sender: mpsc::Sender<Envelope>,
}

impl DeliveryChannel {
    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    /// Hands `payload` to the bound handler and waits until it has been taken.
    pub(crate) async fn deliver(&self, payload: String) -> Delivery {
        let (ack, taken) = oneshot::channel();
        if self.sender.send(Envelope { payload, ack }).await.is_err() {
            return Delivery::Closed;
        }
        match taken.await {
            Ok(()) => Delivery::Delivered,
            Err(_) => Delivery::Closed,
        }
    }
}

/// A table entry: the producer half plus the channel's only close signal.
struct Binding {
    channel: DeliveryChannel,
    closer: oneshot::Sender<CloseReason>,
}

impl Binding {
    /// Consumes the binding, so a channel cannot be closed twice.
    fn close(self, reason: CloseReason) {
        // The handler may already be gone, in which case there is no one to tell.
        let _ = self.closer.send(reason);
    }
}

/// Table state guarded by the single registry lock.
#[derive(Default)]
struct Channels {
    bindings: HashMap<ClientId, Binding>,
    /// Set by `close_all_and_refuse`; registrations are closed on arrival.
    draining: bool,
}

/// Maps each client id to its single live delivery channel.
///
/// Every read and write goes through one lock. Every close happens in the same
/// locked step that takes the binding out of the map.
#[derive(Default)]
pub struct ChannelTable {
    channels: Mutex<Channels>,
}

impl ChannelTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Channels> {
        // Nothing panics while the lock is held, but never let a poisoned lock wedge the registry.
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a channel for `client_id`, closing and replacing any existing one.
    ///
    /// Once the table is draining the new channel is closed with
    /// `CloseReason::Shutdown` before it is handed out, and never enters the table.
    pub fn register(self: &Arc<Self>, client_id: ClientId) -> Subscription {
        let connection_id = ConnectionId::new();
        // Capacity 1 holds the envelope while its sender waits for the acknowledgement.
        let (sender, receiver) = mpsc::channel(1);
        let (closer, closed) = oneshot::channel();

        let binding = Binding {
            channel: DeliveryChannel {
                connection_id: connection_id.clone(),
                sender,
            },
            closer,
        };

        {
            let mut channels = self.lock();
            if channels.draining {
                debug!("Refusing connection for client {client_id}, registry is shutting down");
                binding.close(CloseReason::Shutdown);
            } else if let Some(previous) = channels.bindings.insert(client_id.clone(), binding) {
                debug!(
                    "Connection {} for client {} superseded by {}",
                    previous.channel.connection_id.as_str(),
                    client_id,
                    connection_id.as_str()
                );
                previous.close(CloseReason::Superseded);
            }
        }

        Subscription::new(
            Arc::clone(self),
            client_id,
            connection_id,
            receiver,
            closed,
        )
    }

    /// Returns the producer half bound to `client_id`, if any.
    pub fn lookup(&self, client_id: &ClientId) -> Option<DeliveryChannel> {
        self.lock()
            .bindings
            .get(client_id)
            .map(|binding| binding.channel.clone())
    }

    /// Closes and removes the channel for `client_id`. Returns false if none was bound.
    pub fn remove(&self, client_id: &ClientId) -> bool {
        let mut channels = self.lock();
        match channels.bindings.remove(client_id) {
            Some(binding) => {
                debug!("Removed connection for client {client_id}");
                binding.close(CloseReason::Removed);
                true
            }
            None => false,
        }
    }

    /// Removes the entry for `client_id` only if it still belongs to `connection_id`.
    ///
    /// Used by an exiting handler; a superseded handler must not remove its successor.
    pub(crate) fn release(&self, client_id: &ClientId, connection_id: &ConnectionId) -> bool {
        let mut channels = self.lock();
        let owned = channels
            .bindings
            .get(client_id)
            .is_some_and(|binding| binding.channel.connection_id == *connection_id);
        if !owned {
            return false;
        }
        if let Some(binding) = channels.bindings.remove(client_id) {
            binding.close(CloseReason::Removed);
        }
        true
    }

    /// Closes every channel and clears the table. Returns how many were closed.
    ///
    /// The table stays usable: later registrations are accepted as usual.
    pub fn close_all(&self) -> usize {
        Self::drain(&mut self.lock())
    }

    /// Like `close_all`, and in the same locked step stops accepting
    /// registrations for the rest of the table's life.
    pub fn close_all_and_refuse(&self) -> usize {
        let mut channels = self.lock();
        channels.draining = true;
        Self::drain(&mut channels)
    }

    fn drain(channels: &mut Channels) -> usize {
        let count = channels.bindings.len();
        for (_, binding) in channels.bindings.drain() {
            binding.close(CloseReason::Shutdown);
        }
        count
    }

    pub fn is_draining(&self) -> bool {
        self.lock().draining
    }

    pub fn contains(&self, client_id: &ClientId) -> bool {
        self.lock().bindings.contains_key(client_id)
    }

    pub fn len(&self) -> usize {
        self.lock().bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().bindings.is_empty()
    }

    /// Currently bound client ids, sorted.
    pub fn client_ids(&self) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self.lock().bindings.keys().cloned().collect();
        ids.sort();
        ids
    }
}
