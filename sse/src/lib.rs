//! Server-Sent Events (SSE) push registry.
//!
//! Binds opaque client ids to long-lived streaming connections and delivers
//! server-pushed text messages to them one client at a time.
//!
//! # Architecture
//!
//! - **One connection per client id**: registering an id that is already bound
//!   closes the older connection and replaces it in the same locked step.
//! - **Single lock**: the `ChannelTable` guards every read and write with one
//!   mutex. A channel is only ever closed by the code that takes its binding
//!   out of the table, so no channel can be closed twice.
//! - **Rendezvous delivery**: `Manager::send` waits until the bound handler has
//!   taken the message (bounded by the send timeout). There is no queue, no
//!   history and no acknowledgement beyond that hand-off.
//! - **Self-cleaning handlers**: dropping a `Subscription` removes its own entry,
//!   so a departed peer never leaves a dangling channel behind.
//!
//! # Message Flow
//!
//! 1. A client opens the streaming endpoint with its id
//! 2. `Manager::register_connection` returns a `Subscription`
//! 3. `handler::event_stream` turns it into the response body
//! 4. `Manager::send` looks up the channel and hands the payload over
//! 5. The handler emits `data: <payload>\n\n`
//! 6. On disconnect, supersession or `Manager::close_all` the stream ends
//!
//! # Example: Sending a message
//!
//! ```rust,ignore
//! use sse::connection::ClientId;
//!
//! let client_id = ClientId::try_from("device-17")?;
//! app_state.sse_manager.send(&client_id, "refresh").await;
//! ```
//!
//! # Modules
//!
//! - `connection`: ChannelTable, ids, DeliveryChannel and delivery outcomes
//! - `subscription`: the consumer half owned by one connection handler
//! - `handler`: turns a subscription into a stream of framed events
//! - `manager`: dispatch and shutdown API over the table
//! - `message`: event framing

pub mod connection;
pub mod error;
pub mod handler;
pub mod manager;
pub mod message;
pub mod subscription;

pub use connection::{ClientId, CloseReason, Delivery};
pub use manager::Manager;
pub use subscription::Subscription;
