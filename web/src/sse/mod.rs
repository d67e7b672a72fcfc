//! SSE HTTP handler for the web layer.
//!
//! This module contains only the Axum handler for the streaming endpoint.
//! The registry itself (Manager, ChannelTable, Subscription) lives in the
//! `sse` crate so it can be driven without a transport.

pub mod handler;
