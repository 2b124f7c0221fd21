//! Supervisor client: typed access to an external process supervisor.
//!
//! ## Contents
//! - [`Transport`] raw call surface implemented by the host (RPC + message bus)
//! - [`SupervisorClient`] owned connection, message channel and ack correlation
//! - [`AckWait`] one registered acknowledgment wait
//! - wire types: [`ProcessId`], [`ProcessRecord`], [`OutboundEnvelope`], [`InboundMessage`]

mod client;
mod correlation;
mod transport;
mod wire;

#[cfg(test)]
pub(crate) mod testing;

pub use client::SupervisorClient;
pub use correlation::AckWait;
pub use transport::{MessageStream, Transport};
pub use wire::{InboundMessage, OutboundEnvelope, ProcessId, ProcessRecord, SourceProcess};
