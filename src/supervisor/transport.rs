//! # Supervisor transport boundary.
//!
//! [`Transport`] is the raw call surface of the external process supervisor:
//! control RPC (`connect`, `list`, `describe`, `restart`, `delete`,
//! `disconnect`) plus the message bus (`launch_bus`, `send_data_to_process_id`).
//!
//! The crate never implements the supervisor; hosts provide a `Transport` for
//! their process manager and hand it to [`SupervisorClient`](crate::SupervisorClient).
//!
//! ## Message bus
//! `launch_bus` returns a [`MessageStream`]: every message any worker publishes
//! on the bus, in arrival order. Dropping the stream closes the bus.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::TransportError;

use super::wire::{InboundMessage, OutboundEnvelope, ProcessId, ProcessRecord};

/// Stream of messages published by workers on the supervisor bus.
pub type MessageStream = mpsc::Receiver<InboundMessage>;

/// Raw, asynchronous call surface of an external process supervisor.
///
/// ### Implementation requirements
/// - Never block the executor; every call is awaited by the orchestrator.
/// - Report failures as [`TransportError`]; never panic.
/// - `disconnect` may be called without a prior successful `connect`.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Opens the control connection.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Opens the message bus. Requires an open control connection.
    async fn launch_bus(&self) -> Result<MessageStream, TransportError>;

    /// Lists every process currently known to the supervisor.
    async fn list(&self) -> Result<Vec<ProcessRecord>, TransportError>;

    /// Describes one process (the supervisor may return several records).
    async fn describe(&self, id: ProcessId) -> Result<Vec<ProcessRecord>, TransportError>;

    /// Hands a message to the supervisor for delivery to one process.
    ///
    /// Resolves once the supervisor accepted the message, not when the
    /// process handled it.
    async fn send_data_to_process_id(
        &self,
        id: ProcessId,
        envelope: OutboundEnvelope,
    ) -> Result<(), TransportError>;

    /// Restarts one process.
    async fn restart(&self, id: ProcessId) -> Result<(), TransportError>;

    /// Deletes one process.
    async fn delete(&self, id: ProcessId) -> Result<(), TransportError>;

    /// Closes the control connection.
    async fn disconnect(&self) -> Result<(), TransportError>;
}
