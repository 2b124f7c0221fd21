//! # SupervisorClient: typed façade over a [`Transport`].
//!
//! Owns the control connection and, optionally, the message channel for the
//! lifetime of one connection.
//!
//! ## Architecture
//! ```text
//! connect(true) ──► transport.connect() ──► transport.launch_bus() ──► MessageStream
//!                                                                         │
//!                                          dispatcher task (spawned) ◄────┘
//!                                             │  loop { msg = stream.recv() }
//!                                             └─► PendingAcks::resolve(msg)
//!
//! await_ack(id, type) ──► PendingAcks::register ──► AckWait
//! send_prepare(id, type, payload) ──► transport.send_data_to_process_id(id, { type, data, topic })
//!
//! disconnect()        ──► cancel dispatcher ──► join ──► PendingAcks::close() ──► transport.disconnect()
//! release_detached()  ──► cancel dispatcher ──► PendingAcks::close() ──► spawn(transport.disconnect())
//! ```
//!
//! ## Rules
//! - `disconnect()` is idempotent and never fails; release errors are logged.
//! - Waits registered before `disconnect()` resolve with `ChannelUnavailable`.
//! - When the message stream ends, the channel counts as closed: pending and
//!   later waits fail with `ChannelUnavailable`.
//! - Messages nobody waits for are dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{ActionError, SupervisorOp};

use super::correlation::{AckWait, PendingAcks};
use super::transport::{MessageStream, Transport};
use super::wire::{OutboundEnvelope, ProcessId, ProcessRecord};

/// Live message channel owned by a connected client.
struct Channel {
    pending: Arc<PendingAcks>,
    cancel: CancellationToken,
    dispatcher: JoinHandle<()>,
}

/// Typed asynchronous client for an external process supervisor.
///
/// Every operation returns a `Result`; none of them panics.
pub struct SupervisorClient<T: Transport> {
    transport: Arc<T>,
    connected: AtomicBool,
    /// Set by any connect attempt; cleared by the single release.
    attempted: AtomicBool,
    channel: Mutex<Option<Channel>>,
}

impl<T: Transport> SupervisorClient<T> {
    /// Wraps a transport. No connection is opened yet.
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            connected: AtomicBool::new(false),
            attempted: AtomicBool::new(false),
            channel: Mutex::new(None),
        }
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// True while the control connection is open.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// True while the message channel is open and its stream has not ended.
    pub fn has_channel(&self) -> bool {
        self.pending().is_ok()
    }

    /// Opens the control connection and, if `with_channel`, the message channel.
    ///
    /// Fails with [`ActionError::Connection`] when the transport refuses either.
    pub async fn connect(&self, with_channel: bool) -> Result<(), ActionError> {
        self.attempted.store(true, Ordering::Release);
        self.transport
            .connect()
            .await
            .map_err(ActionError::connection)?;
        self.connected.store(true, Ordering::Release);

        if with_channel {
            let stream = self
                .transport
                .launch_bus()
                .await
                .map_err(ActionError::connection)?;
            let channel = Self::spawn_dispatcher(stream);
            let previous = self
                .channel
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .replace(channel);
            if let Some(old) = previous {
                old.cancel.cancel();
                old.pending.close();
            }
        }
        Ok(())
    }

    /// Routes every inbound message to the correlation table until cancelled.
    fn spawn_dispatcher(mut stream: MessageStream) -> Channel {
        let pending = PendingAcks::new();
        let cancel = CancellationToken::new();

        let table = Arc::clone(&pending);
        let token = cancel.clone();
        let dispatcher = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    msg = stream.recv() => match msg {
                        Some(msg) => {
                            let (kind, source) = (msg.kind.clone(), msg.source());
                            if !table.resolve(msg) {
                                tracing::trace!(kind = %kind, process_id = %source, "dropping uncorrelated message");
                            }
                        }
                        None => {
                            tracing::debug!("supervisor message stream ended");
                            break;
                        }
                    }
                }
            }
            table.close();
        });

        Channel {
            pending,
            cancel,
            dispatcher,
        }
    }

    fn require_connection(&self) -> Result<(), ActionError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(ActionError::Connection {
                reason: "not connected".into(),
            })
        }
    }

    fn pending(&self) -> Result<Arc<PendingAcks>, ActionError> {
        self.channel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|c| Arc::clone(&c.pending))
            .filter(|p| !p.is_closed())
            .ok_or(ActionError::ChannelUnavailable)
    }

    /// Returns the full current process snapshot.
    pub async fn list_processes(&self) -> Result<Vec<ProcessRecord>, ActionError> {
        self.require_connection()?;
        self.transport.list().await.map_err(ActionError::connection)
    }

    /// Returns the records describing one process.
    pub async fn describe(&self, id: ProcessId) -> Result<Vec<ProcessRecord>, ActionError> {
        self.require_connection()?;
        self.transport
            .describe(id)
            .await
            .map_err(ActionError::connection)
    }

    /// Sends a prepare message to one process (fire-and-forget).
    ///
    /// Resolves once the transport accepted the message. Fails with
    /// [`ActionError::ChannelUnavailable`] when no channel is open.
    pub async fn send_prepare(
        &self,
        id: ProcessId,
        message_type: &str,
        payload: Value,
    ) -> Result<(), ActionError> {
        self.pending()?;
        let envelope = OutboundEnvelope::new(message_type, payload);
        self.transport
            .send_data_to_process_id(id, envelope)
            .await
            .map_err(|e| ActionError::Send {
                process_id: id,
                reason: e.to_string(),
            })
    }

    /// Registers interest in the next `message_type` message sent by `id`.
    ///
    /// Registration is immediate, so a wait created before [`send_prepare`](Self::send_prepare)
    /// cannot miss a fast reply. The returned [`AckWait`] never resolves for a
    /// message from another process.
    pub fn await_ack(&self, id: ProcessId, message_type: &str) -> Result<AckWait, ActionError> {
        self.pending()?.register(message_type, id)
    }

    /// Restarts one process; resolves with the same id.
    pub async fn restart(&self, id: ProcessId) -> Result<ProcessId, ActionError> {
        self.require_connection()?;
        self.transport
            .restart(id)
            .await
            .map(|()| id)
            .map_err(|e| Self::op_error(SupervisorOp::Restart, id, e.to_string()))
    }

    /// Deletes one process; resolves with the same id.
    pub async fn delete(&self, id: ProcessId) -> Result<ProcessId, ActionError> {
        self.require_connection()?;
        self.transport
            .delete(id)
            .await
            .map(|()| id)
            .map_err(|e| Self::op_error(SupervisorOp::Delete, id, e.to_string()))
    }

    fn op_error(op: SupervisorOp, process_id: ProcessId, reason: String) -> ActionError {
        ActionError::SupervisorOperation {
            op,
            process_id,
            reason,
        }
    }

    /// Releases the message channel and the control connection.
    ///
    /// Idempotent. The transport is released once after any connect attempt,
    /// including a failed one. Release failures are logged and swallowed so
    /// callers can always reach a terminal state.
    pub async fn disconnect(&self) {
        let channel = self
            .channel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(ch) = channel {
            ch.cancel.cancel();
            if let Err(e) = ch.dispatcher.await {
                tracing::warn!(error = %e, "message dispatcher ended abnormally");
            }
            ch.pending.close();
        }

        self.connected.store(false, Ordering::Release);
        if self.attempted.swap(false, Ordering::AcqRel) {
            if let Err(e) = self.transport.disconnect().await {
                tracing::warn!(error = %e, "supervisor disconnect failed");
            }
        }
    }

    /// Releases the channel and connection without awaiting.
    ///
    /// Used when an action is abandoned mid-flight: the dispatcher is cancelled
    /// and pending waits are closed synchronously, and the transport release is
    /// spawned onto the current runtime. No-op after `disconnect()`.
    pub(crate) fn release_detached(&self) {
        let channel = self
            .channel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(ch) = channel {
            ch.cancel.cancel();
            ch.pending.close();
        }

        self.connected.store(false, Ordering::Release);
        if !self.attempted.swap(false, Ordering::AcqRel) {
            return;
        }
        let transport = Arc::clone(&self.transport);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = transport.disconnect().await {
                        tracing::warn!(error = %e, "supervisor disconnect failed");
                    }
                });
            }
            Err(_) => tracing::warn!("no runtime left to release the supervisor connection"),
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_len(&self) -> usize {
        self.pending().map(|p| p.len()).unwrap_or(0)
    }
}
