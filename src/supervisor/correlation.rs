//! # Correlation table for acknowledgments.
//!
//! Maps `(message_type, process_id)` to exactly one pending completion.
//!
//! ```text
//! await_ack(42, "prepare") ──► register ──► table[("prepare", 42)] = (token, oneshot tx)
//!                                    └────► AckWait { rx }
//!
//! dispatcher: InboundMessage { type: "prepare", pm_id: 99 } ──► no entry ──► dropped
//!             InboundMessage { type: "prepare", pm_id: 42 } ──► remove entry ──► tx.send(msg)
//! ```
//!
//! ## Rules
//! - At most one wait per key; a second registration fails with `AckPending`.
//! - An entry is removed exactly once: on delivery, on [`AckWait`] drop, or on `close()`.
//! - A dropped wait only removes its own entry (matched by registration token),
//!   never a newer wait registered under the same key.
//! - Once closed (the message stream ended or the channel was released), the
//!   table refuses new waits with `ChannelUnavailable`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::error::ActionError;

use super::wire::{InboundMessage, ProcessId};

type Key = (String, ProcessId);

struct Pending {
    token: u64,
    tx: oneshot::Sender<InboundMessage>,
}

/// Pending acknowledgment waits, keyed by message type and process.
#[derive(Default)]
pub(crate) struct PendingAcks {
    inner: Mutex<HashMap<Key, Pending>>,
    next_token: AtomicU64,
    closed: AtomicBool,
}

impl PendingAcks {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Key, Pending>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers interest in the next `message_type` message from `process_id`.
    pub(crate) fn register(
        self: &Arc<Self>,
        message_type: &str,
        process_id: ProcessId,
    ) -> Result<AckWait, ActionError> {
        let key = (message_type.to_owned(), process_id);
        let mut table = self.lock();
        if self.is_closed() {
            return Err(ActionError::ChannelUnavailable);
        }
        if table.contains_key(&key) {
            return Err(ActionError::AckPending {
                process_id,
                message_type: key.0,
            });
        }

        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        table.insert(key.clone(), Pending { token, tx });

        Ok(AckWait {
            table: Arc::clone(self),
            key,
            token,
            rx,
        })
    }

    /// Delivers `msg` to the wait registered for its type and sender.
    ///
    /// Returns `false` when nobody waits for it (the message is dropped).
    pub(crate) fn resolve(&self, msg: InboundMessage) -> bool {
        let key = (msg.kind.clone(), msg.source());
        let Some(pending) = self.lock().remove(&key) else {
            return false;
        };
        pending.tx.send(msg).is_ok()
    }

    /// Refuses further waits and drops the pending ones; their receivers
    /// observe a closed channel.
    pub(crate) fn close(&self) {
        let mut table = self.lock();
        self.closed.store(true, Ordering::Release);
        table.clear();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of pending waits.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    fn forget(&self, key: &Key, token: u64) {
        let mut table = self.lock();
        if table.get(key).is_some_and(|p| p.token == token) {
            table.remove(key);
        }
    }
}

/// Handle to one registered acknowledgment wait.
///
/// Dropping it before the acknowledgment arrives unregisters the wait.
pub struct AckWait {
    table: Arc<PendingAcks>,
    key: Key,
    token: u64,
    rx: oneshot::Receiver<InboundMessage>,
}

impl AckWait {
    /// Process this wait is correlated to.
    pub fn process_id(&self) -> ProcessId {
        self.key.1
    }

    /// Waits for the correlated message.
    ///
    /// - `timeout = None` waits until the message arrives or the channel closes.
    /// - On timeout the wait is unregistered and `ActionError::Timeout` is returned.
    /// - If the message channel is released first, returns `ChannelUnavailable`.
    pub async fn recv(mut self, timeout: Option<Duration>) -> Result<InboundMessage, ActionError> {
        let process_id = self.process_id();
        let rx = &mut self.rx;
        let res = match timeout.filter(|d| *d > Duration::ZERO) {
            Some(dur) => match tokio::time::timeout(dur, rx).await {
                Ok(r) => r,
                Err(_elapsed) => {
                    return Err(ActionError::Timeout {
                        process_id,
                        timeout: dur,
                    });
                }
            },
            None => rx.await,
        };
        res.map_err(|_closed| ActionError::ChannelUnavailable)
    }
}

impl Drop for AckWait {
    fn drop(&mut self) {
        self.table.forget(&self.key, self.token);
    }
}
