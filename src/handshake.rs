//! # Handshake: prepare message / acknowledgment round trip.
//!
//! Gates every destructive operation: a process may only be restarted or
//! deleted after it acknowledged the prepare message with `data.success == true`.
//!
//! ## Flow
//! ```text
//! prepare_and_confirm(id, type, payload)
//!   ├─► client.await_ack(id, type)        (register before sending: a fast reply cannot be missed)
//!   ├─► client.send_prepare(id, type, payload)
//!   │       └─ Err ──► Send / ChannelUnavailable      (wait unregistered on drop)
//!   ├─► publish PrepareSent
//!   ├─► wait.recv(timeout)
//!   │       ├─ Timeout ──► publish AckTimeout ──► Err(Timeout)
//!   │       └─ Ok(msg) ──► publish AckReceived
//!   └─► verify(msg)
//!           ├─ data absent / falsy   ──► Err(MalformedAck)   (null, false, 0, "")
//!           ├─ data.success != true  ──► Err(PrepareRejected { data })
//!           └─ otherwise             ──► Ok(id)
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::error::ActionError;
use crate::events::{Bus, Event, EventKind};
use crate::supervisor::{InboundMessage, ProcessId, SupervisorClient, Transport};

/// Prepare/acknowledge coordinator for single processes.
pub struct Handshake<'a, T: Transport> {
    client: &'a SupervisorClient<T>,
    bus: &'a Bus,
    timeout: Option<Duration>,
    group: Option<Arc<str>>,
}

impl<'a, T: Transport> Handshake<'a, T> {
    /// Creates a coordinator over a connected client.
    ///
    /// `timeout = None` waits for acknowledgments without bound.
    pub fn new(client: &'a SupervisorClient<T>, bus: &'a Bus, timeout: Option<Duration>) -> Self {
        Self {
            client,
            bus,
            timeout,
            group: None,
        }
    }

    /// Tags emitted events with the group being acted on.
    pub fn for_group(mut self, group: impl Into<Arc<str>>) -> Self {
        self.group = Some(group.into());
        self
    }

    fn event(&self, kind: EventKind, id: ProcessId) -> Event {
        let ev = Event::new(kind).with_process(id);
        match &self.group {
            Some(g) => ev.with_group(Arc::clone(g)),
            None => ev,
        }
    }

    /// Sends the prepare message to `id` and resolves once it acknowledged
    /// successfully; yields `id`.
    pub async fn prepare_and_confirm(
        &self,
        id: ProcessId,
        message_type: &str,
        payload: &Value,
    ) -> Result<ProcessId, ActionError> {
        let wait = self.client.await_ack(id, message_type)?;
        self.client
            .send_prepare(id, message_type, payload.clone())
            .await?;
        self.bus
            .publish(self.event(EventKind::PrepareSent, id).with_reason(message_type));

        let ack = match wait.recv(self.timeout).await {
            Ok(ack) => ack,
            Err(e) => {
                if let ActionError::Timeout { timeout, .. } = &e {
                    self.bus
                        .publish(self.event(EventKind::AckTimeout, id).with_timeout(*timeout));
                }
                return Err(e);
            }
        };
        self.bus.publish(self.event(EventKind::AckReceived, id));

        verify(id, ack)
    }
}

/// Validates a correlated acknowledgment.
fn verify(id: ProcessId, ack: InboundMessage) -> Result<ProcessId, ActionError> {
    match ack.data {
        None => Err(ActionError::MalformedAck { process_id: id }),
        Some(data) if is_falsy(&data) => Err(ActionError::MalformedAck { process_id: id }),
        Some(data) => {
            if data.get("success") == Some(&Value::Bool(true)) {
                Ok(id)
            } else {
                Err(ActionError::PrepareRejected {
                    process_id: id,
                    data,
                })
            }
        }
    }
}

/// A `data` envelope that carries nothing: `null`, `false`, zero or `""`.
/// Objects and arrays always count as present, even when empty.
fn is_falsy(data: &Value) -> bool {
    match data {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_none_or(|f| f == 0.0 || f.is_nan()),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
