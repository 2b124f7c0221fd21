//! Scripted in-memory supervisor used by unit tests.
//!
//! Records every call in order and answers prepare messages with scripted
//! worker replies (default: `{ "success": true }` from the target).

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::error::TransportError;

use super::transport::{MessageStream, Transport};
use super::wire::{InboundMessage, OutboundEnvelope, ProcessId, ProcessRecord};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Connect,
    LaunchBus,
    List,
    Describe(ProcessId),
    Send(ProcessId, OutboundEnvelope),
    Restart(ProcessId),
    Delete(ProcessId),
    Disconnect,
}

impl Call {
    pub(crate) fn is_destructive(&self) -> bool {
        matches!(self, Call::Restart(_) | Call::Delete(_))
    }
}

/// Shared, ordered log of transport calls.
#[derive(Clone, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub(crate) fn snapshot(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.lock().unwrap().is_empty()
    }

    /// Calls with the envelope stripped, for compact ordering assertions.
    pub(crate) fn trace(&self) -> Vec<String> {
        self.snapshot()
            .into_iter()
            .map(|c| match c {
                Call::Connect => "connect".to_string(),
                Call::LaunchBus => "launch_bus".to_string(),
                Call::List => "list".to_string(),
                Call::Describe(id) => format!("describe:{id}"),
                Call::Send(id, _) => format!("send:{id}"),
                Call::Restart(id) => format!("restart:{id}"),
                Call::Delete(id) => format!("delete:{id}"),
                Call::Disconnect => "disconnect".to_string(),
            })
            .collect()
    }
}

#[derive(Clone)]
struct Emit {
    from: Option<ProcessId>,
    kind: Option<String>,
    data: Option<Value>,
}

/// Messages a worker publishes after receiving a prepare message.
#[derive(Clone)]
pub(crate) struct Reply {
    emits: Vec<Emit>,
    close_bus: bool,
}

impl Reply {
    fn single(data: Option<Value>) -> Self {
        Self {
            emits: vec![Emit {
                from: None,
                kind: None,
                data,
            }],
            close_bus: false,
        }
    }

    pub(crate) fn ok() -> Self {
        Self::single(Some(json!({ "success": true })))
    }

    pub(crate) fn reject(data: Value) -> Self {
        Self::single(Some(data))
    }

    pub(crate) fn malformed() -> Self {
        Self::single(None)
    }

    pub(crate) fn silent() -> Self {
        Self {
            emits: Vec::new(),
            close_bus: false,
        }
    }

    /// Ends the message stream once the reply was published.
    pub(crate) fn then_close_bus(mut self) -> Self {
        self.close_bus = true;
        self
    }

    /// Prepends a successful reply that claims to come from `other`.
    pub(crate) fn after_reply_from(mut self, other: u64) -> Self {
        self.emits.insert(
            0,
            Emit {
                from: Some(ProcessId(other)),
                kind: None,
                data: Some(json!({ "success": true })),
            },
        );
        self
    }

    /// Prepends a successful reply on a different message type.
    pub(crate) fn after_reply_of_kind(mut self, kind: &str) -> Self {
        self.emits.insert(
            0,
            Emit {
                from: None,
                kind: Some(kind.to_string()),
                data: Some(json!({ "success": true })),
            },
        );
        self
    }
}

#[derive(Default)]
struct Failures {
    connect: bool,
    launch_bus: bool,
    list: bool,
    disconnect: bool,
    send: HashSet<ProcessId>,
    restart: HashSet<ProcessId>,
    delete: HashSet<ProcessId>,
}

pub(crate) struct ScriptedTransport {
    processes: Vec<ProcessRecord>,
    replies: HashMap<ProcessId, Reply>,
    fail: Failures,
    bus: Mutex<Option<mpsc::Sender<InboundMessage>>>,
    calls: CallLog,
}

impl ScriptedTransport {
    pub(crate) fn new(processes: Vec<ProcessRecord>) -> Self {
        Self {
            processes,
            replies: HashMap::new(),
            fail: Failures::default(),
            bus: Mutex::new(None),
            calls: CallLog::default(),
        }
    }

    pub(crate) fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    pub(crate) fn reply(mut self, id: u64, reply: Reply) -> Self {
        self.replies.insert(ProcessId(id), reply);
        self
    }

    pub(crate) fn fail_connect(mut self) -> Self {
        self.fail.connect = true;
        self
    }

    pub(crate) fn fail_launch_bus(mut self) -> Self {
        self.fail.launch_bus = true;
        self
    }

    pub(crate) fn fail_list(mut self) -> Self {
        self.fail.list = true;
        self
    }

    pub(crate) fn fail_disconnect(mut self) -> Self {
        self.fail.disconnect = true;
        self
    }

    pub(crate) fn fail_send(mut self, id: u64) -> Self {
        self.fail.send.insert(ProcessId(id));
        self
    }

    pub(crate) fn fail_restart(mut self, id: u64) -> Self {
        self.fail.restart.insert(ProcessId(id));
        self
    }

    pub(crate) fn fail_delete(mut self, id: u64) -> Self {
        self.fail.delete.insert(ProcessId(id));
        self
    }

    fn check(failing: bool, what: &str) -> Result<(), TransportError> {
        if failing {
            Err(TransportError::rejected(format!("{what} refused")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        self.calls.push(Call::Connect);
        Self::check(self.fail.connect, "connect")
    }

    async fn launch_bus(&self) -> Result<MessageStream, TransportError> {
        self.calls.push(Call::LaunchBus);
        Self::check(self.fail.launch_bus, "launch_bus")?;
        let (tx, rx) = mpsc::channel(64);
        *self.bus.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn list(&self) -> Result<Vec<ProcessRecord>, TransportError> {
        self.calls.push(Call::List);
        Self::check(self.fail.list, "list")?;
        Ok(self.processes.clone())
    }

    async fn describe(&self, id: ProcessId) -> Result<Vec<ProcessRecord>, TransportError> {
        self.calls.push(Call::Describe(id));
        Ok(self
            .processes
            .iter()
            .filter(|p| p.pm_id == id)
            .cloned()
            .collect())
    }

    async fn send_data_to_process_id(
        &self,
        id: ProcessId,
        envelope: OutboundEnvelope,
    ) -> Result<(), TransportError> {
        self.calls.push(Call::Send(id, envelope.clone()));
        Self::check(self.fail.send.contains(&id), "send")?;

        let tx = self.bus.lock().unwrap().clone().ok_or(TransportError::Closed)?;
        let reply = self.replies.get(&id).cloned().unwrap_or_else(Reply::ok);
        for emit in reply.emits {
            let msg = InboundMessage::new(
                emit.kind.unwrap_or_else(|| envelope.kind.clone()),
                emit.from.unwrap_or(id),
                emit.data,
            );
            tx.send(msg).await.map_err(|_| TransportError::Closed)?;
        }
        if reply.close_bus {
            self.bus.lock().unwrap().take();
        }
        Ok(())
    }

    async fn restart(&self, id: ProcessId) -> Result<(), TransportError> {
        self.calls.push(Call::Restart(id));
        Self::check(self.fail.restart.contains(&id), "restart")
    }

    async fn delete(&self, id: ProcessId) -> Result<(), TransportError> {
        self.calls.push(Call::Delete(id));
        Self::check(self.fail.delete.contains(&id), "delete")
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.calls.push(Call::Disconnect);
        self.bus.lock().unwrap().take();
        Self::check(self.fail.disconnect, "disconnect")
    }
}
