//! # Wire types exchanged with the supervisor.
//!
//! - [`ProcessId`] opaque per-instance identifier (`pm_id`)
//! - [`ProcessRecord`] one entry of a process listing
//! - [`OutboundEnvelope`] message sent to a process: `{ type, data, topic }`
//! - [`InboundMessage`] message received from a process: `{ type, process: { pm_id }, data }`
//!
//! ## Example
//! ```rust
//! use cautious::{InboundMessage, ProcessId};
//!
//! let raw = r#"{ "type": "cautious:prepare", "process": { "pm_id": 3 }, "data": { "success": true } }"#;
//! let msg: InboundMessage = serde_json::from_str(raw).unwrap();
//! assert_eq!(msg.process.pm_id, ProcessId(3));
//! assert_eq!(msg.kind, "cautious:prepare");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of one running process instance.
///
/// Unique among live instances; the supervisor may hand it out again once the
/// instance has been deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub u64);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for ProcessId {
    fn from(id: u64) -> Self {
        ProcessId(id)
    }
}

/// One process as reported by the supervisor's listing.
///
/// `name` is the group name shared by all replicas of one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    /// Group (application) name.
    pub name: String,
    /// Instance identifier.
    pub pm_id: ProcessId,
}

impl ProcessRecord {
    /// Creates a record.
    pub fn new(name: impl Into<String>, pm_id: impl Into<ProcessId>) -> Self {
        Self {
            name: name.into(),
            pm_id: pm_id.into(),
        }
    }
}

/// Envelope handed to the supervisor for delivery to one process.
///
/// The supervisor routes on `topic`, workers dispatch on `type`; both carry
/// the same value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    /// Message type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Opaque payload.
    pub data: Value,
    /// Routing topic, always equal to `kind`.
    pub topic: String,
}

impl OutboundEnvelope {
    /// Builds an envelope with `topic` mirrored from `kind`.
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        let kind = kind.into();
        Self {
            topic: kind.clone(),
            kind,
            data,
        }
    }
}

/// Identity of the process that emitted an [`InboundMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceProcess {
    /// Instance identifier of the sender.
    pub pm_id: ProcessId,
}

/// Message published by a worker on the supervisor's message bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Message type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Sender.
    pub process: SourceProcess,
    /// Reply payload; absent when the worker sent none.
    #[serde(default)]
    pub data: Option<Value>,
}

impl InboundMessage {
    /// Creates a message as if sent by `pm_id`.
    pub fn new(kind: impl Into<String>, pm_id: impl Into<ProcessId>, data: Option<Value>) -> Self {
        Self {
            kind: kind.into(),
            process: SourceProcess {
                pm_id: pm_id.into(),
            },
            data,
        }
    }

    /// Returns the sender's identifier.
    #[inline]
    pub fn source(&self) -> ProcessId {
        self.process.pm_id
    }
}
