//! Error types used by the orchestrator, the handshake and the supervisor client.
//!
//! This module defines two main error enums:
//!
//! - [`ActionError`]: errors raised while running a lifecycle action.
//! - [`TransportError`]: errors reported by the external supervisor transport.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//! [`ActionError::diagnostic`] produces the value handed back to external callers.

use std::time::Duration;

use serde_json::{Value, json};
use thiserror::Error;

use crate::supervisor::ProcessId;

/// # Errors reported by the external supervisor transport.
///
/// The transport is a collaborator (process manager RPC, message bus); these
/// are the only two ways it is allowed to fail.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The supervisor answered the call with an error.
    #[error("supervisor rejected the call: {reason}")]
    Rejected {
        /// Reason reported by the supervisor.
        reason: String,
    },

    /// The underlying link is gone.
    #[error("transport closed")]
    Closed,
}

impl TransportError {
    /// Shorthand for [`TransportError::Rejected`].
    pub fn rejected(reason: impl Into<String>) -> Self {
        TransportError::Rejected {
            reason: reason.into(),
        }
    }
}

/// Destructive supervisor operation that can fail after a successful handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorOp {
    /// Restart one process instance.
    Restart,
    /// Delete one process instance.
    Delete,
}

impl SupervisorOp {
    /// Returns the operation name as used by the supervisor API.
    pub fn as_str(&self) -> &'static str {
        match self {
            SupervisorOp::Restart => "restart",
            SupervisorOp::Delete => "delete",
        }
    }
}

/// Failure of a single group member during an action.
#[derive(Debug, Clone)]
pub struct MemberFailure {
    /// Process the failure belongs to.
    pub process_id: ProcessId,
    /// What went wrong for this member.
    pub error: ActionError,
}

/// # Errors produced while running a lifecycle action.
///
/// Configuration errors are raised before the supervisor is contacted.
/// Per-member errors (`MalformedAck`, `PrepareRejected`, `Timeout`,
/// `SupervisorOperation`, `Send`) are subject to the action's failure policy.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum ActionError {
    /// Required static configuration is missing or blank.
    #[error("configuration error: {reason}")]
    Configuration {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// A trigger named an action that does not exist.
    #[error("unknown action '{name}'")]
    UnknownAction {
        /// The name the caller used.
        name: String,
    },

    /// The supervisor could not be reached, or the client is not connected.
    #[error("connection error: {reason}")]
    Connection {
        /// Underlying transport message.
        reason: String,
    },

    /// A message operation was attempted without an open message channel.
    #[error("message channel unavailable")]
    ChannelUnavailable,

    /// A prepare message could not be handed to the transport.
    #[error("failed to send prepare message to process {process_id}: {reason}")]
    Send {
        /// Target process.
        process_id: ProcessId,
        /// Underlying transport message.
        reason: String,
    },

    /// A wait is already registered for the same process and message type.
    #[error("an acknowledgment for process {process_id} on '{message_type}' is already awaited")]
    AckPending {
        /// Target process.
        process_id: ProcessId,
        /// Message type of the existing wait.
        message_type: String,
    },

    /// The worker replied without a `data` envelope.
    #[error("process {process_id} replied without a data property")]
    MalformedAck {
        /// Process that sent the reply.
        process_id: ProcessId,
    },

    /// The worker explicitly declined to prepare; carries its own diagnostic.
    #[error("process {process_id} rejected the prepare request: {data}")]
    PrepareRejected {
        /// Process that declined.
        process_id: ProcessId,
        /// The reply's `data`, verbatim.
        data: Value,
    },

    /// No acknowledgment arrived within the configured bound.
    #[error("process {process_id} did not acknowledge within {timeout:?}")]
    Timeout {
        /// Process that stayed silent.
        process_id: ProcessId,
        /// The bound that was exceeded.
        timeout: Duration,
    },

    /// The supervisor refused a restart or delete.
    #[error("{} of process {process_id} failed: {reason}", .op.as_str())]
    SupervisorOperation {
        /// Which operation failed.
        op: SupervisorOp,
        /// Target process.
        process_id: ProcessId,
        /// Underlying transport message.
        reason: String,
    },

    /// Another action is already running on this orchestrator.
    #[error("another action is already in flight")]
    Busy,

    /// One or more members failed during a fail-isolated action.
    #[error("{} of {} members failed", .failures.len(), .failures.len() + .completed.len())]
    MembersFailed {
        /// Members that completed.
        completed: Vec<ProcessId>,
        /// Members that failed, with their errors.
        failures: Vec<MemberFailure>,
    },
}

impl ActionError {
    /// Shorthand for [`ActionError::Configuration`].
    pub fn configuration(reason: impl Into<String>) -> Self {
        ActionError::Configuration {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use cautious::ActionError;
    ///
    /// let err = ActionError::configuration("missing group");
    /// assert_eq!(err.as_label(), "configuration_error");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ActionError::Configuration { .. } => "configuration_error",
            ActionError::UnknownAction { .. } => "unknown_action",
            ActionError::Connection { .. } => "connection_error",
            ActionError::ChannelUnavailable => "channel_unavailable",
            ActionError::Send { .. } => "prepare_send_failed",
            ActionError::AckPending { .. } => "ack_pending",
            ActionError::MalformedAck { .. } => "malformed_ack",
            ActionError::PrepareRejected { .. } => "prepare_rejected",
            ActionError::Timeout { .. } => "ack_timeout",
            ActionError::SupervisorOperation { .. } => "supervisor_operation_error",
            ActionError::Busy => "action_busy",
            ActionError::MembersFailed { .. } => "members_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ActionError::PrepareRejected { process_id, data } => {
                format!("rejected by process {process_id}: {data}")
            }
            ActionError::MembersFailed { failures, .. } => {
                let ids: Vec<String> = failures.iter().map(|f| f.process_id.to_string()).collect();
                format!("failed members: [{}]", ids.join(", "))
            }
            other => other.to_string(),
        }
    }

    /// Returns the process this error is attached to, if any.
    pub fn process_id(&self) -> Option<ProcessId> {
        match self {
            ActionError::Send { process_id, .. }
            | ActionError::AckPending { process_id, .. }
            | ActionError::MalformedAck { process_id }
            | ActionError::PrepareRejected { process_id, .. }
            | ActionError::Timeout { process_id, .. }
            | ActionError::SupervisorOperation { process_id, .. } => Some(*process_id),
            _ => None,
        }
    }

    /// Caller-facing error value.
    ///
    /// `PrepareRejected` yields the worker's `data` unmodified so the operator
    /// reads the condition the worker itself reported. `MembersFailed` yields one
    /// entry per failed member. Everything else is the display string.
    pub fn diagnostic(&self) -> Value {
        match self {
            ActionError::PrepareRejected { data, .. } => data.clone(),
            ActionError::MembersFailed { failures, .. } => Value::Array(
                failures
                    .iter()
                    .map(|f| json!({ "processId": f.process_id, "error": f.error.diagnostic() }))
                    .collect(),
            ),
            other => Value::String(other.to_string()),
        }
    }

    pub(crate) fn connection(err: TransportError) -> Self {
        ActionError::Connection {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_diagnostic_is_verbatim() {
        let data = json!({ "success": false, "reason": "draining 3 jobs" });
        let err = ActionError::PrepareRejected {
            process_id: ProcessId(4),
            data: data.clone(),
        };
        assert_eq!(err.diagnostic(), data);
        assert_eq!(err.as_label(), "prepare_rejected");
        assert_eq!(err.process_id(), Some(ProcessId(4)));
    }

    #[test]
    fn test_members_failed_diagnostic_lists_each_member() {
        let err = ActionError::MembersFailed {
            completed: vec![ProcessId(1), ProcessId(3)],
            failures: vec![MemberFailure {
                process_id: ProcessId(2),
                error: ActionError::MalformedAck {
                    process_id: ProcessId(2),
                },
            }],
        };
        assert_eq!(err.to_string(), "1 of 3 members failed");
        assert_eq!(err.as_message(), "failed members: [2]");

        let diag = err.diagnostic();
        assert_eq!(diag[0]["processId"], json!(2));
        assert_eq!(
            diag[0]["error"],
            json!("process 2 replied without a data property")
        );
    }

    #[test]
    fn test_supervisor_operation_display() {
        let err = ActionError::SupervisorOperation {
            op: SupervisorOp::Delete,
            process_id: ProcessId(7),
            reason: "no such process".into(),
        };
        assert_eq!(err.to_string(), "delete of process 7 failed: no such process");
        assert_eq!(err.as_label(), "supervisor_operation_error");
    }

    #[test]
    fn test_config_error_has_no_process() {
        let err = ActionError::configuration("messageType may not be blank");
        assert!(err.process_id().is_none());
        assert_eq!(
            err.diagnostic(),
            json!("configuration error: messageType may not be blank")
        );
    }
}
