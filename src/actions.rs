//! # Trigger surface: named actions invoked by an external caller.
//!
//! A dashboard (or any host) invokes actions by name with one optional string
//! parameter, the group name, and receives a JSON reply:
//!
//! ```text
//! invoke("reload", Some("api")) ──► { "success": true,  "data": { "processIds": [1, 2] } }
//! invoke("stop",   Some("api")) ──► { "success": false, "error": <diagnostic> }
//! invoke("reload", None)        ──► group taken from Config::group_name
//! ```
//!
//! The `error` value is [`ActionError::diagnostic`]: a worker's own rejection
//! data reaches the caller unmodified.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::ActionError;
use crate::orchestrator::{Action, Orchestrator};
use crate::supervisor::{ProcessId, Transport};

/// Payload of a successful reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyData {
    /// Processes the action was applied to.
    pub process_ids: Vec<ProcessId>,
}

/// Caller-facing result of one triggered action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    /// True if the action ran on every member.
    pub success: bool,
    /// Actioned processes (success only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ReplyData>,
    /// Caller-facing diagnostic (failure only), see [`ActionError::diagnostic`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl Reply {
    /// Successful reply listing the actioned processes.
    pub fn ok(process_ids: Vec<ProcessId>) -> Self {
        Self {
            success: true,
            data: Some(ReplyData { process_ids }),
            error: None,
        }
    }

    /// Failed reply carrying the error's diagnostic.
    pub fn failed(err: &ActionError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.diagnostic()),
        }
    }

    /// Renders the reply as the JSON value handed back to the caller.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl From<Result<Vec<ProcessId>, ActionError>> for Reply {
    fn from(res: Result<Vec<ProcessId>, ActionError>) -> Self {
        match res {
            Ok(ids) => Reply::ok(ids),
            Err(e) => Reply::failed(&e),
        }
    }
}

/// Registry of the actions exposed to the host.
pub struct ActionRegistry<T: Transport> {
    orchestrator: Arc<Orchestrator<T>>,
}

impl<T: Transport> Clone for ActionRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
        }
    }
}

impl<T: Transport> ActionRegistry<T> {
    /// Exposes the actions of a shared orchestrator.
    pub fn new(orchestrator: Arc<Orchestrator<T>>) -> Self {
        Self { orchestrator }
    }

    /// Action names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        Action::ALL.into_iter().map(|a| a.as_str())
    }

    /// Orchestrator the actions run on.
    pub fn orchestrator(&self) -> &Orchestrator<T> {
        &self.orchestrator
    }

    /// Invokes the action registered as `name`.
    ///
    /// A missing or blank `group` falls back to the configured group name.
    /// Never fails: every error is folded into the reply.
    pub async fn invoke(&self, name: &str, group: Option<&str>) -> Reply {
        Reply::from(self.run(name, group).await)
    }

    async fn run(&self, name: &str, group: Option<&str>) -> Result<Vec<ProcessId>, ActionError> {
        let orch = &self.orchestrator;
        let requested = group.unwrap_or_default();
        let action: Action = name.parse().inspect_err(|e| {
            orch.publish_rejected(None, requested, e);
        })?;
        let group = orch.config().resolve_group(group).inspect_err(|e| {
            orch.publish_rejected(Some(action), requested, e);
        })?;
        tracing::debug!(action = %action, group = %group, "action triggered");
        orch.run(&group, action).await
    }
}
