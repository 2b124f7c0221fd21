//! # ActionReport: aggregate outcome of one action.
//!
//! Created fresh per invocation, returned to the caller, never persisted.
//! [`ActionReport::into_result`] applies the action's failure policy:
//!
//! ```text
//! no failures                 ──► Ok(completed)
//! failures, Sequential        ──► Err(first failure)          (reload: fail-fast)
//! failures, Concurrent        ──► Err(MembersFailed { .. })   (stop: fail-isolated aggregate)
//! ```

use crate::error::{ActionError, MemberFailure};
use crate::supervisor::ProcessId;

use super::action::{Action, Strategy};
use super::apply::MemberOutcomes;

/// Outcome of one orchestrated action over a membership snapshot.
#[derive(Debug)]
pub struct ActionReport {
    /// Action that ran.
    pub action: Action,
    /// Group that was targeted.
    pub group: String,
    /// Membership snapshot taken when the action began.
    pub members: Vec<ProcessId>,
    /// Members actioned successfully, in membership order.
    pub completed: Vec<ProcessId>,
    /// Members that failed, in membership order.
    pub failures: Vec<MemberFailure>,
    /// Members left untouched after a fail-fast stop.
    pub skipped: Vec<ProcessId>,
}

impl ActionReport {
    pub(crate) fn new(
        action: Action,
        group: String,
        members: Vec<ProcessId>,
        outcomes: MemberOutcomes,
    ) -> Self {
        Self {
            action,
            group,
            members,
            completed: outcomes.completed,
            failures: outcomes.failures,
            skipped: outcomes.skipped,
        }
    }

    /// True if every member was actioned.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns the failure recorded for `id`, if any.
    pub fn failure_for(&self, id: ProcessId) -> Option<&ActionError> {
        self.failures
            .iter()
            .find(|f| f.process_id == id)
            .map(|f| &f.error)
    }

    /// Collapses the report into the caller-facing result.
    pub fn into_result(self) -> Result<Vec<ProcessId>, ActionError> {
        let mut failures = self.failures;
        if failures.is_empty() {
            return Ok(self.completed);
        }
        match self.action.strategy() {
            Strategy::Sequential => Err(failures.swap_remove(0).error),
            Strategy::Concurrent => Err(ActionError::MembersFailed {
                completed: self.completed,
                failures,
            }),
        }
    }
}
