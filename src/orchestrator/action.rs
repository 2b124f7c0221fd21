//! # Lifecycle actions and their composition strategy.
//!
//! | Action   | Destructive call | Strategy     | On member failure                 |
//! |----------|------------------|--------------|-----------------------------------|
//! | `reload` | `restart(id)`    | `Sequential` | stop, leave the rest untouched    |
//! | `stop`   | `delete(id)`     | `Concurrent` | keep going, collect every outcome |
//!
//! Reload never takes down more than one replica at a time; stop is a full
//! shutdown so replica ordering is irrelevant.

use std::fmt;
use std::str::FromStr;

use crate::error::{ActionError, SupervisorOp};

/// A lifecycle transition applied to every member of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Restart members one by one.
    Reload,
    /// Delete all members.
    Stop,
}

impl Action {
    /// Every action, in trigger registration order.
    pub const ALL: [Action; 2] = [Action::Reload, Action::Stop];

    /// Trigger name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Reload => "reload",
            Action::Stop => "stop",
        }
    }

    /// How members are composed for this action.
    pub fn strategy(&self) -> Strategy {
        match self {
            Action::Reload => Strategy::Sequential,
            Action::Stop => Strategy::Concurrent,
        }
    }

    /// Destructive supervisor call issued after a successful handshake.
    pub fn operation(&self) -> SupervisorOp {
        match self {
            Action::Reload => SupervisorOp::Restart,
            Action::Stop => SupervisorOp::Delete,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| ActionError::UnknownAction { name: s.to_owned() })
    }
}

/// Composition of per-member work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One member at a time, in membership order; stop at the first failure.
    Sequential,
    /// All members in flight at once; every member runs to completion.
    Concurrent,
}

impl Strategy {
    /// True if a member failure stops the remaining members.
    pub fn is_fail_fast(&self) -> bool {
        matches!(self, Strategy::Sequential)
    }
}
