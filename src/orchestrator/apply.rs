//! # Per-member combinator.
//!
//! [`apply_per_member`] runs one async operation per member under a [`Strategy`]:
//!
//! ```text
//! Sequential:  op(m0) ─► op(m1) ─► op(m2)        first Err stops; m(i+1).. are skipped
//! Concurrent:  op(m0) ┐
//!              op(m1) ┼─► join_all               every member finishes, order preserved
//!              op(m2) ┘
//! ```
//!
//! Concurrent futures are interleaved on the caller's task (`join_all`), not
//! spawned: the operation may borrow the caller's state.

use std::future::Future;

use futures::future::join_all;

use crate::error::{ActionError, MemberFailure};
use crate::supervisor::ProcessId;

use super::action::Strategy;

/// Outcome of applying an operation to every member.
#[derive(Debug, Default)]
pub struct MemberOutcomes {
    /// Members whose operation succeeded, in membership order.
    pub completed: Vec<ProcessId>,
    /// Members whose operation failed, in membership order.
    pub failures: Vec<MemberFailure>,
    /// Members never started because a sequential run stopped early.
    pub skipped: Vec<ProcessId>,
}

/// Applies `op` to every member under `strategy`.
pub async fn apply_per_member<F, Fut>(
    strategy: Strategy,
    members: &[ProcessId],
    op: F,
) -> MemberOutcomes
where
    F: Fn(ProcessId) -> Fut,
    Fut: Future<Output = Result<ProcessId, ActionError>>,
{
    let mut out = MemberOutcomes::default();

    match strategy {
        Strategy::Sequential => {
            for (i, &id) in members.iter().enumerate() {
                match op(id).await {
                    Ok(done) => out.completed.push(done),
                    Err(error) => {
                        out.failures.push(MemberFailure {
                            process_id: id,
                            error,
                        });
                        out.skipped.extend_from_slice(&members[i + 1..]);
                        break;
                    }
                }
            }
        }
        Strategy::Concurrent => {
            let results = join_all(members.iter().map(|&id| op(id))).await;
            for (&id, res) in members.iter().zip(results) {
                match res {
                    Ok(done) => out.completed.push(done),
                    Err(error) => out.failures.push(MemberFailure {
                        process_id: id,
                        error,
                    }),
                }
            }
        }
    }
    out
}
