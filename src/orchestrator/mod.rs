//! Orchestration: actions, composition and the orchestrator itself.
//!
//! The public entry point is [`Orchestrator`], which drives one handshake-gated
//! action over a process group and reports the outcome as an [`ActionReport`].
//!
//! Internal modules:
//! - [`action`]: `Action` → destructive call and `Strategy`;
//! - [`apply`]: the generic per-member combinator;
//! - [`report`]: aggregated outcome and its failure policy;
//! - [`core`]: the orchestrator, its builder and membership resolution.

mod action;
mod apply;
mod core;
mod report;

pub use action::{Action, Strategy};
pub use apply::{MemberOutcomes, apply_per_member};
pub use self::core::{Orchestrator, OrchestratorBuilder, membership};
pub use report::ActionReport;
