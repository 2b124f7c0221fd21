//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted while an action runs.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Orchestrator`, `Handshake`, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: `Orchestrator`'s subscriber listener (fans out to `SubscriberSet`),
//!   or any caller holding a receiver from [`Orchestrator::bus`](crate::Orchestrator::bus).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
