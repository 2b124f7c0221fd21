//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and the optional built-in [`LogWriter`] (feature `logging`).
//!
//! ## Architecture
//! ```text
//! Orchestrator/Handshake ── publish(Event) ──► Bus ──► subscriber listener
//!                                                          │
//!                                                          └──► SubscriberSet::emit(&Event)
//!                                                                  ├──► LogWriter (tracing)
//!                                                                  └──► custom subscribers
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
