//! # Runtime events emitted by the orchestrator and the handshake.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Action events**: one orchestrated action (started, rejected, finished)
//! - **Member events**: per-process progress (prepare sent, ack, actioned, failed, skipped)
//! - **Subscriber events**: fan-out health (overflow, panic)
//!
//! The [`Event`] struct carries additional metadata such as timestamps, action,
//! group, process id, reasons, and counts.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use cautious::{Action, Event, EventKind, ProcessId};
//!
//! let ev = Event::new(EventKind::MemberFailed)
//!     .with_action(Action::Reload)
//!     .with_group("api")
//!     .with_process(ProcessId(3))
//!     .with_reason("malformed_ack");
//!
//! assert_eq!(ev.kind, EventKind::MemberFailed);
//! assert_eq!(ev.group.as_deref(), Some("api"));
//! assert_eq!(ev.process_id, Some(ProcessId(3)));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::orchestrator::Action;
use crate::supervisor::ProcessId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Action events ===
    /// An action passed validation and acquired the orchestrator.
    ///
    /// Sets:
    /// - `action`, `group`
    ActionStarted,

    /// An action was refused before contacting the supervisor
    /// (configuration error or another action in flight).
    ///
    /// Sets:
    /// - `action`, `group` (if known)
    /// - `reason`: error label (`unknown_action` for an unrecognized trigger name)
    ActionRejected,

    /// Control connection and message channel are open.
    ///
    /// Sets:
    /// - `action`, `group`
    Connected,

    /// Membership snapshot resolved.
    ///
    /// Sets:
    /// - `action`, `group`
    /// - `count`: number of members
    MembersResolved,

    /// Connection released (reached on every path after a connect attempt).
    ///
    /// Sets:
    /// - `action`, `group`
    Disconnected,

    /// Action reached its terminal state.
    ///
    /// Sets:
    /// - `action`, `group`
    /// - `count`: members actioned
    /// - `reason`: error label (failure only)
    ActionFinished,

    // === Member events ===
    /// Prepare message accepted by the transport.
    ///
    /// Sets:
    /// - `group` (if known), `process_id`
    /// - `reason`: message type
    PrepareSent,

    /// Correlated acknowledgment received (not yet validated).
    ///
    /// Sets:
    /// - `group` (if known), `process_id`
    AckReceived,

    /// No acknowledgment within the configured bound.
    ///
    /// Sets:
    /// - `group` (if known), `process_id`
    /// - `timeout_ms`
    AckTimeout,

    /// Destructive operation completed after a successful handshake.
    ///
    /// Sets:
    /// - `action`, `group`, `process_id`
    MemberActioned,

    /// Handshake or destructive operation failed for one member.
    ///
    /// Sets:
    /// - `action`, `group`, `process_id`
    /// - `reason`: error message
    MemberFailed,

    /// Member left untouched because a fail-fast action stopped early.
    ///
    /// Sets:
    /// - `action`, `group`, `process_id`
    MemberSkipped,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `reason`: subscriber name and panic message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `reason`: subscriber name and drop reason
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Action being orchestrated.
    pub action: Option<Action>,
    /// Group name the action targets.
    pub group: Option<Arc<str>>,
    /// Member the event is about.
    pub process_id: Option<ProcessId>,
    /// Human-readable reason (errors, labels, message types).
    pub reason: Option<Arc<str>>,
    /// Acknowledgment timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Member count.
    pub count: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            action: None,
            group: None,
            process_id: None,
            reason: None,
            timeout_ms: None,
            count: None,
        }
    }

    /// Attaches the action.
    #[inline]
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    /// Attaches a group name.
    #[inline]
    pub fn with_group(mut self, group: impl Into<Arc<str>>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Attaches a process id.
    #[inline]
    pub fn with_process(mut self, id: ProcessId) -> Self {
        self.process_id = Some(id);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Attaches a member count.
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(n.min(u32::MAX as usize) as u32);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_member_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::PrepareSent
                | EventKind::AckReceived
                | EventKind::AckTimeout
                | EventKind::MemberActioned
                | EventKind::MemberFailed
                | EventKind::MemberSkipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::ActionStarted);
        let b = Event::new(EventKind::ActionFinished);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_timeout_is_clamped() {
        let ev = Event::new(EventKind::AckTimeout).with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
        assert!(ev.is_member_event());
    }
}
