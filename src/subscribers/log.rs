//! # LogWriter: renders events through `tracing`
//!
//! A minimal subscriber that turns incoming [`Event`]s into structured
//! `tracing` records. Install any `tracing` subscriber in the host to see them.
//!
//! ## Levels
//! - `info`: action started/finished, member actioned
//! - `debug`: connection, membership, prepare/ack traffic
//! - `warn`: member failed or skipped, ack timeout, action rejected, subscriber trouble

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let action = e.action.map(|a| a.as_str()).unwrap_or("-");
        let group = e.group.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        let pid = e.process_id.map(|p| p.0);

        match e.kind {
            EventKind::ActionStarted => {
                tracing::info!(seq = e.seq, action, group, "action started");
            }
            EventKind::ActionRejected => {
                tracing::warn!(seq = e.seq, action, group, reason, "action rejected");
            }
            EventKind::Connected => {
                tracing::debug!(seq = e.seq, action, group, "connected to supervisor");
            }
            EventKind::MembersResolved => {
                tracing::debug!(seq = e.seq, action, group, members = e.count, "membership resolved");
            }
            EventKind::PrepareSent => {
                tracing::debug!(seq = e.seq, group, process_id = pid, message_type = reason, "prepare sent");
            }
            EventKind::AckReceived => {
                tracing::debug!(seq = e.seq, group, process_id = pid, "ack received");
            }
            EventKind::AckTimeout => {
                tracing::warn!(seq = e.seq, group, process_id = pid, timeout_ms = e.timeout_ms, "ack timed out");
            }
            EventKind::MemberActioned => {
                tracing::info!(seq = e.seq, action, group, process_id = pid, "member actioned");
            }
            EventKind::MemberFailed => {
                tracing::warn!(seq = e.seq, action, group, process_id = pid, reason, "member failed");
            }
            EventKind::MemberSkipped => {
                tracing::warn!(seq = e.seq, action, group, process_id = pid, "member skipped");
            }
            EventKind::Disconnected => {
                tracing::debug!(seq = e.seq, action, group, "disconnected from supervisor");
            }
            EventKind::ActionFinished => {
                if reason.is_empty() {
                    tracing::info!(seq = e.seq, action, group, actioned = e.count, "action succeeded");
                } else {
                    tracing::warn!(seq = e.seq, action, group, actioned = e.count, reason, "action failed");
                }
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(seq = e.seq, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(seq = e.seq, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
