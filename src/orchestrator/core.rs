//! # Orchestrator: handshake-gated reload/stop over a process group.
//!
//! The [`Orchestrator`] owns the [`SupervisorClient`] (and through it the
//! connection and message channel), the event [`Bus`], and the static
//! [`Config`]. One action runs at a time.
//!
//! ## Per-invocation state machine
//! ```text
//! Idle ─► validate ──(blank group / message type)──► Failed(Configuration)   no supervisor contact
//!           │
//!           ├──(another action in flight)──────────► Failed(Busy)            no supervisor contact
//!           ▼
//!       Connecting ─► Listing ─► ( Handshaking ─► Acting )* ─┐
//!           │            │                │                  │
//!           └────────────┴────── Err ─────┴──────────────────┤
//!                                                            ▼
//!                                                      Disconnecting ─► { Succeeded, Failed }
//! ```
//! `Disconnecting` is reached exactly once on every path after validation.
//! An action whose future is dropped mid-flight is released by a guard: the
//! channel closes synchronously and the transport release is spawned.
//!
//! ## Member flow
//! ```text
//! membership = list() │ filter(name == group) │ map(pm_id) │ dedup
//! apply_per_member(action.strategy(), membership, |id| {
//!     handshake.prepare_and_confirm(id)  ─► restart(id) | delete(id)
//! })
//! ```
//! No `restart`/`delete` is issued for an id whose handshake did not succeed
//! in the same invocation.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{Mutex, broadcast::error::RecvError};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{ActionError, SupervisorOp};
use crate::events::{Bus, Event, EventKind};
use crate::handshake::Handshake;
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::supervisor::{ProcessId, ProcessRecord, SupervisorClient, Transport};

use super::action::Action;
use super::apply::apply_per_member;
use super::report::ActionReport;

/// Resolves the membership set: ids of the records named `group`, in listing
/// order, each id at most once.
pub fn membership(records: &[ProcessRecord], group: &str) -> Vec<ProcessId> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| r.name == group)
        .map(|r| r.pm_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Builder for constructing an [`Orchestrator`] with optional subscribers.
pub struct OrchestratorBuilder<T: Transport> {
    cfg: Config,
    transport: T,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<T: Transport> OrchestratorBuilder<T> {
    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events through dedicated workers with
    /// bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the orchestrator.
    ///
    /// Must be called from within a tokio runtime when subscribers are set
    /// (their workers are spawned here).
    pub fn build(self) -> Orchestrator<T> {
        let bus = Bus::from_config(&self.cfg);
        let listener = CancellationToken::new();

        if !self.subscribers.is_empty() {
            let set = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
            subscriber_listener(&bus, set, listener.clone());
        }

        Orchestrator {
            cfg: self.cfg,
            client: SupervisorClient::new(self.transport),
            bus,
            in_flight: Mutex::new(()),
            listener,
        }
    }
}

/// Forwards bus events to the subscriber set until `token` is cancelled.
fn subscriber_listener(bus: &Bus, set: Arc<SubscriberSet>, token: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber listener lagged behind the event bus");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
        if let Ok(set) = Arc::try_unwrap(set) {
            set.shutdown().await;
        }
    });
}

/// Coordinates cautious lifecycle actions over process groups.
pub struct Orchestrator<T: Transport> {
    cfg: Config,
    client: SupervisorClient<T>,
    bus: Bus,
    in_flight: Mutex<()>,
    listener: CancellationToken,
}

impl<T: Transport> Orchestrator<T> {
    /// Starts building an orchestrator over `transport`.
    pub fn builder(cfg: Config, transport: T) -> OrchestratorBuilder<T> {
        OrchestratorBuilder {
            cfg,
            transport,
            subscribers: Vec::new(),
        }
    }

    /// Creates an orchestrator without subscribers.
    pub fn new(cfg: Config, transport: T) -> Self {
        Self::builder(cfg, transport).build()
    }

    /// Static configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Event bus; subscribe to observe actions as they run.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Supervisor client owned by this orchestrator.
    pub fn client(&self) -> &SupervisorClient<T> {
        &self.client
    }

    /// Reloads `group` (sequential, fail-fast) and returns the restarted ids.
    pub async fn reload(&self, group: &str) -> Result<Vec<ProcessId>, ActionError> {
        self.run(group, Action::Reload).await
    }

    /// Stops `group` (concurrent, fail-isolated) and returns the deleted ids.
    pub async fn stop(&self, group: &str) -> Result<Vec<ProcessId>, ActionError> {
        self.run(group, Action::Stop).await
    }

    /// Runs `action` on `group` and collapses the report with
    /// [`ActionReport::into_result`].
    pub async fn run(&self, group: &str, action: Action) -> Result<Vec<ProcessId>, ActionError> {
        self.execute(group, action).await?.into_result()
    }

    /// Runs `action` on every member of `group`.
    ///
    /// Returns `Err` only when the action could not reach its members
    /// (configuration, busy, connection or listing failure). Member failures
    /// are recorded in the returned [`ActionReport`].
    pub async fn execute(&self, group: &str, action: Action) -> Result<ActionReport, ActionError> {
        if let Err(e) = self.cfg.validate_for(group) {
            self.publish_rejected(Some(action), group, &e);
            return Err(e);
        }
        let Ok(_in_flight) = self.in_flight.try_lock() else {
            let e = ActionError::Busy;
            self.publish_rejected(Some(action), group, &e);
            return Err(e);
        };

        let group: Arc<str> = Arc::from(group);
        self.bus.publish(self.action_event(EventKind::ActionStarted, action, &group));
        let mut release = ReleaseGuard {
            orchestrator: self,
            action,
            group: Arc::clone(&group),
            armed: true,
        };

        let res = self.drive(&group, action).await;

        self.client.disconnect().await;
        release.armed = false;
        self.bus.publish(self.action_event(EventKind::Disconnected, action, &group));
        self.publish_finished(action, &group, &res);
        res
    }

    async fn drive(&self, group: &Arc<str>, action: Action) -> Result<ActionReport, ActionError> {
        self.client.connect(true).await?;
        self.bus.publish(self.action_event(EventKind::Connected, action, group));

        let records = self.client.list_processes().await?;
        let members = membership(&records, group);
        self.bus.publish(
            self.action_event(EventKind::MembersResolved, action, group)
                .with_count(members.len()),
        );

        let handshake = Handshake::new(&self.client, &self.bus, self.cfg.ack_timeout_opt())
            .for_group(Arc::clone(group));
        let (this, hs) = (self, &handshake);
        let outcomes = apply_per_member(action.strategy(), &members, move |id| {
            this.act_on(hs, group, action, id)
        })
        .await;

        for &id in &outcomes.skipped {
            self.bus.publish(
                self.action_event(EventKind::MemberSkipped, action, group)
                    .with_process(id),
            );
        }
        Ok(ActionReport::new(
            action,
            group.to_string(),
            members,
            outcomes,
        ))
    }

    /// Runs one member and publishes its outcome.
    async fn act_on(
        &self,
        handshake: &Handshake<'_, T>,
        group: &Arc<str>,
        action: Action,
        id: ProcessId,
    ) -> Result<ProcessId, ActionError> {
        let res = self.confirm_then_act(handshake, action, id).await;

        let ev = match &res {
            Ok(_) => self.action_event(EventKind::MemberActioned, action, group),
            Err(e) => self
                .action_event(EventKind::MemberFailed, action, group)
                .with_reason(e.as_message()),
        };
        self.bus.publish(ev.with_process(id));
        res
    }

    /// The destructive call is unreachable unless the handshake succeeded.
    async fn confirm_then_act(
        &self,
        handshake: &Handshake<'_, T>,
        action: Action,
        id: ProcessId,
    ) -> Result<ProcessId, ActionError> {
        let confirmed = handshake
            .prepare_and_confirm(id, &self.cfg.message_type, &self.cfg.payload)
            .await?;
        match action.operation() {
            SupervisorOp::Restart => self.client.restart(confirmed).await,
            SupervisorOp::Delete => self.client.delete(confirmed).await,
        }
    }

    fn action_event(&self, kind: EventKind, action: Action, group: &Arc<str>) -> Event {
        Event::new(kind)
            .with_action(action)
            .with_group(Arc::clone(group))
    }

    /// Reports an action refused before any supervisor contact.
    pub(crate) fn publish_rejected(
        &self,
        action: Option<Action>,
        group: &str,
        err: &ActionError,
    ) {
        let mut ev = Event::new(EventKind::ActionRejected).with_reason(err.as_label());
        if let Some(action) = action {
            ev = ev.with_action(action);
        }
        if !group.trim().is_empty() {
            ev = ev.with_group(group);
        }
        self.bus.publish(ev);
    }

    fn publish_finished(
        &self,
        action: Action,
        group: &Arc<str>,
        res: &Result<ActionReport, ActionError>,
    ) {
        let ev = self.action_event(EventKind::ActionFinished, action, group);
        let ev = match res {
            Ok(report) => {
                let ev = ev.with_count(report.completed.len());
                match report.failures.first() {
                    Some(f) => ev.with_reason(f.error.as_label()),
                    None => ev,
                }
            }
            Err(e) => ev.with_count(0).with_reason(e.as_label()),
        };
        self.bus.publish(ev);
    }
}

/// Releases the connection of an action dropped before `Disconnecting`.
struct ReleaseGuard<'a, T: Transport> {
    orchestrator: &'a Orchestrator<T>,
    action: Action,
    group: Arc<str>,
    armed: bool,
}

impl<T: Transport> Drop for ReleaseGuard<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let orch = self.orchestrator;
        tracing::warn!(action = %self.action, group = %self.group, "action abandoned before completion");
        orch.client.release_detached();
        orch.bus.publish(
            orch.action_event(EventKind::Disconnected, self.action, &self.group)
                .with_reason("abandoned"),
        );
        orch.bus.publish(
            orch.action_event(EventKind::ActionFinished, self.action, &self.group)
                .with_reason("action_abandoned"),
        );
    }
}

impl<T: Transport> Drop for Orchestrator<T> {
    fn drop(&mut self) {
        self.listener.cancel();
    }
}
