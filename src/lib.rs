//! # cautious
//!
//! **Cautious** reloads and stops groups of supervised processes without
//! cutting work off mid-flight.
//!
//! Before a process is restarted or deleted it receives a typed "prepare"
//! message; the destructive call is issued only after that process replied
//! with `{ "success": true }`. The crate drives an external process supervisor
//! through the [`Transport`] trait and never implements the supervisor itself.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   caller ──► ActionRegistry::invoke("reload" | "stop", group)
//!                         │
//!                         ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Orchestrator                                                     │
//! │  - Config (message type, payload, ack timeout)                    │
//! │  - single-flight guard (overlapping actions fail with Busy)       │
//! │  - Bus ──► subscriber_listener ──► SubscriberSet                   │
//! └──────┬──────────────────────────────────────────────┬─────────────┘
//!        │ connect / list / restart / delete / disconnect│ per member
//!        ▼                                               ▼
//! ┌────────────────────────┐                  ┌────────────────────────┐
//! │  SupervisorClient      │◄─ await_ack ─────│  Handshake             │
//! │  - Transport (host)    │── send_prepare ─►│  prepare ─► ack ─► ok? │
//! │  - dispatcher task     │                  └────────────────────────┘
//! │  - PendingAcks table   │
//! └──────────┬─────────────┘
//!            ▼
//!   external supervisor (RPC + message bus)
//! ```
//!
//! ### Lifecycle of one action
//! ```text
//! validate(group, message type) ──(blank)──► Err(Configuration), no supervisor contact
//! try_lock(in flight)           ──(held)───► Err(Busy), no supervisor contact
//! connect(with_channel) ─► list() ─► membership(group)
//!   ├─ reload: Sequential  handshake(id) ─► restart(id)   first failure stops the rest
//!   └─ stop:   Concurrent  handshake(id) ─► delete(id)    every member runs to completion
//! disconnect()                  (always, exactly once)
//! ```
//!
//! ## Features
//! | Area               | Description                                                    | Key types / traits                          |
//! |--------------------|----------------------------------------------------------------|---------------------------------------------|
//! | **Orchestration**  | Handshake-gated reload/stop over a process group.              | [`Orchestrator`], [`Action`], [`Strategy`]  |
//! | **Trigger surface**| Named actions returning JSON replies.                          | [`ActionRegistry`], [`Reply`]               |
//! | **Supervisor**     | Typed client over a host-provided transport.                   | [`SupervisorClient`], [`Transport`]         |
//! | **Handshake**      | Prepare/ack round trip correlated by process and message type. | [`Handshake`], [`AckWait`]                  |
//! | **Subscriber API** | Hook into action events (logging, metrics, audit).             | [`Subscribe`], [`Event`]                    |
//! | **Errors**         | Typed errors carrying worker diagnostics.                      | [`ActionError`], [`TransportError`]         |
//! | **Configuration**  | Static settings, loadable from JSON.                           | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports the built-in [`LogWriter`] subscriber (renders events through `tracing`).
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use async_trait::async_trait;
//! use serde_json::json;
//! use tokio::sync::mpsc;
//! use cautious::{
//!     ActionRegistry, Config, InboundMessage, MessageStream, Orchestrator, OutboundEnvelope,
//!     ProcessId, ProcessRecord, Transport, TransportError,
//! };
//!
//! /// Two "api" workers that are always ready to restart.
//! #[derive(Default)]
//! struct Fleet {
//!     bus: Mutex<Option<mpsc::Sender<InboundMessage>>>,
//! }
//!
//! #[async_trait]
//! impl Transport for Fleet {
//!     async fn connect(&self) -> Result<(), TransportError> { Ok(()) }
//!
//!     async fn launch_bus(&self) -> Result<MessageStream, TransportError> {
//!         let (tx, rx) = mpsc::channel(16);
//!         *self.bus.lock().unwrap() = Some(tx);
//!         Ok(rx)
//!     }
//!
//!     async fn list(&self) -> Result<Vec<ProcessRecord>, TransportError> {
//!         Ok(vec![ProcessRecord::new("api", 0), ProcessRecord::new("api", 1)])
//!     }
//!
//!     async fn describe(&self, _id: ProcessId) -> Result<Vec<ProcessRecord>, TransportError> {
//!         Ok(Vec::new())
//!     }
//!
//!     async fn send_data_to_process_id(
//!         &self,
//!         id: ProcessId,
//!         envelope: OutboundEnvelope,
//!     ) -> Result<(), TransportError> {
//!         let tx = self.bus.lock().unwrap().clone().ok_or(TransportError::Closed)?;
//!         let ack = InboundMessage::new(envelope.kind, id, Some(json!({ "success": true })));
//!         tx.send(ack).await.map_err(|_| TransportError::Closed)
//!     }
//!
//!     async fn restart(&self, _id: ProcessId) -> Result<(), TransportError> { Ok(()) }
//!     async fn delete(&self, _id: ProcessId) -> Result<(), TransportError> { Ok(()) }
//!     async fn disconnect(&self) -> Result<(), TransportError> { Ok(()) }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let cfg = Config::new("shutdown:prepare").with_group("api");
//!
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn cautious::Subscribe>> = vec![Arc::new(cautious::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn cautious::Subscribe>> = Vec::new();
//!
//!     let orchestrator = Orchestrator::builder(cfg, Fleet::default())
//!         .with_subscribers(subs)
//!         .build();
//!     let actions = ActionRegistry::new(Arc::new(orchestrator));
//!
//!     let reply = actions.invoke("reload", None).await;
//!     assert_eq!(
//!         reply.to_value(),
//!         json!({ "success": true, "data": { "processIds": [0, 1] } })
//!     );
//! }
//! ```
mod actions;
mod config;
mod error;
mod events;
mod handshake;
mod orchestrator;
mod subscribers;
mod supervisor;

// ---- Public re-exports ----

pub use actions::{ActionRegistry, Reply, ReplyData};
pub use config::Config;
pub use error::{ActionError, MemberFailure, SupervisorOp, TransportError};
pub use events::{Bus, Event, EventKind};
pub use handshake::Handshake;
pub use orchestrator::{
    Action, ActionReport, MemberOutcomes, Orchestrator, OrchestratorBuilder, Strategy,
    apply_per_member, membership,
};
pub use subscribers::{Subscribe, SubscriberSet};
pub use supervisor::{
    AckWait, InboundMessage, MessageStream, OutboundEnvelope, ProcessId, ProcessRecord,
    SourceProcess, SupervisorClient, Transport,
};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
