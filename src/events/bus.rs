//! # Action event fan-out.
//!
//! Every stage of an action (start, handshake, member outcome, disconnect)
//! is reported as an [`Event`] on one [`Bus`] owned by the orchestrator.
//! The bus is sized once from [`Config::bus_capacity`] and shared by clone
//! with the handshake and the subscriber workers.
//!
//! ```text
//! Orchestrator ─┐
//! Handshake    ─┼─► Bus (ring of Config::bus_capacity) ─► subscriber_listener ─► SubscriberSet
//! Sub workers  ─┘                                      └► Bus::subscribe() (tests, hosts)
//! ```
//!
//! Publishing never waits on a receiver. An action with nobody listening
//! runs exactly as one with subscribers attached; its events are dropped.
//! A receiver that falls more than `bus_capacity` events behind skips the
//! oldest ones (`RecvError::Lagged`).

use tokio::sync::broadcast;

use super::event::Event;
use crate::config::Config;

/// Shared handle to the action event channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus holding up to `capacity` undelivered events (at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Creates the bus an orchestrator built from `cfg` reports on.
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.bus_capacity_clamped())
    }

    /// Reports `ev` to current receivers.
    ///
    /// Returns false when nobody was listening and the event was dropped.
    pub fn publish(&self, ev: Event) -> bool {
        self.tx.send(ev).is_ok()
    }

    /// Starts observing events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    #[test]
    fn test_unobserved_events_are_dropped() {
        let bus = Bus::new(4);
        assert!(!bus.publish(Event::new(EventKind::ActionStarted)));

        let mut rx = bus.subscribe();
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert!(bus.publish(Event::new(EventKind::Connected)));
        assert_eq!(rx.try_recv().unwrap().kind, EventKind::Connected);
    }

    #[tokio::test]
    async fn test_capacity_follows_config() {
        let cfg = Config {
            bus_capacity: 2,
            ..Config::new("prepare")
        };
        let bus = Bus::from_config(&cfg);
        let mut rx = bus.subscribe();

        for kind in [EventKind::ActionStarted, EventKind::Connected, EventKind::Disconnected] {
            bus.publish(Event::new(kind));
        }

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(1))));
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::Connected);
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::Disconnected);
    }

    #[tokio::test]
    async fn test_zero_capacity_keeps_latest_event() {
        let bus = Bus::from_config(&Config {
            bus_capacity: 0,
            ..Config::new("prepare")
        });
        let mut rx = bus.subscribe();

        bus.publish(Event::new(EventKind::ActionStarted));
        bus.publish(Event::new(EventKind::ActionFinished));

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(1))));
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::ActionFinished);
    }
}
