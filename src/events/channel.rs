//! Event channel implementation using crossbeam-channel.
//!
//! Provides a thread-safe way to send events from the engine to any UI
//! layer. Hashing runs on rayon workers, so senders must be `Send + Sync`.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use super::Event;

/// Sends events from the engine.
///
/// Cheap to clone. A disabled sender drops every event, which is what
/// headless runs and tests use.
#[derive(Clone, Default)]
pub struct EventSender {
    inner: Option<Sender<Event>>,
}

impl EventSender {
    /// A sender that discards everything
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Send an event.
    ///
    /// A dropped receiver is not an error: progress reporting is optional.
    pub fn send(&self, event: Event) {
        if let Some(sender) = &self.inner {
            let _ = sender.send(event);
        }
    }

    /// True when events reach a receiver
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }
}

impl std::fmt::Debug for EventSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSender")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Receives events from the engine.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event; `None` once every sender is gone
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Take an event if one is waiting
    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Blocking iterator that ends when every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }

    /// Everything currently queued, without blocking
    pub fn drain(&self) -> Vec<Event> {
        self.inner.try_iter().collect()
    }
}

/// Constructors for connected sender/receiver pairs
pub struct EventChannel;

impl EventChannel {
    /// Unbounded channel; events are small and the engine never waits on the UI
    pub fn new() -> (EventSender, EventReceiver) {
        Self::wrap(unbounded())
    }

    /// Bounded channel for a UI that needs backpressure
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        Self::wrap(bounded(capacity))
    }

    fn wrap((sender, receiver): (Sender<Event>, Receiver<Event>)) -> (EventSender, EventReceiver) {
        (
            EventSender {
                inner: Some(sender),
            },
            EventReceiver { inner: receiver },
        )
    }
}
