//! Inbound event dispatch.
//!
//! Handlers register per event kind and run in registration order.
//! Unknown events are counted and ignored; malformed frames are logged
//! and dropped without touching connection state.

use crate::envelope::{decode, InboundEvent};
use metrics::counter;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::{debug, warn};

/// Event kinds a handler can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TaskAssigned,
    NewMessage,
}

/// Registration handle returned by [`EventRouter::on`]; pass to
/// [`EventRouter::off`] to dispose of the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerId(u64);

type Handler = Box<dyn Fn(&InboundEvent) + Send + Sync>;

/// Routes decoded inbound events to registered handlers.
pub struct EventRouter {
    handlers: RwLock<Vec<(HandlerId, EventKind, Handler)>>,
    next_id: AtomicU64,
}

impl EventRouter {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a handler for an event kind. Multiple handlers for the
    /// same kind are all invoked, in registration order.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> HandlerId
    where
        F: Fn(&InboundEvent) + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .write()
            .unwrap()
            .push((id, kind, Box::new(handler)));
        id
    }

    /// Remove a previously registered handler. Returns false when the id
    /// was already disposed.
    pub fn off(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.write().unwrap();
        let before = handlers.len();
        handlers.retain(|(handler_id, _, _)| *handler_id != id);
        handlers.len() != before
    }

    /// Dispatch a decoded event to all matching handlers.
    pub fn dispatch(&self, event: &InboundEvent) {
        let kind = match event.kind() {
            Some(kind) => kind,
            None => {
                if let InboundEvent::Unknown { event, .. } = event {
                    debug!("Ignoring unknown event '{}'", event);
                }
                counter!("sync_events_unknown_total").increment(1);
                return;
            }
        };
        let handlers = self.handlers.read().unwrap();
        for (_, handler_kind, handler) in handlers.iter() {
            if *handler_kind == kind {
                handler(event);
            }
        }
    }

    /// Decode a raw frame and dispatch it. Malformed frames are dropped
    /// with a log line and a counter; the connection is unaffected.
    pub fn route(&self, raw: &str) {
        match decode(raw) {
            Ok(event) => self.dispatch(&event),
            Err(e) => {
                warn!("Dropping malformed frame: {}", e);
                counter!("sync_protocol_errors_total").increment(1);
            }
        }
    }
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_handlers_run_in_registration_order() {
        let router = EventRouter::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = order.clone();
            router.on(EventKind::TaskAssigned, move |_| {
                order.lock().unwrap().push(tag);
            });
        }

        router.route(r#"{"event":"task_assigned","data":{"taskId":1,"title":"t"}}"#);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_off_disposes_a_handler() {
        let router = EventRouter::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_clone = calls.clone();
        let id = router.on(EventKind::NewMessage, move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        let frame = r#"{"event":"new_message","data":{"id":1,"teamId":"1","content":"x","sender":"s","created_at":"now"}}"#;
        router.route(frame);
        assert!(router.off(id));
        router.route(frame);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!router.off(id));
    }

    #[test]
    fn test_unknown_events_are_routed_nowhere() {
        let router = EventRouter::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_clone = calls.clone();
        router.on(EventKind::TaskAssigned, move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        router.route(r#"{"event":"typing_indicator","data":{}}"#);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_malformed_frames_are_absorbed() {
        let router = EventRouter::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_clone = calls.clone();
        router.on(EventKind::NewMessage, move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        router.route("garbage");
        router.route(r#"{"data":{}}"#);
        router.route(r#"{"event":"new_message","data":{"id":"bad"}}"#);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handlers_only_see_their_kind() {
        let router = EventRouter::new();
        let task_calls = Arc::new(AtomicUsize::new(0));
        let message_calls = Arc::new(AtomicUsize::new(0));

        let task_clone = task_calls.clone();
        router.on(EventKind::TaskAssigned, move |_| {
            task_clone.fetch_add(1, Ordering::SeqCst);
        });
        let message_clone = message_calls.clone();
        router.on(EventKind::NewMessage, move |_| {
            message_clone.fetch_add(1, Ordering::SeqCst);
        });

        router.route(r#"{"event":"task_assigned","data":{"taskId":1,"title":"t"}}"#);
        assert_eq!(task_calls.load(Ordering::SeqCst), 1);
        assert_eq!(message_calls.load(Ordering::SeqCst), 0);
    }
}
