// Session-scoped event bus
// Delivery is synchronous, on the caller's stack, in subscription order.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::{trace, warn};

use crate::EventConsumer;
use crate::game_events::{EventKind, GameEvent};

/// Handle returned by [`EventBus::on`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener = Rc<RefCell<dyn FnMut(&GameEvent)>>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<EventKind, Vec<(ListenerId, Listener)>>,
}

/// Publish/subscribe hub shared by everything inside one game session.
///
/// Cloning is cheap and every clone talks to the same registry. The set of
/// listeners that receive an event is fixed when `emit` starts, so a
/// listener may emit, subscribe or unsubscribe from inside its callback.
/// A listener that is re-entered while it is still running is skipped.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Rc<RefCell<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `listener` to every event of `kind`
    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&GameEvent) + 'static,
    {
        let listener: Listener = Rc::new(RefCell::new(listener));
        let mut registry = self.registry.borrow_mut();
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry
            .listeners
            .entry(kind)
            .or_default()
            .push((id, listener));
        trace!(target: "events", "Listener {:?} subscribed to {:?}", id, kind);
        id
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut registry = self.registry.borrow_mut();
        for listeners in registry.listeners.values_mut() {
            if let Some(pos) = listeners.iter().position(|(lid, _)| *lid == id) {
                listeners.remove(pos);
                return true;
            }
        }
        false
    }

    /// Deliver `event` to every current listener of its kind
    pub fn emit(&self, event: GameEvent) {
        let kind = event.kind();
        let snapshot: Vec<Listener> = {
            let registry = self.registry.borrow();
            match registry.listeners.get(&kind) {
                Some(listeners) => listeners.iter().map(|(_, l)| Rc::clone(l)).collect(),
                None => return,
            }
        };

        for listener in snapshot {
            match listener.try_borrow_mut() {
                Ok(mut callback) => (&mut *callback)(&event),
                Err(_) => {
                    warn!(target: "events", "Listener re-entered while handling {:?}, skipped", kind);
                }
            }
        }
    }

    /// Subscribe one consumer to several kinds at once
    pub fn attach<C: EventConsumer>(&self, kinds: &[EventKind], consumer: C) -> Vec<ListenerId> {
        let consumer = Rc::new(RefCell::new(consumer));
        kinds
            .iter()
            .map(|kind| {
                let consumer = Rc::clone(&consumer);
                self.on(*kind, move |event| match consumer.try_borrow_mut() {
                    Ok(mut consumer) => consumer.handle_event(event),
                    Err(_) => {
                        warn!(target: "events", "Consumer re-entered while handling {:?}, skipped", event.kind());
                    }
                })
            })
            .collect()
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.registry
            .borrow()
            .listeners
            .get(&kind)
            .map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        let total: usize = registry.listeners.values().map(Vec::len).sum();
        f.debug_struct("EventBus")
            .field("listeners", &total)
            .finish()
    }
}
