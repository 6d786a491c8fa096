use tableau_events::{EventBus, EventKind, GameEvent, ListenerId};
use tracing::{debug, info};

// Re-export EventConsumer from tableau-events
pub use tableau_events::EventConsumer;

/// Event consumer that logs the non-periodic bus traffic
#[derive(Debug, Default)]
pub struct LoggingConsumer {
    seen: u64,
}

impl LoggingConsumer {
    /// Everything except clock ticks, frames and UI refreshes, which fire too often to log
    pub const KINDS: [EventKind; 5] = [
        EventKind::ScriptNext,
        EventKind::ItemsStatesUpdate,
        EventKind::OnlineCounterUpdate,
        EventKind::HighlightTitles,
        EventKind::CoordinateBorderFlicker,
    ];

    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a fresh consumer to [`LoggingConsumer::KINDS`]
    pub fn attach(bus: &EventBus) -> Vec<ListenerId> {
        bus.attach(&Self::KINDS, Self::new())
    }
}

impl EventConsumer for LoggingConsumer {
    fn handle_event(&mut self, event: &GameEvent) {
        self.seen += 1;
        match event {
            GameEvent::ScriptNext { channel } => {
                debug!(target: "events", "Script next requested on {}", channel);
            }
            GameEvent::ItemsStatesUpdate(update) => {
                info!(
                    target: "events",
                    "Player update: items +{:?} -{:?}, states put {:?} remove {:?}",
                    update.items.add, update.items.remove, update.states.put, update.states.remove
                );
            }
            GameEvent::OnlineCounterUpdate { online } => {
                info!(target: "events", "{} players online", online);
            }
            GameEvent::HighlightTitles { mission_ids } => match mission_ids {
                Some(ids) => debug!(target: "events", "Highlighting missions {:?}", ids),
                None => debug!(target: "events", "Mission highlight cleared"),
            },
            GameEvent::CoordinateBorderFlicker { enabled } => {
                debug!(target: "events", "Coordinate border flicker: {}", enabled);
            }
            other => {
                debug!(target: "events", "Event #{}: {:?}", self.seen, other.kind());
            }
        }
    }
}
