/// Core event vocabulary for tableau
///
/// This crate holds the types every other crate talks in: script channels,
/// the game events published on the bus, the server-pushed delta payloads and
/// the synchronous event bus itself.
mod channel;
mod deltas;
mod event_bus;
mod game_events;

pub use channel::{ASYNC_ANIMATION_CHANNEL, Channel, MAIN_CHANNEL};
pub use deltas::{ItemsDelta, ItemsStatesUpdate, StatesDelta};
pub use event_bus::{EventBus, ListenerId};
pub use game_events::{ClockTick, EventKind, GameEvent};

// ============================================================================
// Event Consumer Trait
// ============================================================================

/// Trait for components that want to observe bus traffic as a whole
/// (loggers, debug overlays, demo drivers).
///
/// Attach one with [`EventBus::attach`].
pub trait EventConsumer: 'static {
    /// Handle an event the consumer subscribed to
    fn handle_event(&mut self, event: &GameEvent);
}
