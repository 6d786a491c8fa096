use std::fmt;
use std::time::Instant;

use crate::channel::Channel;
use crate::deltas::ItemsStatesUpdate;

/// The four periodic clock streams a session emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClockTick {
    /// UI tick, ~20ms
    Fast,
    /// Input poll tick, ~100ms
    Poll,
    /// Heartbeat, 1s
    Heartbeat,
    /// Slow synchronization, 60s
    SlowSync,
}

impl ClockTick {
    pub const ALL: [ClockTick; 4] = [
        ClockTick::Fast,
        ClockTick::Poll,
        ClockTick::Heartbeat,
        ClockTick::SlowSync,
    ];

    pub fn event_name(&self) -> &'static str {
        match self {
            ClockTick::Fast => "game.clock.20ms",
            ClockTick::Poll => "game.clock.100ms",
            ClockTick::Heartbeat => "game.clock.1s",
            ClockTick::SlowSync => "game.clock.60s",
        }
    }
}

impl fmt::Display for ClockTick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

/// Everything published on the session event bus
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Ask the director of `channel` in the active scene to move on
    ScriptNext { channel: Channel },
    /// Widgets or player data changed, UI should re-render
    UiUpdate,
    /// One animation frame passed; carries the previous frame's timestamp
    AnimationFrame { last_frame: Instant },
    /// Periodic clock tick
    Tick(ClockTick),
    /// Server-pushed delta for the player's items and flags
    ItemsStatesUpdate(ItemsStatesUpdate),
    /// Server-pushed number of players online
    OnlineCounterUpdate { online: u32 },
    /// Highlight mission titles, or clear the highlight with `None`
    HighlightTitles { mission_ids: Option<Vec<String>> },
    /// Toggle the flickering border around the coordinate ruler
    CoordinateBorderFlicker { enabled: bool },
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::ScriptNext { .. } => EventKind::ScriptNext,
            GameEvent::UiUpdate => EventKind::UiUpdate,
            GameEvent::AnimationFrame { .. } => EventKind::AnimationFrame,
            GameEvent::Tick(tick) => EventKind::Tick(*tick),
            GameEvent::ItemsStatesUpdate(_) => EventKind::ItemsStatesUpdate,
            GameEvent::OnlineCounterUpdate { .. } => EventKind::OnlineCounterUpdate,
            GameEvent::HighlightTitles { .. } => EventKind::HighlightTitles,
            GameEvent::CoordinateBorderFlicker { .. } => EventKind::CoordinateBorderFlicker,
        }
    }
}

/// Payload-free key that listeners subscribe on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    ScriptNext,
    UiUpdate,
    AnimationFrame,
    Tick(ClockTick),
    ItemsStatesUpdate,
    OnlineCounterUpdate,
    HighlightTitles,
    CoordinateBorderFlicker,
}
