use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Periods of the session's clock streams, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// UI tick (default: 20)
    pub fast_ms: u64,

    /// Input poll tick (default: 100)
    pub poll_ms: u64,

    /// Heartbeat tick (default: 1000)
    pub heartbeat_ms: u64,

    /// Slow synchronization tick (default: 60000)
    pub slow_sync_ms: u64,

    /// Animation frame period when there is no display to pace frames (default: 16)
    pub frame_ms: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            fast_ms: 20,
            poll_ms: 100,
            heartbeat_ms: 1000,
            slow_sync_ms: 60_000,
            frame_ms: 16,
        }
    }
}

impl ClockConfig {
    pub fn fast(&self) -> Duration {
        Duration::from_millis(self.fast_ms.max(1))
    }

    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(1))
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms.max(1))
    }

    pub fn slow_sync(&self) -> Duration {
        Duration::from_millis(self.slow_sync_ms.max(1))
    }

    pub fn frame(&self) -> Duration {
        Duration::from_millis(self.frame_ms.max(1))
    }
}
