use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning for script units that run on their own timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// Delay between the remove-item popup starting and the queue moving on
    pub remove_item_settle_ms: u64,

    /// How long the remove-item popup flies, in seconds
    pub item_popup_secs: f64,

    /// Sprite walking speed
    pub move_ms_per_tile: u64,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            remove_item_settle_ms: 3000,
            item_popup_secs: 3.0,
            move_ms_per_tile: 150,
        }
    }
}

impl DirectorConfig {
    pub fn remove_item_settle(&self) -> Duration {
        Duration::from_millis(self.remove_item_settle_ms)
    }
}
