use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::player::Player;

/// Starting state for the hero player of a local session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub id: String,
    pub items: BTreeSet<String>,
    pub states: BTreeMap<String, String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            id: "hero".to_string(),
            items: BTreeSet::new(),
            states: BTreeMap::new(),
        }
    }
}

impl PlayerConfig {
    pub fn to_player(&self) -> Player {
        Player::new(self.id.clone())
            .with_items(self.items.iter().cloned())
            .with_states(self.states.clone())
    }
}
