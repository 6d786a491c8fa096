use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Set-style change to the player's items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsDelta {
    #[serde(default)]
    pub add: Vec<String>,
    #[serde(default)]
    pub remove: Vec<String>,
}

impl ItemsDelta {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// Map-style change to the player's string flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatesDelta {
    #[serde(default)]
    pub put: BTreeMap<String, String>,
    #[serde(default)]
    pub remove: Vec<String>,
}

impl StatesDelta {
    pub fn is_empty(&self) -> bool {
        self.put.is_empty() && self.remove.is_empty()
    }
}

/// Server push describing what changed on the player after a mission,
/// challenge or any other server-side transaction.
///
/// Items and states are applied as two separate batches, items first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsStatesUpdate {
    #[serde(default)]
    pub items: ItemsDelta,
    #[serde(default)]
    pub states: StatesDelta,
}

impl ItemsStatesUpdate {
    pub fn add_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items.add.extend(items.into_iter().map(Into::into));
        self
    }

    pub fn remove_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items.remove.extend(items.into_iter().map(Into::into));
        self
    }

    pub fn put_state(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.states.put.insert(key.into(), value.into());
        self
    }

    pub fn remove_state(mut self, key: impl Into<String>) -> Self {
        self.states.remove.push(key.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.states.is_empty()
    }
}
