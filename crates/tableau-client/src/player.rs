use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use tableau_events::ItemsStatesUpdate;
use tracing::debug;

/// The hero player's mutable state, shared inside one session
pub type SharedPlayer = Rc<RefCell<Player>>;

/// The hero player: a set of item ids and a string-keyed flag map.
///
/// Only two kinds of writers touch this: script units that mirror their
/// change to the network client, and server-pushed [`ItemsStatesUpdate`]s.
/// Everything runs on the session thread so no lock is involved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    #[serde(default)]
    items: BTreeSet<String>,
    #[serde(default)]
    states: BTreeMap<String, String>,
}

impl Player {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            items: BTreeSet::new(),
            states: BTreeMap::new(),
        }
    }

    pub fn with_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items.extend(items.into_iter().map(Into::into));
        self
    }

    pub fn with_states<I, K, V>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.states
            .extend(states.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn into_shared(self) -> SharedPlayer {
        Rc::new(RefCell::new(self))
    }

    pub fn items(&self) -> &BTreeSet<String> {
        &self.items
    }

    pub fn has_item(&self, item: &str) -> bool {
        self.items.contains(item)
    }

    pub fn states(&self) -> &BTreeMap<String, String> {
        &self.states
    }

    pub fn state(&self, key: &str) -> Option<&str> {
        self.states.get(key).map(String::as_str)
    }

    /// Returns false if the item was not held
    pub fn remove_item(&mut self, item: &str) -> bool {
        self.items.remove(item)
    }

    pub fn put_state(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.states.insert(key.into(), value.into());
    }

    pub fn remove_state(&mut self, key: &str) -> Option<String> {
        self.states.remove(key)
    }

    /// Apply a server-pushed delta.
    ///
    /// Items are rebuilt into a fresh set and swapped in as one batch, then
    /// flags are put and removed. Adding a held item or removing a missing
    /// one is a no-op. Returns whether either batch had anything in it.
    pub fn apply_update(&mut self, update: &ItemsStatesUpdate) -> bool {
        if !update.items.is_empty() {
            let mut items = self.items.clone();
            for item in &update.items.add {
                items.insert(item.clone());
            }
            for item in &update.items.remove {
                items.remove(item);
            }
            debug!(
                target: "session",
                "Items update for {}: +{:?} -{:?}",
                self.id, update.items.add, update.items.remove
            );
            self.items = items;
        }

        if !update.states.is_empty() {
            for (key, value) in &update.states.put {
                self.states.insert(key.clone(), value.clone());
            }
            for key in &update.states.remove {
                self.states.remove(key);
            }
        }

        !update.is_empty()
    }
}
