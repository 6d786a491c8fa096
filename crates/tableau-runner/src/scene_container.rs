use std::collections::BTreeMap;

use tableau_director::{DirectorError, ScriptedScene};
use tracing::info;

/// Loaded scenes keyed by map id. At most one is active at a time.
#[derive(Debug, Default)]
pub struct SceneContainer {
    scenes: BTreeMap<String, ScriptedScene>,
    active: Option<String>,
}

impl SceneContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scene, replacing any scene with the same id
    pub fn insert(&mut self, scene: ScriptedScene) -> Option<ScriptedScene> {
        self.scenes.insert(scene.id().to_string(), scene)
    }

    pub fn activate(&mut self, id: &str) -> Result<(), DirectorError> {
        if !self.scenes.contains_key(id) {
            return Err(DirectorError::UnknownScene { id: id.to_string() });
        }
        if self.active.as_deref() != Some(id) {
            info!(target: "session", "Switching to scene {}", id);
            self.active = Some(id.to_string());
        }
        Ok(())
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active.as_deref() == Some(id)
    }

    pub fn active(&self) -> Option<&ScriptedScene> {
        self.active.as_ref().and_then(|id| self.scenes.get(id))
    }

    pub fn active_mut(&mut self) -> Option<&mut ScriptedScene> {
        let id = self.active.as_ref()?;
        self.scenes.get_mut(id)
    }

    pub fn get(&self, id: &str) -> Option<&ScriptedScene> {
        self.scenes.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ScriptedScene> {
        self.scenes.get_mut(id)
    }

    pub fn scenes_mut(&mut self) -> impl Iterator<Item = &mut ScriptedScene> {
        self.scenes.values_mut()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}
