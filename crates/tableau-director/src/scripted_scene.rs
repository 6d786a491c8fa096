use std::collections::BTreeMap;
use std::time::Instant;

use tableau_client::GameScene;
use tableau_events::Channel;
use tracing::trace;

use crate::builder::ScriptsBuilder;
use crate::context::ScriptEnv;
use crate::director::{AdvanceOutcome, Director};
use crate::error::DirectorError;
use crate::stage::{Stage, UnitTicket};
use crate::timer::TimerManager;

/// A scene together with its per-channel directors and their timers
#[derive(Debug)]
pub struct ScriptedScene {
    scene: GameScene,
    directors: BTreeMap<Channel, Director>,
    timers: TimerManager,
}

impl ScriptedScene {
    pub fn new(scene: GameScene) -> Self {
        Self {
            scene,
            directors: BTreeMap::new(),
            timers: TimerManager::new(),
        }
    }

    pub fn id(&self) -> &str {
        self.scene.id()
    }

    pub fn scene(&self) -> &GameScene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut GameScene {
        &mut self.scene
    }

    pub fn director(&self, channel: &Channel) -> Option<&Director> {
        self.directors.get(channel)
    }

    pub fn timers(&self) -> &TimerManager {
        &self.timers
    }

    /// Queue scripts on `channel`, creating its director on first use
    pub fn scripts<F>(
        &mut self,
        stage: &Stage,
        now: Instant,
        channel: Channel,
        auto_start: bool,
        build: F,
    ) -> Result<Option<AdvanceOutcome>, DirectorError>
    where
        F: FnOnce(&mut ScriptsBuilder<'_>) -> Result<(), DirectorError>,
    {
        let scene_id = self.scene.id().to_string();
        let director = self
            .directors
            .entry(channel.clone())
            .or_insert_with(|| Director::new(scene_id, channel));
        let mut env = ScriptEnv {
            scene: &mut self.scene,
            timers: &mut self.timers,
            stage,
            now,
        };
        director.run_queue(&mut env, auto_start, build)
    }

    /// Advance `channel` directly
    pub fn advance(
        &mut self,
        stage: &Stage,
        now: Instant,
        channel: &Channel,
    ) -> Result<AdvanceOutcome, DirectorError> {
        let Some(director) = self.directors.get_mut(channel) else {
            return Err(DirectorError::EmptyQueue {
                channel: channel.clone(),
            });
        };
        let mut env = ScriptEnv {
            scene: &mut self.scene,
            timers: &mut self.timers,
            stage,
            now,
        };
        director.advance(&mut env)
    }

    /// `ScriptNext` for this scene. Callers only deliver it while the scene is active.
    pub fn on_external_signal(
        &mut self,
        stage: &Stage,
        now: Instant,
        channel: &Channel,
    ) -> Result<Option<AdvanceOutcome>, DirectorError> {
        let Some(director) = self.directors.get_mut(channel) else {
            trace!(target: "director", "No director for {} in {}", channel, self.scene.id());
            return Ok(None);
        };
        let mut env = ScriptEnv {
            scene: &mut self.scene,
            timers: &mut self.timers,
            stage,
            now,
        };
        director.on_external_advance_signal(channel, &mut env)
    }

    /// Canvas click. Only the main channel listens for clicks.
    pub fn on_click(
        &mut self,
        stage: &Stage,
        now: Instant,
    ) -> Result<Option<AdvanceOutcome>, DirectorError> {
        let Some(director) = self.directors.get_mut(&Channel::Main) else {
            return Ok(None);
        };
        let mut env = ScriptEnv {
            scene: &mut self.scene,
            timers: &mut self.timers,
            stage,
            now,
        };
        director.on_click(&mut env)
    }

    pub fn on_unit_completed(
        &mut self,
        stage: &Stage,
        now: Instant,
        ticket: &UnitTicket,
    ) -> Result<Option<AdvanceOutcome>, DirectorError> {
        if ticket.scene != self.scene.id() {
            return Ok(None);
        }
        let Some(director) = self.directors.get_mut(&ticket.channel) else {
            return Ok(None);
        };
        let mut env = ScriptEnv {
            scene: &mut self.scene,
            timers: &mut self.timers,
            stage,
            now,
        };
        director.on_unit_completed(ticket, &mut env)
    }

    /// Tickets of units whose timers are due at `now`
    pub fn due_timers(&mut self, now: Instant) -> Vec<UnitTicket> {
        self.timers
            .tick(now)
            .into_iter()
            .map(|(id, ticket, reason)| {
                trace!(target: "director", "Timer {:?} ({}) fired for {}", id, reason, ticket);
                ticket
            })
            .collect()
    }

    /// Per-frame animation update of the scene
    pub fn animate(&mut self, now: Instant) {
        self.scene.animate(now);
    }

    /// Stop every running unit and drop all queues
    pub fn abandon_all(&mut self, stage: &Stage, now: Instant) {
        let mut env = ScriptEnv {
            scene: &mut self.scene,
            timers: &mut self.timers,
            stage,
            now,
        };
        for director in self.directors.values_mut() {
            director.abandon(&mut env);
        }
    }
}
