use tableau_events::Channel;
use tracing::{debug, trace};

use crate::builder::ScriptsBuilder;
use crate::context::{ScriptContext, ScriptEnv};
use crate::error::DirectorError;
use crate::script::ScriptUnit;
use crate::stage::UnitTicket;

/// Where a director is in its queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorState {
    /// Nothing started
    Idle,
    /// Unit `current` is running and more units follow
    Running { current: usize },
    /// The last unit is running; the next advance resets the queue
    Draining,
}

/// Result of one [`Director::advance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Background channel held back; nothing changed
    Deferred,
    /// Unit `index` was started
    Started { index: usize },
    /// The queue was exhausted and cleared
    Finished,
}

/// Runs the script queue of one channel in one scene.
///
/// `cursor` is `None` while idle, otherwise the index of the next unit to
/// start (so the running unit sits at `cursor - 1`). Only one unit is
/// started at a time and the previous one is stopped right before the next
/// one starts.
#[derive(Debug)]
pub struct Director {
    scene_id: String,
    channel: Channel,
    scripts: Vec<ScriptUnit>,
    cursor: Option<usize>,
    respond_to_click: bool,
    counter: u64,
    generation: u64,
}

impl Director {
    pub fn new(scene_id: impl Into<String>, channel: Channel) -> Self {
        Self {
            scene_id: scene_id.into(),
            channel,
            scripts: Vec::new(),
            cursor: None,
            respond_to_click: false,
            counter: 0,
            generation: 0,
        }
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn scene_id(&self) -> &str {
        &self.scene_id
    }

    pub fn is_running(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn responds_to_click(&self) -> bool {
        self.respond_to_click
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    pub fn state(&self) -> DirectorState {
        match self.cursor {
            None => DirectorState::Idle,
            Some(cursor) if cursor >= self.scripts.len() => DirectorState::Draining,
            Some(cursor) => DirectorState::Running {
                current: cursor.saturating_sub(1),
            },
        }
    }

    /// The most recently started unit, if it has not been stopped yet
    pub fn current_unit(&self) -> Option<&ScriptUnit> {
        self.cursor
            .and_then(|cursor| cursor.checked_sub(1))
            .and_then(|index| self.scripts.get(index))
    }

    /// Ticket of the unit currently running
    pub fn ticket(&self) -> UnitTicket {
        UnitTicket {
            scene: self.scene_id.clone(),
            channel: self.channel.clone(),
            generation: self.generation,
        }
    }

    /// Unique id for a widget shown by this director
    pub fn next_widget_id(&mut self) -> String {
        let id = format!(
            "{}-ScriptWidget-{}-{}",
            self.scene_id, self.channel, self.counter
        );
        self.counter += 1;
        id
    }

    /// Append a unit. Never starts anything by itself.
    pub fn enqueue(&mut self, unit: ScriptUnit) {
        self.scripts.push(unit);
    }

    /// Fill the queue through `build`, then start it when `auto_start` is set.
    ///
    /// A unit rejected by the builder aborts the rest of `build`; units
    /// enqueued before it stay in the queue.
    pub fn run_queue<F>(
        &mut self,
        env: &mut ScriptEnv<'_>,
        auto_start: bool,
        build: F,
    ) -> Result<Option<AdvanceOutcome>, DirectorError>
    where
        F: FnOnce(&mut ScriptsBuilder<'_>) -> Result<(), DirectorError>,
    {
        {
            let mut builder = ScriptsBuilder::new(self, &*env.scene);
            build(&mut builder)?;
        }

        if auto_start {
            self.advance(env).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Stop the running unit and start the next one, or reset the queue
    /// once every unit has run
    pub fn advance(&mut self, env: &mut ScriptEnv<'_>) -> Result<AdvanceOutcome, DirectorError> {
        if self.scripts.is_empty() {
            return Err(DirectorError::EmptyQueue {
                channel: self.channel.clone(),
            });
        }

        if self.channel.is_background()
            && (!env.stage.control.is_window_visible() || env.stage.control.is_modal_visible())
        {
            debug!(target: "director", "Channel {} deferred, game not in view", self.channel);
            return Ok(AdvanceOutcome::Deferred);
        }

        let cursor = self.cursor.unwrap_or(0);
        self.generation = env.stage.next_generation();

        if cursor > 0 {
            self.stop_unit(cursor - 1, env);
        }

        if cursor == self.scripts.len() {
            debug!(target: "director", "Scripts of {} finished", self.channel);
            self.reset();
            return Ok(AdvanceOutcome::Finished);
        }

        self.cursor = Some(cursor + 1);
        let ticket = self.ticket();
        let unit = &mut self.scripts[cursor];
        debug!(target: "director", "Running script {}:{}: {}", self.channel, cursor, unit);

        let mut ctx = ScriptContext::new(env, &self.channel, &mut self.respond_to_click, ticket);
        unit.start(&mut ctx)?;
        Ok(AdvanceOutcome::Started { index: cursor })
    }

    /// Route a `ScriptNext` for `channel`. Other channels and empty queues are ignored.
    pub fn on_external_advance_signal(
        &mut self,
        channel: &Channel,
        env: &mut ScriptEnv<'_>,
    ) -> Result<Option<AdvanceOutcome>, DirectorError> {
        if *channel != self.channel || self.scripts.is_empty() {
            return Ok(None);
        }
        self.advance(env).map(Some)
    }

    /// A click on the canvas advances only while a unit asked for clicks
    pub fn on_click(
        &mut self,
        env: &mut ScriptEnv<'_>,
    ) -> Result<Option<AdvanceOutcome>, DirectorError> {
        if !self.is_running() || !self.respond_to_click {
            return Ok(None);
        }
        self.advance(env).map(Some)
    }

    /// A unit reported it is done. Dropped unless it is still the current unit.
    pub fn on_unit_completed(
        &mut self,
        ticket: &UnitTicket,
        env: &mut ScriptEnv<'_>,
    ) -> Result<Option<AdvanceOutcome>, DirectorError> {
        if !self.is_running() || ticket.generation != self.generation {
            trace!(
                target: "director",
                "Stale completion {} dropped, {} is at generation {}",
                ticket, self.channel, self.generation
            );
            return Ok(None);
        }
        self.advance(env).map(Some)
    }

    /// Stop the running unit, if any, and drop the whole queue
    pub fn abandon(&mut self, env: &mut ScriptEnv<'_>) {
        if let Some(index) = self.cursor.and_then(|cursor| cursor.checked_sub(1)) {
            if index < self.scripts.len() {
                self.stop_unit(index, env);
            }
        }
        if !self.scripts.is_empty() {
            debug!(
                target: "director",
                "Abandoned {} scripts of {}",
                self.scripts.len(),
                self.channel
            );
        }
        self.generation = env.stage.next_generation();
        self.reset();
    }

    fn stop_unit(&mut self, index: usize, env: &mut ScriptEnv<'_>) {
        let ticket = self.ticket();
        let unit = &mut self.scripts[index];
        trace!(target: "director", "Stopping script {}:{}: {}", self.channel, index, unit);

        let mut ctx = ScriptContext::new(env, &self.channel, &mut self.respond_to_click, ticket);
        unit.stop(&mut ctx);
    }

    fn reset(&mut self) {
        self.scripts.clear();
        self.cursor = None;
    }
}
