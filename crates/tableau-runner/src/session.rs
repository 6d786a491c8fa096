// Game session: owns the scenes, the player, the bus and the clock, and
// feeds unit completions back into the directors.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use futures::future::LocalBoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use tableau_client::config::{ClockConfig, TableauConfig};
use tableau_client::{
    CanvasState, EffectHost, GameControl, GameScene, NetworkClient, SharedPlayer,
};
use tableau_director::{
    AdvanceOutcome, DirectorError, DirectorSettings, DirectorSignal, ScriptTask, ScriptedScene,
    ScriptsBuilder, Stage, StageReceivers, UnitTicket,
};
use tableau_events::{Channel, ClockTick, EventBus, EventKind, GameEvent, ListenerId};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;
use tracing::{debug, error, info, trace, warn};

use crate::clock::{ClockEvent, SessionClock};
use crate::scene_container::SceneContainer;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Director(#[from] DirectorError),
    #[error("No scene is active")]
    NoActiveScene,
}

struct TaskOutcome {
    origin: Option<UnitTicket>,
    label: String,
    result: anyhow::Result<()>,
}

/// One running game: the loaded scenes with their directors, the hero
/// player, the event bus and the clock.
///
/// Everything lives on one thread. Script units report completion through
/// the stage channels; the session drains them between callbacks so a unit
/// never re-enters its director while the director is still running it.
pub struct GameSession {
    stage: Stage,
    signals: UnboundedReceiver<DirectorSignal>,
    tasks: UnboundedReceiver<ScriptTask>,
    running: FuturesUnordered<LocalBoxFuture<'static, TaskOutcome>>,
    scenes: SceneContainer,
    clock: ClockConfig,
    move_ms_per_tile: u64,
    online: Rc<Cell<u32>>,
    started_at: Instant,
    last_frame: Instant,
    listeners: Vec<ListenerId>,
}

impl GameSession {
    pub fn new(
        config: &TableauConfig,
        bus: EventBus,
        player: SharedPlayer,
        network: Rc<dyn NetworkClient>,
        control: Rc<dyn GameControl>,
        effects: Rc<dyn EffectHost>,
    ) -> Self {
        let settings = DirectorSettings::from(&config.director);
        let (stage, StageReceivers { signals, tasks }) =
            Stage::new(bus, player, network, control, effects, settings);

        let online = Rc::new(Cell::new(0));
        let listeners = subscribe(&stage, &online);
        let now = now();

        info!(target: "session", "Session started for player {}", stage.player.borrow().id);

        Self {
            stage,
            signals,
            tasks,
            running: FuturesUnordered::new(),
            scenes: SceneContainer::new(),
            clock: config.clock.clone(),
            move_ms_per_tile: config.director.move_ms_per_tile,
            online,
            started_at: now,
            last_frame: now,
            listeners,
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn bus(&self) -> &EventBus {
        &self.stage.bus
    }

    pub fn player(&self) -> &SharedPlayer {
        &self.stage.player
    }

    pub fn scenes(&self) -> &SceneContainer {
        &self.scenes
    }

    /// Players online, as last pushed by the server
    pub fn online_count(&self) -> u32 {
        self.online.get()
    }

    pub fn elapsed_since_start(&self) -> Duration {
        now().saturating_duration_since(self.started_at)
    }

    pub fn last_frame(&self) -> Instant {
        self.last_frame
    }

    /// Number of awaited or detached script tasks still running
    pub fn pending_tasks(&self) -> usize {
        self.running.len()
    }

    /// A new empty scene whose sprites walk at the configured speed
    pub fn create_scene(&self, id: &str, canvas: CanvasState) -> GameScene {
        GameScene::new(id, canvas, self.move_ms_per_tile)
    }

    /// Load a scene. A scene already loaded under the same id is replaced
    /// and its running units are stopped.
    pub fn add_scene(&mut self, scene: GameScene) {
        debug!(target: "session", "Loaded scene {}", scene.id());
        if let Some(mut replaced) = self.scenes.insert(ScriptedScene::new(scene)) {
            debug!(target: "session", "Scene {} reloaded, abandoning its scripts", replaced.id());
            replaced.abandon_all(&self.stage, now());
        }
    }

    pub fn scene_mut(&mut self, id: &str) -> Option<&mut GameScene> {
        self.scenes.get_mut(id).map(ScriptedScene::scene_mut)
    }

    pub fn activate_scene(&mut self, id: &str) -> Result<(), SessionError> {
        self.scenes.activate(id)?;
        Ok(())
    }

    /// Queue scripts on `channel` of the active scene
    pub fn scripts<F>(
        &mut self,
        channel: Channel,
        auto_start: bool,
        build: F,
    ) -> Result<Option<AdvanceOutcome>, SessionError>
    where
        F: FnOnce(&mut ScriptsBuilder<'_>) -> Result<(), DirectorError>,
    {
        let scene = self.scenes.active_mut().ok_or(SessionError::NoActiveScene)?;
        let outcome = scene.scripts(&self.stage, now(), channel, auto_start, build)?;
        self.pump();
        Ok(outcome)
    }

    /// A click on the game canvas
    pub fn on_canvas_click(&mut self) -> Result<Option<AdvanceOutcome>, SessionError> {
        let scene = self.scenes.active_mut().ok_or(SessionError::NoActiveScene)?;
        let outcome = scene.on_click(&self.stage, now())?;
        self.pump();
        Ok(outcome)
    }

    /// One animation frame: move sprites, then announce the frame with the
    /// previous frame's timestamp
    pub fn animate(&mut self) {
        let now = now();
        if let Some(scene) = self.scenes.active_mut() {
            scene.animate(now);
        }
        self.stage.bus.emit(GameEvent::AnimationFrame {
            last_frame: self.last_frame,
        });
        self.last_frame = now;
        self.pump();
    }

    /// Publish a clock tick. The fast tick also fires due unit timers.
    pub fn emit_tick(&mut self, tick: ClockTick) {
        self.stage.bus.emit(GameEvent::Tick(tick));
        if tick == ClockTick::Fast {
            self.tick_timers();
        }
        self.pump();
    }

    /// Complete every unit whose timer is due, in every scene
    pub fn tick_timers(&mut self) {
        let now = now();
        let due: Vec<UnitTicket> = self
            .scenes
            .scenes_mut()
            .flat_map(|scene| scene.due_timers(now))
            .collect();
        for ticket in due {
            self.complete(&ticket);
        }
    }

    /// Handle every queued signal and start every queued task, until
    /// nothing new turns up
    pub fn pump(&mut self) {
        loop {
            let mut progressed = false;
            while let Ok(task) = self.tasks.try_recv() {
                self.start_task(task);
                progressed = true;
            }
            while let Ok(signal) = self.signals.try_recv() {
                self.handle_signal(signal);
                progressed = true;
            }
            if !progressed {
                break;
            }
        }
    }

    /// Drive script tasks until none are left. Clock streams do not run.
    pub async fn run_until_stalled(&mut self) {
        loop {
            self.pump();
            match self.running.next().await {
                Some(outcome) => self.finish_task(outcome),
                None => break,
            }
        }
    }

    /// Run the session loop until `shutdown` flips to true or its sender is dropped
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        let mut clock = SessionClock::new(&self.clock);
        info!(target: "session", "Session loop started");

        loop {
            self.pump();

            tokio::select! {
                event = clock.next() => match event {
                    ClockEvent::Frame => self.animate(),
                    ClockEvent::Tick(tick) => self.emit_tick(tick),
                },
                Some(outcome) = self.running.next(), if !self.running.is_empty() => {
                    self.finish_task(outcome);
                }
                Some(signal) = self.signals.recv() => self.handle_signal(signal),
                Some(task) = self.tasks.recv() => self.start_task(task),
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!(target: "session", "Session received shutdown signal");
                        break;
                    }
                }
            }
        }

        self.teardown();
        info!(
            target: "session",
            "Session loop stopped after {:.1}s",
            self.elapsed_since_start().as_secs_f64()
        );
    }

    /// Stop running units in every scene so nothing is left on screen
    pub fn teardown(&mut self) {
        let now = now();
        for scene in self.scenes.scenes_mut() {
            scene.abandon_all(&self.stage, now);
        }
        if !self.running.is_empty() {
            debug!(target: "session", "Dropping {} unfinished script tasks", self.running.len());
            self.running = FuturesUnordered::new();
        }
    }

    fn handle_signal(&mut self, signal: DirectorSignal) {
        match signal {
            DirectorSignal::Completed(ticket) => self.complete(&ticket),
            DirectorSignal::External(channel) => {
                let Some(scene) = self.scenes.active_mut() else {
                    trace!(target: "session", "Script next on {} with no active scene", channel);
                    return;
                };
                if let Err(err) = scene.on_external_signal(&self.stage, now(), &channel) {
                    error!(target: "session", "Advancing {} failed: {}", channel, err);
                }
            }
        }
    }

    fn complete(&mut self, ticket: &UnitTicket) {
        let Some(scene) = self.scenes.get_mut(&ticket.scene) else {
            warn!(target: "session", "Completion {} for unloaded scene", ticket);
            return;
        };
        if let Err(err) = scene.on_unit_completed(&self.stage, now(), ticket) {
            error!(target: "session", "Advancing after {} failed: {}", ticket, err);
        }
    }

    fn start_task(&mut self, task: ScriptTask) {
        trace!(target: "session", "Starting task {}", task.label);
        let ScriptTask {
            origin,
            label,
            future,
        } = task;
        self.running.push(Box::pin(async move {
            TaskOutcome {
                origin,
                label,
                result: future.await,
            }
        }));
    }

    fn finish_task(&mut self, outcome: TaskOutcome) {
        match (outcome.origin, outcome.result) {
            (Some(ticket), Ok(())) => self.complete(&ticket),
            (Some(ticket), Err(err)) => {
                // The unit never completes; its channel waits for an outside signal
                error!(
                    target: "session",
                    "Unhandled failure in script {} ({}): {:#}",
                    outcome.label, ticket, err
                );
            }
            (None, Ok(())) => {
                trace!(target: "session", "Task {} finished", outcome.label);
            }
            (None, Err(err)) => {
                debug!(target: "session", "Best-effort task {} failed: {:#}", outcome.label, err);
            }
        }
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        // Listeners hold bus and player handles; drop them with the session
        for id in self.listeners.drain(..) {
            self.stage.bus.off(id);
        }
    }
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

fn subscribe(stage: &Stage, online: &Rc<Cell<u32>>) -> Vec<ListenerId> {
    let bus = &stage.bus;
    let mut listeners = Vec::new();

    let signals = stage.signal_sender();
    listeners.push(bus.on(EventKind::ScriptNext, move |event| {
        if let GameEvent::ScriptNext { channel } = event {
            let _ = signals.send(DirectorSignal::External(channel.clone()));
        }
    }));

    let player = Rc::clone(&stage.player);
    let ui_bus = bus.clone();
    listeners.push(bus.on(EventKind::ItemsStatesUpdate, move |event| {
        let GameEvent::ItemsStatesUpdate(update) = event else {
            return;
        };
        match player.try_borrow_mut() {
            Ok(mut player) => {
                if !player.apply_update(update) {
                    trace!(target: "session", "Empty items/states update");
                }
            }
            Err(_) => {
                warn!(target: "session", "Player busy, update dropped: {:?}", update);
                return;
            }
        }
        // One refresh per update, empty or not
        ui_bus.emit(GameEvent::UiUpdate);
    }));

    let online = Rc::clone(online);
    listeners.push(bus.on(EventKind::OnlineCounterUpdate, move |event| {
        if let GameEvent::OnlineCounterUpdate { online: count } = event {
            online.set(*count);
        }
    }));

    listeners
}
