use std::time::{Duration, Instant};

use futures::future::LocalBoxFuture;
use tableau_client::{ArrivalCallback, GameScene};
use tableau_events::{Channel, GameEvent};

use crate::stage::{DirectorSignal, ScriptTask, Stage, UnitTicket};
use crate::timer::{TimerId, TimerManager};

/// What a director works against for the duration of one call: the scene
/// it belongs to, that scene's timers and the session handles
pub struct ScriptEnv<'e> {
    pub scene: &'e mut GameScene,
    pub timers: &'e mut TimerManager,
    pub stage: &'e Stage,
    pub now: Instant,
}

/// Handed to a unit's `start` and `stop`
pub struct ScriptContext<'a, 'e> {
    env: &'a mut ScriptEnv<'e>,
    channel: &'a Channel,
    respond_to_click: &'a mut bool,
    ticket: UnitTicket,
}

impl<'a, 'e> ScriptContext<'a, 'e> {
    pub(crate) fn new(
        env: &'a mut ScriptEnv<'e>,
        channel: &'a Channel,
        respond_to_click: &'a mut bool,
        ticket: UnitTicket,
    ) -> Self {
        Self {
            env,
            channel,
            respond_to_click,
            ticket,
        }
    }

    pub fn channel(&self) -> &Channel {
        self.channel
    }

    pub fn ticket(&self) -> &UnitTicket {
        &self.ticket
    }

    pub fn now(&self) -> Instant {
        self.env.now
    }

    pub fn stage(&self) -> &'e Stage {
        self.env.stage
    }

    pub fn scene(&mut self) -> &mut GameScene {
        &mut *self.env.scene
    }

    /// Let clicks on the canvas advance the queue. Ignored outside the main channel.
    pub fn respond_to_click(&mut self, enabled: bool) {
        if self.channel.is_main() {
            *self.respond_to_click = enabled;
        }
    }

    pub fn emit(&self, event: GameEvent) {
        self.env.stage.bus.emit(event);
    }

    pub fn request_ui_update(&self) {
        self.emit(GameEvent::UiUpdate);
    }

    /// Complete this unit once `delay` has passed
    pub fn schedule_completion(&mut self, delay: Duration, reason: &str) -> TimerId {
        self.env
            .timers
            .schedule(self.env.now, delay, self.ticket.clone(), reason)
    }

    pub fn cancel_timer(&mut self, id: TimerId) -> bool {
        self.env.timers.cancel(id)
    }

    /// Complete this unit as soon as the current call returns
    pub fn complete_now(&self) {
        self.env
            .stage
            .signal(DirectorSignal::Completed(self.ticket.clone()));
    }

    /// Callback that completes this unit when invoked, for collaborators
    /// that report back later (sprite arrival)
    pub fn completion_callback(&self) -> ArrivalCallback {
        let sender = self.env.stage.signal_sender();
        let ticket = self.ticket.clone();
        Box::new(move || {
            // A closed channel means the session ended; nothing left to complete
            let _ = sender.send(DirectorSignal::Completed(ticket));
        })
    }

    /// Run `future` and complete this unit when it succeeds
    pub fn run_then_complete(
        &self,
        label: impl Into<String>,
        future: LocalBoxFuture<'static, anyhow::Result<()>>,
    ) {
        self.env.stage.spawn(ScriptTask {
            origin: Some(self.ticket.clone()),
            label: label.into(),
            future,
        });
    }

    /// Run `future` without tying it to any unit; its result is ignored
    pub fn fire_and_forget(
        &self,
        label: impl Into<String>,
        future: LocalBoxFuture<'static, anyhow::Result<()>>,
    ) {
        self.env.stage.spawn(ScriptTask {
            origin: None,
            label: label.into(),
            future,
        });
    }
}
