use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

use tableau_client::{
    CanvasState, GameScene, GridCoordinate, HeadlessHost, NetworkClient, NetworkFuture, Player,
    PixelCoordinate, Widget,
};
use tableau_director::{
    AdvanceOutcome, DirectorError, DirectorSettings, DirectorSignal, DirectorState,
    ScriptedScene, ScriptsBuilder, Stage, StageReceivers, COORDINATE_LABEL_ID, POPUP_AUDIO,
    STAR_MISSION_ID,
};
use tableau_events::{Channel, EventBus, EventKind, GameEvent};

#[derive(Default)]
struct RecordingNetwork {
    calls: RefCell<Vec<String>>,
    fail: Cell<bool>,
}

impl RecordingNetwork {
    fn record(&self, call: String) -> NetworkFuture {
        self.calls.borrow_mut().push(call.clone());
        let fail = self.fail.get();
        Box::pin(async move {
            if fail {
                anyhow::bail!("{call} failed: server unreachable");
            }
            Ok(())
        })
    }
}

impl NetworkClient for RecordingNetwork {
    fn put_state(&self, key: &str, value: &str) -> NetworkFuture {
        self.record(format!("putState({key}, {value})"))
    }

    fn remove_state(&self, key: &str) -> NetworkFuture {
        self.record(format!("removeState({key})"))
    }

    fn remove_item(&self, item: &str) -> NetworkFuture {
        self.record(format!("removeItem({item})"))
    }
}

struct Harness {
    stage: Stage,
    receivers: StageReceivers,
    host: Rc<HeadlessHost>,
    network: Rc<RecordingNetwork>,
    scene: ScriptedScene,
    events: Rc<RefCell<Vec<GameEvent>>>,
    now: Instant,
}

impl Harness {
    fn new() -> Self {
        let bus = EventBus::new();
        let events = Rc::new(RefCell::new(Vec::new()));
        for kind in [
            EventKind::UiUpdate,
            EventKind::CoordinateBorderFlicker,
            EventKind::HighlightTitles,
        ] {
            let events = Rc::clone(&events);
            bus.on(kind, move |event| events.borrow_mut().push(event.clone()));
        }

        let host = Rc::new(HeadlessHost::new());
        let network = Rc::new(RecordingNetwork::default());
        let player = Player::new("hero").with_items(["apple", "key"]).into_shared();
        let (stage, receivers) = Stage::new(
            bus,
            player,
            network.clone(),
            host.clone(),
            host.clone(),
            DirectorSettings::default(),
        );

        let mut scene = GameScene::new("town", CanvasState::default(), 100);
        scene.sprites_mut().spawn("pupil", GridCoordinate::new(0, 0));

        Self {
            stage,
            receivers,
            host,
            network,
            scene: ScriptedScene::new(scene),
            events,
            now: Instant::now(),
        }
    }

    fn scripts<F>(
        &mut self,
        channel: Channel,
        auto_start: bool,
        build: F,
    ) -> Result<Option<AdvanceOutcome>, DirectorError>
    where
        F: FnOnce(&mut ScriptsBuilder<'_>) -> Result<(), DirectorError>,
    {
        self.scene
            .scripts(&self.stage, self.now, channel, auto_start, build)
    }

    fn advance(&mut self, channel: &Channel) -> Result<AdvanceOutcome, DirectorError> {
        self.scene.advance(&self.stage, self.now, channel)
    }

    fn signal(&mut self, channel: &Channel) -> Result<Option<AdvanceOutcome>, DirectorError> {
        self.scene.on_external_signal(&self.stage, self.now, channel)
    }

    fn click(&mut self) -> Result<Option<AdvanceOutcome>, DirectorError> {
        self.scene.on_click(&self.stage, self.now)
    }

    fn elapse(&mut self, by: Duration) {
        self.now += by;
    }

    fn fire_timers(&mut self) -> Vec<Option<AdvanceOutcome>> {
        let tickets = self.scene.due_timers(self.now);
        tickets
            .iter()
            .map(|ticket| {
                self.scene
                    .on_unit_completed(&self.stage, self.now, ticket)
                    .unwrap()
            })
            .collect()
    }

    fn drain_signals(&mut self) -> Vec<Option<AdvanceOutcome>> {
        let mut outcomes = Vec::new();
        while let Ok(signal) = self.receivers.signals.try_recv() {
            let outcome = match signal {
                DirectorSignal::Completed(ticket) => {
                    self.scene.on_unit_completed(&self.stage, self.now, &ticket)
                }
                DirectorSignal::External(channel) => {
                    self.scene.on_external_signal(&self.stage, self.now, &channel)
                }
            };
            outcomes.push(outcome.unwrap());
        }
        outcomes
    }

    /// Await the tasks queued so far; successful tasks complete their unit
    async fn run_tasks(&mut self) -> Vec<(String, bool)> {
        let mut queued = Vec::new();
        while let Ok(task) = self.receivers.tasks.try_recv() {
            queued.push(task);
        }

        let mut results = Vec::new();
        for task in queued {
            let ok = task.future.await.is_ok();
            if ok {
                if let Some(ticket) = task.origin {
                    self.scene
                        .on_unit_completed(&self.stage, self.now, &ticket)
                        .unwrap();
                }
            }
            results.push((task.label, ok));
        }
        results
    }

    fn flickers(&self) -> Vec<bool> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                GameEvent::CoordinateBorderFlicker { enabled } => Some(*enabled),
                _ => None,
            })
            .collect()
    }

    fn main_state(&self) -> DirectorState {
        self.scene
            .director(&Channel::Main)
            .map(|director| director.state())
            .unwrap_or(DirectorState::Idle)
    }
}

fn component(builder: &mut ScriptsBuilder<'_>, name: &str) {
    builder.widget(name, Default::default(), Some(name.to_string()), None);
}

#[test]
fn test_advance_visits_units_in_order_then_resets() {
    let mut h = Harness::new();
    h.scripts(Channel::Main, false, |s| {
        component(s, "first");
        component(s, "second");
        component(s, "third");
        Ok(())
    })
    .unwrap();
    assert_eq!(h.main_state(), DirectorState::Idle);

    assert_eq!(
        h.advance(&Channel::Main).unwrap(),
        AdvanceOutcome::Started { index: 0 }
    );
    assert_eq!(h.main_state(), DirectorState::Running { current: 0 });
    assert_eq!(
        h.advance(&Channel::Main).unwrap(),
        AdvanceOutcome::Started { index: 1 }
    );
    assert_eq!(
        h.advance(&Channel::Main).unwrap(),
        AdvanceOutcome::Started { index: 2 }
    );
    assert_eq!(h.main_state(), DirectorState::Draining);
    assert_eq!(h.advance(&Channel::Main).unwrap(), AdvanceOutcome::Finished);
    assert_eq!(h.main_state(), DirectorState::Idle);
    assert!(h.scene.scene().widgets().is_empty());

    let err = h.advance(&Channel::Main).unwrap_err();
    assert_eq!(
        err,
        DirectorError::EmptyQueue {
            channel: Channel::Main
        }
    );
}

#[test]
fn test_each_unit_is_stopped_once_right_before_the_next_starts() {
    let mut h = Harness::new();
    h.scripts(Channel::Main, true, |s| {
        s.beginner_guide();
        s.beginner_guide();
        Ok(())
    })
    .unwrap();
    assert_eq!(h.flickers(), vec![true]);

    h.advance(&Channel::Main).unwrap();
    assert_eq!(h.flickers(), vec![true, false, true]);

    h.advance(&Channel::Main).unwrap();
    assert_eq!(h.flickers(), vec![true, false, true, false]);
    assert!(h.host.overlays().is_empty());
}

#[test]
fn test_widget_ids_are_unique_per_director() {
    let mut h = Harness::new();
    h.scripts(Channel::Main, true, |s| {
        component(s, "a");
        component(s, "b");
        Ok(())
    })
    .unwrap();

    let ids: Vec<&String> = h.scene.scene().widgets().keys().collect();
    assert_eq!(ids, vec!["town-ScriptWidget-MainChannel-0"]);

    h.advance(&Channel::Main).unwrap();
    let ids: Vec<&String> = h.scene.scene().widgets().keys().collect();
    assert_eq!(ids, vec!["town-ScriptWidget-MainChannel-1"]);
}

#[test]
fn test_click_advances_only_while_gate_is_open() {
    let mut h = Harness::new();
    h.scripts(Channel::Main, true, |s| {
        component(s, "bubble");
        s.remove_item("missing", Some(GridCoordinate::new(1, 1)));
        Ok(())
    })
    .unwrap();
    assert!(h.scene.director(&Channel::Main).unwrap().responds_to_click());

    assert_eq!(h.click().unwrap(), Some(AdvanceOutcome::Started { index: 1 }));

    // Remove item does not ask for clicks and the widget's stop closed the gate
    assert!(!h.scene.director(&Channel::Main).unwrap().responds_to_click());
    assert_eq!(h.click().unwrap(), None);
    assert_eq!(h.main_state(), DirectorState::Draining);
}

#[test]
fn test_click_with_no_scripts_is_ignored() {
    let mut h = Harness::new();
    assert_eq!(h.click().unwrap(), None);
}

#[test]
fn test_gate_is_not_opened_outside_main_channel() {
    let mut h = Harness::new();
    let fireworks = Channel::Custom("Fireworks".to_string());
    h.scripts(fireworks.clone(), true, |s| {
        component(s, "sparkle");
        Ok(())
    })
    .unwrap();

    assert!(!h.scene.director(&fireworks).unwrap().responds_to_click());
    assert_eq!(h.click().unwrap(), None);
    assert_eq!(h.scene.scene().widgets().len(), 1);
}

#[test]
fn test_background_channel_defers_while_hidden_or_modal() {
    let mut h = Harness::new();
    h.host.set_window_visible(false);

    let outcome = h
        .scripts(Channel::AsyncAnimation, true, |s| {
            component(s, "sparkle");
            Ok(())
        })
        .unwrap();
    assert_eq!(outcome, Some(AdvanceOutcome::Deferred));
    assert!(!h.scene.director(&Channel::AsyncAnimation).unwrap().is_running());
    assert!(h.scene.scene().widgets().is_empty());

    h.host.set_window_visible(true);
    h.host.set_modal_visible(true);
    assert_eq!(
        h.signal(&Channel::AsyncAnimation).unwrap(),
        Some(AdvanceOutcome::Deferred)
    );

    h.host.set_modal_visible(false);
    assert_eq!(
        h.signal(&Channel::AsyncAnimation).unwrap(),
        Some(AdvanceOutcome::Started { index: 0 })
    );
    assert_eq!(h.scene.scene().widgets().len(), 1);
}

#[test]
fn test_main_channel_ignores_window_visibility() {
    let mut h = Harness::new();
    h.host.set_window_visible(false);
    let outcome = h
        .scripts(Channel::Main, true, |s| {
            component(s, "bubble");
            Ok(())
        })
        .unwrap();
    assert_eq!(outcome, Some(AdvanceOutcome::Started { index: 0 }));
}

#[test]
fn test_external_signal_for_other_channel_is_ignored() {
    let mut h = Harness::new();
    h.scripts(Channel::Main, true, |s| {
        component(s, "bubble");
        component(s, "next");
        Ok(())
    })
    .unwrap();

    assert_eq!(h.signal(&Channel::AsyncAnimation).unwrap(), None);
    assert_eq!(h.main_state(), DirectorState::Running { current: 0 });
    assert_eq!(
        h.signal(&Channel::Main).unwrap(),
        Some(AdvanceOutcome::Started { index: 1 })
    );
}

#[test]
fn test_speech_dismisses_itself_after_duration() {
    let mut h = Harness::new();
    h.scripts(Channel::Main, true, |s| {
        s.speech(|b| {
            b.speaker("pupil").content("Hello").dismiss_ms(500);
        })?;
        Ok(())
    })
    .unwrap();
    assert_eq!(h.scene.scene().widgets().len(), 1);

    h.elapse(Duration::from_millis(499));
    assert!(h.fire_timers().is_empty());

    h.elapse(Duration::from_millis(1));
    assert_eq!(h.fire_timers(), vec![Some(AdvanceOutcome::Finished)]);
    assert!(h.scene.scene().widgets().is_empty());
    assert_eq!(h.main_state(), DirectorState::Idle);
}

#[test]
fn test_speech_renders_bubble_descriptor() {
    let mut h = Harness::new();
    h.scripts(Channel::Main, true, |s| {
        s.speech(|b| {
            b.speaker_at(GridCoordinate::new(3, 4))
                .content("Welcome")
                .arg("hero")
                .arrow(false);
        })?;
        Ok(())
    })
    .unwrap();

    match h.scene.scene().widgets().values().next() {
        Some(Widget::SpeechBubble(bubble)) => {
            assert_eq!(bubble.speaker_id, None);
            assert_eq!(bubble.speaker_coordinate, Some(GridCoordinate::new(3, 4)));
            assert_eq!(bubble.content_id, "Welcome");
            assert_eq!(bubble.args, vec!["hero".to_string()]);
            assert!(!bubble.arrow);
        }
        other => panic!("expected a speech bubble, got {other:?}"),
    }
}

#[test]
fn test_click_before_dismiss_cancels_the_timer() {
    let mut h = Harness::new();
    h.scripts(Channel::Main, true, |s| {
        s.speech(|b| {
            b.speaker("pupil").content("Hello").dismiss_ms(500);
        })?;
        component(s, "after");
        Ok(())
    })
    .unwrap();
    let stale = h.scene.director(&Channel::Main).unwrap().ticket();

    h.click().unwrap();
    assert_eq!(h.scene.timers().active_count(), 0);

    h.elapse(Duration::from_secs(1));
    assert!(h.fire_timers().is_empty());

    // A late completion from the first unit must not skip the second
    assert_eq!(
        h.scene.on_unit_completed(&h.stage, h.now, &stale).unwrap(),
        None
    );
    assert_eq!(h.main_state(), DirectorState::Draining);
}

#[test]
fn test_speech_without_speaker_is_rejected_before_enqueue() {
    let mut h = Harness::new();
    let err = h
        .scripts(Channel::Main, true, |s| {
            s.put_state("seen", "true");
            s.speech(|b| {
                b.content("Hello");
            })?;
            component(s, "never");
            Ok(())
        })
        .unwrap_err();

    assert_eq!(err, DirectorError::MissingSpeaker);
    let director = h.scene.director(&Channel::Main).unwrap();
    assert_eq!(director.len(), 1);
    assert!(!director.is_running());
}

#[test]
fn test_speech_without_content_is_rejected() {
    let mut h = Harness::new();
    let err = h
        .scripts(Channel::Main, false, |s| {
            s.speech(|b| {
                b.speaker("pupil");
            })?;
            Ok(())
        })
        .unwrap_err();

    assert_eq!(err, DirectorError::MissingContent);
    assert!(h.scene.director(&Channel::Main).unwrap().is_empty());
}

#[test]
fn test_character_move_for_unknown_sprite_is_rejected() {
    let mut h = Harness::new();
    let err = h
        .scripts(Channel::Main, true, |s| {
            s.character_move("ghost", GridCoordinate::new(1, 0), || {})?;
            Ok(())
        })
        .unwrap_err();

    assert_eq!(
        err,
        DirectorError::UnknownSprite {
            id: "ghost".to_string()
        }
    );
}

#[test]
fn test_character_move_completes_on_arrival() {
    let mut h = Harness::new();
    let arrived = Rc::new(Cell::new(false));
    let flag = Rc::clone(&arrived);
    h.scripts(Channel::Main, true, |s| {
        s.character_move("pupil", GridCoordinate::new(2, 1), move || flag.set(true))?;
        component(s, "after");
        Ok(())
    })
    .unwrap();

    h.elapse(Duration::from_millis(200));
    h.scene.animate(h.now);
    assert!(!arrived.get());
    assert!(h.drain_signals().is_empty());

    h.elapse(Duration::from_millis(100));
    h.scene.animate(h.now);
    assert!(arrived.get());
    assert_eq!(
        h.drain_signals(),
        vec![Some(AdvanceOutcome::Started { index: 1 })]
    );

    let sprite = h.scene.scene().sprites().get("pupil").unwrap();
    assert_eq!(sprite.grid(), GridCoordinate::new(2, 1));
    assert_eq!(sprite.pixel(), PixelCoordinate::new(64, 32));
}

#[test]
fn test_remove_item_without_destination_completes_immediately() {
    let mut h = Harness::new();
    h.scripts(Channel::Main, true, |s| {
        s.remove_item("apple", None);
        Ok(())
    })
    .unwrap();

    assert!(!h.stage.player.borrow().has_item("apple"));
    assert!(h.events.borrow().contains(&GameEvent::UiUpdate));
    assert_eq!(*h.network.calls.borrow(), vec!["removeItem(apple)"]);
    assert!(h.host.popups().is_empty());

    assert_eq!(h.drain_signals(), vec![Some(AdvanceOutcome::Finished)]);
}

#[test]
fn test_remove_item_with_destination_waits_for_settle_delay() {
    let mut h = Harness::new();
    h.scripts(Channel::Main, true, |s| {
        s.remove_item("key", Some(GridCoordinate::new(2, 3)));
        component(s, "after");
        Ok(())
    })
    .unwrap();

    // Removed at start, not after the delay
    assert!(!h.stage.player.borrow().has_item("key"));
    assert_eq!(h.host.played_audio(), vec![POPUP_AUDIO.to_string()]);
    let popups = h.host.popups();
    assert_eq!(popups.len(), 1);
    assert_eq!(popups[0].item, "key");
    assert_eq!(popups[0].from, PixelCoordinate::new(980, 200));
    assert_eq!(popups[0].to, PixelCoordinate::new(64, 96));
    assert_eq!(popups[0].duration_secs, 3.0);
    assert!(h.drain_signals().is_empty());

    h.elapse(Duration::from_millis(2999));
    assert!(h.fire_timers().is_empty());
    assert_eq!(h.main_state(), DirectorState::Running { current: 0 });

    h.elapse(Duration::from_millis(1));
    assert_eq!(
        h.fire_timers(),
        vec![Some(AdvanceOutcome::Started { index: 1 })]
    );
}

#[tokio::test]
async fn test_remove_item_network_failure_is_ignored() {
    let mut h = Harness::new();
    h.network.fail.set(true);
    h.scripts(Channel::Main, true, |s| {
        s.remove_item("apple", None);
        Ok(())
    })
    .unwrap();

    let results = h.run_tasks().await;
    assert_eq!(results, vec![("removeItem(apple)".to_string(), false)]);
    assert_eq!(h.drain_signals(), vec![Some(AdvanceOutcome::Finished)]);
    assert!(!h.stage.player.borrow().has_item("apple"));
}

#[tokio::test]
async fn test_put_state_updates_player_after_network_call() {
    let mut h = Harness::new();
    h.scripts(Channel::Main, true, |s| {
        s.put_state("seen", "true");
        s.remove_state("seen");
        Ok(())
    })
    .unwrap();
    assert_eq!(h.stage.player.borrow().state("seen"), None);

    let results = h.run_tasks().await;
    assert_eq!(results, vec![("putState(seen, true)".to_string(), true)]);
    assert_eq!(h.stage.player.borrow().state("seen"), Some("true"));
    assert_eq!(h.main_state(), DirectorState::Draining);

    h.run_tasks().await;
    assert_eq!(h.stage.player.borrow().state("seen"), None);
    assert_eq!(h.main_state(), DirectorState::Idle);
    assert_eq!(
        *h.network.calls.borrow(),
        vec!["putState(seen, true)", "removeState(seen)"]
    );
}

#[tokio::test]
async fn test_failed_suspend_action_stalls_the_channel() {
    let mut h = Harness::new();
    h.network.fail.set(true);
    h.scripts(Channel::Main, true, |s| {
        s.put_state("seen", "true");
        component(s, "never");
        Ok(())
    })
    .unwrap();

    let results = h.run_tasks().await;
    assert_eq!(results, vec![("putState(seen, true)".to_string(), false)]);
    assert_eq!(h.stage.player.borrow().state("seen"), None);
    assert_eq!(h.main_state(), DirectorState::Running { current: 0 });
    assert!(h.scene.scene().widgets().is_empty());

    // An outside signal gets it moving again
    assert_eq!(
        h.signal(&Channel::Main).unwrap(),
        Some(AdvanceOutcome::Started { index: 1 })
    );
}

#[test]
fn test_beginner_guide_shows_and_clears_overlay() {
    let mut h = Harness::new();
    h.scripts(Channel::Main, true, |s| {
        s.beginner_guide();
        Ok(())
    })
    .unwrap();

    let overlays = h.host.overlays();
    assert_eq!(overlays.len(), 1);
    assert_eq!(overlays[0].label_id, COORDINATE_LABEL_ID);
    assert!(h.events.borrow().contains(&GameEvent::HighlightTitles {
        mission_ids: Some(vec![STAR_MISSION_ID.to_string()])
    }));
    assert!(h.scene.director(&Channel::Main).unwrap().responds_to_click());

    assert_eq!(h.click().unwrap(), Some(AdvanceOutcome::Finished));
    assert!(h.host.overlays().is_empty());
    assert!(h
        .events
        .borrow()
        .contains(&GameEvent::HighlightTitles { mission_ids: None }));
    assert!(!h.scene.director(&Channel::Main).unwrap().responds_to_click());
}

#[test]
fn test_abandon_stops_running_guide() {
    let mut h = Harness::new();
    h.scripts(Channel::Main, true, |s| {
        s.beginner_guide();
        component(s, "never");
        Ok(())
    })
    .unwrap();
    assert_eq!(h.host.overlays().len(), 1);

    h.scene.abandon_all(&h.stage, h.now);

    assert!(h.host.overlays().is_empty());
    assert_eq!(h.flickers(), vec![true, false]);
    assert_eq!(h.main_state(), DirectorState::Idle);
    assert!(h.scene.director(&Channel::Main).unwrap().is_empty());
}

#[test]
fn test_enqueue_after_finish_starts_a_new_round() {
    let mut h = Harness::new();
    h.scripts(Channel::Main, true, |s| {
        component(s, "one");
        Ok(())
    })
    .unwrap();
    h.advance(&Channel::Main).unwrap();
    assert_eq!(h.main_state(), DirectorState::Idle);

    let outcome = h
        .scripts(Channel::Main, true, |s| {
            component(s, "two");
            Ok(())
        })
        .unwrap();
    assert_eq!(outcome, Some(AdvanceOutcome::Started { index: 0 }));
    let ids: Vec<&String> = h.scene.scene().widgets().keys().collect();
    assert_eq!(ids, vec!["town-ScriptWidget-MainChannel-1"]);
}

#[test]
fn test_completion_from_replaced_scene_is_dropped() {
    let mut h = Harness::new();
    h.scripts(Channel::Main, true, |s| {
        s.speech(|b| {
            b.speaker("pupil").content("old").dismiss_ms(500);
        })?;
        Ok(())
    })
    .unwrap();
    let old_ticket = h.scene.director(&Channel::Main).unwrap().ticket();

    // Same scene id, fresh directors
    let mut fresh = GameScene::new("town", CanvasState::default(), 100);
    fresh.sprites_mut().spawn("pupil", GridCoordinate::new(0, 0));
    h.scene = ScriptedScene::new(fresh);
    h.scripts(Channel::Main, true, |s| {
        component(s, "first");
        component(s, "second");
        Ok(())
    })
    .unwrap();
    let new_ticket = h.scene.director(&Channel::Main).unwrap().ticket();
    assert_ne!(old_ticket, new_ticket);

    let outcome = h
        .scene
        .on_unit_completed(&h.stage, h.now, &old_ticket)
        .unwrap();
    assert_eq!(outcome, None);
    assert_eq!(h.main_state(), DirectorState::Running { current: 0 });
}
