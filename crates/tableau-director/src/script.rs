use std::fmt;
use std::time::Duration;

use futures::future::LocalBoxFuture;
use tableau_client::{GridCoordinate, ItemPopup, OverlayId, Widget};
use tableau_events::GameEvent;
use tracing::{debug, warn};

use crate::context::ScriptContext;
use crate::error::DirectorError;
use crate::stage::Stage;
use crate::timer::TimerId;

/// Mission highlighted by the beginner guide
pub const STAR_MISSION_ID: &str = "star-tableau";
/// Text id of the beginner guide arrow
pub const COORDINATE_LABEL_ID: &str = "ThisIsCoordinate";
/// Sound played when an item flies off
pub const POPUP_AUDIO: &str = "popup";

/// Builds the async action of a suspend-and-run unit when it starts
pub type SuspendAction = Box<dyn FnOnce(&Stage) -> LocalBoxFuture<'static, anyhow::Result<()>>>;

/// One step of a channel's script queue
pub enum ScriptUnit {
    DisplayWidget(DisplayWidget),
    CharacterMove(CharacterMove),
    SuspendAndRun(SuspendAndRun),
    RemoveItem(RemoveItem),
    BeginnerGuide(BeginnerGuide),
}

impl ScriptUnit {
    pub fn display_widget(
        id: impl Into<String>,
        widget: Widget,
        label: Option<String>,
        dismiss: Option<Duration>,
    ) -> Self {
        ScriptUnit::DisplayWidget(DisplayWidget {
            id: id.into(),
            widget,
            label,
            dismiss: dismiss.filter(|d| !d.is_zero()),
            dismiss_timer: None,
        })
    }

    pub fn character_move(
        character_id: impl Into<String>,
        destination: GridCoordinate,
        callback: Box<dyn FnOnce()>,
    ) -> Self {
        ScriptUnit::CharacterMove(CharacterMove {
            character_id: character_id.into(),
            destination,
            callback: Some(callback),
        })
    }

    pub fn suspend_and_run(label: impl Into<String>, action: SuspendAction) -> Self {
        ScriptUnit::SuspendAndRun(SuspendAndRun {
            label: label.into(),
            action: Some(action),
        })
    }

    pub fn remove_item(item: impl Into<String>, destination: Option<GridCoordinate>) -> Self {
        ScriptUnit::RemoveItem(RemoveItem {
            item: item.into(),
            destination,
            settle_timer: None,
        })
    }

    pub fn beginner_guide() -> Self {
        ScriptUnit::BeginnerGuide(BeginnerGuide { arrow: None })
    }

    pub fn start(&mut self, ctx: &mut ScriptContext<'_, '_>) -> Result<(), DirectorError> {
        match self {
            ScriptUnit::DisplayWidget(unit) => unit.start(ctx),
            ScriptUnit::CharacterMove(unit) => unit.start(ctx)?,
            ScriptUnit::SuspendAndRun(unit) => unit.start(ctx),
            ScriptUnit::RemoveItem(unit) => unit.start(ctx),
            ScriptUnit::BeginnerGuide(unit) => unit.start(ctx),
        }
        Ok(())
    }

    /// Clean up after the unit. Most units have nothing to undo.
    pub fn stop(&mut self, ctx: &mut ScriptContext<'_, '_>) {
        match self {
            ScriptUnit::DisplayWidget(unit) => unit.stop(ctx),
            ScriptUnit::RemoveItem(unit) => unit.stop(ctx),
            ScriptUnit::BeginnerGuide(unit) => unit.stop(ctx),
            ScriptUnit::CharacterMove(_) | ScriptUnit::SuspendAndRun(_) => {}
        }
    }
}

impl fmt::Display for ScriptUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptUnit::DisplayWidget(unit) => {
                f.write_str(unit.label.as_deref().unwrap_or(&unit.id))
            }
            ScriptUnit::CharacterMove(unit) => write!(
                f,
                "CharacterMove({} -> ({}, {}))",
                unit.character_id, unit.destination.x, unit.destination.y
            ),
            ScriptUnit::SuspendAndRun(unit) => write!(f, "SuspendAndRun({})", unit.label),
            ScriptUnit::RemoveItem(unit) => write!(f, "RemoveItem({})", unit.item),
            ScriptUnit::BeginnerGuide(_) => f.write_str("BeginnerGuide"),
        }
    }
}

impl fmt::Debug for ScriptUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptUnit::DisplayWidget(unit) => f
                .debug_struct("DisplayWidget")
                .field("id", &unit.id)
                .field("label", &unit.label)
                .field("dismiss", &unit.dismiss)
                .finish(),
            ScriptUnit::CharacterMove(unit) => f
                .debug_struct("CharacterMove")
                .field("character_id", &unit.character_id)
                .field("destination", &unit.destination)
                .finish(),
            ScriptUnit::SuspendAndRun(unit) => f
                .debug_struct("SuspendAndRun")
                .field("label", &unit.label)
                .finish(),
            ScriptUnit::RemoveItem(unit) => f
                .debug_struct("RemoveItem")
                .field("item", &unit.item)
                .field("destination", &unit.destination)
                .finish(),
            ScriptUnit::BeginnerGuide(unit) => f
                .debug_struct("BeginnerGuide")
                .field("arrow", &unit.arrow)
                .finish(),
        }
    }
}

/// Shows a widget in the scene until the unit is stopped
pub struct DisplayWidget {
    id: String,
    widget: Widget,
    label: Option<String>,
    dismiss: Option<Duration>,
    dismiss_timer: Option<TimerId>,
}

impl DisplayWidget {
    pub fn id(&self) -> &str {
        &self.id
    }

    fn start(&mut self, ctx: &mut ScriptContext<'_, '_>) {
        ctx.respond_to_click(true);
        ctx.scene().insert_widget(self.id.clone(), self.widget.clone());
        ctx.request_ui_update();

        if let Some(dismiss) = self.dismiss {
            self.dismiss_timer = Some(ctx.schedule_completion(dismiss, "widget dismiss"));
        }
    }

    fn stop(&mut self, ctx: &mut ScriptContext<'_, '_>) {
        ctx.respond_to_click(false);
        if let Some(timer) = self.dismiss_timer.take() {
            ctx.cancel_timer(timer);
        }
        ctx.scene().remove_widget(&self.id);
        ctx.request_ui_update();
    }
}

/// Walks a character to a tile. Completes when the sprite arrives.
pub struct CharacterMove {
    character_id: String,
    destination: GridCoordinate,
    callback: Option<Box<dyn FnOnce()>>,
}

impl CharacterMove {
    fn start(&mut self, ctx: &mut ScriptContext<'_, '_>) -> Result<(), DirectorError> {
        let callback = self.callback.take();
        let complete = ctx.completion_callback();
        let now = ctx.now();
        let moved = ctx.scene().sprites_mut().move_to(
            &self.character_id,
            self.destination,
            now,
            Box::new(move || {
                if let Some(callback) = callback {
                    callback();
                }
                complete();
            }),
        );

        if moved {
            Ok(())
        } else {
            Err(DirectorError::UnknownSprite {
                id: self.character_id.clone(),
            })
        }
    }
}

/// Runs an async action and completes when it succeeds
pub struct SuspendAndRun {
    label: String,
    action: Option<SuspendAction>,
}

impl SuspendAndRun {
    fn start(&mut self, ctx: &mut ScriptContext<'_, '_>) {
        match self.action.take() {
            Some(action) => {
                let future = action(ctx.stage());
                ctx.run_then_complete(self.label.clone(), future);
            }
            None => {
                warn!(target: "director", "Action {} already ran, completing", self.label);
                ctx.complete_now();
            }
        }
    }
}

/// Takes an item away from the player, optionally with a popup flying to a tile
pub struct RemoveItem {
    item: String,
    destination: Option<GridCoordinate>,
    settle_timer: Option<TimerId>,
}

impl RemoveItem {
    fn start(&mut self, ctx: &mut ScriptContext<'_, '_>) {
        let stage = ctx.stage();
        match stage.player.try_borrow_mut() {
            Ok(mut player) => {
                if !player.remove_item(&self.item) {
                    debug!(target: "director", "Player did not hold {}", self.item);
                }
            }
            Err(_) => warn!(target: "director", "Player busy, {} kept locally", self.item),
        }
        ctx.request_ui_update();
        ctx.fire_and_forget(
            format!("removeItem({})", self.item),
            stage.network.remove_item(&self.item),
        );

        let Some(destination) = self.destination else {
            ctx.complete_now();
            return;
        };

        stage.effects.play_audio(POPUP_AUDIO);
        let canvas = *ctx.scene().canvas();
        stage.effects.item_popup(ItemPopup {
            item: self.item.clone(),
            from: canvas.items_box(),
            to: canvas.grid_to_container(destination),
            duration_secs: stage.settings.item_popup_secs,
        });
        self.settle_timer =
            Some(ctx.schedule_completion(stage.settings.remove_item_settle, "item popup settle"));
    }

    fn stop(&mut self, ctx: &mut ScriptContext<'_, '_>) {
        if let Some(timer) = self.settle_timer.take() {
            ctx.cancel_timer(timer);
        }
    }
}

/// Onboarding overlay: an arrow at the coordinate ruler and a highlighted mission
pub struct BeginnerGuide {
    arrow: Option<OverlayId>,
}

impl BeginnerGuide {
    fn start(&mut self, ctx: &mut ScriptContext<'_, '_>) {
        ctx.respond_to_click(true);
        let at = ctx.scene().canvas().ui_origin;
        self.arrow = Some(ctx.stage().effects.show_arrow(at, COORDINATE_LABEL_ID));
        ctx.emit(GameEvent::CoordinateBorderFlicker { enabled: true });
        ctx.emit(GameEvent::HighlightTitles {
            mission_ids: Some(vec![STAR_MISSION_ID.to_string()]),
        });
    }

    fn stop(&mut self, ctx: &mut ScriptContext<'_, '_>) {
        ctx.respond_to_click(false);
        ctx.emit(GameEvent::CoordinateBorderFlicker { enabled: false });
        ctx.emit(GameEvent::HighlightTitles { mission_ids: None });
        if let Some(arrow) = self.arrow.take() {
            ctx.stage().effects.remove_overlay(arrow);
        }
    }
}
