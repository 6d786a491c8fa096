/// Script director for tableau scenes
///
/// A scene runs one [`Director`] per [`Channel`](tableau_events::Channel).
/// Each director walks an ordered queue of [`ScriptUnit`]s, starting one unit
/// at a time and moving on only when something asks it to: a click, a
/// timer, a sprite arriving, an async action finishing or a `ScriptNext`
/// event on the bus.
///
/// Units never call back into their director directly. Completion is
/// reported as a [`DirectorSignal`] or a [`ScriptTask`] on the [`Stage`]
/// channels and the session feeds it back in once the current call has
/// returned.
pub mod builder;
pub mod context;
pub mod director;
pub mod error;
pub mod script;
pub mod scripted_scene;
pub mod stage;
pub mod timer;

pub use builder::{ScriptsBuilder, SpeechBuilder};
pub use context::{ScriptContext, ScriptEnv};
pub use director::{AdvanceOutcome, Director, DirectorState};
pub use error::DirectorError;
pub use script::{
    COORDINATE_LABEL_ID, POPUP_AUDIO, STAR_MISSION_ID, ScriptUnit, SuspendAction,
};
pub use scripted_scene::ScriptedScene;
pub use stage::{
    DirectorSettings, DirectorSignal, ScriptTask, Stage, StageReceivers, UnitTicket,
};
pub use timer::{TimerId, TimerManager};
