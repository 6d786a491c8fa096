use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use futures::future::LocalBoxFuture;
use tableau_client::config::DirectorConfig;
use tableau_client::{EffectHost, GameControl, NetworkClient, SharedPlayer};
use tableau_events::{Channel, EventBus};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::warn;

/// Timing for units that pace themselves
#[derive(Debug, Clone, PartialEq)]
pub struct DirectorSettings {
    pub remove_item_settle: Duration,
    pub item_popup_secs: f64,
}

impl Default for DirectorSettings {
    fn default() -> Self {
        Self::from(&DirectorConfig::default())
    }
}

impl From<&DirectorConfig> for DirectorSettings {
    fn from(config: &DirectorConfig) -> Self {
        Self {
            remove_item_settle: config.remove_item_settle(),
            item_popup_secs: config.item_popup_secs,
        }
    }
}

/// Names one started unit: the scene, the channel and the session-wide
/// generation drawn when the unit started.
///
/// A completion carrying an outdated ticket belongs to a unit that is no
/// longer current and is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitTicket {
    pub scene: String,
    pub channel: Channel,
    pub generation: u64,
}

impl fmt::Display for UnitTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.scene, self.channel, self.generation)
    }
}

/// Requests for the session to move a director on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectorSignal {
    /// The unit named by the ticket finished on its own
    Completed(UnitTicket),
    /// Something outside the scripts asked the channel to advance
    External(Channel),
}

/// Async work started by a unit
pub struct ScriptTask {
    /// Unit to complete once the work succeeds. `None` for fire-and-forget work.
    pub origin: Option<UnitTicket>,
    pub label: String,
    pub future: LocalBoxFuture<'static, anyhow::Result<()>>,
}

impl fmt::Debug for ScriptTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptTask")
            .field("origin", &self.origin)
            .field("label", &self.label)
            .finish()
    }
}

/// Receiving halves of the [`Stage`] channels, drained by the session
#[derive(Debug)]
pub struct StageReceivers {
    pub signals: UnboundedReceiver<DirectorSignal>,
    pub tasks: UnboundedReceiver<ScriptTask>,
}

/// Session-wide handles every script unit may use
pub struct Stage {
    pub bus: EventBus,
    pub player: SharedPlayer,
    pub network: Rc<dyn NetworkClient>,
    pub control: Rc<dyn GameControl>,
    pub effects: Rc<dyn EffectHost>,
    pub settings: DirectorSettings,
    generations: Cell<u64>,
    signal_tx: UnboundedSender<DirectorSignal>,
    task_tx: UnboundedSender<ScriptTask>,
}

impl Stage {
    pub fn new(
        bus: EventBus,
        player: SharedPlayer,
        network: Rc<dyn NetworkClient>,
        control: Rc<dyn GameControl>,
        effects: Rc<dyn EffectHost>,
        settings: DirectorSettings,
    ) -> (Self, StageReceivers) {
        let (signal_tx, signals) = mpsc::unbounded_channel();
        let (task_tx, tasks) = mpsc::unbounded_channel();
        let stage = Self {
            bus,
            player,
            network,
            control,
            effects,
            settings,
            generations: Cell::new(0),
            signal_tx,
            task_tx,
        };
        (stage, StageReceivers { signals, tasks })
    }

    /// Next unit generation. Shared by every director of the session, so a
    /// ticket never matches a director other than the one that issued it,
    /// even after its scene is reloaded under the same id.
    pub fn next_generation(&self) -> u64 {
        let generation = self.generations.get() + 1;
        self.generations.set(generation);
        generation
    }

    pub fn signal(&self, signal: DirectorSignal) {
        if self.signal_tx.send(signal).is_err() {
            warn!(target: "director", "Signal dropped, session is gone");
        }
    }

    pub fn spawn(&self, task: ScriptTask) {
        if let Err(err) = self.task_tx.send(task) {
            warn!(target: "director", "Task {} dropped, session is gone", err.0.label);
        }
    }

    /// Sender for code that outlives a single call, such as bus listeners
    /// and sprite arrival callbacks
    pub fn signal_sender(&self) -> UnboundedSender<DirectorSignal> {
        self.signal_tx.clone()
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("bus", &self.bus)
            .field("player", &self.player.try_borrow().map(|p| p.id.clone()).ok())
            .field("settings", &self.settings)
            .finish()
    }
}
