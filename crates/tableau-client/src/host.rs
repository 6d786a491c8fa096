use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use crate::geometry::PixelCoordinate;

/// Handle for an overlay shown through [`EffectHost::show_arrow`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(pub u64);

/// A fly-away item animation from the items box to a map position
#[derive(Debug, Clone, PartialEq)]
pub struct ItemPopup {
    pub item: String,
    pub from: PixelCoordinate,
    pub to: PixelCoordinate,
    pub duration_secs: f64,
}

/// Read-only view of the surrounding window and modal state
pub trait GameControl {
    /// False while the game window is hidden or minimized
    fn is_window_visible(&self) -> bool;

    /// True while a blocking modal dialog covers the game
    fn is_modal_visible(&self) -> bool;
}

/// Visual and audio effects the script units ask the UI to perform
pub trait EffectHost {
    fn show_arrow(&self, at: PixelCoordinate, label_id: &str) -> OverlayId;

    fn remove_overlay(&self, id: OverlayId);

    fn play_audio(&self, name: &str);

    fn item_popup(&self, popup: ItemPopup);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    pub at: PixelCoordinate,
    pub label_id: String,
}

/// Host with no display. Records every effect so it can be inspected.
#[derive(Debug)]
pub struct HeadlessHost {
    window_visible: Cell<bool>,
    modal_visible: Cell<bool>,
    next_overlay: Cell<u64>,
    overlays: RefCell<BTreeMap<OverlayId, Overlay>>,
    audio: RefCell<Vec<String>>,
    popups: RefCell<Vec<ItemPopup>>,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self {
            window_visible: Cell::new(true),
            modal_visible: Cell::new(false),
            next_overlay: Cell::new(0),
            overlays: RefCell::new(BTreeMap::new()),
            audio: RefCell::new(Vec::new()),
            popups: RefCell::new(Vec::new()),
        }
    }
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_window_visible(&self, visible: bool) {
        self.window_visible.set(visible);
    }

    pub fn set_modal_visible(&self, visible: bool) {
        self.modal_visible.set(visible);
    }

    /// Overlays currently on screen
    pub fn overlays(&self) -> Vec<Overlay> {
        self.overlays.borrow().values().cloned().collect()
    }

    pub fn played_audio(&self) -> Vec<String> {
        self.audio.borrow().clone()
    }

    pub fn popups(&self) -> Vec<ItemPopup> {
        self.popups.borrow().clone()
    }
}

impl GameControl for HeadlessHost {
    fn is_window_visible(&self) -> bool {
        self.window_visible.get()
    }

    fn is_modal_visible(&self) -> bool {
        self.modal_visible.get()
    }
}

impl EffectHost for HeadlessHost {
    fn show_arrow(&self, at: PixelCoordinate, label_id: &str) -> OverlayId {
        let id = OverlayId(self.next_overlay.get());
        self.next_overlay.set(id.0 + 1);
        self.overlays.borrow_mut().insert(
            id,
            Overlay {
                at,
                label_id: label_id.to_string(),
            },
        );
        id
    }

    fn remove_overlay(&self, id: OverlayId) {
        self.overlays.borrow_mut().remove(&id);
    }

    fn play_audio(&self, name: &str) {
        self.audio.borrow_mut().push(name.to_string());
    }

    fn item_popup(&self, popup: ItemPopup) {
        self.popups.borrow_mut().push(popup);
    }
}
