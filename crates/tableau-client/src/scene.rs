use std::time::Instant;

use crate::geometry::{GridCoordinate, PixelCoordinate, PixelSize};
use crate::sprite::SpriteLayer;
use crate::widget::{Widget, WidgetMap};

const RIGHT_SIDEBAR_WIDTH: i32 = 300;
const ITEMS_BOX_OFFSET: PixelCoordinate = PixelCoordinate::new(0, 200);

/// Where things sit inside the game container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasState {
    pub container_size: PixelSize,
    pub tile_size: PixelSize,
    /// Top-left of the UI layer (coordinate ruler, guide arrows)
    pub ui_origin: PixelCoordinate,
    /// Container pixel of map tile (0, 0)
    pub map_origin: PixelCoordinate,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            container_size: PixelSize::new(1280, 720),
            tile_size: PixelSize::new(32, 32),
            ui_origin: PixelCoordinate::new(0, 0),
            map_origin: PixelCoordinate::new(0, 0),
        }
    }
}

impl CanvasState {
    /// Top-left container pixel of a map tile
    pub fn grid_to_container(&self, grid: GridCoordinate) -> PixelCoordinate {
        self.map_origin
            + PixelCoordinate::new(grid.x * self.tile_size.width, grid.y * self.tile_size.height)
    }

    pub fn right_sidebar_origin(&self) -> PixelCoordinate {
        PixelCoordinate::new(self.container_size.width - RIGHT_SIDEBAR_WIDTH, 0)
    }

    /// Top-left of the items box in the right sidebar
    pub fn items_box(&self) -> PixelCoordinate {
        self.right_sidebar_origin() + ITEMS_BOX_OFFSET
    }
}

/// One loaded map: its layout, the script widgets on it and its characters
#[derive(Debug)]
pub struct GameScene {
    id: String,
    canvas: CanvasState,
    widgets: WidgetMap,
    sprites: SpriteLayer,
}

impl GameScene {
    pub fn new(id: impl Into<String>, canvas: CanvasState, move_ms_per_tile: u64) -> Self {
        Self {
            id: id.into(),
            canvas,
            widgets: WidgetMap::new(),
            sprites: SpriteLayer::new(canvas.tile_size, move_ms_per_tile),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn canvas(&self) -> &CanvasState {
        &self.canvas
    }

    pub fn widgets(&self) -> &WidgetMap {
        &self.widgets
    }

    /// Returns the widget previously stored under `id`, if any
    pub fn insert_widget(&mut self, id: impl Into<String>, widget: Widget) -> Option<Widget> {
        self.widgets.insert(id.into(), widget)
    }

    pub fn remove_widget(&mut self, id: &str) -> Option<Widget> {
        self.widgets.remove(id)
    }

    pub fn sprites(&self) -> &SpriteLayer {
        &self.sprites
    }

    pub fn sprites_mut(&mut self) -> &mut SpriteLayer {
        &mut self.sprites
    }

    /// Per-frame animation update
    pub fn animate(&mut self, now: Instant) {
        self.sprites.animate(now);
    }
}
