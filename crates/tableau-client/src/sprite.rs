use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::geometry::{GridCoordinate, PixelCoordinate, PixelSize};

/// Invoked once when a sprite reaches its destination
pub type ArrivalCallback = Box<dyn FnOnce()>;

struct Movement {
    from: PixelCoordinate,
    to: GridCoordinate,
    started_at: Instant,
    duration: Duration,
    on_arrival: Vec<ArrivalCallback>,
}

/// A character drawn on the map, moved by per-frame interpolation
pub struct CharacterSprite {
    id: String,
    grid: GridCoordinate,
    pixel: PixelCoordinate,
    movement: Option<Movement>,
}

impl CharacterSprite {
    pub fn new(id: impl Into<String>, grid: GridCoordinate, tile_size: PixelSize) -> Self {
        Self {
            id: id.into(),
            grid,
            pixel: grid_to_pixel(grid, tile_size),
            movement: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Last tile the sprite stood on (updated on arrival)
    pub fn grid(&self) -> GridCoordinate {
        self.grid
    }

    /// Current pixel position in the map
    pub fn pixel(&self) -> PixelCoordinate {
        self.pixel
    }

    pub fn is_moving(&self) -> bool {
        self.movement.is_some()
    }

    fn animate(&mut self, now: Instant, tile_size: PixelSize) -> Vec<ArrivalCallback> {
        let Some(movement) = &self.movement else {
            return Vec::new();
        };

        let target = grid_to_pixel(movement.to, tile_size);
        let elapsed = now.saturating_duration_since(movement.started_at);
        let progress = if movement.duration.is_zero() {
            1.0
        } else {
            elapsed.as_secs_f64() / movement.duration.as_secs_f64()
        };
        self.pixel = movement.from.lerp(&target, progress);

        if progress < 1.0 {
            return Vec::new();
        }

        match self.movement.take() {
            Some(movement) => {
                self.grid = movement.to;
                self.pixel = target;
                trace!(target: "session", "Sprite {} arrived at {:?}", self.id, self.grid);
                movement.on_arrival
            }
            None => Vec::new(),
        }
    }
}

impl fmt::Debug for CharacterSprite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CharacterSprite")
            .field("id", &self.id)
            .field("grid", &self.grid)
            .field("pixel", &self.pixel)
            .field("moving_to", &self.movement.as_ref().map(|m| m.to))
            .finish()
    }
}

/// All character sprites of a scene
#[derive(Debug)]
pub struct SpriteLayer {
    sprites: BTreeMap<String, CharacterSprite>,
    tile_size: PixelSize,
    ms_per_tile: u64,
}

impl SpriteLayer {
    pub fn new(tile_size: PixelSize, ms_per_tile: u64) -> Self {
        Self {
            sprites: BTreeMap::new(),
            tile_size,
            ms_per_tile,
        }
    }

    /// Place a character on `grid`, replacing any sprite with the same id
    pub fn spawn(&mut self, id: impl Into<String>, grid: GridCoordinate) {
        let sprite = CharacterSprite::new(id, grid, self.tile_size);
        self.sprites.insert(sprite.id.clone(), sprite);
    }

    pub fn get(&self, id: &str) -> Option<&CharacterSprite> {
        self.sprites.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sprites.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Start moving a sprite towards `destination`.
    ///
    /// The move lasts `ms_per_tile` per grid step and completes on a later
    /// [`SpriteLayer::animate`] call, never synchronously. A new move
    /// replaces the old one but keeps its pending callbacks. Returns false
    /// if there is no such sprite.
    pub fn move_to(
        &mut self,
        id: &str,
        destination: GridCoordinate,
        now: Instant,
        on_arrival: ArrivalCallback,
    ) -> bool {
        let Some(sprite) = self.sprites.get_mut(id) else {
            return false;
        };

        let mut callbacks = sprite
            .movement
            .take()
            .map(|m| m.on_arrival)
            .unwrap_or_default();
        callbacks.push(on_arrival);

        let steps = sprite.grid.manhattan_distance(&destination);
        let duration = Duration::from_millis(self.ms_per_tile.saturating_mul(u64::from(steps)));
        sprite.movement = Some(Movement {
            from: sprite.pixel,
            to: destination,
            started_at: now,
            duration,
            on_arrival: callbacks,
        });
        true
    }

    /// Advance every moving sprite to `now` and run arrival callbacks
    pub fn animate(&mut self, now: Instant) {
        let tile_size = self.tile_size;
        let arrived: Vec<ArrivalCallback> = self
            .sprites
            .values_mut()
            .flat_map(|sprite| sprite.animate(now, tile_size))
            .collect();

        for callback in arrived {
            callback();
        }
    }
}

fn grid_to_pixel(grid: GridCoordinate, tile_size: PixelSize) -> PixelCoordinate {
    PixelCoordinate::new(grid.x * tile_size.width, grid.y * tile_size.height)
}
