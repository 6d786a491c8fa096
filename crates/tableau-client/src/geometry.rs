use serde::{Deserialize, Serialize};
use std::ops::Add;

/// A tile position on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridCoordinate {
    pub x: i32,
    pub y: i32,
}

impl GridCoordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Number of tile steps between two coordinates when moving along the grid
    pub fn manhattan_distance(&self, other: &GridCoordinate) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// A pixel position, either in the map or in the game container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelCoordinate {
    pub x: i32,
    pub y: i32,
}

impl PixelCoordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Linear interpolation towards `to`; `progress` is clamped to [0, 1]
    pub fn lerp(&self, to: &PixelCoordinate, progress: f64) -> PixelCoordinate {
        let progress = progress.clamp(0.0, 1.0);
        let step = |from: i32, to: i32| -> i32 {
            (f64::from(from) + f64::from(to - from) * progress).round() as i32
        };
        PixelCoordinate::new(step(self.x, to.x), step(self.y, to.y))
    }
}

impl Add for PixelCoordinate {
    type Output = PixelCoordinate;

    fn add(self, rhs: PixelCoordinate) -> PixelCoordinate {
        PixelCoordinate::new(self.x + rhs.x, self.y + rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: i32,
    pub height: i32,
}

impl PixelSize {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manhattan_distance() {
        let a = GridCoordinate::new(1, 2);
        let b = GridCoordinate::new(-2, 6);
        assert_eq!(a.manhattan_distance(&b), 7);
        assert_eq!(b.manhattan_distance(&a), 7);
        assert_eq!(a.manhattan_distance(&a), 0);
    }

    #[test]
    fn test_lerp_is_clamped() {
        let from = PixelCoordinate::new(0, 0);
        let to = PixelCoordinate::new(64, -32);
        assert_eq!(from.lerp(&to, 0.5), PixelCoordinate::new(32, -16));
        assert_eq!(from.lerp(&to, 2.0), to);
        assert_eq!(from.lerp(&to, -1.0), from);
    }
}
