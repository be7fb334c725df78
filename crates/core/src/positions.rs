//! Position types for skill hitboxes

use serde::{Deserialize, Serialize};

/// A point relative to the caster, in map pixels
///
/// Skill ranges are stored as two corners: `lt` (left-top) and `rb`
/// (right-bottom), both relative to the caster facing left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

impl Point {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    /// Mirror horizontally (caster facing right)
    pub const fn mirrored(self) -> Self {
        Self { x: -self.x, y: self.y }
    }
}

/// Axis-aligned skill range built from its two corners
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hitbox {
    pub lt: Point,
    pub rb: Point,
}

impl Hitbox {
    pub const fn new(lt: Point, rb: Point) -> Self {
        Self { lt, rb }
    }

    /// Whether both corners are zero (skill has no area)
    pub fn is_empty(&self) -> bool {
        self.lt == Point::default() && self.rb == Point::default()
    }

    /// Width in pixels
    pub fn width(&self) -> i32 {
        (self.rb.x as i32 - self.lt.x as i32).abs()
    }

    /// Height in pixels
    pub fn height(&self) -> i32 {
        (self.rb.y as i32 - self.lt.y as i32).abs()
    }
}
