//! Entity primitives
//!
//! Every actor in the world is an axis-aligned box given by its top-left
//! corner and size. All gameplay collision goes through [`Bounds::intersects`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Top-left corner
    pub pos: Vec2,
    /// Width and height (never negative)
    pub size: Vec2,
}

impl Bounds {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            size: size.max(Vec2::ZERO),
        }
    }

    /// Box of `size` centred on `center`
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        Self::new(center - size / 2.0, size)
    }

    /// Strict overlap: touching edges do not count
    #[inline]
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.pos.x < other.pos.x + other.size.x
            && self.pos.x + self.size.x > other.pos.x
            && self.pos.y < other.pos.y + other.size.y
            && self.pos.y + self.size.y > other.pos.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }
}

/// Anything positioned and collidable
pub trait Body {
    fn bounds(&self) -> Bounds;

    #[inline]
    fn center(&self) -> Vec2 {
        self.bounds().center()
    }

    #[inline]
    fn intersects(&self, other: &impl Body) -> bool {
        self.bounds().intersects(&other.bounds())
    }
}

impl Body for Bounds {
    fn bounds(&self) -> Bounds {
        *self
    }
}

/// Centre-distance test used by radius hazards (bombs, shockwaves, lasers)
#[inline]
pub fn within_radius(a: Vec2, b: Vec2, radius: f32) -> bool {
    a.distance_squared(b) < radius * radius
}

/// Whether a point is outside the world by more than `margin`
#[inline]
pub fn is_off_screen(point: Vec2, world: Vec2, margin: f32) -> bool {
    point.x < -margin || point.x > world.x + margin || point.y < -margin || point.y > world.y + margin
}
