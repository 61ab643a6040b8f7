//! The player avatar

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geom::{Body, Bounds};
use crate::clamp_to_world;
use crate::consts::*;

/// Held movement directions for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Movement {
    /// Per-axis step direction (-1, 0 or 1 on each axis; diagonals are not normalised)
    pub fn axis(&self) -> Vec2 {
        let mut axis = Vec2::ZERO;
        if self.left {
            axis.x -= 1.0;
        }
        if self.right {
            axis.x += 1.0;
        }
        if self.up {
            axis.y -= 1.0;
        }
        if self.down {
            axis.y += 1.0;
        }
        axis
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub size: Vec2,
    /// Raw health; may dip below zero on the killing blow, see [`Player::health`]
    health: f32,
    pub speed: f32,
    pub shock_crystals: u32,
    pub stars: u32,
    pub max_inventory_slots: u32,
}

impl Player {
    /// Spawn a player centred on `center`
    pub fn new(center: Vec2) -> Self {
        let size = Vec2::splat(PLAYER_SIZE);
        Self {
            pos: center - size / 2.0,
            size,
            health: PLAYER_MAX_HEALTH,
            speed: PLAYER_SPEED,
            shock_crystals: 0,
            stars: 0,
            max_inventory_slots: MAX_INVENTORY_SLOTS,
        }
    }

    /// Apply one tick of held movement, then clamp into the world
    pub fn update(&mut self, movement: Movement, world: Vec2) {
        self.pos += movement.axis() * self.speed;
        self.clamp(world);
    }

    /// Displace the player (boss forces, wall pushes) and clamp into the world
    pub fn shove(&mut self, delta: Vec2, world: Vec2) {
        self.pos += delta;
        self.clamp(world);
    }

    /// Place the player's top-left corner and clamp into the world
    pub fn teleport(&mut self, pos: Vec2, world: Vec2) {
        self.pos = pos;
        self.clamp(world);
    }

    pub fn clamp(&mut self, world: Vec2) {
        self.pos = clamp_to_world(self.pos, self.size, world);
    }

    /// Health as presented: always within `[0, 100]`
    pub fn health(&self) -> f32 {
        self.health.clamp(0.0, PLAYER_MAX_HEALTH)
    }

    /// Subtract `amount`; returns true when this leaves the player at or below zero
    pub fn take_damage(&mut self, amount: f32) -> bool {
        self.health -= amount;
        self.health <= 0.0
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).min(PLAYER_MAX_HEALTH);
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub fn inventory_count(&self) -> u32 {
        self.shock_crystals + self.stars
    }

    pub fn has_inventory_space(&self) -> bool {
        self.inventory_count() < self.max_inventory_slots
    }

    pub fn add_shock_crystal(&mut self) {
        self.shock_crystals += 1;
    }

    pub fn use_shock_crystal(&mut self) -> bool {
        if self.shock_crystals > 0 {
            self.shock_crystals -= 1;
            true
        } else {
            false
        }
    }

    pub fn add_star(&mut self) {
        self.stars += 1;
    }

    pub fn use_star(&mut self) -> bool {
        if self.stars > 0 {
            self.stars -= 1;
            true
        } else {
            false
        }
    }
}

impl Body for Player {
    fn bounds(&self) -> Bounds {
        Bounds::new(self.pos, self.size)
    }
}
