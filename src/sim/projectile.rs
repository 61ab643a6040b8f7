//! Things that fly: bullets, Nova lasers and thrown stars

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geom::{Body, Bounds, is_off_screen};
use crate::consts::*;
use crate::direction_to;

pub const LASER_SIZE: f32 = 8.0;
pub const LASER_SPEED: f32 = 15.0;
pub const LASER_DAMAGE: f32 = 25.0;
pub const LASER_OFF_SCREEN_MARGIN: f32 = 50.0;
pub const LASER_TRAIL_LENGTH: usize = 30;
pub const LASER_TRAIL_FADE: f32 = 0.05;

pub const STAR_SIZE: f32 = 40.0;
pub const STAR_SPEED: f32 = 12.0;
pub const STAR_LIFETIME: u32 = 240;
pub const STAR_MAX_BOUNCES: u32 = 6;

/// Who fired a [`Projectile`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shooter {
    Player,
    Enemy,
    Mage,
}

/// A straight-flying bullet, positioned by its centre
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub damage: f32,
    pub shooter: Shooter,
    pub dead: bool,
}

impl Projectile {
    /// Player bullet leaving `center` along the unit vector `dir`
    pub fn player(center: Vec2, dir: Vec2) -> Self {
        Self {
            pos: center,
            vel: dir * PROJECTILE_SPEED,
            size: Vec2::splat(PROJECTILE_SIZE),
            damage: PROJECTILE_DAMAGE,
            shooter: Shooter::Player,
            dead: false,
        }
    }

    /// Hostile bullet aimed from `from` at `target`
    pub fn hostile(shooter: Shooter, from: Vec2, target: Vec2) -> Self {
        let dir = direction_to(from, target).unwrap_or(Vec2::Y);
        Self {
            pos: from,
            vel: dir * ENEMY_PROJECTILE_SPEED,
            size: Vec2::splat(ENEMY_PROJECTILE_SIZE),
            damage: ENEMY_PROJECTILE_DAMAGE,
            shooter,
            dead: false,
        }
    }

    pub fn update(&mut self) {
        self.pos += self.vel;
    }

    pub fn is_off_screen(&self, world: Vec2) -> bool {
        is_off_screen(self.pos, world, 0.0)
    }
}

impl Body for Projectile {
    fn bounds(&self) -> Bounds {
        Bounds::centered(self.pos, self.size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub pos: Vec2,
    pub alpha: f32,
}

/// Nova's fast laser bolt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NovaLaser {
    /// Head position (centre)
    pub pos: Vec2,
    pub origin: Vec2,
    pub dir: Vec2,
    pub size: Vec2,
    pub damage: f32,
    /// Oldest first
    pub trail: VecDeque<TrailPoint>,
    pub dead: bool,
}

impl NovaLaser {
    pub fn new(origin: Vec2, dir: Vec2) -> Self {
        Self {
            pos: origin,
            origin,
            dir,
            size: Vec2::splat(LASER_SIZE),
            damage: LASER_DAMAGE,
            trail: VecDeque::with_capacity(LASER_TRAIL_LENGTH + 1),
            dead: false,
        }
    }

    pub fn update(&mut self) {
        self.pos += self.dir * LASER_SPEED;

        self.trail.push_back(TrailPoint {
            pos: self.pos,
            alpha: 1.0,
        });
        self.trail.retain_mut(|point| {
            point.alpha -= LASER_TRAIL_FADE;
            point.alpha > 0.0
        });
        while self.trail.len() > LASER_TRAIL_LENGTH {
            self.trail.pop_front();
        }
    }

    /// Radial hit test against a box's centre
    pub fn hits(&self, target: &impl Body) -> bool {
        let bounds = target.bounds();
        let reach = self.size.x / 2.0 + bounds.size.x.min(bounds.size.y) / 2.0;
        self.pos.distance(bounds.center()) < reach
    }

    pub fn is_off_screen(&self, world: Vec2) -> bool {
        is_off_screen(self.pos, world, LASER_OFF_SCREEN_MARGIN)
    }
}

/// A thrown star: bounces around the arena killing whatever it touches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Star {
    /// Top-left corner
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub age: u32,
    pub bounces: u32,
    pub dead: bool,
}

impl Star {
    /// Star centred on `center` flying along the unit vector `dir`
    pub fn new(center: Vec2, dir: Vec2) -> Self {
        let size = Vec2::splat(STAR_SIZE);
        Self {
            pos: center - size / 2.0,
            vel: dir * STAR_SPEED,
            size,
            age: 0,
            bounces: 0,
            dead: false,
        }
    }

    pub fn update(&mut self, world: Vec2) {
        self.age += 1;
        self.pos += self.vel;

        let max = (world - self.size).max(Vec2::ZERO);
        if self.pos.x < 0.0 || self.pos.x > max.x {
            self.vel.x = -self.vel.x;
            self.pos.x = self.pos.x.clamp(0.0, max.x);
            self.bounces += 1;
        }
        if self.pos.y < 0.0 || self.pos.y > max.y {
            self.vel.y = -self.vel.y;
            self.pos.y = self.pos.y.clamp(0.0, max.y);
            self.bounces += 1;
        }
    }

    pub fn is_spent(&self) -> bool {
        self.age >= STAR_LIFETIME || self.bounces >= STAR_MAX_BOUNCES
    }
}

impl Body for Star {
    fn bounds(&self) -> Bounds {
        Bounds::new(self.pos, self.size)
    }
}
