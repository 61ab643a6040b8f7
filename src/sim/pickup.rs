//! Collectibles: power-ups, XP orbs, shock crystals and star orbs

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geom::{Body, Bounds};
use crate::from_angle;

pub const POWER_UP_SIZE: f32 = 24.0;
pub const POWER_UP_HEAL: f32 = 30.0;

pub const XP_ORB_SIZE: f32 = 8.0;
pub const XP_ORB_FRICTION: f32 = 0.92;
pub const XP_ORB_ATTRACT_RADIUS: f32 = 150.0;
pub const XP_ORB_ATTRACT_FORCE: f32 = 0.6;
pub const XP_ORB_LIFETIME: u32 = 900;
/// Equal-value orbs closer than this coalesce
pub const XP_ORB_MERGE_DISTANCE: f32 = 10.0;

pub const SHOCK_CRYSTAL_SIZE: f32 = 16.0;

pub const STAR_ORB_SIZE: f32 = 24.0;
pub const STAR_ORB_LIFETIME: u32 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    Health,
    Multishot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub pos: Vec2,
    pub kind: PowerUpKind,
    pub dead: bool,
}

impl PowerUp {
    pub fn new(pos: Vec2, kind: PowerUpKind) -> Self {
        Self {
            pos,
            kind,
            dead: false,
        }
    }
}

impl Body for PowerUp {
    fn bounds(&self) -> Bounds {
        Bounds::new(self.pos, Vec2::splat(POWER_UP_SIZE))
    }
}

/// Experience dropped by kills; worth `value` score when collected
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpOrb {
    /// Centre
    pub pos: Vec2,
    pub vel: Vec2,
    pub value: u32,
    pub age: u32,
    pub dead: bool,
}

impl XpOrb {
    pub fn new(pos: Vec2, vel: Vec2, value: u32) -> Self {
        Self {
            pos,
            vel,
            value,
            age: 0,
            dead: false,
        }
    }

    /// Orb bursting out of `pos` in a random direction
    pub fn scattered(pos: Vec2, value: u32, rng: &mut impl Rng) -> Self {
        let dir = from_angle(rng.random::<f32>() * std::f32::consts::TAU);
        Self::new(pos, dir * rng.random_range(1.0f32..4.0), value)
    }

    pub fn update(&mut self, player_center: Vec2) {
        self.age += 1;
        self.vel *= XP_ORB_FRICTION;

        let to_player = player_center - self.pos;
        let dist = to_player.length();
        if dist < XP_ORB_ATTRACT_RADIUS && dist > 0.0 {
            let pull = 1.0 - dist / XP_ORB_ATTRACT_RADIUS;
            self.vel += to_player / dist * XP_ORB_ATTRACT_FORCE * (0.5 + pull);
        }

        self.pos += self.vel;
    }

    pub fn is_expired(&self) -> bool {
        self.age >= XP_ORB_LIFETIME
    }
}

impl Body for XpOrb {
    fn bounds(&self) -> Bounds {
        Bounds::centered(self.pos, Vec2::splat(XP_ORB_SIZE))
    }
}

/// Coalesce equal-value orbs closer than [`XP_ORB_MERGE_DISTANCE`].
///
/// Walks from the back: each orb absorbs at most one earlier neighbour per
/// pass, and the absorbed orb is removed. Returns the number of merges.
pub fn merge_xp_orbs(orbs: &mut Vec<XpOrb>) -> usize {
    let mut merges = 0;
    let mut i = orbs.len();
    while i > 0 {
        i -= 1;
        let Some(j) = (0..i).rev().find(|&j| {
            orbs[j].value == orbs[i].value && orbs[i].pos.distance(orbs[j].pos) < XP_ORB_MERGE_DISTANCE
        }) else {
            continue;
        };
        let absorbed = orbs.remove(j);
        // Removing j shifted the survivor down one slot
        i -= 1;
        orbs[i].value += absorbed.value;
        merges += 1;
    }
    merges
}

/// Shockwave charge dropped by the Mage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShockCrystal {
    pub pos: Vec2,
    pub dead: bool,
}

impl ShockCrystal {
    pub fn new(pos: Vec2) -> Self {
        Self { pos, dead: false }
    }
}

impl Body for ShockCrystal {
    fn bounds(&self) -> Bounds {
        Bounds::new(self.pos, Vec2::splat(SHOCK_CRYSTAL_SIZE))
    }
}

/// A star for sale: touching it with enough score buys a throwable star
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarOrb {
    pub pos: Vec2,
    pub age: u32,
    pub dead: bool,
}

impl StarOrb {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            age: 0,
            dead: false,
        }
    }

    pub fn update(&mut self) {
        self.age += 1;
    }

    pub fn is_expired(&self) -> bool {
        self.age >= STAR_ORB_LIFETIME
    }
}

impl Body for StarOrb {
    fn bounds(&self) -> Bounds {
        Bounds::new(self.pos, Vec2::splat(STAR_ORB_SIZE))
    }
}
