//! Bosses
//!
//! The Mage and Nova are enemies with extra health and a set of abilities, each
//! gated by its own cooldown. [`Boss::advance`] moves the boss and reports which
//! abilities fired this tick; the session applies their effects.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geom::{Body, Bounds};
use crate::{clamp_to_world, direction_to};

pub const BOSS_SIZE: f32 = 50.0;
/// Keep teleport destinations this far from the world edge
pub const BOSS_TELEPORT_MARGIN: f32 = 50.0;

pub const MAGE_HEALTH: f32 = 500.0;
pub const MAGE_SPEED: f32 = 1.5;
pub const MAGE_DAMAGE: f32 = 20.0;
pub const MAGE_PREFERRED_DISTANCE: f32 = 200.0;
pub const MAGE_SHOOT_TICKS: u32 = 90;
pub const MAGE_TELEPORT_TICKS: u32 = 300;
pub const MAGE_WALL_TICKS: u32 = 420;
pub const MAGE_PUSH_PULL_TICKS: u32 = 360;
pub const MAGE_PUSH_PULL_FORCE: f32 = 15.0;
pub const MAGE_LOOT_ORBS: u32 = 20;
pub const MAGE_LOOT_VALUE: u32 = 10;

pub const NOVA_HEALTH: f32 = 800.0;
pub const NOVA_SPEED: f32 = 2.0;
pub const NOVA_DAMAGE: f32 = 25.0;
pub const NOVA_PREFERRED_DISTANCE: f32 = 120.0;
pub const NOVA_LASER_TICKS: u32 = 120;
pub const NOVA_TELEPORT_TICKS: u32 = 240;
pub const NOVA_TELEPORT_PLAYER_TICKS: u32 = 600;
pub const NOVA_SUMMON_TICKS: u32 = 480;
pub const NOVA_DISAPPEAR_TICKS: u32 = 540;
pub const NOVA_HIDDEN_TICKS: u32 = 90;
pub const NOVA_LOOT_ORBS: u32 = 30;
pub const NOVA_LOOT_VALUE: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossKind {
    Mage,
    Nova,
}

impl BossKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Mage => "mage",
            Self::Nova => "nova",
        }
    }

    /// XP orbs dropped on defeat as `(count, value)`
    pub fn loot(self) -> (u32, u32) {
        match self {
            Self::Mage => (MAGE_LOOT_ORBS, MAGE_LOOT_VALUE),
            Self::Nova => (NOVA_LOOT_ORBS, NOVA_LOOT_VALUE),
        }
    }
}

/// An ability that fired this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossAction {
    /// Fire an enemy projectile at the player
    Shoot,
    /// The boss blinked to a new spot
    Teleported,
    /// Ring the player with walls
    SummonWalls,
    /// Shove the player away from the boss
    Push,
    /// Yank the player toward the boss
    Pull,
    /// Fire a laser at the player
    FireLaser,
    /// Move the player to a random spot
    TeleportPlayer,
    /// Call in regular enemies
    SummonEnemies,
    /// Vanish for a while
    Disappear,
    /// Come back after vanishing
    Reappear,
}

/// A repeating countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cooldown {
    pub elapsed: u32,
    pub period: u32,
}

impl Cooldown {
    pub fn new(period: u32) -> Self {
        Self { elapsed: 0, period }
    }

    /// Advance one tick; true (and restart) when the period has elapsed
    pub fn ready(&mut self) -> bool {
        self.elapsed += 1;
        if self.elapsed >= self.period {
            self.elapsed = 0;
            true
        } else {
            false
        }
    }
}

/// Per-kind ability timers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Abilities {
    Mage {
        shoot: Cooldown,
        teleport: Cooldown,
        walls: Cooldown,
        push_pull: Cooldown,
        /// Next push/pull is a push
        push_next: bool,
    },
    Nova {
        laser: Cooldown,
        teleport: Cooldown,
        teleport_player: Cooldown,
        summon: Cooldown,
        disappear: Cooldown,
        /// Ticks left while vanished
        hidden: u32,
    },
}

/// What a boss can see when it moves
pub struct BossContext {
    pub player_center: Vec2,
    pub enemy_count: usize,
    pub world: Vec2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub kind: BossKind,
    pub pos: Vec2,
    pub size: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub speed: f32,
    pub contact_damage: f32,
    /// Whether projectiles currently hurt it
    pub vulnerable: bool,
    /// Suspended bosses neither act nor collide (debug toggle)
    pub is_active: bool,
    pub abilities: Abilities,
}

impl Boss {
    pub fn mage(center: Vec2) -> Self {
        Self::with(
            BossKind::Mage,
            center,
            MAGE_HEALTH,
            MAGE_SPEED,
            MAGE_DAMAGE,
            Abilities::Mage {
                shoot: Cooldown::new(MAGE_SHOOT_TICKS),
                teleport: Cooldown::new(MAGE_TELEPORT_TICKS),
                walls: Cooldown::new(MAGE_WALL_TICKS),
                push_pull: Cooldown::new(MAGE_PUSH_PULL_TICKS),
                push_next: true,
            },
        )
    }

    pub fn nova(center: Vec2) -> Self {
        Self::with(
            BossKind::Nova,
            center,
            NOVA_HEALTH,
            NOVA_SPEED,
            NOVA_DAMAGE,
            Abilities::Nova {
                laser: Cooldown::new(NOVA_LASER_TICKS),
                teleport: Cooldown::new(NOVA_TELEPORT_TICKS),
                teleport_player: Cooldown::new(NOVA_TELEPORT_PLAYER_TICKS),
                summon: Cooldown::new(NOVA_SUMMON_TICKS),
                disappear: Cooldown::new(NOVA_DISAPPEAR_TICKS),
                hidden: 0,
            },
        )
    }

    fn with(kind: BossKind, center: Vec2, health: f32, speed: f32, damage: f32, abilities: Abilities) -> Self {
        let size = Vec2::splat(BOSS_SIZE);
        Self {
            kind,
            pos: center - size / 2.0,
            size,
            health,
            max_health: health,
            speed,
            contact_damage: damage,
            vulnerable: kind == BossKind::Nova,
            is_active: true,
            abilities,
        }
    }

    /// Nova is intangible while vanished
    pub fn is_hidden(&self) -> bool {
        matches!(self.abilities, Abilities::Nova { hidden, .. } if hidden > 0)
    }

    /// Whether the boss takes part in collisions this tick
    pub fn is_tangible(&self) -> bool {
        self.is_active && !self.is_hidden()
    }

    pub fn health_ratio(&self) -> f32 {
        (self.health / self.max_health).clamp(0.0, 1.0)
    }

    /// Subtract `amount` if vulnerable; returns true iff this leaves the boss dead
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.vulnerable {
            return false;
        }
        self.health -= amount;
        self.health <= 0.0
    }

    /// Move one tick and tick every ability timer
    pub fn advance(&mut self, ctx: &BossContext, rng: &mut impl Rng) -> Vec<BossAction> {
        let mut actions = Vec::new();
        if !self.is_active {
            return actions;
        }

        let center = self.center();

        match &mut self.abilities {
            Abilities::Mage {
                shoot,
                teleport,
                walls,
                push_pull,
                push_next,
            } => {
                self.vulnerable = ctx.enemy_count == 0;

                // Orbit at a fixed distance from the player
                if let Some(dir) = direction_to(center, ctx.player_center) {
                    let dist = center.distance(ctx.player_center);
                    if dist > MAGE_PREFERRED_DISTANCE {
                        self.pos += dir * self.speed;
                    } else if dist < MAGE_PREFERRED_DISTANCE - 20.0 {
                        self.pos -= dir * self.speed;
                    }
                }

                if shoot.ready() {
                    actions.push(BossAction::Shoot);
                }
                if teleport.ready() {
                    self.pos = random_spot(ctx.world, self.size, rng);
                    actions.push(BossAction::Teleported);
                }
                if walls.ready() {
                    actions.push(BossAction::SummonWalls);
                }
                if push_pull.ready() {
                    actions.push(if *push_next { BossAction::Push } else { BossAction::Pull });
                    *push_next = !*push_next;
                }
            }
            Abilities::Nova {
                laser,
                teleport,
                teleport_player,
                summon,
                disappear,
                hidden,
            } => {
                if *hidden > 0 {
                    *hidden -= 1;
                    if *hidden == 0 {
                        self.vulnerable = true;
                        actions.push(BossAction::Reappear);
                    }
                    return actions;
                }

                if center.distance(ctx.player_center) > NOVA_PREFERRED_DISTANCE {
                    self.pos += direction_to(center, ctx.player_center).unwrap_or(Vec2::ZERO) * self.speed;
                }

                if laser.ready() {
                    actions.push(BossAction::FireLaser);
                }
                if teleport.ready() {
                    self.pos = random_spot(ctx.world, self.size, rng);
                    actions.push(BossAction::Teleported);
                }
                if teleport_player.ready() {
                    actions.push(BossAction::TeleportPlayer);
                }
                if summon.ready() {
                    actions.push(BossAction::SummonEnemies);
                }
                if disappear.ready() {
                    *hidden = NOVA_HIDDEN_TICKS;
                    self.vulnerable = false;
                    actions.push(BossAction::Disappear);
                }
            }
        }

        self.pos = clamp_to_world(self.pos, self.size, ctx.world);
        actions
    }
}

/// Top-left corner for a box of `size` somewhere away from the edges
fn random_spot(world: Vec2, size: Vec2, rng: &mut impl Rng) -> Vec2 {
    let lo = Vec2::splat(BOSS_TELEPORT_MARGIN);
    let hi = (world - size - lo).max(lo);
    Vec2::new(rng.random_range(lo.x..=hi.x), rng.random_range(lo.y..=hi.y))
}

impl Body for Boss {
    fn bounds(&self) -> Bounds {
        Bounds::new(self.pos, self.size)
    }
}
