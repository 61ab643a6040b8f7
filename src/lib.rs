//! FRACTAL - a real-time arcade survival game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, behaviours, collisions, spawning, session state)
//! - `settings`: Runtime configuration for hosts

pub mod settings;
pub mod sim;

pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
///
/// All speeds and timers are expressed per tick.
pub mod consts {
    /// Nominal simulation rate
    pub const TICKS_PER_SECOND: u32 = 60;
    /// Fixed simulation timestep in seconds (hosts accumulate wall time against this)
    pub const SIM_DT: f32 = 1.0 / TICKS_PER_SECOND as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Default world dimensions
    pub const WORLD_WIDTH: f32 = 1280.0;
    pub const WORLD_HEIGHT: f32 = 720.0;

    /// Player defaults
    pub const PLAYER_SIZE: f32 = 40.0;
    pub const PLAYER_SPEED: f32 = 5.0;
    pub const PLAYER_MAX_HEALTH: f32 = 100.0;
    pub const MAX_INVENTORY_SLOTS: u32 = 3;

    /// Enemy defaults
    pub const ENEMY_SIZE: f32 = 30.0;
    pub const ENEMY_CONTACT_DAMAGE: f32 = 10.0;
    /// How far outside the world edge regular enemies appear
    pub const ENEMY_SPAWN_OFFSET: f32 = 30.0;

    /// Player projectile
    pub const PROJECTILE_SIZE: f32 = 6.0;
    pub const PROJECTILE_SPEED: f32 = 10.0;
    pub const PROJECTILE_DAMAGE: f32 = 10.0;
    /// Multishot pellet spread (radians)
    pub const MULTISHOT_SPREAD: [f32; 3] = [-0.3, 0.0, 0.3];
    pub const MULTISHOT_DURATION: u32 = 300;

    /// Enemy projectile
    pub const ENEMY_PROJECTILE_SIZE: f32 = 8.0;
    pub const ENEMY_PROJECTILE_SPEED: f32 = 5.0;
    pub const ENEMY_PROJECTILE_DAMAGE: f32 = 10.0;

    /// Session progression
    pub const ENEMIES_PER_LEVEL_START: u32 = 16;
    pub const ENEMIES_PER_LEVEL_GROWTH: u32 = 5;
    pub const ENEMY_SPAWN_INTERVAL_START: u32 = 120;
    pub const ENEMY_SPAWN_INTERVAL_FLOOR: u32 = 60;
    pub const ENEMY_SPAWN_INTERVAL_TRANSITION_STEP: u32 = 10;
    pub const ENEMY_SPAWN_INTERVAL_TRANSITION_FLOOR: u32 = 40;
    pub const POWER_UP_SPAWN_INTERVAL: u32 = 600;
    pub const BOMB_SPAWN_INTERVAL: u32 = 300;
    pub const BOMB_SPAWN_CHANCE: f64 = 0.2;
    pub const BOMB_MIN_LEVEL: u32 = 3;
    pub const MAGE_FIRST_LEVEL: u32 = 8;
    pub const MAGE_LEVEL_PERIOD: u32 = 6;

    /// Level transition / death animation lengths
    pub const LEVEL_TRANSITION_TICKS: u32 = 120;
    /// Delay before the wave is cleared after a level-up (200 ms)
    pub const WAVE_CLEAR_DELAY_TICKS: u64 = 12;
    pub const DEATH_ANIMATION_TICKS: u32 = 120;
    /// Lifetime of the light left behind by a kill (300 ms)
    pub const KILL_LIGHT_TICKS: u64 = 18;

    /// Star orb economy
    pub const STAR_ORB_COST: u64 = 80;
}

/// Unit vector from `from` toward `to`, or `None` when the points coincide
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Option<Vec2> {
    let delta = to - from;
    let dist = delta.length();
    (dist > 0.0).then(|| delta / dist)
}

/// Unit vector for an angle in radians
#[inline]
pub fn from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Clamp a top-left position so a box of `size` stays inside `world`
#[inline]
pub fn clamp_to_world(pos: Vec2, size: Vec2, world: Vec2) -> Vec2 {
    Vec2::new(
        pos.x.clamp(0.0, (world.x - size.x).max(0.0)),
        pos.y.clamp(0.0, (world.y - size.y).max(0.0)),
    )
}
