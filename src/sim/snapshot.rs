//! Read-only views for hosts
//!
//! [`Snapshot`] borrows everything a renderer needs for one frame.
//! [`StatusUpdate`] is the coarse summary handed to a presence-style reporter,
//! produced only when something a human would notice has changed.

use glam::Vec2;
use serde::Serialize;

use super::boss::{Boss, BossKind};
use super::enemy::Enemy;
use super::events::{DeathCause, Light};
use super::hazard::{Bomb, FirePatch, PlaceableBomb, Wall};
use super::pickup::{PowerUp, ShockCrystal, StarOrb, XpOrb};
use super::player::Player;
use super::projectile::{NovaLaser, Projectile, Star};
use super::state::{GamePhase, GameState};
use crate::consts::LEVEL_TRANSITION_TICKS;

/// Everything needed to draw one frame
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<'a> {
    pub tick: u64,
    pub phase: GamePhase,
    pub paused: bool,
    pub world: Vec2,

    pub player: &'a Player,
    pub enemies: &'a [Enemy],
    pub boss: Option<&'a Boss>,
    pub projectiles: &'a [Projectile],
    pub enemy_projectiles: &'a [Projectile],
    pub lasers: &'a [NovaLaser],
    pub stars: &'a [Star],
    pub bombs: &'a [Bomb],
    pub placed_bombs: &'a [PlaceableBomb],
    pub fire_patches: &'a [FirePatch],
    pub walls: &'a [Wall],
    pub power_ups: &'a [PowerUp],
    pub xp_orbs: &'a [XpOrb],
    pub shock_crystals: &'a [ShockCrystal],
    pub star_orbs: &'a [StarOrb],
    pub lights: &'a [Light],

    // HUD
    pub score: u64,
    pub level: u32,
    pub health: f32,
    pub accuracy: u32,
    pub multishot_ratio: f32,
    pub selected_slot: u8,
    pub placeable_bombs: u32,
    pub enemies_killed: u32,
    pub enemies_per_level: u32,
    /// Boss health in `[0, 1]`
    pub boss_health: Option<f32>,
    /// Interstitial progress in `[0, 1]` while a level transition runs
    pub level_transition: Option<f32>,
    pub death_cause: Option<DeathCause>,
}

/// What the player is doing, for status text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Activity {
    Fighting,
    BossFight,
    LevelTransition,
    Dying,
    GameOver,
}

impl Activity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Fighting => "Fighting enemies",
            Self::BossFight => "Fighting a boss",
            Self::LevelTransition => "Leveling up",
            Self::Dying => "Dying",
            Self::GameOver => "Game over",
        }
    }
}

/// Coarse session summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusUpdate {
    pub activity: Activity,
    pub level: u32,
    pub boss: Option<BossKind>,
    pub enemy_count: usize,
    pub paused: bool,
    pub dead: bool,
    pub death_cause: Option<DeathCause>,
}

impl StatusUpdate {
    /// Fields whose change warrants a new report; exact enemy counts are bucketed
    fn key(&self) -> (Activity, u32, Option<BossKind>, u8, bool, bool) {
        (
            self.activity,
            self.level,
            self.boss,
            enemy_band(self.enemy_count),
            self.paused,
            self.dead,
        )
    }
}

/// Bucket an enemy count into 0 / 1-4 / 5-9 / 10+
pub fn enemy_band(count: usize) -> u8 {
    match count {
        0 => 0,
        1..=4 => 1,
        5..=9 => 2,
        _ => 3,
    }
}

/// Receives status updates from a host
pub trait StatusReporter {
    fn report(&mut self, update: &StatusUpdate);
}

/// Game-over rating for an accuracy percentage
pub fn accuracy_phrase(accuracy: u32) -> &'static str {
    match accuracy {
        69 => "NICE",
        95.. => "GODLIKE",
        85..=94 => "INSANE",
        75..=84 => "good... ig",
        65..=74 => "skibidi",
        50..=64 => "bro.. nah",
        35..=49 => "just give up",
        20..=34 => "so bad lol",
        _ => "pathetic",
    }
}

impl GameState {
    pub fn snapshot(&self) -> Snapshot<'_> {
        let level_transition = match self.phase {
            GamePhase::LevelTransition { elapsed } => {
                Some((elapsed as f32 / LEVEL_TRANSITION_TICKS as f32).min(1.0))
            }
            _ => None,
        };

        Snapshot {
            tick: self.time_ticks,
            phase: self.phase,
            paused: self.paused,
            world: self.world,

            player: &self.player,
            enemies: &self.enemies,
            boss: self.boss.as_ref(),
            projectiles: &self.projectiles,
            enemy_projectiles: &self.enemy_projectiles,
            lasers: &self.lasers,
            stars: &self.stars,
            bombs: &self.bombs,
            placed_bombs: &self.placed_bombs,
            fire_patches: &self.fire_patches,
            walls: &self.walls,
            power_ups: &self.power_ups,
            xp_orbs: &self.xp_orbs,
            shock_crystals: &self.shock_crystals,
            star_orbs: &self.star_orbs,
            lights: &self.lights,

            score: self.score,
            level: self.level,
            health: self.player.health(),
            accuracy: self.accuracy(),
            multishot_ratio: self.multishot_ratio(),
            selected_slot: self.selected_slot,
            placeable_bombs: self.placeable_bombs,
            enemies_killed: self.enemies_killed,
            enemies_per_level: self.enemies_per_level,
            boss_health: self.boss.as_ref().map(Boss::health_ratio),
            level_transition,
            death_cause: self.death_cause,
        }
    }

    /// Current coarse status
    pub fn status(&self) -> StatusUpdate {
        let activity = match self.phase {
            GamePhase::Dying { .. } => Activity::Dying,
            GamePhase::GameOver => Activity::GameOver,
            GamePhase::LevelTransition { .. } => Activity::LevelTransition,
            GamePhase::Playing if self.boss.is_some() => Activity::BossFight,
            GamePhase::Playing => Activity::Fighting,
        };

        StatusUpdate {
            activity,
            level: self.level,
            boss: self.boss_kind(),
            enemy_count: self.live_enemy_count(),
            paused: self.paused,
            dead: !self.is_live(),
            death_cause: self.death_cause,
        }
    }

    /// The current status if it differs coarsely from the last one handed out
    pub fn poll_status(&mut self) -> Option<StatusUpdate> {
        let status = self.status();
        let changed = self
            .last_status
            .as_ref()
            .is_none_or(|last| last.key() != status.key());
        if !changed {
            return None;
        }
        self.last_status = Some(status.clone());
        Some(status)
    }
}
