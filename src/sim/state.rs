//! Session state and bookkeeping
//!
//! [`GameState`] owns every entity collection and the session globals. It is
//! passed by `&mut` into each subsystem; nothing in the simulation is global.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boss::{Boss, BossKind};
use super::enemy::{Enemy, EnemyKind};
use super::events::{DeathCause, Effect, GameEvent, KillSource, Light, ParticleKind, TaskAction, TaskQueue};
use super::geom::Body;
use super::hazard::{BOMB_GROUND_INSET, Bomb, FirePatch, MAX_PLACEABLE_BOMBS, PlaceableBomb, Wall};
use super::pickup::{PowerUp, SHOCK_CRYSTAL_SIZE, ShockCrystal, StarOrb, XpOrb};
use super::player::Player;
use super::projectile::{NovaLaser, Projectile, Star};
use super::snapshot::StatusUpdate;
use crate::consts::*;

/// Chance a dumb enemy killed by a projectile drops a falling bomb
pub const DUMB_BOMB_DROP_CHANCE: f64 = 0.1;
/// Chance a medium or smart enemy killed by a projectile grants a placeable bomb
pub const PLACEABLE_BOMB_DROP_CHANCE: f64 = 0.3;
/// Falling bombs dropped by kills start this far above the corpse
pub const DROPPED_BOMB_HEIGHT: f32 = 100.0;
/// Flat score for star and shockwave kills
pub const INSTANT_KILL_SCORE: u64 = 100;
/// Radius of the light left at a projectile kill
pub const KILL_LIGHT_RADIUS: f32 = 200.0;

/// Top-level session phase; pause is orthogonal and kept in [`GameState::paused`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Normal play
    Playing,
    /// Interstitial after a level-up; the world keeps running
    LevelTransition { elapsed: u32 },
    /// Player died; only the death animation advances
    Dying { elapsed: u32 },
    /// Run ended
    GameOver,
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// The only source of randomness in the simulation
    pub rng: Pcg32,
    /// Playfield size
    pub world: Vec2,
    /// Session tick counter (frozen while paused)
    pub time_ticks: u64,
    pub phase: GamePhase,
    pub paused: bool,

    pub player: Player,
    pub enemies: Vec<Enemy>,
    /// At most one boss at a time
    pub boss: Option<Boss>,
    pub projectiles: Vec<Projectile>,
    pub enemy_projectiles: Vec<Projectile>,
    pub lasers: Vec<NovaLaser>,
    pub stars: Vec<Star>,
    pub bombs: Vec<Bomb>,
    pub placed_bombs: Vec<PlaceableBomb>,
    pub fire_patches: Vec<FirePatch>,
    pub walls: Vec<Wall>,
    pub power_ups: Vec<PowerUp>,
    pub xp_orbs: Vec<XpOrb>,
    pub shock_crystals: Vec<ShockCrystal>,
    pub star_orbs: Vec<StarOrb>,
    pub lights: Vec<Light>,

    /// Placeable bombs held by the player
    pub placeable_bombs: u32,
    pub score: u64,
    pub level: u32,
    pub enemies_killed: u32,
    pub enemies_per_level: u32,
    pub shots_fired: u32,
    pub shots_hit: u32,
    /// Remaining multishot ticks (0 = inactive)
    pub multishot_ticks: u32,
    pub enemy_spawn_timer: u32,
    pub enemy_spawn_interval: u32,
    pub power_up_spawn_timer: u32,
    pub bomb_spawn_timer: u32,
    /// Inventory slot highlighted by the player (0-2)
    pub selected_slot: u8,
    pub death_cause: Option<DeathCause>,

    pub tasks: TaskQueue,
    /// Presentation requests since the host last drained them
    pub effects: Vec<Effect>,
    /// Gameplay events since the host last drained them
    pub events: Vec<GameEvent>,
    /// Last coarse status handed out by `poll_status`
    pub(crate) last_status: Option<StatusUpdate>,
    next_id: u32,
}

impl GameState {
    /// Create a new session with the given seed and world size
    pub fn new(seed: u64, world: Vec2) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            world,
            time_ticks: 0,
            phase: GamePhase::Playing,
            paused: false,

            player: Player::new(world / 2.0),
            enemies: Vec::new(),
            boss: None,
            projectiles: Vec::new(),
            enemy_projectiles: Vec::new(),
            lasers: Vec::new(),
            stars: Vec::new(),
            bombs: Vec::new(),
            placed_bombs: Vec::new(),
            fire_patches: Vec::new(),
            walls: Vec::new(),
            power_ups: Vec::new(),
            xp_orbs: Vec::new(),
            shock_crystals: Vec::new(),
            star_orbs: Vec::new(),
            lights: Vec::new(),

            placeable_bombs: 0,
            score: 0,
            level: 1,
            enemies_killed: 0,
            enemies_per_level: ENEMIES_PER_LEVEL_START,
            shots_fired: 0,
            shots_hit: 0,
            multishot_ticks: 0,
            enemy_spawn_timer: 0,
            enemy_spawn_interval: ENEMY_SPAWN_INTERVAL_START,
            power_up_spawn_timer: 0,
            bomb_spawn_timer: 0,
            selected_slot: 0,
            death_cause: None,

            tasks: TaskQueue::default(),
            effects: Vec::new(),
            events: Vec::new(),
            last_status: None,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Hit percentage, floored; 0 before the first shot
    pub fn accuracy(&self) -> u32 {
        if self.shots_fired == 0 {
            0
        } else {
            (u64::from(self.shots_hit) * 100 / u64::from(self.shots_fired)) as u32
        }
    }

    pub fn multishot_active(&self) -> bool {
        self.multishot_ticks > 0
    }

    /// Remaining multishot time in `[0, 1]`
    pub fn multishot_ratio(&self) -> f32 {
        self.multishot_ticks as f32 / MULTISHOT_DURATION as f32
    }

    /// Whether gameplay systems run this tick
    pub fn is_live(&self) -> bool {
        matches!(self.phase, GamePhase::Playing | GamePhase::LevelTransition { .. })
    }

    pub fn is_dying(&self) -> bool {
        matches!(self.phase, GamePhase::Dying { .. })
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn boss_kind(&self) -> Option<BossKind> {
        self.boss.as_ref().map(|b| b.kind)
    }

    /// Regular spawning stops while a Mage or an active Nova is present
    pub fn regular_spawning_blocked(&self) -> bool {
        self.boss
            .as_ref()
            .is_some_and(|b| b.kind == BossKind::Mage || b.is_active)
    }

    /// Regular enemies not yet marked dead
    pub fn live_enemy_count(&self) -> usize {
        self.enemies.iter().filter(|e| !e.dead).count()
    }

    // === Effects ===

    pub fn particles(&mut self, kind: ParticleKind, pos: Vec2, count: u32) {
        self.effects.push(Effect::Particles { kind, pos, count });
    }

    pub fn shake(&mut self, intensity: f32, duration: u32) {
        self.effects.push(Effect::Shake { intensity, duration });
    }

    /// Roll `chance` and emit a glitch on success
    pub fn trigger_glitch(&mut self, intensity: f32, chance: f64) {
        if self.rng.random_bool(chance.clamp(0.0, 1.0)) {
            self.effects.push(Effect::Glitch { intensity });
        }
    }

    /// Kill light that removes itself after a short delay
    pub fn add_light(&mut self, pos: Vec2) {
        let id = self.next_entity_id();
        self.lights.push(Light {
            id,
            pos,
            radius: KILL_LIGHT_RADIUS,
        });
        self.tasks
            .schedule(self.time_ticks, KILL_LIGHT_TICKS, TaskAction::RemoveLight(id));
    }

    /// Apply a deferred task
    pub fn run_task(&mut self, action: TaskAction) {
        match action {
            TaskAction::RemoveLight(id) => self.lights.retain(|l| l.id != id),
            TaskAction::ClearWave => {
                self.enemies.clear();
                self.enemy_projectiles.clear();
            }
        }
    }

    // === Player ===

    /// Hurt the player; lethal damage starts the death animation once
    pub fn damage_player(&mut self, amount: f32, cause: DeathCause) {
        if !self.is_live() {
            return;
        }
        self.events.push(GameEvent::PlayerDamaged { amount, cause });
        if self.player.take_damage(amount) {
            self.begin_death(cause);
        }
    }

    pub fn begin_death(&mut self, cause: DeathCause) {
        if !self.is_live() {
            return;
        }
        log::info!(
            "Player died on level {} ({:?}), score {}, accuracy {}%",
            self.level,
            cause,
            self.score,
            self.accuracy()
        );
        self.phase = GamePhase::Dying { elapsed: 0 };
        self.death_cause = Some(cause);
        let center = self.player.center();
        self.particles(ParticleKind::Explosion, center, 50);
        self.shake(30.0, 40);
        self.events.push(GameEvent::PlayerDied { cause });
    }

    // === Kills and progression ===

    /// Scatter `count` orbs worth `value` each from `center`
    pub fn spawn_xp_orbs(&mut self, center: Vec2, count: u32, value: u32) {
        for _ in 0..count {
            let orb = XpOrb::scattered(center, value, &mut self.rng);
            self.xp_orbs.push(orb);
        }
    }

    /// Remove enemy `idx` with its one loot and score batch.
    ///
    /// Returns false (and does nothing) if the enemy was already removed, so a
    /// corpse can never pay out twice.
    pub fn kill_enemy(&mut self, idx: usize, source: KillSource) -> bool {
        let Some(enemy) = self.enemies.get_mut(idx) else {
            return false;
        };
        if enemy.dead {
            return false;
        }
        enemy.dead = true;
        let kind = enemy.kind;
        let center = enemy.center();

        let (count, value) = kind.loot();
        self.spawn_xp_orbs(center, count, value);
        self.score += match source {
            KillSource::Projectile | KillSource::FallingBomb => 0,
            KillSource::Star | KillSource::Shockwave => INSTANT_KILL_SCORE,
            KillSource::PlacedBomb => u64::from(count * value),
        };

        match source {
            KillSource::Projectile => {
                self.particles(ParticleKind::Explosion, center, 30);
                self.shake(20.0, 25);
                if kind == EnemyKind::Smart {
                    self.trigger_glitch(8.0, 0.25);
                }
                self.roll_kill_drops(kind, center);
                self.add_light(center);
            }
            KillSource::Shockwave => self.particles(ParticleKind::Explosion, center, 50),
            KillSource::Star => {
                self.particles(ParticleKind::Explosion, center, 30);
                self.shake(10.0, 15);
            }
            KillSource::PlacedBomb | KillSource::FallingBomb => {
                self.particles(ParticleKind::Explosion, center, 30);
            }
        }

        self.enemies_killed += 1;
        self.events.push(GameEvent::EnemyKilled { kind, source });
        if source != KillSource::Shockwave {
            self.check_level_up();
        }
        true
    }

    fn roll_kill_drops(&mut self, kind: EnemyKind, center: Vec2) {
        match kind {
            EnemyKind::Dumb if self.rng.random_bool(DUMB_BOMB_DROP_CHANCE) => {
                let ground = self.world.y - BOMB_GROUND_INSET;
                let bomb = Bomb::new(center - Vec2::new(0.0, DROPPED_BOMB_HEIGHT), ground, &mut self.rng);
                self.bombs.push(bomb);
            }
            EnemyKind::Medium | EnemyKind::Smart if self.rng.random_bool(PLACEABLE_BOMB_DROP_CHANCE) => {
                self.placeable_bombs = (self.placeable_bombs + 1).min(MAX_PLACEABLE_BOMBS);
            }
            _ => {}
        }
    }

    /// Level up once the kill threshold is reached; the threshold grows by 5
    pub fn check_level_up(&mut self) -> bool {
        if self.enemies_killed < self.enemies_per_level {
            return false;
        }
        self.enemies_per_level += ENEMIES_PER_LEVEL_GROWTH;
        self.advance_level();
        true
    }

    fn advance_level(&mut self) {
        self.level += 1;
        self.enemies_killed = 0;
        log::info!("Level up: {} (next after {} kills)", self.level, self.enemies_per_level);
        self.events.push(GameEvent::LevelUp { level: self.level });
        self.start_level_transition();
    }

    /// Begin the interstitial and schedule the wave clear
    pub fn start_level_transition(&mut self) {
        if !self.is_live() {
            return;
        }
        self.phase = GamePhase::LevelTransition { elapsed: 0 };
        self.tasks
            .schedule(self.time_ticks, WAVE_CLEAR_DELAY_TICKS, TaskAction::ClearWave);
        self.particles(ParticleKind::Celebration, self.world / 2.0, 100);
    }

    /// Pay out and remove the current boss; the level advances without growing the threshold
    pub fn defeat_boss(&mut self) {
        let Some(boss) = self.boss.take() else {
            return;
        };
        let center = boss.center();
        log::info!("{} defeated on level {}", boss.kind.name(), self.level);

        let (count, value) = boss.kind.loot();
        self.spawn_xp_orbs(center, count, value);
        match boss.kind {
            BossKind::Mage => {
                self.particles(ParticleKind::Explosion, center, 100);
                self.shake(40.0, 50);
                self.trigger_glitch(15.0, 1.0);
                self.shock_crystals
                    .push(ShockCrystal::new(center - Vec2::splat(SHOCK_CRYSTAL_SIZE / 2.0)));
                self.walls.clear();
            }
            BossKind::Nova => {
                self.particles(ParticleKind::Explosion, center, 200);
                self.shake(50.0, 60);
                self.trigger_glitch(20.0, 1.0);
                self.lasers.clear();
            }
        }
        self.events.push(GameEvent::BossDefeated { kind: boss.kind });
        self.advance_level();
    }

    // === Compaction ===

    /// Drop everything marked dead this tick
    pub fn compact(&mut self) {
        self.enemies.retain(|e| !e.dead);
        self.projectiles.retain(|p| !p.dead);
        self.enemy_projectiles.retain(|p| !p.dead);
        self.lasers.retain(|l| !l.dead);
        self.stars.retain(|s| !s.dead);
        self.bombs.retain(|b| !b.exploded);
        self.placed_bombs.retain(|b| !b.exploded);
        self.fire_patches.retain(|f| !f.dead);
        self.walls.retain(|w| !w.dead);
        self.power_ups.retain(|p| !p.dead);
        self.xp_orbs.retain(|o| !o.dead);
        self.shock_crystals.retain(|c| !c.dead);
        self.star_orbs.retain(|o| !o.dead);

        self.debug_check_invariants();
    }

    fn debug_check_invariants(&self) {
        debug_assert!(self.enemies.iter().all(|e| e.size.x >= 0.0 && e.size.y >= 0.0));
        debug_assert!(self.player.health() >= 0.0 && self.player.health() <= PLAYER_MAX_HEALTH);
        debug_assert!(
            self.player.pos.x >= 0.0
                && self.player.pos.y >= 0.0
                && self.player.pos.x + self.player.size.x <= self.world.x.max(self.player.size.x)
                && self.player.pos.y + self.player.size.y <= self.world.y.max(self.player.size.y),
            "player out of bounds: {:?}",
            self.player.pos
        );
        debug_assert!(self.player.inventory_count() <= self.player.max_inventory_slots);
        debug_assert!(self.placeable_bombs <= MAX_PLACEABLE_BOMBS);
        debug_assert!(self.enemy_spawn_interval >= ENEMY_SPAWN_INTERVAL_TRANSITION_FLOOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::projectile::Shooter;

    const WORLD: Vec2 = Vec2::new(WORLD_WIDTH, WORLD_HEIGHT);

    fn state_with_enemies(kinds: &[EnemyKind]) -> GameState {
        let mut state = GameState::new(42, WORLD);
        for (i, &kind) in kinds.iter().enumerate() {
            let id = state.next_entity_id();
            state
                .enemies
                .push(Enemy::new(id, Vec2::new(100.0 + 40.0 * i as f32, 100.0), kind));
        }
        state
    }

    #[test]
    fn test_accuracy() {
        let mut state = GameState::new(1, WORLD);
        assert_eq!(state.accuracy(), 0);
        state.shots_fired = 3;
        state.shots_hit = 2;
        assert_eq!(state.accuracy(), 66);
        state.shots_hit = 3;
        assert_eq!(state.accuracy(), 100);
    }

    #[test]
    fn test_kill_pays_out_once() {
        let mut state = state_with_enemies(&[EnemyKind::Smart]);
        assert!(state.kill_enemy(0, KillSource::Star));
        assert!(!state.kill_enemy(0, KillSource::Star));
        assert_eq!(state.score, INSTANT_KILL_SCORE);
        assert_eq!(state.xp_orbs.len(), 5);
        assert_eq!(state.enemies_killed, 1);
        let kills = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::EnemyKilled { .. }))
            .count();
        assert_eq!(kills, 1);

        state.compact();
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_score_by_kill_source() {
        let mut state = state_with_enemies(&[EnemyKind::Medium, EnemyKind::Teleport, EnemyKind::Dumb]);
        state.kill_enemy(0, KillSource::PlacedBomb);
        assert_eq!(state.score, 15);
        state.kill_enemy(1, KillSource::Projectile);
        assert_eq!(state.score, 15);
        state.kill_enemy(2, KillSource::FallingBomb);
        assert_eq!(state.score, 15);
        assert_eq!(state.xp_orbs.len(), 3 + 6 + 2);
    }

    #[test]
    fn test_projectile_kill_leaves_timed_light() {
        let mut state = state_with_enemies(&[EnemyKind::Teleport]);
        state.kill_enemy(0, KillSource::Projectile);
        assert_eq!(state.lights.len(), 1);
        assert_eq!(state.lights[0].radius, KILL_LIGHT_RADIUS);

        state.time_ticks += KILL_LIGHT_TICKS - 1;
        for task in state.tasks.drain_due(state.time_ticks) {
            state.run_task(task);
        }
        assert_eq!(state.lights.len(), 1);

        state.time_ticks += 1;
        for task in state.tasks.drain_due(state.time_ticks) {
            state.run_task(task);
        }
        assert!(state.lights.is_empty());
    }

    #[test]
    fn test_level_threshold_grows_by_five() {
        let mut state = GameState::new(3, WORLD);
        assert_eq!(state.enemies_per_level, 16);

        state.enemies_killed = 16;
        assert!(state.check_level_up());
        assert_eq!(state.level, 2);
        assert_eq!(state.enemies_killed, 0);
        assert_eq!(state.enemies_per_level, 21);
        assert_eq!(state.phase, GamePhase::LevelTransition { elapsed: 0 });

        state.enemies_killed = 20;
        assert!(!state.check_level_up());
        state.enemies_killed = 21;
        assert!(state.check_level_up());
        assert_eq!(state.level, 3);
        assert_eq!(state.enemies_per_level, 26);
    }

    #[test]
    fn test_level_up_clears_wave_after_delay() {
        let mut state = state_with_enemies(&[EnemyKind::Dumb, EnemyKind::Dumb]);
        state
            .enemy_projectiles
            .push(Projectile::hostile(Shooter::Enemy, Vec2::ZERO, Vec2::ONE));
        state.enemies_killed = state.enemies_per_level;
        state.check_level_up();

        state.time_ticks = WAVE_CLEAR_DELAY_TICKS;
        for task in state.tasks.drain_due(state.time_ticks) {
            state.run_task(task);
        }
        assert!(state.enemies.is_empty());
        assert!(state.enemy_projectiles.is_empty());
    }

    #[test]
    fn test_boss_defeat_advances_level_without_threshold_growth() {
        let mut state = GameState::new(5, WORLD);
        state.level = 8;
        state.enemies_killed = 7;
        state.boss = Some(Boss::mage(WORLD / 2.0));
        state.defeat_boss();

        assert!(state.boss.is_none());
        assert_eq!(state.level, 9);
        assert_eq!(state.enemies_killed, 0);
        assert_eq!(state.enemies_per_level, ENEMIES_PER_LEVEL_START);
        assert_eq!(state.xp_orbs.len(), 20);
        assert_eq!(state.shock_crystals.len(), 1);
        assert!(matches!(state.phase, GamePhase::LevelTransition { .. }));
    }

    #[test]
    fn test_death_starts_once() {
        let mut state = GameState::new(8, WORLD);
        state.damage_player(75.0, DeathCause::Fire);
        assert_eq!(state.phase, GamePhase::Playing);
        state.damage_player(30.0, DeathCause::Bomb);
        assert_eq!(state.phase, GamePhase::Dying { elapsed: 0 });
        assert_eq!(state.death_cause, Some(DeathCause::Bomb));
        assert_eq!(state.player.health(), 0.0);

        state.damage_player(30.0, DeathCause::Fire);
        assert_eq!(state.death_cause, Some(DeathCause::Bomb));
        let deaths = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::PlayerDied { .. }))
            .count();
        assert_eq!(deaths, 1);
    }
}
