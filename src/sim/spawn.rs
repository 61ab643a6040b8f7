//! Spawning and progression
//!
//! Timers and probability tables deciding what enters the arena and when.

use glam::Vec2;
use rand::Rng;

use super::boss::{Boss, BossKind};
use super::enemy::{Enemy, EnemyKind, pick_enemy_kind};
use super::events::{GameEvent, ParticleKind, PickupKind};
use super::geom::Body;
use super::hazard::{BOMB_GROUND_INSET, BOMB_START_Y, Bomb};
use super::pickup::{PowerUp, PowerUpKind, StarOrb};
use super::state::GameState;
use crate::consts::*;

/// Power-ups appear at least this far inside the world
const POWER_UP_MARGIN: f32 = 20.0;
/// Star orbs and falling bombs appear at least this far inside the world
const SPAWN_MARGIN: f32 = 50.0;

/// Whether a Mage fight is due on `level` (level 8, then every 6th level)
pub fn mage_due(level: u32) -> bool {
    level >= MAGE_FIRST_LEVEL && (level - MAGE_FIRST_LEVEL).is_multiple_of(MAGE_LEVEL_PERIOD)
}

/// Top-left corner just outside a world edge (`side`: 0 top, 1 right, 2 bottom, 3 left)
pub fn edge_spawn_position(world: Vec2, side: u32, t: f32) -> Vec2 {
    match side % 4 {
        0 => Vec2::new(t * world.x, -ENEMY_SPAWN_OFFSET),
        1 => Vec2::new(world.x + ENEMY_SPAWN_OFFSET, t * world.y),
        2 => Vec2::new(t * world.x, world.y + ENEMY_SPAWN_OFFSET),
        _ => Vec2::new(-ENEMY_SPAWN_OFFSET, t * world.y),
    }
}

/// Uniform point whose margin-inset box fits inside the world
fn random_point_inside(rng: &mut impl Rng, world: Vec2, margin: f32) -> Vec2 {
    let span = (world - Vec2::splat(2.0 * margin)).max(Vec2::ZERO);
    Vec2::new(
        margin + rng.random::<f32>() * span.x,
        margin + rng.random::<f32>() * span.y,
    )
}

/// Spawn one regular enemy off a random edge, kind chosen by level
pub fn spawn_enemy(state: &mut GameState) -> EnemyKind {
    let side = state.rng.random_range(0..4);
    let t = state.rng.random::<f32>();
    let pos = edge_spawn_position(state.world, side, t);
    let kind = pick_enemy_kind(state.level, state.rng.random());

    let id = state.next_entity_id();
    state.enemies.push(Enemy::new(id, pos, kind));
    state.events.push(GameEvent::EnemySpawned { kind });
    kind
}

/// Regular enemy at an explicit spot, kept on screen (Nova summons)
pub fn spawn_enemy_at(state: &mut GameState, pos: Vec2, kind: EnemyKind) {
    let max = (state.world - Vec2::splat(ENEMY_SIZE)).max(Vec2::ZERO);
    let id = state.next_entity_id();
    state.enemies.push(Enemy::new(id, pos.clamp(Vec2::ZERO, max), kind));
    state.events.push(GameEvent::EnemySpawned { kind });
}

pub fn spawn_power_up(state: &mut GameState) {
    let pos = random_point_inside(&mut state.rng, state.world, POWER_UP_MARGIN);
    let kind = if state.rng.random_bool(0.5) {
        PowerUpKind::Health
    } else {
        PowerUpKind::Multishot
    };
    state.power_ups.push(PowerUp::new(pos, kind));
}

pub fn spawn_falling_bomb(state: &mut GameState) {
    let span = (state.world.x - 2.0 * SPAWN_MARGIN).max(0.0);
    let x = SPAWN_MARGIN + state.rng.random::<f32>() * span;
    let ground = state.world.y - BOMB_GROUND_INSET;
    let bomb = Bomb::new(Vec2::new(x, BOMB_START_Y), ground, &mut state.rng);
    state.bombs.push(bomb);
}

pub fn spawn_star_orb(state: &mut GameState) {
    let pos = random_point_inside(&mut state.rng, state.world, SPAWN_MARGIN);
    state.star_orbs.push(StarOrb::new(pos));
}

/// Put a boss in the (empty) boss slot, clearing the regular wave.
///
/// Returns false without touching anything if a boss is already present.
pub fn spawn_boss(state: &mut GameState, kind: BossKind) -> bool {
    if state.boss.is_some() {
        log::debug!("Refusing to spawn {} while a boss is alive", kind.name());
        return false;
    }

    let center = state.world / 2.0;
    state.boss = Some(match kind {
        BossKind::Mage => Boss::mage(center),
        BossKind::Nova => Boss::nova(center),
    });
    state.enemies.clear();
    state.enemy_projectiles.clear();

    match kind {
        BossKind::Mage => {
            state.particles(ParticleKind::Explosion, center, 100);
            state.shake(30.0, 40);
            state.trigger_glitch(10.0, 1.0);
        }
        BossKind::Nova => {
            state.particles(ParticleKind::Explosion, center, 150);
            state.shake(40.0, 50);
            state.trigger_glitch(15.0, 1.0);
        }
    }
    state.events.push(GameEvent::BossSpawned { kind });
    log::info!("{} spawned on level {}", kind.name(), state.level);
    true
}

/// Suspend or resume the Nova; no-op without one
pub fn toggle_nova(state: &mut GameState) {
    if let Some(boss) = state.boss.as_mut().filter(|b| b.kind == BossKind::Nova) {
        boss.is_active = !boss.is_active;
        log::debug!("Nova active: {}", boss.is_active);
    }
}

/// Buy a star directly, discarding any star orb on the field
pub fn force_buy_star_orb(state: &mut GameState) -> bool {
    if state.score < STAR_ORB_COST || !state.player.has_inventory_space() {
        return false;
    }
    state.score -= STAR_ORB_COST;
    state.player.add_star();
    state.star_orbs.clear();

    let center = state.player.center();
    state.particles(ParticleKind::Collection, center, 30);
    state.shake(15.0, 20);
    state.events.push(GameEvent::PickupCollected {
        kind: PickupKind::StarOrb,
    });
    true
}

/// Run every spawn timer for one tick
pub fn update_spawning(state: &mut GameState) {
    if !state.regular_spawning_blocked() {
        state.enemy_spawn_timer += 1;
        if state.enemy_spawn_timer >= state.enemy_spawn_interval {
            spawn_enemy(state);
            state.enemy_spawn_timer = 0;
            if state.enemy_spawn_interval > ENEMY_SPAWN_INTERVAL_FLOOR {
                state.enemy_spawn_interval -= 1;
            }
        }
    }

    if state.boss.is_none() && mage_due(state.level) && state.live_enemy_count() == 0 {
        spawn_boss(state, BossKind::Mage);
    }

    if state.score >= STAR_ORB_COST && state.star_orbs.is_empty() && state.player.has_inventory_space() {
        spawn_star_orb(state);
    }

    state.power_up_spawn_timer += 1;
    if state.power_up_spawn_timer >= POWER_UP_SPAWN_INTERVAL {
        spawn_power_up(state);
        state.power_up_spawn_timer = 0;
    }

    if state.level >= BOMB_MIN_LEVEL {
        state.bomb_spawn_timer += 1;
        if state.bomb_spawn_timer >= BOMB_SPAWN_INTERVAL {
            if state.rng.random_bool(BOMB_SPAWN_CHANCE) {
                spawn_falling_bomb(state);
            }
            state.bomb_spawn_timer = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORLD: Vec2 = Vec2::new(WORLD_WIDTH, WORLD_HEIGHT);

    #[test]
    fn test_mage_levels() {
        assert!(!mage_due(7));
        assert!(mage_due(8));
        assert!(!mage_due(9));
        assert!(mage_due(14));
        assert!(mage_due(20));
    }

    #[test]
    fn test_level_one_spawns_only_dumb() {
        let mut state = GameState::new(77, WORLD);
        for _ in 0..1000 {
            assert_eq!(spawn_enemy(&mut state), EnemyKind::Dumb);
        }
        assert!(state.enemies.iter().all(|e| {
            e.pos.x < 0.0 || e.pos.y < 0.0 || e.pos.x > WORLD.x || e.pos.y > WORLD.y
        }));
    }

    #[test]
    fn test_spawn_interval_ramps_to_floor() {
        let mut state = GameState::new(1, WORLD);
        for _ in 0..20_000 {
            update_spawning(&mut state);
            state.enemies.clear();
        }
        assert_eq!(state.enemy_spawn_interval, ENEMY_SPAWN_INTERVAL_FLOOR);
    }

    #[test]
    fn test_mage_blocks_regular_spawns() {
        let mut state = GameState::new(2, WORLD);
        assert!(spawn_boss(&mut state, BossKind::Mage));
        for _ in 0..1000 {
            update_spawning(&mut state);
        }
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_active_nova_blocks_regular_spawns_until_suspended() {
        let mut state = GameState::new(3, WORLD);
        assert!(spawn_boss(&mut state, BossKind::Nova));
        for _ in 0..1000 {
            update_spawning(&mut state);
        }
        assert!(state.enemies.is_empty());

        toggle_nova(&mut state);
        for _ in 0..ENEMY_SPAWN_INTERVAL_START {
            update_spawning(&mut state);
        }
        assert_eq!(state.enemies.len(), 1);
    }

    #[test]
    fn test_boss_slot_is_exclusive() {
        let mut state = GameState::new(4, WORLD);
        assert!(spawn_boss(&mut state, BossKind::Nova));
        assert!(!spawn_boss(&mut state, BossKind::Mage));
        assert_eq!(state.boss_kind(), Some(BossKind::Nova));

        state.boss = None;
        assert!(spawn_boss(&mut state, BossKind::Mage));
        assert!(!spawn_boss(&mut state, BossKind::Nova));
        assert_eq!(state.boss_kind(), Some(BossKind::Mage));
    }

    #[test]
    fn test_mage_waits_for_empty_field() {
        let mut state = GameState::new(5, WORLD);
        state.level = MAGE_FIRST_LEVEL;
        state.enemy_spawn_timer = 0;
        spawn_enemy(&mut state);
        update_spawning(&mut state);
        assert!(state.boss.is_none());

        state.enemies.clear();
        update_spawning(&mut state);
        assert_eq!(state.boss_kind(), Some(BossKind::Mage));
    }

    #[test]
    fn test_spawning_boss_clears_wave() {
        let mut state = GameState::new(6, WORLD);
        for _ in 0..5 {
            spawn_enemy(&mut state);
        }
        spawn_boss(&mut state, BossKind::Mage);
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_force_buy_star() {
        let mut state = GameState::new(7, WORLD);
        state.score = 79;
        assert!(!force_buy_star_orb(&mut state));
        state.score = 100;
        spawn_star_orb(&mut state);
        assert!(force_buy_star_orb(&mut state));
        assert_eq!(state.score, 20);
        assert_eq!(state.player.stars, 1);
        assert!(state.star_orbs.is_empty());
    }

    #[test]
    fn test_bombs_only_from_level_three() {
        let mut state = GameState::new(8, WORLD);
        for _ in 0..(BOMB_SPAWN_INTERVAL * 50) {
            update_spawning(&mut state);
        }
        assert!(state.bombs.is_empty());

        state.level = BOMB_MIN_LEVEL;
        for _ in 0..(BOMB_SPAWN_INTERVAL * 50) {
            update_spawning(&mut state);
            state.enemies.clear();
        }
        assert!(!state.bombs.is_empty());
    }
}
