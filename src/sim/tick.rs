//! Fixed timestep simulation tick
//!
//! Drives the session state machine and runs every subsystem in a fixed order.

use glam::Vec2;

use super::boss::BossKind;
use super::events::{GameEvent, ParticleKind};
use super::geom::{Body, within_radius};
use super::hazard::{PLACED_BOMB_MIN_SPACING, PlaceableBomb};
use super::player::Movement;
use super::projectile::{Projectile, Star};
use super::resolve::{advance_entities, resolve_collisions, trigger_shockwave};
use super::snapshot::accuracy_phrase;
use super::spawn::{force_buy_star_orb, spawn_boss, toggle_nova, update_spawning};
use super::state::{GamePhase, GameState};
use crate::consts::*;
use crate::{direction_to, from_angle};

/// Autopilot shoots this often
const AUTOPILOT_FIRE_TICKS: u64 = 12;
/// Threats closer than this make the autopilot back off
const AUTOPILOT_THREAT_RADIUS: f32 = 200.0;
/// Enemy count at which the autopilot spends a shock crystal
const AUTOPILOT_SHOCKWAVE_CROWD: usize = 8;
/// Keep the autopilot's goal this far inside the world
const AUTOPILOT_EDGE_MARGIN: f32 = 60.0;
const AUTOPILOT_DEADZONE: f32 = 4.0;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Held movement keys
    pub movement: Movement,
    /// Primary fire toward a world point
    pub fire: Option<Vec2>,
    /// Secondary action toward a world point (shockwave, star or placed bomb)
    pub secondary: Option<Vec2>,
    /// Highlight an inventory slot
    pub select_slot: Option<u8>,
    /// Discard the session and start over
    pub reset: bool,
    /// Pause toggle
    pub pause: bool,
    /// Idle/demo mode - AI plays the game
    pub idle_mode: bool,

    // Debug
    pub spawn_mage: bool,
    pub spawn_nova: bool,
    pub toggle_nova: bool,
    pub buy_star: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    if input.reset {
        reset(state);
        return;
    }

    if input.pause && !state.is_game_over() {
        state.paused = !state.paused;
        log::debug!("Paused: {}", state.paused);
    }
    if let Some(slot) = input
        .select_slot
        .filter(|&s| u32::from(s) < state.player.max_inventory_slots)
    {
        state.selected_slot = slot;
    }

    // Nothing moves (and no deferred task comes due) while paused
    if state.paused || state.is_game_over() {
        return;
    }

    state.time_ticks += 1;
    for action in state.tasks.drain_due(state.time_ticks) {
        state.run_task(action);
    }

    match state.phase {
        GamePhase::Dying { elapsed } => {
            advance_death(state, elapsed + 1);
            return;
        }
        GamePhase::LevelTransition { elapsed } => {
            let elapsed = elapsed + 1;
            if elapsed >= LEVEL_TRANSITION_TICKS {
                state.phase = GamePhase::Playing;
                state.enemy_spawn_interval = state
                    .enemy_spawn_interval
                    .saturating_sub(ENEMY_SPAWN_INTERVAL_TRANSITION_STEP)
                    .max(ENEMY_SPAWN_INTERVAL_TRANSITION_FLOOR);
            } else {
                state.phase = GamePhase::LevelTransition { elapsed };
            }
        }
        GamePhase::Playing | GamePhase::GameOver => {}
    }

    let mut input = input.clone();
    if input.idle_mode {
        autopilot(state, &mut input);
    }
    let input = &input;

    if let Some(target) = input.fire {
        fire_primary(state, target);
    }
    if let Some(target) = input.secondary {
        use_secondary(state, target);
    }
    let world = state.world;
    state.player.update(input.movement, world);

    advance_entities(state);
    resolve_collisions(state);
    state.multishot_ticks = state.multishot_ticks.saturating_sub(1);

    update_spawning(state);
    if input.spawn_mage {
        spawn_boss(state, BossKind::Mage);
    }
    if input.spawn_nova {
        spawn_boss(state, BossKind::Nova);
    }
    if input.toggle_nova {
        toggle_nova(state);
    }
    if input.buy_star {
        force_buy_star_orb(state);
    }

    state.compact();
}

fn reset(state: &mut GameState) {
    log::info!("Resetting session (seed {})", state.seed);
    *state = GameState::new(state.seed, state.world);
    state.events.push(GameEvent::Reset);
}

fn advance_death(state: &mut GameState, elapsed: u32) {
    if elapsed < DEATH_ANIMATION_TICKS {
        state.phase = GamePhase::Dying { elapsed };
        return;
    }
    state.phase = GamePhase::GameOver;
    state.events.push(GameEvent::GameOver);
    let accuracy = state.accuracy();
    log::info!(
        "Game over on level {}: score {}, accuracy {}% ({})",
        state.level,
        state.score,
        accuracy,
        accuracy_phrase(accuracy)
    );
}

/// Shoot from the player toward `target`: one bullet, or a spread while multishot runs
pub fn fire_primary(state: &mut GameState, target: Vec2) {
    if !state.is_live() {
        return;
    }
    let origin = state.player.center();
    let Some(dir) = direction_to(origin, target) else {
        return;
    };

    let pellets = if state.multishot_active() {
        let base = dir.y.atan2(dir.x);
        for offset in MULTISHOT_SPREAD {
            state
                .projectiles
                .push(Projectile::player(origin, from_angle(base + offset)));
        }
        MULTISHOT_SPREAD.len() as u32
    } else {
        state.projectiles.push(Projectile::player(origin, dir));
        1
    };

    state.shots_fired += pellets;
    state.particles(ParticleKind::Muzzle, origin, 5);
    state.events.push(GameEvent::ShotFired { pellets });
}

/// Secondary action: shock crystal, else star, else a placed bomb at `target`
pub fn use_secondary(state: &mut GameState, target: Vec2) {
    if !state.is_live() {
        return;
    }

    if state.player.use_shock_crystal() {
        trigger_shockwave(state);
        return;
    }

    if state.player.stars > 0 {
        let origin = state.player.center();
        if let Some(dir) = direction_to(origin, target) {
            state.player.use_star();
            state.stars.push(Star::new(origin, dir));
            state.shake(10.0, 15);
            state.particles(ParticleKind::Power, origin, 20);
        }
        return;
    }

    let crowded = state
        .placed_bombs
        .iter()
        .any(|b| !b.exploded && within_radius(b.pos, target, PLACED_BOMB_MIN_SPACING));
    if state.placeable_bombs > 0 && !crowded {
        state.placed_bombs.push(PlaceableBomb::new(target));
        state.placeable_bombs -= 1;
    }
}

/// Demo AI: shoot the nearest target, back away from the nearest threat,
/// otherwise wander toward loot
fn autopilot(state: &GameState, input: &mut TickInput) {
    let me = state.player.center();
    let closest = |a: &Vec2, b: &Vec2| a.distance_squared(me).total_cmp(&b.distance_squared(me));

    let boss_center = state.boss.as_ref().filter(|b| b.is_tangible()).map(|b| b.center());
    let target = state
        .enemies
        .iter()
        .filter(|e| !e.dead)
        .map(|e| e.center())
        .chain(boss_center)
        .min_by(closest);

    if let Some(target) = target {
        if state.time_ticks.is_multiple_of(AUTOPILOT_FIRE_TICKS) {
            input.fire = Some(target);
        }
        let crowd = state.live_enemy_count() >= AUTOPILOT_SHOCKWAVE_CROWD;
        if (state.player.shock_crystals > 0 && crowd) || state.player.stars > 0 {
            input.secondary = Some(target);
        }
    }

    let threat = state
        .enemies
        .iter()
        .filter(|e| !e.dead)
        .map(|e| e.center())
        .chain(state.enemy_projectiles.iter().filter(|p| !p.dead).map(|p| p.pos))
        .chain(state.lasers.iter().filter(|l| !l.dead).map(|l| l.pos))
        .chain(boss_center)
        .filter(|p| within_radius(*p, me, AUTOPILOT_THREAT_RADIUS))
        .min_by(closest);

    let goal = match threat {
        Some(threat) => me + (me - threat),
        None => state
            .power_ups
            .iter()
            .map(|p| p.center())
            .chain(state.shock_crystals.iter().map(|c| c.center()))
            .chain(state.xp_orbs.iter().map(|o| o.pos))
            .min_by(closest)
            .unwrap_or(state.world / 2.0),
    };
    let lo = Vec2::splat(AUTOPILOT_EDGE_MARGIN).min(state.world / 2.0);
    let hi = (state.world - Vec2::splat(AUTOPILOT_EDGE_MARGIN)).max(lo);
    input.movement = steer(me, goal.clamp(lo, hi));
}

fn steer(from: Vec2, to: Vec2) -> Movement {
    let d = to - from;
    Movement {
        up: d.y < -AUTOPILOT_DEADZONE,
        down: d.y > AUTOPILOT_DEADZONE,
        left: d.x < -AUTOPILOT_DEADZONE,
        right: d.x > AUTOPILOT_DEADZONE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::{Enemy, EnemyKind};
    use crate::sim::events::{DeathCause, Effect};
    use crate::sim::projectile::Shooter;

    const WORLD: Vec2 = Vec2::new(WORLD_WIDTH, WORLD_HEIGHT);

    fn pause() -> TickInput {
        TickInput {
            pause: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_tick_pause() {
        let mut state = GameState::new(12345, WORLD);
        tick(&mut state, &TickInput::default());
        assert_eq!(state.time_ticks, 1);

        tick(&mut state, &pause());
        assert!(state.paused);
        assert_eq!(state.time_ticks, 1);

        for _ in 0..10 {
            tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.time_ticks, 1);

        // Unpause resumes in the same tick
        tick(&mut state, &pause());
        assert!(!state.paused);
        assert_eq!(state.time_ticks, 2);
    }

    #[test]
    fn test_pause_freezes_scheduled_tasks() {
        let mut state = GameState::new(7, WORLD);
        state.add_light(Vec2::new(100.0, 100.0));

        tick(&mut state, &pause());
        for _ in 0..100 {
            tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.lights.len(), 1);

        tick(&mut state, &pause());
        for _ in 1..KILL_LIGHT_TICKS {
            tick(&mut state, &TickInput::default());
        }
        assert!(state.lights.is_empty());
    }

    #[test]
    fn test_reset_rebuilds_session() {
        let mut state = GameState::new(31, WORLD);
        for _ in 0..50 {
            tick(&mut state, &TickInput::default());
        }
        state.score = 999;
        state.level = 5;

        tick(
            &mut state,
            &TickInput {
                reset: true,
                ..Default::default()
            },
        );
        assert_eq!(state.score, 0);
        assert_eq!(state.level, 1);
        assert_eq!(state.time_ticks, 0);
        assert_eq!(state.seed, 31);
        assert_eq!(state.events, vec![GameEvent::Reset]);
    }

    #[test]
    fn test_determinism() {
        let mut state1 = GameState::new(99999, WORLD);
        let mut state2 = GameState::new(99999, WORLD);
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };

        for _ in 0..3000 {
            tick(&mut state1, &input);
            tick(&mut state2, &input);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.rng, state2.rng);
        let snap1 = serde_json::to_string(&state1.snapshot()).ok();
        let snap2 = serde_json::to_string(&state2.snapshot()).ok();
        assert!(snap1.is_some());
        assert_eq!(snap1, snap2);
    }

    #[test]
    fn test_lethal_hit_then_game_over() {
        let mut state = GameState::new(5, WORLD);
        state.player.take_damage(75.0);
        let center = state.player.center();
        let mut shot = Projectile::hostile(Shooter::Enemy, center, center + Vec2::X);
        shot.damage = 30.0;
        state.enemy_projectiles.push(shot);

        tick(&mut state, &TickInput::default());
        assert_eq!(state.phase, GamePhase::Dying { elapsed: 0 });
        assert_eq!(state.player.health(), 0.0);
        assert_eq!(state.death_cause, Some(DeathCause::EnemyProjectile));

        for _ in 0..DEATH_ANIMATION_TICKS {
            tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.events.contains(&GameEvent::GameOver));

        let ticks = state.time_ticks;
        tick(&mut state, &TickInput::default());
        assert_eq!(state.time_ticks, ticks);
    }

    #[test]
    fn test_level_transition_lowers_spawn_interval() {
        let mut state = GameState::new(6, WORLD);
        state.enemy_spawn_interval = 45;
        state.enemies_killed = state.enemies_per_level;
        assert!(state.check_level_up());

        for _ in 1..LEVEL_TRANSITION_TICKS {
            tick(&mut state, &TickInput::default());
        }
        assert!(matches!(state.phase, GamePhase::LevelTransition { .. }));

        tick(&mut state, &TickInput::default());
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.enemy_spawn_interval, ENEMY_SPAWN_INTERVAL_TRANSITION_FLOOR);
    }

    #[test]
    fn test_every_pellet_counts_as_a_shot() {
        let mut state = GameState::new(8, WORLD);
        let fire = TickInput {
            fire: Some(Vec2::new(0.0, 0.0)),
            ..Default::default()
        };

        tick(&mut state, &fire);
        assert_eq!(state.shots_fired, 1);
        assert_eq!(state.projectiles.len(), 1);

        state.multishot_ticks = MULTISHOT_DURATION;
        tick(&mut state, &fire);
        assert_eq!(state.shots_fired, 4);
        assert_eq!(state.projectiles.len(), 4);
    }

    #[test]
    fn test_multishot_expires() {
        let mut state = GameState::new(9, WORLD);
        state.multishot_ticks = 3;
        for _ in 0..3 {
            tick(&mut state, &TickInput::default());
        }
        assert!(!state.multishot_active());
    }

    #[test]
    fn test_secondary_priority() {
        let mut state = GameState::new(10, WORLD);
        state.player.add_shock_crystal();
        state.player.add_star();
        state.placeable_bombs = 2;
        let target = Vec2::new(100.0, 100.0);

        use_secondary(&mut state, target);
        assert_eq!(state.player.shock_crystals, 0);
        assert_eq!(state.player.stars, 1);
        assert!(state.events.contains(&GameEvent::Shockwave { kills: 0 }));

        use_secondary(&mut state, target);
        assert_eq!(state.player.stars, 0);
        assert_eq!(state.stars.len(), 1);
        assert_eq!(state.placeable_bombs, 2);

        use_secondary(&mut state, target);
        assert_eq!(state.placed_bombs.len(), 1);
        assert_eq!(state.placeable_bombs, 1);

        // Too close to the first bomb
        use_secondary(&mut state, target + Vec2::new(50.0, 0.0));
        assert_eq!(state.placed_bombs.len(), 1);
        assert_eq!(state.placeable_bombs, 1);

        use_secondary(&mut state, target + Vec2::new(150.0, 0.0));
        assert_eq!(state.placed_bombs.len(), 2);
        assert_eq!(state.placeable_bombs, 0);
    }

    #[test]
    fn test_star_throw_feedback() {
        let mut state = GameState::new(13, WORLD);
        state.player.add_star();
        let origin = state.player.center();

        use_secondary(&mut state, origin + Vec2::new(100.0, 0.0));
        assert_eq!(state.stars.len(), 1);
        assert!(state.effects.contains(&Effect::Shake {
            intensity: 10.0,
            duration: 15
        }));
        assert!(state.effects.contains(&Effect::Particles {
            kind: ParticleKind::Power,
            pos: origin,
            count: 20
        }));
    }

    #[test]
    fn test_slot_selection() {
        let mut state = GameState::new(11, WORLD);
        let select = |slot| TickInput {
            select_slot: Some(slot),
            ..Default::default()
        };
        tick(&mut state, &select(2));
        assert_eq!(state.selected_slot, 2);
        tick(&mut state, &select(7));
        assert_eq!(state.selected_slot, 2);
    }

    #[test]
    fn test_debug_boss_inputs_respect_exclusivity() {
        let mut state = GameState::new(12, WORLD);
        tick(
            &mut state,
            &TickInput {
                spawn_nova: true,
                spawn_mage: true,
                ..Default::default()
            },
        );
        assert_eq!(state.boss_kind(), Some(BossKind::Mage));

        tick(
            &mut state,
            &TickInput {
                spawn_nova: true,
                ..Default::default()
            },
        );
        assert_eq!(state.boss_kind(), Some(BossKind::Mage));
    }

    #[test]
    fn test_autopilot_aims_and_backs_off() {
        let mut state = GameState::new(13, WORLD);
        state.time_ticks = AUTOPILOT_FIRE_TICKS;
        let me = state.player.center();
        let id = state.next_entity_id();
        state
            .enemies
            .push(Enemy::new(id, me + Vec2::new(100.0, -15.0), EnemyKind::Dumb));
        let enemy_center = me + Vec2::new(115.0, 0.0);

        let mut input = TickInput::default();
        autopilot(&state, &mut input);
        assert_eq!(input.fire, Some(enemy_center));
        assert!(input.movement.left);
        assert!(!input.movement.right);
    }

    #[test]
    fn test_autopilot_engages_enemies() {
        let mut state = GameState::new(2024, WORLD);
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for _ in 0..600 {
            tick(&mut state, &input);
        }
        assert!(state.shots_fired > 0);
        assert!(state.shots_hit <= state.shots_fired);
    }
}
