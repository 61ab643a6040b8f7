//! Collision & resolution
//!
//! Each tick first moves every entity ([`advance_entities`]), then reconciles
//! their interactions in a fixed order ([`resolve_collisions`]):
//!
//! 1. player projectiles against enemies, the boss, then walls
//! 2. hostile projectiles, lasers and melee contact against the player
//! 3. hazards: stars, falling bombs, placed bombs, fire, walls
//! 4. pickups against the player
//!
//! Removal only ever marks entities dead; the session compacts at the end of
//! the tick, so indices stay valid for the whole pass.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::boss::{BossAction, BossContext, MAGE_PUSH_PULL_FORCE};
use super::enemy::{EnemyContext, EnemyKind};
use super::events::{DeathCause, GameEvent, KillSource, ParticleKind, PickupKind};
use super::geom::{Body, Bounds, within_radius};
use super::hazard::{
    BOMB_ENEMY_DAMAGE, BOMB_EXPLOSION_RADIUS, BOMB_PLAYER_DAMAGE, BombContext, FIRE_DAMAGE, FirePatch,
    PLACED_BOMB_ENEMY_DAMAGE, PLACED_BOMB_EXPLOSION_RADIUS, PLACED_BOMB_PLAYER_DAMAGE, WALL_PUSH, WALL_SIZE, Wall,
};
use super::pickup::{POWER_UP_HEAL, PowerUpKind, merge_xp_orbs};
use super::projectile::{NovaLaser, Projectile, Shooter};
use super::spawn::spawn_enemy_at;
use super::state::GameState;
use crate::consts::*;
use crate::{direction_to, from_angle};

/// Walls test player shots against a small box around the shot centre
const WALL_PROBE_SIZE: f32 = 4.0;

// === Movement ===

/// Move every non-player entity one tick
pub fn advance_entities(state: &mut GameState) {
    advance_enemies(state);
    advance_boss(state);

    let world = state.world;
    let player_center = state.player.center();
    for projectile in state.projectiles.iter_mut().chain(state.enemy_projectiles.iter_mut()) {
        projectile.update();
    }
    for laser in &mut state.lasers {
        laser.update();
    }
    for star in &mut state.stars {
        star.update(world);
    }
    advance_bombs(state);
    for bomb in &mut state.placed_bombs {
        bomb.update();
    }
    for patch in &mut state.fire_patches {
        patch.update();
    }
    for wall in &mut state.walls {
        wall.update();
    }
    for orb in &mut state.xp_orbs {
        orb.update(player_center);
    }
    for orb in &mut state.star_orbs {
        orb.update();
    }
}

fn advance_enemies(state: &mut GameState) {
    let player_center = state.player.center();
    let ctx = EnemyContext {
        player_center,
        projectiles: &state.projectiles,
        bombs: &state.bombs,
    };
    for enemy in state.enemies.iter_mut().filter(|e| !e.dead) {
        enemy.advance(&ctx, &mut state.rng);
        if enemy.should_shoot() {
            let shot = Projectile::hostile(Shooter::Enemy, enemy.center(), player_center);
            state.enemy_projectiles.push(shot);
        }
    }
}

fn advance_boss(state: &mut GameState) {
    let ctx = BossContext {
        player_center: state.player.center(),
        enemy_count: state.live_enemy_count(),
        world: state.world,
    };
    let Some(boss) = state.boss.as_mut() else {
        return;
    };
    let actions = boss.advance(&ctx, &mut state.rng);
    let center = boss.center();

    for action in actions {
        apply_boss_action(state, center, action);
    }
}

fn apply_boss_action(state: &mut GameState, center: Vec2, action: BossAction) {
    let world = state.world;
    match action {
        BossAction::Shoot => {
            let target = state.player.center();
            state
                .enemy_projectiles
                .push(Projectile::hostile(Shooter::Mage, center, target));
        }
        BossAction::Teleported => {
            state.particles(ParticleKind::Power, center, 30);
            state.shake(10.0, 15);
        }
        BossAction::SummonWalls => summon_walls(state),
        BossAction::Push | BossAction::Pull => {
            let sign = if action == BossAction::Push { 1.0 } else { -1.0 };
            if let Some(dir) = direction_to(center, state.player.center()) {
                state.player.shove(dir * MAGE_PUSH_PULL_FORCE * sign, world);
            }
            let player_center = state.player.center();
            state.particles(ParticleKind::Force, player_center, 20);
            state.shake(10.0, 15);
        }
        BossAction::FireLaser => {
            if let Some(dir) = direction_to(center, state.player.center()) {
                state.lasers.push(NovaLaser::new(center, dir));
                state.shake(8.0, 12);
            }
        }
        BossAction::TeleportPlayer => teleport_player(state),
        BossAction::SummonEnemies => summon_enemies(state, center),
        BossAction::Disappear => {
            state.particles(ParticleKind::Power, center, 50);
            state.shake(25.0, 30);
            state.trigger_glitch(15.0, 1.0);
        }
        BossAction::Reappear => {
            state.particles(ParticleKind::Power, center, 50);
            state.shake(15.0, 20);
        }
    }
}

/// Ring the player with 2-4 walls
fn summon_walls(state: &mut GameState) {
    let count = state.rng.random_range(2..=4u32);
    let player_center = state.player.center();
    for i in 0..count {
        let angle = TAU * i as f32 / count as f32;
        let distance = state.rng.random_range(100.0f32..200.0);
        let center = player_center + from_angle(angle) * distance;
        state.walls.push(Wall::new(center - WALL_SIZE / 2.0));
    }
    state.shake(15.0, 20);
    state.trigger_glitch(5.0, 0.7);
}

fn teleport_player(state: &mut GameState) {
    let world = state.world;
    let from = state.player.center();
    let max = (world - state.player.size).max(Vec2::ZERO);
    let pos = Vec2::new(
        state.rng.random::<f32>() * max.x,
        state.rng.random::<f32>() * max.y,
    );
    state.player.teleport(pos, world);

    let to = state.player.center();
    state.particles(ParticleKind::Power, from, 50);
    state.particles(ParticleKind::Power, to, 50);
    state.shake(20.0, 25);
    state.trigger_glitch(12.0, 1.0);
}

/// Call 2-3 dumb enemies in around the boss
fn summon_enemies(state: &mut GameState, center: Vec2) {
    let count = state.rng.random_range(2..=3);
    for _ in 0..count {
        let angle = state.rng.random::<f32>() * TAU;
        let distance = state.rng.random_range(100.0f32..150.0);
        let pos = center + from_angle(angle) * distance - Vec2::splat(ENEMY_SIZE / 2.0);
        spawn_enemy_at(state, pos, EnemyKind::Dumb);
    }
    state.shake(15.0, 18);
    state.trigger_glitch(8.0, 0.8);
}

fn advance_bombs(state: &mut GameState) {
    let enemy_centers: Vec<Vec2> = state
        .enemies
        .iter()
        .filter(|e| !e.dead)
        .map(|e| e.center())
        .collect();
    let ctx = BombContext {
        player_center: state.player.center(),
        enemy_centers: &enemy_centers,
        world: state.world,
    };
    for bomb in state.bombs.iter_mut().filter(|b| !b.exploded) {
        bomb.update(&ctx, &mut state.rng);
    }
}

// === Resolution ===

/// Reconcile every interaction for this tick
pub fn resolve_collisions(state: &mut GameState) {
    resolve_player_projectiles(state);
    resolve_player_hits(state);

    resolve_stars(state);
    resolve_bombs(state);
    resolve_placed_bombs(state);
    resolve_fire(state);
    resolve_walls(state);

    resolve_pickups(state);
}

/// Player shots: first enemy hit (highest index first), else the boss, else a wall
fn resolve_player_projectiles(state: &mut GameState) {
    let world = state.world;
    for i in 0..state.projectiles.len() {
        let projectile = &mut state.projectiles[i];
        if projectile.dead {
            continue;
        }
        if projectile.is_off_screen(world) {
            projectile.dead = true;
            continue;
        }
        let shot = projectile.bounds();
        let damage = projectile.damage;
        let center = projectile.pos;

        let hit = (0..state.enemies.len())
            .rev()
            .find(|&j| !state.enemies[j].dead && state.enemies[j].intersects(&shot));
        if let Some(j) = hit {
            state.projectiles[i].dead = true;
            state.shots_hit += 1;
            if state.enemies[j].take_damage(damage) {
                state.kill_enemy(j, KillSource::Projectile);
            }
            continue;
        }

        let boss_hit = state
            .boss
            .as_ref()
            .is_some_and(|b| b.is_tangible() && b.intersects(&shot));
        // Boss hits consume the shot but do not count toward accuracy
        if boss_hit {
            state.projectiles[i].dead = true;
            if state.boss.as_mut().is_some_and(|b| b.take_damage(damage)) {
                state.defeat_boss();
            }
            continue;
        }

        let probe = Bounds::centered(center, Vec2::splat(WALL_PROBE_SIZE));
        if state.walls.iter().any(|w| !w.dead && w.intersects(&probe)) {
            state.projectiles[i].dead = true;
        }
    }
}

/// Everything that hurts the player on touch
fn resolve_player_hits(state: &mut GameState) {
    let world = state.world;

    for i in 0..state.enemy_projectiles.len() {
        let projectile = &mut state.enemy_projectiles[i];
        if projectile.dead {
            continue;
        }
        if projectile.is_off_screen(world) {
            projectile.dead = true;
            continue;
        }
        if projectile.intersects(&state.player) {
            projectile.dead = true;
            let cause = match projectile.shooter {
                Shooter::Mage => DeathCause::MageProjectile,
                _ => DeathCause::EnemyProjectile,
            };
            let damage = projectile.damage;
            state.damage_player(damage, cause);
        }
    }

    for i in 0..state.lasers.len() {
        let laser = &mut state.lasers[i];
        if laser.dead {
            continue;
        }
        if laser.is_off_screen(world) {
            laser.dead = true;
            continue;
        }
        if laser.hits(&state.player) {
            laser.dead = true;
            let damage = laser.damage;
            state.damage_player(damage, DeathCause::NovaLaser);
        }
    }

    let player = state.player.bounds();
    let contacts: Vec<(f32, EnemyKind)> = state
        .enemies
        .iter()
        .filter(|e| !e.dead && e.intersects(&player))
        .map(|e| (e.contact_damage, e.kind))
        .collect();
    for (damage, kind) in contacts {
        state.damage_player(damage, DeathCause::Contact(kind));
    }

    let boss_contact = state
        .boss
        .as_ref()
        .filter(|b| b.is_tangible() && b.intersects(&player))
        .map(|b| (b.contact_damage, b.kind));
    if let Some((damage, kind)) = boss_contact {
        state.damage_player(damage, DeathCause::Boss(kind));
    }
}

fn resolve_stars(state: &mut GameState) {
    for i in 0..state.stars.len() {
        let star = &mut state.stars[i];
        if star.dead {
            continue;
        }
        if star.is_spent() {
            star.dead = true;
            continue;
        }
        let area = star.bounds();
        for j in (0..state.enemies.len()).rev() {
            if state.enemies[j].intersects(&area) {
                state.kill_enemy(j, KillSource::Star);
            }
        }
    }
}

fn resolve_bombs(state: &mut GameState) {
    for i in 0..state.bombs.len() {
        if !state.bombs[i].should_explode() {
            continue;
        }
        state.bombs[i].detonate();
        let center = state.bombs[i].pos;
        state.particles(ParticleKind::Explosion, center, 50);

        if state.bombs[i].is_fire_bomb {
            let patches = state.bombs[i].fire_patches(state.world, &mut state.rng);
            state.fire_patches.extend(patches);
        } else {
            for j in (0..state.enemies.len()).rev() {
                let enemy = &mut state.enemies[j];
                if !enemy.dead
                    && within_radius(enemy.center(), center, BOMB_EXPLOSION_RADIUS)
                    && enemy.take_damage(BOMB_ENEMY_DAMAGE)
                {
                    state.kill_enemy(j, KillSource::FallingBomb);
                }
            }
        }

        for wall in state
            .walls
            .iter_mut()
            .filter(|w| within_radius(w.center(), center, BOMB_EXPLOSION_RADIUS))
        {
            wall.dead = true;
        }
        if within_radius(state.player.center(), center, BOMB_EXPLOSION_RADIUS) {
            state.damage_player(BOMB_PLAYER_DAMAGE, DeathCause::Bomb);
        }
        state.shake(25.0, 30);
        state.trigger_glitch(10.0, 1.0);
    }
}

fn resolve_placed_bombs(state: &mut GameState) {
    for i in 0..state.placed_bombs.len() {
        if !state.placed_bombs[i].should_explode() {
            continue;
        }
        state.placed_bombs[i].detonate();
        let center = state.placed_bombs[i].pos;
        state.particles(ParticleKind::Explosion, center, 40);

        for j in (0..state.enemies.len()).rev() {
            let enemy = &mut state.enemies[j];
            if !enemy.dead
                && within_radius(enemy.center(), center, PLACED_BOMB_EXPLOSION_RADIUS)
                && enemy.take_damage(PLACED_BOMB_ENEMY_DAMAGE)
            {
                state.kill_enemy(j, KillSource::PlacedBomb);
            }
        }
        if within_radius(state.player.center(), center, PLACED_BOMB_EXPLOSION_RADIUS) {
            state.damage_player(PLACED_BOMB_PLAYER_DAMAGE, DeathCause::PlacedBomb);
        }
        state.shake(20.0, 25);
    }
}

/// Spread, burn the player, ignite enemies; burning enemies leave trails
fn resolve_fire(state: &mut GameState) {
    // Patches born this tick start burning next tick
    let existing = state.fire_patches.len();
    for i in 0..existing {
        if state.fire_patches[i].dead {
            continue;
        }
        if state.fire_patches[i].should_spread(&mut state.rng) {
            let children = state.fire_patches[i].spread(state.world, &mut state.rng);
            state.fire_patches.extend(children);
        }

        let area = state.fire_patches[i].bounds();
        if state.player.intersects(&area) && state.fire_patches[i].should_damage() {
            state.damage_player(FIRE_DAMAGE, DeathCause::Fire);
        }
        for enemy in state
            .enemies
            .iter_mut()
            .filter(|e| !e.dead && e.intersects(&area))
        {
            enemy.ignite();
        }

        if state.fire_patches[i].is_expired() {
            state.fire_patches[i].dead = true;
        }
    }

    let trails: Vec<FirePatch> = state
        .enemies
        .iter_mut()
        .filter(|e| !e.dead)
        .filter_map(|e| e.should_leave_fire_trail().then(|| FirePatch::trail(e.center())))
        .collect();
    state.fire_patches.extend(trails);
}

fn resolve_walls(state: &mut GameState) {
    let world = state.world;
    for wall in state.walls.iter_mut().filter(|w| !w.dead) {
        if wall.is_expired() {
            wall.dead = true;
            continue;
        }
        if state.player.intersects(&*wall) {
            let push = direction_to(wall.center(), state.player.center()).unwrap_or(Vec2::X) * WALL_PUSH;
            state.player.shove(push, world);
        }
    }
}

fn resolve_pickups(state: &mut GameState) {
    for orb in &mut state.xp_orbs {
        if orb.is_expired() {
            orb.dead = true;
        }
    }
    for orb in &mut state.star_orbs {
        if orb.is_expired() {
            orb.dead = true;
        }
    }

    // Nothing is collected once the player is down
    if state.is_live() {
        collect_power_ups(state);
        collect_shock_crystals(state);
        collect_star_orbs(state);
        collect_xp_orbs(state);
    }

    state.xp_orbs.retain(|o| !o.dead);
    merge_xp_orbs(&mut state.xp_orbs);
}

fn collect_power_ups(state: &mut GameState) {
    for i in 0..state.power_ups.len() {
        let power_up = &mut state.power_ups[i];
        if power_up.dead || !power_up.intersects(&state.player) {
            continue;
        }
        power_up.dead = true;
        let (kind, center) = (power_up.kind, power_up.center());

        match kind {
            PowerUpKind::Health => {
                state.player.heal(POWER_UP_HEAL);
                state.particles(ParticleKind::Heal, center, 20);
            }
            PowerUpKind::Multishot => {
                state.multishot_ticks = MULTISHOT_DURATION;
                state.particles(ParticleKind::Power, center, 20);
            }
        }
        state.events.push(GameEvent::PickupCollected {
            kind: PickupKind::PowerUp(kind),
        });
    }
}

fn collect_shock_crystals(state: &mut GameState) {
    for i in 0..state.shock_crystals.len() {
        let crystal = &mut state.shock_crystals[i];
        if crystal.dead || !state.player.has_inventory_space() || !crystal.intersects(&state.player) {
            continue;
        }
        crystal.dead = true;
        let center = crystal.center();

        state.player.add_shock_crystal();
        state.particles(ParticleKind::Collection, center, 20);
        state.shake(15.0, 20);
        state.events.push(GameEvent::PickupCollected {
            kind: PickupKind::ShockCrystal,
        });
    }
}

fn collect_star_orbs(state: &mut GameState) {
    for i in 0..state.star_orbs.len() {
        let orb = &mut state.star_orbs[i];
        if orb.dead
            || state.score < STAR_ORB_COST
            || !state.player.has_inventory_space()
            || !orb.intersects(&state.player)
        {
            continue;
        }
        orb.dead = true;
        let center = orb.center();

        state.score -= STAR_ORB_COST;
        state.player.add_star();
        state.particles(ParticleKind::Collection, center, 30);
        state.shake(15.0, 20);
        state.events.push(GameEvent::PickupCollected {
            kind: PickupKind::StarOrb,
        });
    }
}

fn collect_xp_orbs(state: &mut GameState) {
    for i in 0..state.xp_orbs.len() {
        let orb = &mut state.xp_orbs[i];
        if orb.dead || !orb.intersects(&state.player) {
            continue;
        }
        orb.dead = true;
        let (value, pos) = (orb.value, orb.pos);

        state.score += u64::from(value);
        state.particles(ParticleKind::Collection, pos, 5);
        state.events.push(GameEvent::PickupCollected {
            kind: PickupKind::XpOrb { value },
        });
    }
}

// === Shockwave ===

/// Kill every regular enemy, then check for a level-up once
pub fn trigger_shockwave(state: &mut GameState) -> u32 {
    let center = state.player.center();
    state.particles(ParticleKind::Shockwave, center, 200);
    state.shake(50.0, 60);
    state.trigger_glitch(20.0, 1.0);

    let mut kills = 0;
    for j in (0..state.enemies.len()).rev() {
        if state.kill_enemy(j, KillSource::Shockwave) {
            kills += 1;
        }
    }
    state.check_level_up();

    log::debug!("Shockwave killed {} enemies", kills);
    state.events.push(GameEvent::Shockwave { kills });
    kills
}
