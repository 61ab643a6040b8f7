//! Regular enemies
//!
//! Each [`EnemyKind`] carries its own stats and movement rule; [`Enemy::advance`]
//! dispatches on the kind once per tick.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geom::{Body, Bounds};
use super::hazard::Bomb;
use super::projectile::Projectile;
use crate::consts::*;
use crate::from_angle;

/// Medium enemies stop closing in inside this radius
pub const MEDIUM_HOLD_DISTANCE: f32 = 100.0;
/// Smart enemies stop closing in inside this radius
pub const SMART_HOLD_DISTANCE: f32 = 150.0;
/// Projectiles closer than this make a smart enemy dodge
pub const SMART_DODGE_RADIUS: f32 = 80.0;
pub const SMART_DODGE_SPEED_FACTOR: f32 = 1.5;
/// Unit push away from each threatening bomb
pub const BOMB_AVOID_STEP: f32 = 3.0;
/// Ticks of normal movement before a teleporter fades out
pub const TELEPORT_INTERVAL: u32 = 180;
pub const TELEPORT_COOLDOWN: u32 = 60;
pub const TELEPORT_FADE_STEP: f32 = 0.05;
pub const TELEPORT_MIN_DISTANCE: f32 = 100.0;
pub const TELEPORT_DISTANCE_RANGE: f32 = 150.0;
pub const IGNITE_SPEED_FACTOR: f32 = 1.5;
/// Ticks between fire patches dropped by a burning enemy
pub const FIRE_TRAIL_INTERVAL: u32 = 60;

/// Behavioural category of a regular enemy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Walks straight at the player
    Dumb,
    /// Closes to 100px and shoots slowly
    Medium,
    /// Dodges projectiles, holds at 150px and shoots
    Smart,
    /// Walks at the player and periodically blinks next to them
    Teleport,
}

/// Per-kind baseline stats
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    pub speed: f32,
    pub health: f32,
    pub shoot_interval: u32,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 4] = [Self::Dumb, Self::Medium, Self::Smart, Self::Teleport];

    pub fn stats(self) -> EnemyStats {
        match self {
            Self::Dumb => EnemyStats {
                speed: 2.0,
                health: 30.0,
                shoot_interval: 120,
            },
            Self::Medium => EnemyStats {
                speed: 2.2,
                health: 35.0,
                shoot_interval: 180,
            },
            Self::Smart => EnemyStats {
                speed: 2.5,
                health: 40.0,
                shoot_interval: 120,
            },
            Self::Teleport => EnemyStats {
                speed: 1.5,
                health: 25.0,
                shoot_interval: 120,
            },
        }
    }

    pub fn shoots(self) -> bool {
        matches!(self, Self::Medium | Self::Smart)
    }

    /// XP orbs dropped on death as `(count, value)`
    pub fn loot(self) -> (u32, u32) {
        match self {
            Self::Smart => (5, 10),
            Self::Teleport => (6, 10),
            Self::Medium => (3, 5),
            Self::Dumb => (2, 5),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dumb => "dumb",
            Self::Medium => "medium",
            Self::Smart => "smart",
            Self::Teleport => "teleport",
        }
    }
}

/// Level-gated enemy mix; `roll` is uniform in `[0, 1)`
pub fn pick_enemy_kind(level: u32, roll: f64) -> EnemyKind {
    use EnemyKind::*;
    match level {
        0 | 1 => Dumb,
        2 => {
            if roll < 0.4 {
                Dumb
            } else if roll < 0.7 {
                Medium
            } else {
                Smart
            }
        }
        3 => {
            if roll < 0.3 {
                Dumb
            } else if roll < 0.5 {
                Medium
            } else if roll < 0.75 {
                Smart
            } else {
                Teleport
            }
        }
        _ => {
            if roll < 0.25 {
                Dumb
            } else if roll < 0.5 {
                Medium
            } else if roll < 0.75 {
                Smart
            } else {
                Teleport
            }
        }
    }
}

/// Blink sub-state of teleporting enemies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Blink {
    /// Ticks of normal movement since the last blink
    pub timer: u32,
    pub cooldown: u32,
    /// 0 = invisible, 1 = fully visible
    pub alpha: f32,
    pub fading_out: bool,
}

impl Default for Blink {
    fn default() -> Self {
        Self {
            timer: 0,
            cooldown: 0,
            alpha: 1.0,
            fading_out: false,
        }
    }
}

/// What an enemy can see when it moves
pub struct EnemyContext<'a> {
    pub player_center: Vec2,
    pub projectiles: &'a [Projectile],
    pub bombs: &'a [Bomb],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub pos: Vec2,
    pub size: Vec2,
    /// Current behaviour (burning enemies behave as `Smart`)
    pub kind: EnemyKind,
    pub original_kind: EnemyKind,
    pub speed: f32,
    original_speed: f32,
    pub health: f32,
    pub contact_damage: f32,
    pub shoot_timer: u32,
    pub shoot_interval: u32,
    pub blink: Blink,
    pub on_fire: bool,
    fire_trail_timer: u32,
    /// Marked for removal at the end of the tick
    pub dead: bool,
}

impl Enemy {
    pub fn new(id: u32, pos: Vec2, kind: EnemyKind) -> Self {
        let stats = kind.stats();
        Self {
            id,
            pos,
            size: Vec2::splat(ENEMY_SIZE),
            kind,
            original_kind: kind,
            speed: stats.speed,
            original_speed: stats.speed,
            health: stats.health,
            contact_damage: ENEMY_CONTACT_DAMAGE,
            shoot_timer: 0,
            shoot_interval: stats.shoot_interval,
            blink: Blink::default(),
            on_fire: false,
            fire_trail_timer: 0,
            dead: false,
        }
    }

    /// Move one tick according to the current kind
    pub fn advance(&mut self, ctx: &EnemyContext, rng: &mut impl Rng) {
        if self.on_fire {
            self.fire_trail_timer += 1;
        }

        if let Some(step) = self.bomb_avoidance(ctx.bombs) {
            self.pos += step;
            return;
        }

        match self.kind {
            EnemyKind::Dumb => self.pursue_from(self.pos, ctx.player_center, 0.0),
            EnemyKind::Medium => {
                self.shoot_timer += 1;
                self.pursue_from(self.center(), ctx.player_center, MEDIUM_HOLD_DISTANCE);
            }
            EnemyKind::Smart => {
                self.shoot_timer += 1;
                match self.dodge_direction(ctx.projectiles) {
                    Some(dodge) => self.pos += dodge * self.speed * SMART_DODGE_SPEED_FACTOR,
                    None => self.pursue_from(self.center(), ctx.player_center, SMART_HOLD_DISTANCE),
                }
            }
            EnemyKind::Teleport => self.advance_teleporter(ctx.player_center, rng),
        }
    }

    /// Summed escape vector from every bomb whose warning zone covers us
    fn bomb_avoidance(&self, bombs: &[Bomb]) -> Option<Vec2> {
        let center = self.center();
        let mut threatened = false;
        let mut step = Vec2::ZERO;
        for bomb in bombs {
            let radius = bomb.avoid_radius();
            let away = center - bomb.pos;
            let dist = away.length();
            if radius > 0.0 && dist < radius {
                threatened = true;
                if dist > 0.0 {
                    step += away / dist * BOMB_AVOID_STEP;
                }
            }
        }
        threatened.then_some(step)
    }

    /// Step toward `target` measured from `origin`, only while farther than `hold`
    fn pursue_from(&mut self, origin: Vec2, target: Vec2, hold: f32) {
        let delta = target - origin;
        let dist = delta.length();
        if dist > hold && dist > 0.0 {
            self.pos += delta / dist * self.speed;
        }
    }

    /// Perpendicular to the last projectile inside the dodge radius
    fn dodge_direction(&self, projectiles: &[Projectile]) -> Option<Vec2> {
        let center = self.center();
        let mut dodge = None;
        for projectile in projectiles.iter().filter(|p| !p.dead) {
            let d = projectile.pos - center;
            let dist = d.length();
            if dist < SMART_DODGE_RADIUS && dist > 0.0 {
                dodge = Some(Vec2::new(-d.y / dist, d.x / dist));
            }
        }
        dodge
    }

    fn advance_teleporter(&mut self, player_center: Vec2, rng: &mut impl Rng) {
        if self.blink.fading_out {
            self.blink.alpha -= TELEPORT_FADE_STEP;
            if self.blink.alpha <= 0.0 {
                let angle = rng.random::<f32>() * std::f32::consts::TAU;
                let distance = TELEPORT_MIN_DISTANCE + rng.random::<f32>() * TELEPORT_DISTANCE_RANGE;
                self.pos = player_center + from_angle(angle) * distance;
                self.blink.fading_out = false;
                self.blink.cooldown = TELEPORT_COOLDOWN;
            }
        } else if self.blink.alpha < 1.0 {
            self.blink.alpha = (self.blink.alpha + TELEPORT_FADE_STEP).min(1.0);
        } else {
            self.pursue_from(self.pos, player_center, 0.0);

            self.blink.timer += 1;
            if self.blink.timer >= TELEPORT_INTERVAL && self.blink.cooldown == 0 {
                self.blink.fading_out = true;
                self.blink.timer = 0;
            }
            self.blink.cooldown = self.blink.cooldown.saturating_sub(1);
        }
    }

    /// True once per elapsed shoot interval for shooting kinds
    pub fn should_shoot(&mut self) -> bool {
        if self.kind.shoots() && self.shoot_timer >= self.shoot_interval {
            self.shoot_timer = 0;
            true
        } else {
            false
        }
    }

    /// Set the enemy on fire; only the first call has any effect
    pub fn ignite(&mut self) {
        if self.on_fire {
            return;
        }
        self.on_fire = true;
        self.kind = EnemyKind::Smart;
        self.speed = self.original_speed * IGNITE_SPEED_FACTOR;
    }

    /// True once per trail interval while burning
    pub fn should_leave_fire_trail(&mut self) -> bool {
        if self.on_fire && self.fire_trail_timer >= FIRE_TRAIL_INTERVAL {
            self.fire_trail_timer = 0;
            true
        } else {
            false
        }
    }

    /// Subtract `amount`; returns true iff health is now at or below zero.
    /// Every call subtracts again, so callers must stop at the first `true`.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        self.health -= amount;
        self.health <= 0.0
    }
}

impl Body for Enemy {
    fn bounds(&self) -> Bounds {
        Bounds::new(self.pos, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn ctx<'a>(player_center: Vec2, projectiles: &'a [Projectile], bombs: &'a [Bomb]) -> EnemyContext<'a> {
        EnemyContext {
            player_center,
            projectiles,
            bombs,
        }
    }

    #[test]
    fn test_level_one_is_all_dumb() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..1000 {
            assert_eq!(pick_enemy_kind(1, rng.random()), EnemyKind::Dumb);
        }
    }

    #[test]
    fn test_level_four_quartiles() {
        assert_eq!(pick_enemy_kind(4, 0.10), EnemyKind::Dumb);
        assert_eq!(pick_enemy_kind(4, 0.40), EnemyKind::Medium);
        assert_eq!(pick_enemy_kind(4, 0.60), EnemyKind::Smart);
        assert_eq!(pick_enemy_kind(4, 0.90), EnemyKind::Teleport);
        assert_eq!(pick_enemy_kind(12, 0.25), EnemyKind::Medium);
    }

    #[test]
    fn test_early_levels_mix() {
        assert_eq!(pick_enemy_kind(2, 0.39), EnemyKind::Dumb);
        assert_eq!(pick_enemy_kind(2, 0.69), EnemyKind::Medium);
        assert_eq!(pick_enemy_kind(2, 0.99), EnemyKind::Smart);
        assert_eq!(pick_enemy_kind(3, 0.29), EnemyKind::Dumb);
        assert_eq!(pick_enemy_kind(3, 0.80), EnemyKind::Teleport);
    }

    #[test]
    fn test_dumb_walks_toward_player() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut enemy = Enemy::new(1, Vec2::ZERO, EnemyKind::Dumb);
        enemy.advance(&ctx(Vec2::new(100.0, 0.0), &[], &[]), &mut rng);
        assert_eq!(enemy.pos, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_medium_holds_inside_radius() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut enemy = Enemy::new(1, Vec2::ZERO, EnemyKind::Medium);
        // Centre is at (15, 15); player 50px away
        enemy.advance(&ctx(Vec2::new(65.0, 15.0), &[], &[]), &mut rng);
        assert_eq!(enemy.pos, Vec2::ZERO);
        assert_eq!(enemy.shoot_timer, 1);
    }

    #[test]
    fn test_medium_shoots_every_180_ticks() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut enemy = Enemy::new(1, Vec2::ZERO, EnemyKind::Medium);
        let view = ctx(Vec2::new(40.0, 15.0), &[], &[]);
        let mut shots = 0;
        for _ in 0..360 {
            enemy.advance(&view, &mut rng);
            if enemy.should_shoot() {
                shots += 1;
            }
        }
        assert_eq!(shots, 2);
    }

    #[test]
    fn test_dumb_never_shoots() {
        let mut enemy = Enemy::new(1, Vec2::ZERO, EnemyKind::Dumb);
        enemy.shoot_timer = 1000;
        assert!(!enemy.should_shoot());
    }

    #[test]
    fn test_smart_dodges_last_projectile_in_range() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut enemy = Enemy::new(1, Vec2::ZERO, EnemyKind::Smart);
        let center = enemy.center();
        let projectiles = [
            Projectile::player(center + Vec2::new(0.0, 50.0), Vec2::X),
            Projectile::player(center + Vec2::new(40.0, 0.0), Vec2::X),
        ];
        enemy.advance(&ctx(Vec2::new(1000.0, 0.0), &projectiles, &[]), &mut rng);
        // Perpendicular to (40, 0) is (0, 1), scaled by 2.5 * 1.5
        assert!((enemy.pos - Vec2::new(0.0, 3.75)).length() < 1e-4);
    }

    #[test]
    fn test_bomb_avoidance_overrides_pursuit() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut enemy = Enemy::new(1, Vec2::ZERO, EnemyKind::Dumb);
        let mut bomb = Bomb::new(enemy.center() + Vec2::new(-30.0, 0.0), 700.0, &mut rng);
        bomb.begin_warning();
        enemy.advance(&ctx(Vec2::new(-500.0, 15.0), &[], &[bomb]), &mut rng);
        assert!((enemy.pos - Vec2::new(3.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_teleporter_blinks_near_player() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut enemy = Enemy::new(1, Vec2::ZERO, EnemyKind::Teleport);
        let player = Vec2::new(600.0, 400.0);
        let view = ctx(player, &[], &[]);
        for _ in 0..TELEPORT_INTERVAL {
            enemy.advance(&view, &mut rng);
        }
        assert!(enemy.blink.fading_out);
        for _ in 0..25 {
            enemy.advance(&view, &mut rng);
        }
        assert!(!enemy.blink.fading_out);
        assert_eq!(enemy.blink.cooldown, TELEPORT_COOLDOWN);
        let dist = enemy.pos.distance(player);
        assert!((TELEPORT_MIN_DISTANCE..TELEPORT_MIN_DISTANCE + TELEPORT_DISTANCE_RANGE + 0.01).contains(&dist));
    }

    #[test]
    fn test_ignite_is_applied_once() {
        let mut enemy = Enemy::new(1, Vec2::ZERO, EnemyKind::Dumb);
        enemy.ignite();
        enemy.ignite();
        assert!(enemy.on_fire);
        assert_eq!(enemy.kind, EnemyKind::Smart);
        assert_eq!(enemy.original_kind, EnemyKind::Dumb);
        assert!((enemy.speed - 3.0).abs() < 1e-6);
        assert_eq!(enemy.health, 30.0);
    }

    #[test]
    fn test_take_damage_is_not_idempotent() {
        let mut enemy = Enemy::new(1, Vec2::ZERO, EnemyKind::Teleport);
        assert!(!enemy.take_damage(10.0));
        assert!(enemy.take_damage(15.0));
        assert!(enemy.take_damage(1.0));
        assert_eq!(enemy.health, -1.0);
    }

    #[test]
    fn test_burning_enemy_leaves_trail_every_interval() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut enemy = Enemy::new(1, Vec2::ZERO, EnemyKind::Medium);
        enemy.ignite();
        let view = ctx(Vec2::new(15.0, 15.0), &[], &[]);
        let mut trails = 0;
        for _ in 0..(FIRE_TRAIL_INTERVAL * 3) {
            enemy.advance(&view, &mut rng);
            if enemy.should_leave_fire_trail() {
                trails += 1;
            }
        }
        assert_eq!(trails, 3);
    }
}
