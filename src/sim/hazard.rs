//! Area hazards: falling bombs, placed bombs, fire patches and mage walls

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geom::{Body, Bounds};
use crate::from_angle;

// === Falling bomb ===
pub const BOMB_SIZE: f32 = 16.0;
pub const BOMB_START_Y: f32 = -50.0;
/// Ground line sits this far above the bottom edge
pub const BOMB_GROUND_INSET: f32 = 20.0;
pub const BOMB_GRAVITY: f32 = 0.6;
pub const BOMB_FRICTION: f32 = 0.96;
pub const BOMB_MAX_VX: f32 = 8.0;
pub const BOMB_MOVE_FORCE: f32 = 0.4;
pub const BOMB_RETARGET_TICKS: u32 = 90;
pub const BOMB_CLUSTER_RADIUS: f32 = 150.0;
pub const BOMB_TARGET_MARGIN: f32 = 50.0;
pub const BOMB_STUCK_DELAY: u32 = 120;
pub const BOMB_WARNING_START_RADIUS: f32 = 20.0;
pub const BOMB_WARNING_MAX_RADIUS: f32 = 80.0;
/// Enemies steer clear of a warning bomb out to its warning radius plus this
pub const BOMB_AVOID_MARGIN: f32 = 50.0;
pub const BOMB_EXPLOSION_RADIUS: f32 = 100.0;
pub const BOMB_ENEMY_DAMAGE: f32 = 50.0;
pub const BOMB_PLAYER_DAMAGE: f32 = 30.0;

// === Placed bomb ===
pub const PLACED_BOMB_MIN_SPACING: f32 = 100.0;
pub const PLACED_BOMB_IDLE_TICKS: u32 = 60;
pub const PLACED_BOMB_WARNING_TICKS: u32 = 90;
pub const PLACED_BOMB_MAX_WARNING_RADIUS: f32 = 120.0;
pub const PLACED_BOMB_EXPLOSION_RADIUS: f32 = 120.0;
pub const PLACED_BOMB_ENEMY_DAMAGE: f32 = 70.0;
pub const PLACED_BOMB_PLAYER_DAMAGE: f32 = 20.0;
pub const MAX_PLACEABLE_BOMBS: u32 = 3;

// === Fire ===
pub const FIRE_DAMAGE: f32 = 5.0;
pub const FIRE_DAMAGE_INTERVAL: u32 = 30;
pub const FIRE_SPREAD_CHANCE: f64 = 0.35;
pub const FIRE_MAX_GENERATION: u32 = 2;
pub const FIRE_TRAIL_SIZE: f32 = 30.0;
pub const FIRE_TRAIL_DURATION: u32 = 180;

// === Wall ===
pub const WALL_SIZE: Vec2 = Vec2::new(40.0, 60.0);
pub const WALL_LIFETIME: u32 = 600;
pub const WALL_PUSH: f32 = 5.0;

/// Falling bomb life cycle; only ever moves forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BombState {
    Bouncing,
    Warning,
    Exploding,
}

/// Inputs for the bomb's "most inconvenient spot" search
pub struct BombContext<'a> {
    pub player_center: Vec2,
    pub enemy_centers: &'a [Vec2],
    pub world: Vec2,
}

/// A bouncing bomb that hunts for crowds, then sticks and detonates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bomb {
    /// Centre
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub ground_y: f32,
    pub bounciness: f32,
    pub state: BombState,
    pub target: Option<Vec2>,
    retarget_timer: u32,
    reached_target: bool,
    stuck_timer: u32,
    pub warning_timer: u32,
    pub warning_duration: u32,
    pub warning_radius: f32,
    pub is_fire_bomb: bool,
    pub exploded: bool,
}

impl Bomb {
    pub fn new(pos: Vec2, ground_y: f32, rng: &mut impl Rng) -> Self {
        Self {
            pos,
            vel: Vec2::new((rng.random::<f32>() - 0.5) * 8.0, 0.0),
            size: Vec2::splat(BOMB_SIZE),
            ground_y,
            bounciness: rng.random_range(0.70..0.85),
            state: BombState::Bouncing,
            target: None,
            retarget_timer: 0,
            reached_target: false,
            stuck_timer: 0,
            warning_timer: 0,
            warning_duration: rng.random_range(60..300),
            warning_radius: BOMB_WARNING_START_RADIUS,
            is_fire_bomb: rng.random_bool(0.5),
            exploded: false,
        }
    }

    pub fn update(&mut self, ctx: &BombContext, rng: &mut impl Rng) {
        self.retarget_timer += 1;
        if self.retarget_timer >= BOMB_RETARGET_TICKS || self.target.is_none() {
            self.target = Some(find_inconvenient_spot(ctx, rng));
            self.retarget_timer = 0;
        }

        match self.state {
            BombState::Bouncing => self.bounce(ctx.world),
            BombState::Warning => {
                self.warning_timer += 1;
                let progress = self.warning_timer as f32 / self.warning_duration.max(1) as f32;
                self.warning_radius = BOMB_WARNING_START_RADIUS
                    + (BOMB_WARNING_MAX_RADIUS - BOMB_WARNING_START_RADIUS) * progress.min(1.0);
                if self.warning_timer >= self.warning_duration {
                    self.state = BombState::Exploding;
                }
            }
            BombState::Exploding => {}
        }
    }

    fn bounce(&mut self, world: Vec2) {
        self.vel.y += BOMB_GRAVITY;
        self.vel.x *= BOMB_FRICTION;

        if let Some(target) = self.target {
            let dx = target.x - self.pos.x;
            if dx.abs() > 20.0 {
                self.vel.x += dx.signum() * BOMB_MOVE_FORCE;
            } else if dx.abs() < 10.0 && self.vel.x.abs() < 2.0 && self.vel.y.abs() < 2.0 {
                self.reached_target = true;
            }
        }

        self.vel.x = self.vel.x.clamp(-BOMB_MAX_VX, BOMB_MAX_VX);
        self.pos += self.vel;

        let floor = self.ground_y - self.size.y;
        if self.pos.y >= floor {
            self.pos.y = floor;
            self.vel.y = -self.vel.y.abs() * self.bounciness;
        }
        if self.pos.x < 0.0 || self.pos.x > world.x {
            self.vel.x = -self.vel.x * self.bounciness;
            self.pos.x = self.pos.x.clamp(0.0, world.x);
        }
        if self.pos.y < 0.0 {
            self.vel.y = -self.vel.y * self.bounciness;
            self.pos.y = 0.0;
        }

        if self.reached_target {
            self.stuck_timer += 1;
            if self.stuck_timer >= BOMB_STUCK_DELAY {
                self.begin_warning();
            }
        }
    }

    /// Stick in place and start the warning countdown
    pub fn begin_warning(&mut self) {
        if self.state == BombState::Bouncing {
            self.state = BombState::Warning;
            self.vel = Vec2::ZERO;
        }
    }

    /// Radius enemies flee from (zero unless warning)
    pub fn avoid_radius(&self) -> f32 {
        match self.state {
            BombState::Warning => self.warning_radius + BOMB_AVOID_MARGIN,
            _ => 0.0,
        }
    }

    /// True exactly once: from entering `Exploding` until [`Bomb::detonate`]
    pub fn should_explode(&self) -> bool {
        self.state == BombState::Exploding && !self.exploded
    }

    pub fn detonate(&mut self) {
        self.exploded = true;
    }

    /// Patches left behind by a fire bomb
    pub fn fire_patches(&self, world: Vec2, rng: &mut impl Rng) -> Vec<FirePatch> {
        let count = rng.random_range(2..=6);
        (0..count)
            .map(|_| {
                let offset = from_angle(rng.random::<f32>() * std::f32::consts::TAU) * rng.random_range(0.0f32..60.0);
                let size = rng.random_range(40.0f32..70.0);
                let duration = rng.random_range(180..360);
                FirePatch::new(clamp_inside(self.pos + offset, world, size / 2.0), size, duration, 0)
            })
            .collect()
    }
}

impl Body for Bomb {
    fn bounds(&self) -> Bounds {
        Bounds::centered(self.pos, self.size)
    }
}

/// Densest weighted cluster (player counts double) plus a random offset, kept on screen
pub fn find_inconvenient_spot(ctx: &BombContext, rng: &mut impl Rng) -> Vec2 {
    let targets: Vec<(Vec2, u32)> = std::iter::once((ctx.player_center, 2))
        .chain(ctx.enemy_centers.iter().map(|&c| (c, 1)))
        .collect();

    let mut best = ctx.player_center;
    let mut best_score = 0;
    for &(pos, weight) in &targets {
        let score = weight
            + targets
                .iter()
                .filter(|(other, _)| pos.distance(*other) < BOMB_CLUSTER_RADIUS)
                .map(|(_, w)| w)
                .sum::<u32>();
        if score > best_score {
            best_score = score;
            best = pos;
        }
    }

    let offset = from_angle(rng.random::<f32>() * std::f32::consts::TAU) * rng.random_range(30.0f32..100.0);
    clamp_inside(best + offset, ctx.world, BOMB_TARGET_MARGIN)
}

fn clamp_inside(point: Vec2, world: Vec2, margin: f32) -> Vec2 {
    let lo = Vec2::splat(margin).min(world / 2.0);
    let hi = (world - Vec2::splat(margin)).max(lo);
    point.clamp(lo, hi)
}

/// Placed bomb life cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacedBombState {
    Idle,
    Warning,
    Exploding,
}

/// A bomb the player drops with the secondary action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceableBomb {
    /// Centre
    pub pos: Vec2,
    pub state: PlacedBombState,
    pub timer: u32,
    pub warning_radius: f32,
    pub exploded: bool,
}

impl PlaceableBomb {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            state: PlacedBombState::Idle,
            timer: 0,
            warning_radius: 0.0,
            exploded: false,
        }
    }

    pub fn update(&mut self) {
        self.timer += 1;
        match self.state {
            PlacedBombState::Idle if self.timer >= PLACED_BOMB_IDLE_TICKS => {
                self.state = PlacedBombState::Warning;
                self.timer = 0;
                self.warning_radius = BOMB_WARNING_START_RADIUS;
            }
            PlacedBombState::Warning => {
                let progress = (self.timer as f32 / PLACED_BOMB_WARNING_TICKS as f32).min(1.0);
                self.warning_radius = BOMB_WARNING_START_RADIUS
                    + (PLACED_BOMB_MAX_WARNING_RADIUS - BOMB_WARNING_START_RADIUS) * progress;
                if self.timer >= PLACED_BOMB_WARNING_TICKS {
                    self.state = PlacedBombState::Exploding;
                }
            }
            _ => {}
        }
    }

    pub fn should_explode(&self) -> bool {
        self.state == PlacedBombState::Exploding && !self.exploded
    }

    pub fn detonate(&mut self) {
        self.exploded = true;
    }
}

/// A burning square on the floor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirePatch {
    pub center: Vec2,
    pub size: f32,
    pub duration: u32,
    pub timer: u32,
    damage_timer: u32,
    /// 0 for bomb fire, +1 per spread
    pub generation: u32,
    pub dead: bool,
}

impl FirePatch {
    pub fn new(center: Vec2, size: f32, duration: u32, generation: u32) -> Self {
        Self {
            center,
            size,
            duration,
            timer: 0,
            damage_timer: 0,
            generation,
            dead: false,
        }
    }

    /// Patch dropped behind a burning enemy
    pub fn trail(center: Vec2) -> Self {
        Self::new(center, FIRE_TRAIL_SIZE, FIRE_TRAIL_DURATION, FIRE_MAX_GENERATION)
    }

    pub fn update(&mut self) {
        self.timer += 1;
        self.damage_timer += 1;
    }

    /// Rolls the spread chance on the tick the patch reaches half its duration
    pub fn should_spread(&self, rng: &mut impl Rng) -> bool {
        self.generation < FIRE_MAX_GENERATION
            && self.timer == self.duration / 2
            && rng.random_bool(FIRE_SPREAD_CHANCE)
    }

    pub fn spread(&self, world: Vec2, rng: &mut impl Rng) -> Vec<FirePatch> {
        let count = rng.random_range(1..=2);
        let size = self.size * 0.9;
        (0..count)
            .map(|_| {
                let offset = from_angle(rng.random::<f32>() * std::f32::consts::TAU) * rng.random_range(30.0f32..60.0);
                let duration = rng.random_range(120..240);
                FirePatch::new(
                    clamp_inside(self.center + offset, world, size / 2.0),
                    size,
                    duration,
                    self.generation + 1,
                )
            })
            .collect()
    }

    /// True once per damage interval; only consumed while the player stands in it
    pub fn should_damage(&mut self) -> bool {
        if self.damage_timer >= FIRE_DAMAGE_INTERVAL {
            self.damage_timer = 0;
            true
        } else {
            false
        }
    }

    pub fn is_expired(&self) -> bool {
        self.timer >= self.duration
    }
}

impl Body for FirePatch {
    fn bounds(&self) -> Bounds {
        Bounds::centered(self.center, Vec2::splat(self.size))
    }
}

/// A temporary barrier summoned by the Mage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wall {
    pub pos: Vec2,
    pub size: Vec2,
    pub age: u32,
    pub dead: bool,
}

impl Wall {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            size: WALL_SIZE,
            age: 0,
            dead: false,
        }
    }

    pub fn update(&mut self) {
        self.age += 1;
    }

    pub fn is_expired(&self) -> bool {
        self.age >= WALL_LIFETIME
    }
}

impl Body for Wall {
    fn bounds(&self) -> Bounds {
        Bounds::new(self.pos, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const WORLD: Vec2 = Vec2::new(800.0, 600.0);

    fn resting_bomb(rng: &mut Pcg32) -> Bomb {
        let mut bomb = Bomb::new(Vec2::new(400.0, 564.0), WORLD.y - BOMB_GROUND_INSET, rng);
        bomb.vel = Vec2::ZERO;
        bomb
    }

    #[test]
    fn test_bomb_stuck_then_warns_then_explodes_once() {
        let mut rng = Pcg32::seed_from_u64(11);
        let mut bomb = resting_bomb(&mut rng);
        let ctx = BombContext {
            player_center: Vec2::new(400.0, 564.0),
            enemy_centers: &[],
            world: WORLD,
        };

        // Pin the target under the bomb so it settles immediately
        let mut ticks = 0;
        while bomb.state == BombState::Bouncing {
            bomb.target = Some(bomb.pos);
            bomb.retarget_timer = 0;
            bomb.update(&ctx, &mut rng);
            ticks += 1;
            assert!(ticks < 1000, "bomb never settled");
        }
        assert_eq!(bomb.state, BombState::Warning);
        assert!(ticks >= BOMB_STUCK_DELAY);
        assert!(bomb.avoid_radius() > 0.0);

        let mut warned = 0;
        while bomb.state == BombState::Warning {
            bomb.update(&ctx, &mut rng);
            warned += 1;
        }
        assert_eq!(warned, bomb.warning_duration);
        assert!(bomb.warning_radius <= BOMB_WARNING_MAX_RADIUS + 1e-3);

        assert!(bomb.should_explode());
        bomb.detonate();
        assert!(!bomb.should_explode());
        bomb.update(&ctx, &mut rng);
        assert_eq!(bomb.state, BombState::Exploding);
        assert!(!bomb.should_explode());
    }

    #[test]
    fn test_bomb_above_world_bounces_off_ceiling() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut bomb = Bomb::new(Vec2::new(400.0, -50.0), WORLD.y - BOMB_GROUND_INSET, &mut rng);
        bomb.vel = Vec2::ZERO;
        let ctx = BombContext {
            player_center: Vec2::new(400.0, 300.0),
            enemy_centers: &[],
            world: WORLD,
        };

        bomb.update(&ctx, &mut rng);
        assert_eq!(bomb.pos.y, 0.0);
        // Gravity pulled it down; the ceiling flips that
        assert!(bomb.vel.y < 0.0);
    }

    #[test]
    fn test_bouncing_bomb_has_no_avoid_radius() {
        let mut rng = Pcg32::seed_from_u64(2);
        let bomb = resting_bomb(&mut rng);
        assert_eq!(bomb.avoid_radius(), 0.0);
    }

    #[test]
    fn test_inconvenient_spot_prefers_crowds() {
        let mut rng = Pcg32::seed_from_u64(5);
        let crowd = [
            Vec2::new(600.0, 300.0),
            Vec2::new(610.0, 300.0),
            Vec2::new(600.0, 310.0),
            Vec2::new(590.0, 300.0),
        ];
        let ctx = BombContext {
            player_center: Vec2::new(100.0, 300.0),
            enemy_centers: &crowd,
            world: WORLD,
        };
        let spot = find_inconvenient_spot(&ctx, &mut rng);
        assert!(spot.distance(Vec2::new(600.0, 300.0)) <= 100.0 + 1e-3);
    }

    #[test]
    fn test_placed_bomb_timeline() {
        let mut bomb = PlaceableBomb::new(Vec2::new(100.0, 100.0));
        for _ in 0..PLACED_BOMB_IDLE_TICKS {
            bomb.update();
        }
        assert_eq!(bomb.state, PlacedBombState::Warning);
        for _ in 0..PLACED_BOMB_WARNING_TICKS {
            bomb.update();
        }
        assert!(bomb.should_explode());
        assert_eq!(bomb.warning_radius, PLACED_BOMB_MAX_WARNING_RADIUS);
    }

    #[test]
    fn test_fire_damage_interval() {
        let mut patch = FirePatch::new(Vec2::ZERO, 40.0, 300, 0);
        let mut hits = 0;
        for _ in 0..90 {
            patch.update();
            if patch.should_damage() {
                hits += 1;
            }
        }
        assert_eq!(hits, 3);
    }

    #[test]
    fn test_fire_spread_generation_cap() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut patch = FirePatch::trail(Vec2::new(100.0, 100.0));
        patch.timer = patch.duration / 2;
        for _ in 0..100 {
            assert!(!patch.should_spread(&mut rng));
        }

        let parent = FirePatch::new(Vec2::new(5.0, 5.0), 50.0, 200, 1);
        for child in parent.spread(WORLD, &mut rng) {
            assert_eq!(child.generation, 2);
            assert!((child.size - 45.0).abs() < 1e-4);
            assert!((120..240).contains(&child.duration));
            assert!(child.center.x >= child.size / 2.0 && child.center.y >= child.size / 2.0);
        }
    }

    #[test]
    fn test_wall_expires() {
        let mut wall = Wall::new(Vec2::ZERO);
        for _ in 0..WALL_LIFETIME {
            wall.update();
        }
        assert!(wall.is_expired());
    }
}
