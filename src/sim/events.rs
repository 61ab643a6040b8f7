//! Side-effect output and deferred work
//!
//! The simulation never draws anything. It records [`Effect`] requests and
//! [`GameEvent`]s for the host to drain after each tick, and parks delayed
//! work in a [`TaskQueue`] keyed by the session's tick counter.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::boss::BossKind;
use super::enemy::EnemyKind;
use super::pickup::PowerUpKind;

/// Flavour of a particle burst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    Muzzle,
    Explosion,
    Shockwave,
    Collection,
    Heal,
    Power,
    Celebration,
    Force,
}

/// A presentation request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    Particles { kind: ParticleKind, pos: Vec2, count: u32 },
    Shake { intensity: f32, duration: u32 },
    /// Chance already rolled; only successful glitches are emitted
    Glitch { intensity: f32 },
}

/// A transient light left by a kill
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
}

/// What removed an enemy; decides score credit and drops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KillSource {
    Projectile,
    Star,
    Shockwave,
    PlacedBomb,
    FallingBomb,
}

/// First lethal damage source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Contact(EnemyKind),
    EnemyProjectile,
    MageProjectile,
    Boss(BossKind),
    NovaLaser,
    Bomb,
    PlacedBomb,
    Fire,
}

/// Anything that can be collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    PowerUp(PowerUpKind),
    XpOrb { value: u32 },
    ShockCrystal,
    StarOrb,
}

/// Gameplay happenings of one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    EnemySpawned { kind: EnemyKind },
    EnemyKilled { kind: EnemyKind, source: KillSource },
    PlayerDamaged { amount: f32, cause: DeathCause },
    LevelUp { level: u32 },
    BossSpawned { kind: BossKind },
    BossDefeated { kind: BossKind },
    PickupCollected { kind: PickupKind },
    ShotFired { pellets: u32 },
    Shockwave { kills: u32 },
    PlayerDied { cause: DeathCause },
    GameOver,
    Reset,
}

/// Deferred work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskAction {
    /// Drop a kill light
    RemoveLight(u32),
    /// Clear regular enemies and hostile bullets after a level-up
    ClearWave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: TaskId,
    /// Session tick at which the task runs
    pub due: u64,
    pub action: TaskAction,
}

/// Delayed actions, run in due order (ties by scheduling order)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskQueue {
    tasks: Vec<ScheduledTask>,
    next_id: u64,
}

impl TaskQueue {
    pub fn schedule(&mut self, now: u64, delay: u64, action: TaskAction) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(ScheduledTask {
            id,
            due: now + delay,
            action,
        });
        id
    }

    /// Returns false if the task already ran or never existed
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Remove and return every task due at or before `now`
    pub fn drain_due(&mut self, now: u64) -> Vec<TaskAction> {
        let mut due: Vec<ScheduledTask> = Vec::new();
        self.tasks.retain(|t| {
            if t.due <= now {
                due.push(*t);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|t| (t.due, t.id.0));
        due.into_iter().map(|t| t.action).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_run_when_due_in_order() {
        let mut queue = TaskQueue::default();
        queue.schedule(0, 18, TaskAction::RemoveLight(2));
        queue.schedule(0, 12, TaskAction::ClearWave);
        queue.schedule(5, 13, TaskAction::RemoveLight(3));

        assert!(queue.drain_due(11).is_empty());
        assert_eq!(queue.drain_due(12), vec![TaskAction::ClearWave]);
        assert_eq!(
            queue.drain_due(30),
            vec![TaskAction::RemoveLight(2), TaskAction::RemoveLight(3)]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_cancel() {
        let mut queue = TaskQueue::default();
        let id = queue.schedule(0, 10, TaskAction::ClearWave);
        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        assert!(queue.drain_due(100).is_empty());
    }
}
