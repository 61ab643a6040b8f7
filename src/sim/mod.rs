//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (every speed and timer is per tick)
//! - Seeded RNG only, owned by the session
//! - Stable iteration order; removal is mark-then-compact
//! - No rendering or platform dependencies

pub mod boss;
pub mod enemy;
pub mod events;
pub mod geom;
pub mod hazard;
pub mod pickup;
pub mod player;
pub mod projectile;
pub mod resolve;
pub mod snapshot;
pub mod spawn;
pub mod state;
pub mod tick;

pub use boss::{Boss, BossAction, BossKind};
pub use enemy::{Enemy, EnemyKind, pick_enemy_kind};
pub use events::{DeathCause, Effect, GameEvent, KillSource, Light, ParticleKind, PickupKind, TaskAction, TaskQueue};
pub use geom::{Body, Bounds};
pub use player::{Movement, Player};
pub use snapshot::{Activity, Snapshot, StatusReporter, StatusUpdate, accuracy_phrase};
pub use state::{GamePhase, GameState};
pub use tick::{TickInput, tick};
