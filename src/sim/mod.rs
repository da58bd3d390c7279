//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Variable timestep, scaled against a 60 Hz reference frame
//! - Seeded RNG only
//! - No rendering, storage or platform dependencies

pub mod chaos;
pub mod collision;
pub mod state;
pub mod tick;
pub mod world;

pub use chaos::{ChaosMode, ChaosState, ScheduledRevert, apply_mode};
pub use collision::{find_landing, wrap_x};
pub use state::{
    Coin, Droplet, GameEvent, GooSplat, PhysicsParams, Platform, PlatformKind, Player,
    SimulationState,
};
pub use tick::{TickInput, TickStatus, tick};
