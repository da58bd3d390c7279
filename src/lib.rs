//! Chaos Jump - A vertical platform jumper with randomized rule mutations
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, world generation, chaos modes)
//! - `session`: Round lifecycle (start, death, revive, banking)
//! - `game_loop`: Per-frame scheduler driving the simulation
//! - `render`: Screen-space view handed to a render sink
//! - `persistence`: Player profile store abstraction
//! - `leaderboard`: Top heights query
//! - `settings`: Data-driven game tuning

pub mod error;
pub mod game_loop;
pub mod leaderboard;
pub mod persistence;
pub mod render;
pub mod session;
pub mod settings;
pub mod sim;

pub use error::{GameError, Result, SettingsError, StoreError};
pub use game_loop::{GameLoop, LoopControl};
pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use session::{ReviveBlock, ReviveStatus, Session, SessionPhase};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Frame length the physics constants are tuned against (60 Hz)
    pub const REFERENCE_FRAME_MS: f32 = 1000.0 / 60.0;
    /// Largest frame delta fed into a tick (avoids huge steps after a stall)
    pub const MAX_FRAME_DT_MS: f64 = 32.0;

    /// Player defaults
    pub const PLAYER_WIDTH: f32 = 60.0;
    pub const PLAYER_HEIGHT: f32 = 60.0;
    /// Spawn row measured from the top of the first screen
    pub const PLAYER_SPAWN_Y: f32 = 440.0;
    /// Squish timer decay (full squish fades in 200ms)
    pub const SQUISH_DECAY_PER_MS: f32 = 1.0 / 200.0;

    /// Camera rows as a fraction of viewport height
    pub const CAMERA_THRESHOLD_NORMAL: f32 = 0.4;
    pub const CAMERA_THRESHOLD_FLIPPED: f32 = 0.6;

    /// Start platform sits this far above the bottom of the first screen
    pub const START_PLATFORM_OFFSET: f32 = 50.0;
    pub const START_PLATFORM_WIDTH: f32 = 100.0;

    /// Coin spawns this far off the platform surface
    pub const COIN_MARGIN: f32 = 5.0;

    /// Bouncy platforms multiply the jump impulse
    pub const BOUNCY_PLATFORM_MULTIPLIER: f32 = 1.5;

    /// Revive impulse as a fraction of the current jump power
    pub const REVIVE_JUMP_FACTOR: f32 = 0.6;
    /// Horizontal speed kept through a revive
    pub const REVIVE_MAX_DX: f32 = 2.0;

    /// Goo splat lifetime (ms)
    pub const GOO_SPLAT_LIFE_MS: f32 = 360.0;

    /// World units per displayed meter
    pub const PIXELS_PER_METER: f32 = 5.0;
}

/// Displayed height for a scroll accumulator value.
#[inline]
pub fn height_meters(world_offset_y: f32) -> u32 {
    (world_offset_y / consts::PIXELS_PER_METER).floor().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_meters() {
        assert_eq!(height_meters(0.0), 0);
        assert_eq!(height_meters(4.9), 0);
        assert_eq!(height_meters(5.0), 1);
        assert_eq!(height_meters(512.0), 102);
        assert_eq!(height_meters(-30.0), 0);
    }
}
