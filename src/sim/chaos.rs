//! Chaos modes: timed random rule mutations
//!
//! Every `interval_ms` of game time a new mode is drawn and applied. Applying
//! a mode always starts from the player's base physics, so the result depends
//! only on the mode. When a duration is configured the mode reverts to
//! `normal` through a scheduled revert tagged with the round and mode epoch;
//! the tick checks it against game time, so a stale revert can never fire.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{GameEvent, PhysicsParams, SimulationState};
use crate::settings::ChaosSettings;

/// Speed multipliers for `super_speed`
const SUPER_SPEED_ACCEL: f32 = 7.0 / 3.0;
const SUPER_SPEED_MAX: f32 = 2.0;
/// Slippery keeps this fraction of the normal friction loss
const SLIPPERY_LOSS: f32 = 1.0 / 7.0;
/// Jump multiplier for `bouncy`
const BOUNCY_JUMP: f32 = 31.0 / 21.0;
/// Time scale for `slow_motion` (same arc, played slower)
const SLOW_MOTION_SCALE: f32 = 0.6;

/// The active ruleset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChaosMode {
    #[default]
    Normal,
    GravityFlip,
    ReverseControls,
    SuperSpeed,
    Slippery,
    TinyPlatforms,
    Bouncy,
    SlowMotion,
}

impl ChaosMode {
    pub const ALL: [ChaosMode; 8] = [
        ChaosMode::Normal,
        ChaosMode::GravityFlip,
        ChaosMode::ReverseControls,
        ChaosMode::SuperSpeed,
        ChaosMode::Slippery,
        ChaosMode::TinyPlatforms,
        ChaosMode::Bouncy,
        ChaosMode::SlowMotion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChaosMode::Normal => "normal",
            ChaosMode::GravityFlip => "gravity_flip",
            ChaosMode::ReverseControls => "reverse_controls",
            ChaosMode::SuperSpeed => "super_speed",
            ChaosMode::Slippery => "slippery",
            ChaosMode::TinyPlatforms => "tiny_platforms",
            ChaosMode::Bouncy => "bouncy",
            ChaosMode::SlowMotion => "slow_motion",
        }
    }

    /// Banner shown when the mode kicks in
    pub fn alert_text(&self) -> &'static str {
        match self {
            ChaosMode::Normal => "NORMAL MODE",
            ChaosMode::GravityFlip => "GRAVITY FLIP!",
            ChaosMode::ReverseControls => "REVERSE CONTROLS!",
            ChaosMode::SuperSpeed => "SUPER SPEED!",
            ChaosMode::Slippery => "SLIPPERY MODE!",
            ChaosMode::TinyPlatforms => "TINY PLATFORMS!",
            ChaosMode::Bouncy => "BOUNCY MODE!",
            ChaosMode::SlowMotion => "SLOW MOTION!",
        }
    }

    /// Player body color (0xRRGGBB)
    pub fn color(&self) -> u32 {
        match self {
            ChaosMode::Normal => 0x9D4EDD,
            ChaosMode::GravityFlip => 0xFF69B4,
            ChaosMode::ReverseControls => 0xFFA500,
            ChaosMode::SuperSpeed => 0x00FFFF,
            ChaosMode::Slippery => 0xADD8E6,
            ChaosMode::TinyPlatforms => 0xFFD700,
            ChaosMode::Bouncy => 0xFF1493,
            ChaosMode::SlowMotion => 0x9370DB,
        }
    }

    /// Travel direction is downward on screen
    #[inline]
    pub fn is_flipped(&self) -> bool {
        matches!(self, ChaosMode::GravityFlip)
    }

    /// Physics for this mode, derived from the base set
    pub fn physics(&self, base: &PhysicsParams) -> PhysicsParams {
        let mut p = *base;
        match self {
            ChaosMode::Normal | ChaosMode::ReverseControls | ChaosMode::TinyPlatforms => {}
            ChaosMode::GravityFlip => {
                p.gravity = -base.gravity;
                p.jump_power = -base.jump_power;
            }
            ChaosMode::SuperSpeed => {
                p.speed = base.speed * SUPER_SPEED_ACCEL;
                p.max_speed = base.max_speed * SUPER_SPEED_MAX;
            }
            ChaosMode::Slippery => {
                p.friction = 1.0 - (1.0 - base.friction) * SLIPPERY_LOSS;
            }
            ChaosMode::Bouncy => {
                p.jump_power = base.jump_power * BOUNCY_JUMP;
            }
            ChaosMode::SlowMotion => {
                let s = SLOW_MOTION_SCALE;
                p.speed = base.speed * s * s;
                p.max_speed = base.max_speed * s;
                p.gravity = base.gravity * s * s;
                p.jump_power = base.jump_power * s;
            }
        }
        p
    }
}

/// A deferred return to `normal`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledRevert {
    pub at_ms: f64,
    pub round: u32,
    pub epoch: u64,
}

/// Chaos controller state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChaosState {
    pub mode: ChaosMode,
    /// Game time of the last timer trigger
    pub last_trigger_ms: f64,
    /// Bumped on every mode application
    pub epoch: u64,
    pub revert: Option<ScheduledRevert>,
}

impl ChaosState {
    /// Whole seconds until the next timer trigger (HUD countdown)
    pub fn seconds_until_next(&self, now_ms: f64, interval_ms: f64) -> u32 {
        let remaining = (interval_ms - (now_ms - self.last_trigger_ms)).max(0.0);
        (remaining / 1000.0).ceil() as u32
    }
}

/// Switch to `mode`: reset physics to base, apply the mode, recolor the player
pub fn apply_mode(state: &mut SimulationState, mode: ChaosMode) {
    let chaos = &mut state.chaos;
    chaos.mode = mode;
    chaos.epoch += 1;
    chaos.revert = None;

    let player = &mut state.player;
    player.params = mode.physics(&player.base);
    player.color = mode.color();

    log::debug!(
        "Chaos mode -> {} at {:.0}ms (epoch {})",
        mode.as_str(),
        state.game_time_ms,
        state.chaos.epoch
    );
    state.events.push(GameEvent::ChaosChanged { mode });
}

/// Uniform draw over the configured candidate set
pub fn draw_mode<R: Rng>(rng: &mut R, include_normal: bool) -> ChaosMode {
    let candidates: &[ChaosMode] = if include_normal {
        &ChaosMode::ALL
    } else {
        &ChaosMode::ALL[1..]
    };
    candidates[rng.random_range(0..candidates.len())]
}

/// Per-tick timer evaluation: pending revert first, then the interval trigger
pub fn update(state: &mut SimulationState, settings: &ChaosSettings) {
    let now = state.game_time_ms;

    if let Some(revert) = state.chaos.revert {
        if revert.round != state.round || revert.epoch != state.chaos.epoch {
            log::debug!("Dropping stale chaos revert (epoch {})", revert.epoch);
            state.chaos.revert = None;
        } else if now >= revert.at_ms {
            apply_mode(state, ChaosMode::Normal);
        }
    }

    if now - state.chaos.last_trigger_ms >= settings.interval_ms {
        state.chaos.last_trigger_ms = now;
        let mode = draw_mode(&mut state.rng, settings.include_normal);
        apply_mode(state, mode);

        if let Some(duration) = settings.duration_ms {
            if mode != ChaosMode::Normal {
                state.chaos.revert = Some(ScheduledRevert {
                    at_ms: now + duration,
                    round: state.round,
                    epoch: state.chaos.epoch,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn state() -> SimulationState {
        SimulationState::new(42, 1, &Settings::default())
    }

    #[test]
    fn test_normal_resets_every_parameter() {
        let mut state = state();
        let base = state.player.base;
        for mode in ChaosMode::ALL {
            apply_mode(&mut state, mode);
            apply_mode(&mut state, ChaosMode::Normal);
            assert_eq!(state.player.params, base, "after {}", mode.as_str());
            assert_eq!(state.player.color, ChaosMode::Normal.color());
        }
    }

    #[test]
    fn test_gravity_flip_negates() {
        let base = PhysicsParams::default();
        let p = ChaosMode::GravityFlip.physics(&base);
        assert_eq!(p.gravity, -base.gravity);
        assert_eq!(p.jump_power, -base.jump_power);
        assert_eq!(p.speed, base.speed);
    }

    #[test]
    fn test_mode_deltas() {
        let base = PhysicsParams::default();

        let fast = ChaosMode::SuperSpeed.physics(&base);
        assert!((fast.speed - 2.1).abs() < 1e-5);
        assert!((fast.max_speed - 12.0).abs() < 1e-5);

        let slippery = ChaosMode::Slippery.physics(&base);
        assert!((slippery.friction - 0.98).abs() < 1e-5);

        let bouncy = ChaosMode::Bouncy.physics(&base);
        assert!((bouncy.jump_power + 15.5).abs() < 1e-4);

        let slow = ChaosMode::SlowMotion.physics(&base);
        assert!(slow.speed < base.speed);
        assert!(slow.gravity < base.gravity);
        assert!(slow.jump_power.abs() < base.jump_power.abs());
        // Same apex height, reached more slowly
        let apex = |p: &PhysicsParams| p.jump_power * p.jump_power / (2.0 * p.gravity);
        assert!((apex(&slow) - apex(&base)).abs() < 1e-3);

        assert_eq!(ChaosMode::TinyPlatforms.physics(&base), base);
        assert_eq!(ChaosMode::ReverseControls.physics(&base), base);
    }

    #[test]
    fn test_names_match_serde() {
        for mode in ChaosMode::ALL {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{}\"", mode.as_str()));
        }
    }

    #[test]
    fn test_draw_excludes_normal_when_configured() {
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..500 {
            assert_ne!(draw_mode(&mut rng, false), ChaosMode::Normal);
        }
    }

    #[test]
    fn test_draw_is_deterministic() {
        let mut a = Pcg32::seed_from_u64(11);
        let mut b = Pcg32::seed_from_u64(11);
        let seq_a: Vec<_> = (0..20).map(|_| draw_mode(&mut a, true)).collect();
        let seq_b: Vec<_> = (0..20).map(|_| draw_mode(&mut b, true)).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn test_timer_triggers_on_interval() {
        let settings = ChaosSettings {
            include_normal: false,
            ..Default::default()
        };
        let mut state = state();
        state.game_time_ms = 9_999.0;
        update(&mut state, &settings);
        assert_eq!(state.chaos.mode, ChaosMode::Normal);

        state.game_time_ms = 10_000.0;
        update(&mut state, &settings);
        assert_ne!(state.chaos.mode, ChaosMode::Normal);
        assert_eq!(state.chaos.last_trigger_ms, 10_000.0);
        assert!(state.chaos.revert.is_none());
    }

    #[test]
    fn test_duration_reverts_to_normal() {
        let settings = ChaosSettings {
            include_normal: false,
            duration_ms: Some(3_000.0),
            ..Default::default()
        };
        let mut state = state();
        state.game_time_ms = 10_000.0;
        update(&mut state, &settings);
        assert_ne!(state.chaos.mode, ChaosMode::Normal);

        state.game_time_ms = 12_999.0;
        update(&mut state, &settings);
        assert_ne!(state.chaos.mode, ChaosMode::Normal);

        state.game_time_ms = 13_000.0;
        update(&mut state, &settings);
        assert_eq!(state.chaos.mode, ChaosMode::Normal);
        assert_eq!(state.player.params, state.player.base);
    }

    #[test]
    fn test_stale_revert_is_dropped() {
        let settings = ChaosSettings {
            duration_ms: Some(3_000.0),
            ..Default::default()
        };
        let mut state = state();
        apply_mode(&mut state, ChaosMode::Slippery);
        // Revert left over from an earlier round
        state.chaos.revert = Some(ScheduledRevert {
            at_ms: 0.0,
            round: state.round - 1,
            epoch: state.chaos.epoch,
        });
        state.game_time_ms = 500.0;
        update(&mut state, &settings);
        assert_eq!(state.chaos.mode, ChaosMode::Slippery);
        assert!(state.chaos.revert.is_none());
    }

    #[test]
    fn test_countdown() {
        let chaos = ChaosState::default();
        assert_eq!(chaos.seconds_until_next(0.0, 10_000.0), 10);
        assert_eq!(chaos.seconds_until_next(8_200.0, 10_000.0), 2);
        assert_eq!(chaos.seconds_until_next(12_000.0, 10_000.0), 0);
    }
}
