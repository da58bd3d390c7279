//! Procedural world generation
//!
//! Keeps a rolling window of platforms at least one screen height beyond the
//! camera's leading edge, in whichever direction the player is travelling,
//! and culls whatever has fallen behind the trailing edge.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::chaos::ChaosMode;
use super::state::{Coin, Platform, PlatformKind, SimulationState};
use crate::consts::*;
use crate::settings::{Settings, WorldSettings};

/// Lay out the start platform under the spawn point and fill the first window
pub fn seed_world(state: &mut SimulationState, settings: &Settings) {
    state.platforms.clear();
    state.coins.clear();

    let vp = settings.viewport;
    let id = state.next_entity_id();
    let phase = state.rng.random_range(0.0..TAU);
    state.platforms.push(Platform {
        id,
        pos: Vec2::new(
            (vp.width - START_PLATFORM_WIDTH) / 2.0,
            state.camera_y + vp.height - START_PLATFORM_OFFSET,
        ),
        width: START_PLATFORM_WIDTH,
        height: settings.world.platform_height,
        phase,
        kind: PlatformKind::Normal,
    });

    // No hazards on the opening screen
    fill(state, settings, false);
    log::debug!("Seeded world with {} platforms", state.platforms.len());
}

/// Cull behind the camera, then generate ahead of it
pub fn maintain(state: &mut SimulationState, settings: &Settings) {
    cull(state, settings);
    fill(state, settings, true);
}

/// Y of the extreme platform in the direction of travel.
///
/// With no platforms at all this falls back to the camera's trailing edge so
/// generation restarts from the visible screen.
pub fn frontier_y(state: &SimulationState, viewport_height: f32) -> f32 {
    let ys = state.platforms.iter().map(|p| p.pos.y);
    if state.chaos.mode.is_flipped() {
        ys.reduce(f32::max).unwrap_or(state.camera_y)
    } else {
        ys.reduce(f32::min)
            .unwrap_or(state.camera_y + viewport_height)
    }
}

/// How far generated platforms reach beyond the camera's leading edge
pub fn lookahead(state: &SimulationState, viewport_height: f32) -> f32 {
    let frontier = frontier_y(state, viewport_height);
    if state.chaos.mode.is_flipped() {
        frontier - (state.camera_y + viewport_height)
    } else {
        state.camera_y - frontier
    }
}

/// Weighted kind draw: spikes first, then bouncy, else normal
pub fn roll_kind(roll: f64, world: &WorldSettings) -> PlatformKind {
    if roll < world.spike_chance {
        PlatformKind::Spike
    } else if roll < world.spike_chance + world.bouncy_chance {
        PlatformKind::Bouncy
    } else {
        PlatformKind::Normal
    }
}

fn fill(state: &mut SimulationState, settings: &Settings, hazards: bool) {
    if settings.world.min_platform_gap <= 0.0 {
        log::warn!(
            "min_platform_gap {} is not positive; skipping generation",
            settings.world.min_platform_gap
        );
        return;
    }
    let h = settings.viewport.height;
    let (dir, target) = if state.chaos.mode.is_flipped() {
        (1.0, state.camera_y + 2.0 * h)
    } else {
        (-1.0, state.camera_y - h)
    };

    let mut frontier = frontier_y(state, h);
    let mut spawned = 0;
    while (target - frontier) * dir > 0.0 {
        let gap = state.rng.random_range(
            settings.world.min_platform_gap..=settings.world.max_platform_gap,
        );
        frontier += dir * gap;
        spawn_platform(state, settings, frontier, hazards);
        spawned += 1;
    }

    if spawned > 0 {
        log::trace!("Generated {} platforms, frontier at {:.0}", spawned, frontier);
    }
}

fn spawn_platform(state: &mut SimulationState, settings: &Settings, y: f32, hazards: bool) {
    let world = &settings.world;
    let width = if state.chaos.mode == ChaosMode::TinyPlatforms {
        world.tiny_platform_width
    } else {
        state
            .rng
            .random_range(world.min_platform_width..=world.max_platform_width)
    };
    let x = state
        .rng
        .random_range(0.0..=(settings.viewport.width - width).max(0.0));
    let phase = state.rng.random_range(0.0..TAU);
    let kind = if hazards {
        roll_kind(state.rng.random::<f64>(), world)
    } else {
        PlatformKind::Normal
    };

    let id = state.next_entity_id();
    let platform = Platform {
        id,
        pos: Vec2::new(x, y),
        width,
        height: world.platform_height,
        phase,
        kind,
    };

    if state.rng.random_bool(world.coin_chance) {
        // Coins sit on the side the player lands on
        let coin_y = if state.chaos.mode.is_flipped() {
            platform.bottom() + COIN_MARGIN
        } else {
            platform.top() - world.coin_size - COIN_MARGIN
        };
        let id = state.next_entity_id();
        state.coins.push(Coin {
            id,
            pos: Vec2::new(x + width / 2.0 - world.coin_size / 2.0, coin_y),
            size: world.coin_size,
            collected: false,
        });
    }

    state.platforms.push(platform);
}

fn cull(state: &mut SimulationState, settings: &Settings) {
    let margin = settings.world.cull_margin;
    let before = state.platforms.len();

    if state.chaos.mode.is_flipped() {
        let limit = state.camera_y - margin;
        state.platforms.retain(|p| p.bottom() >= limit);
        state.coins.retain(|c| c.pos.y + c.size >= limit);
    } else {
        let limit = state.camera_y + settings.viewport.height + margin;
        state.platforms.retain(|p| p.top() <= limit);
        state.coins.retain(|c| c.pos.y <= limit);
    }

    let culled = before - state.platforms.len();
    if culled > 0 {
        log::trace!("Culled {} platforms", culled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::apply_mode;

    fn sorted_ys(state: &SimulationState) -> Vec<f32> {
        let mut ys: Vec<f32> = state.platforms.iter().map(|p| p.pos.y).collect();
        ys.sort_by(|a, b| a.partial_cmp(b).unwrap());
        ys
    }

    #[test]
    fn test_seed_covers_one_screen_ahead() {
        let settings = Settings::default();
        let state = SimulationState::new(1, 1, &settings);
        assert!(lookahead(&state, settings.viewport.height) >= settings.viewport.height);
    }

    #[test]
    fn test_zero_gap_does_not_hang() {
        let mut settings = Settings::default();
        settings.world.min_platform_gap = 0.0;
        settings.world.max_platform_gap = 0.0;
        let mut state = SimulationState::new(1, 1, &settings);
        // Only the start platform
        assert_eq!(state.platforms.len(), 1);
        maintain(&mut state, &settings);
        assert_eq!(state.platforms.len(), 1);
    }

    #[test]
    fn test_seed_has_no_hazards() {
        let mut settings = Settings::default();
        settings.world.spike_chance = 0.5;
        settings.world.bouncy_chance = 0.5;
        let state = SimulationState::new(1, 1, &settings);
        assert!(state.platforms.iter().all(|p| p.kind == PlatformKind::Normal));
    }

    #[test]
    fn test_gaps_stay_in_range() {
        let settings = Settings::default();
        let state = SimulationState::new(99, 1, &settings);
        let ys = sorted_ys(&state);
        for pair in ys.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= settings.world.min_platform_gap - 1e-3, "gap {gap}");
            assert!(gap <= settings.world.max_platform_gap + 1e-3, "gap {gap}");
        }
    }

    #[test]
    fn test_platforms_fit_viewport() {
        let settings = Settings::default();
        let state = SimulationState::new(5, 1, &settings);
        for p in &state.platforms {
            assert!(p.pos.x >= 0.0);
            assert!(p.pos.x + p.width <= settings.viewport.width + 1e-3);
        }
    }

    #[test]
    fn test_same_seed_same_layout() {
        let settings = Settings::default();
        let a = SimulationState::new(1234, 1, &settings);
        let b = SimulationState::new(1234, 1, &settings);
        assert_eq!(a.platforms, b.platforms);
        assert_eq!(a.coins, b.coins);
    }

    #[test]
    fn test_empty_world_reseeds_from_camera() {
        let settings = Settings::default();
        let h = settings.viewport.height;
        let mut state = SimulationState::new(8, 1, &settings);
        state.platforms.clear();
        state.coins.clear();
        assert_eq!(frontier_y(&state, h), state.camera_y + h);

        maintain(&mut state, &settings);
        assert!(!state.platforms.is_empty());
        let lowest = state.platforms.iter().map(|p| p.pos.y).fold(f32::MIN, f32::max);
        assert!(lowest <= state.camera_y + h - settings.world.min_platform_gap + 1e-3);
        assert!(lookahead(&state, h) >= h);
    }

    #[test]
    fn test_scrolling_culls_and_extends() {
        let settings = Settings::default();
        let h = settings.viewport.height;
        let mut state = SimulationState::new(2, 1, &settings);
        let start_id = state.platforms[0].id;

        state.camera_y -= 2.0 * h;
        maintain(&mut state, &settings);

        assert!(state.platforms.iter().all(|p| p.id != start_id));
        assert!(
            state
                .platforms
                .iter()
                .all(|p| p.top() <= state.camera_y + h + settings.world.cull_margin)
        );
        assert!(lookahead(&state, h) >= h);
    }

    #[test]
    fn test_flipped_generates_below() {
        let settings = Settings::default();
        let h = settings.viewport.height;
        let mut state = SimulationState::new(3, 1, &settings);
        apply_mode(&mut state, ChaosMode::GravityFlip);
        maintain(&mut state, &settings);

        assert!(lookahead(&state, h) >= h);
        assert!(
            state
                .platforms
                .iter()
                .all(|p| p.bottom() >= state.camera_y - settings.world.cull_margin)
        );
    }

    #[test]
    fn test_tiny_platforms_width() {
        let settings = Settings::default();
        let h = settings.viewport.height;
        let mut state = SimulationState::new(4, 1, &settings);
        apply_mode(&mut state, ChaosMode::TinyPlatforms);
        let known: Vec<u32> = state.platforms.iter().map(|p| p.id).collect();

        state.camera_y -= h;
        maintain(&mut state, &settings);
        let fresh: Vec<_> = state
            .platforms
            .iter()
            .filter(|p| !known.contains(&p.id))
            .collect();
        assert!(!fresh.is_empty());
        assert!(
            fresh
                .iter()
                .all(|p| p.width == settings.world.tiny_platform_width)
        );
    }

    #[test]
    fn test_roll_kind_weights() {
        let world = WorldSettings {
            spike_chance: 0.125,
            bouncy_chance: 0.25,
            ..Default::default()
        };
        assert_eq!(roll_kind(0.0, &world), PlatformKind::Spike);
        assert_eq!(roll_kind(0.124, &world), PlatformKind::Spike);
        assert_eq!(roll_kind(0.125, &world), PlatformKind::Bouncy);
        assert_eq!(roll_kind(0.374, &world), PlatformKind::Bouncy);
        assert_eq!(roll_kind(0.375, &world), PlatformKind::Normal);
        assert_eq!(roll_kind(0.999, &world), PlatformKind::Normal);
    }

    #[test]
    fn test_coins_sit_above_platforms() {
        let mut settings = Settings::default();
        settings.world.coin_chance = 1.0;
        let state = SimulationState::new(6, 1, &settings);
        // Every generated platform (not the start one) carries a coin
        assert_eq!(state.coins.len(), state.platforms.len() - 1);
        for coin in &state.coins {
            let host = state
                .platforms
                .iter()
                .find(|p| (p.top() - settings.world.coin_size - COIN_MARGIN - coin.pos.y).abs() < 1e-3)
                .expect("coin has a host platform");
            assert!((host.pos.x + host.width / 2.0 - (coin.pos.x + coin.size / 2.0)).abs() < 1e-3);
        }
    }
}
