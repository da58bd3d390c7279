//! Per-frame simulation tick
//!
//! Advances the world by one frame in a fixed order: chaos timer, horizontal
//! motion, vertical motion, platform landing, camera follow, coins, goo
//! aging, death check, world maintenance. Physics constants are tuned per
//! 60 Hz reference frame and scaled by the real frame length.

use glam::Vec2;
use rand::Rng;

use super::chaos;
use super::collision::{find_landing, snap_to_surface, wrap_x};
use super::state::{Droplet, GameEvent, GooSplat, Platform, PlatformKind, SimulationState};
use super::world;
use crate::consts::*;
use crate::settings::Settings;

/// Input flags polled once per tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub move_left: bool,
    pub move_right: bool,
    /// Demo mode - steer toward the next platform automatically
    pub autopilot: bool,
}

impl TickInput {
    /// Drop held movement keys. Autopilot is a setting, not a key, and stays.
    pub fn release(&mut self) {
        self.move_left = false;
        self.move_right = false;
    }
}

/// What the tick concluded about the round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    Alive,
    Died,
}

/// Advance the simulation by `dt_ms` milliseconds (clamped to a max frame)
pub fn tick(
    state: &mut SimulationState,
    input: &TickInput,
    dt_ms: f64,
    settings: &Settings,
) -> TickStatus {
    if !state.alive {
        return TickStatus::Died;
    }
    if dt_ms <= 0.0 {
        return TickStatus::Alive;
    }

    let dt_ms = dt_ms.min(MAX_FRAME_DT_MS);
    state.game_time_ms += dt_ms;

    chaos::update(state, &settings.chaos);

    let dt = dt_ms as f32;
    let k = dt / REFERENCE_FRAME_MS;
    let flipped = state.chaos.mode.is_flipped();
    let vp = settings.viewport;

    // Horizontal
    let (left, right) = steer(state, input);
    let player = &mut state.player;
    let p = player.params;
    if left {
        player.vel.x -= p.speed * k;
    }
    if right {
        player.vel.x += p.speed * k;
    }
    player.vel.x *= p.friction.powf(k);
    player.vel.x = player.vel.x.clamp(-p.max_speed, p.max_speed);
    player.pos.x += player.vel.x * k;
    player.pos.x = wrap_x(player.pos.x, player.size.x, vp.width);

    // Vertical
    let prev_y = player.pos.y;
    player.vel.y += p.gravity * k;
    player.pos.y += player.vel.y * k;

    player.squish = (player.squish - dt * SQUISH_DECAY_PER_MS).max(0.0);

    // Platforms
    if let Some(index) = find_landing(&state.player, prev_y, &state.platforms, flipped) {
        let platform = state.platforms[index].clone();
        match platform.kind {
            PlatformKind::Spike => {
                let at = state.player.pos;
                state.events.push(GameEvent::SpikeHit { at });
                return die(state);
            }
            PlatformKind::Normal | PlatformKind::Bouncy => {
                land(state, &platform, flipped);
            }
        }
    }

    // Camera follow
    let threshold = state.camera_threshold(vp.height);
    let screen_y = state.player_screen_y();
    let crossed = if flipped {
        screen_y - threshold
    } else {
        threshold - screen_y
    };
    if crossed > 0.0 {
        state.camera_y += if flipped { crossed } else { -crossed };
        state.world_offset_y += crossed;
    }

    collect_coins(state, settings);
    age_splats(state, dt);

    // Death: fully past the trailing edge of the screen
    let screen_y = state.player_screen_y();
    let out = if flipped {
        screen_y + state.player.size.y < -settings.world.death_margin
    } else {
        screen_y > vp.height + settings.world.death_margin
    };
    if out {
        return die(state);
    }

    world::maintain(state, settings);

    TickStatus::Alive
}

fn die(state: &mut SimulationState) -> TickStatus {
    state.alive = false;
    let height = state.height_meters();
    log::info!("Player died at {}m ({} coins this round)", height, state.round_coins);
    state.events.push(GameEvent::Died { height });
    TickStatus::Died
}

/// Left/right flags after control reversal (or from the autopilot)
fn steer(state: &SimulationState, input: &TickInput) -> (bool, bool) {
    if input.autopilot {
        return autopilot(state);
    }
    if state.chaos.mode == chaos::ChaosMode::ReverseControls {
        (input.move_right, input.move_left)
    } else {
        (input.move_left, input.move_right)
    }
}

/// Aim for the platform we're about to reach: the next one up while rising,
/// the nearest one below while falling (directions swap when flipped).
fn autopilot(state: &SimulationState) -> (bool, bool) {
    let player = &state.player;
    let flipped = state.chaos.mode.is_flipped();
    // Positive along the direction gravity pulls
    let falling = if flipped {
        player.vel.y < 0.0
    } else {
        player.vel.y > 0.0
    };

    let target = state
        .platforms
        .iter()
        .filter(|p| p.kind != PlatformKind::Spike)
        .filter_map(|p| {
            let (surface, edge) = if flipped {
                (p.bottom(), player.top())
            } else {
                (p.top(), player.bottom())
            };
            // Distance from the player's leading edge, measured with gravity
            let along = if flipped { edge - surface } else { surface - edge };
            let wanted = if falling { along >= 0.0 } else { along < 0.0 };
            wanted.then_some((p, along.abs()))
        })
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(p, _)| p.pos.x + p.width / 2.0);

    match target {
        Some(x) => {
            let dx = x - player.center_x();
            let deadzone = 8.0;
            (dx < -deadzone, dx > deadzone)
        }
        None => (false, false),
    }
}

fn land(state: &mut SimulationState, platform: &Platform, flipped: bool) {
    let player = &mut state.player;
    snap_to_surface(player, platform, flipped);
    let boost = match platform.kind {
        PlatformKind::Bouncy => BOUNCY_PLATFORM_MULTIPLIER,
        PlatformKind::Normal | PlatformKind::Spike => 1.0,
    };
    player.vel.y = player.params.jump_power * boost;
    player.squish = 1.0;

    let at = Vec2::new(player.center_x(), player.pos.y);
    spawn_goo_splat(state, platform, flipped);
    state.events.push(GameEvent::Landed {
        kind: platform.kind,
        at,
    });
}

/// Leave a goo splat (plus a few droplets) where the player touched down
fn spawn_goo_splat(state: &mut SimulationState, platform: &Platform, flipped: bool) {
    let player = &state.player;
    let dir = if flipped { 1.0 } else { -1.0 };
    let x = player
        .center_x()
        .clamp(platform.pos.x, platform.pos.x + platform.width);
    let y = if flipped {
        platform.bottom()
    } else {
        platform.top()
    };
    let width = (platform.width * 0.8).min(player.size.x).max(24.0);
    let color = player.color;

    let rng = &mut state.rng;
    let count = rng.random_range(3..=5);
    let droplets = (0..count)
        .map(|_| Droplet {
            pos: Vec2::new(
                x + (rng.random::<f32>() - 0.5) * 30.0,
                y + dir * (4.0 + rng.random::<f32>() * 6.0),
            ),
            vel: Vec2::new(
                (rng.random::<f32>() - 0.5) * 0.3,
                dir * (0.05 + rng.random::<f32>() * 0.15),
            ),
            radius: 2.0 + rng.random::<f32>() * 3.0,
            age_ms: 0.0,
            life_ms: 420.0 + rng.random::<f32>() * 200.0,
        })
        .collect();

    state.splats.push(GooSplat {
        pos: Vec2::new(x, y),
        dir,
        width,
        color,
        age_ms: 0.0,
        life_ms: GOO_SPLAT_LIFE_MS,
        droplets,
    });
}

fn collect_coins(state: &mut SimulationState, settings: &Settings) {
    let player = &state.player;
    let mut collected = 0;
    for coin in state.coins.iter_mut() {
        if !coin.collected && coin.overlaps(player) {
            coin.collected = true;
            collected += 1;
        }
    }

    if collected > 0 {
        state.round_coins += collected * settings.world.coin_value;
        state.events.push(GameEvent::CoinCollected {
            round_coins: state.round_coins,
        });
        state.coins.retain(|c| !c.collected);
    }
}

fn age_splats(state: &mut SimulationState, dt: f32) {
    for splat in state.splats.iter_mut() {
        splat.age_ms += dt;
        for drop in splat.droplets.iter_mut() {
            drop.age_ms += dt;
            drop.pos += drop.vel * dt;
        }
        splat.droplets.retain(|d| d.age_ms < d.life_ms);
    }
    state.splats.retain(|s| s.age_ms < s.life_ms);
}
