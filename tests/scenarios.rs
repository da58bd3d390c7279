//! End-to-end rounds driven through the public API

use std::collections::BTreeSet;

use chaos_jump::error::{GameError, ReviveBlock};
use chaos_jump::leaderboard::Leaderboard;
use chaos_jump::persistence::{MemoryStore, ProfileStore};
use chaos_jump::render::NullSink;
use chaos_jump::sim::{ChaosMode, GameEvent, SimulationState, TickInput, TickStatus, apply_mode, tick};
use chaos_jump::sim::world::lookahead;
use chaos_jump::{GameLoop, LoopControl, ReviveStatus, Session, SessionPhase, Settings};
use proptest::prelude::*;

const DT: f64 = 1000.0 / 60.0;

fn autopilot() -> TickInput {
    TickInput {
        autopilot: true,
        ..Default::default()
    }
}

/// Push the player off the bottom of the screen and run one frame
fn fall_off(session: &mut Session) {
    let h = session.settings().viewport.height;
    let sim = session.simulation_mut();
    sim.player.pos.y = sim.camera_y + h + 500.0;
    sim.player.vel.y = 1.0;
    assert_eq!(session.step(&TickInput::default(), DT), TickStatus::Died);
}

#[test]
fn one_heart_one_revive_round() {
    let mut store = MemoryStore::new();
    let mut session = Session::new(Settings::default()).unwrap();
    session.sign_in("hopper@example.com", &mut store);
    session.start(2024).unwrap();

    session.simulation_mut().round_coins = 4;
    fall_off(&mut session);
    assert_eq!(
        session.phase(),
        SessionPhase::Ended {
            revive: ReviveStatus::Available
        }
    );

    session.revive(&mut store).unwrap();
    assert_eq!(session.profile().unwrap().hearts, 0);
    assert_eq!(session.revives_used(), 1);
    // Coins carry through a revive
    assert_eq!(session.simulation().round_coins, 4);

    fall_off(&mut session);
    let err = session.revive(&mut store).unwrap_err();
    assert!(matches!(
        err,
        GameError::ReviveUnavailable(ReviveBlock::RevivesUsedUp)
    ));

    session.exit_to_menu(&mut store).unwrap();
    let saved = store.load_profile("hopper@example.com").unwrap();
    assert_eq!(saved.total_coins, 4);
    assert_eq!(saved.hearts, 0);
    assert_eq!(session.phase(), SessionPhase::Idle);

    // Next round starts clean
    session.start(2025).unwrap();
    assert_eq!(session.revives_used(), 0);
    assert_eq!(session.simulation().round_coins, 0);
    assert_eq!(session.round(), 2);
}

#[test]
fn long_autopilot_run_keeps_world_invariants() {
    let mut settings = Settings::default();
    // Faster chaos so every generation direction gets exercised
    settings.chaos.interval_ms = 1_500.0;
    let h = settings.viewport.height;
    let w = settings.viewport.width;
    let mut state = SimulationState::new(31337, 1, &settings);

    let mut last_offset = 0.0;
    let mut coin_ids = BTreeSet::new();
    let mut collected_events = 0;

    for _ in 0..6_000 {
        coin_ids.extend(state.coins.iter().map(|c| c.id));
        if tick(&mut state, &autopilot(), DT, &settings) == TickStatus::Died {
            break;
        }

        assert!(state.world_offset_y >= last_offset);
        last_offset = state.world_offset_y;

        assert!(lookahead(&state, h) >= h, "lookahead fell short");
        let mut ys: Vec<f32> = state.platforms.iter().map(|p| p.pos.y).collect();
        ys.sort_by(|a, b| a.total_cmp(b));
        for pair in ys.windows(2) {
            assert!(pair[1] - pair[0] <= settings.world.max_platform_gap + 0.05);
        }

        let p = &state.player;
        assert!(p.pos.x + p.size.x >= 0.0 && p.pos.x <= w);

        collected_events += state
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::CoinCollected { .. }))
            .count();
    }

    assert!(state.round_coins as usize <= coin_ids.len());
    assert!(state.round_coins as usize >= collected_events);
}

#[test]
fn session_loop_until_game_over() {
    let mut store = MemoryStore::new();
    let mut session = Session::new(Settings::default()).unwrap();
    session.sign_in("demo@example.com", &mut store);
    session.start(7).unwrap();

    let mut game_loop = GameLoop::new();
    let mut sink = NullSink;
    let mut time = 0.0;
    let mut stopped = false;
    // No input; force the fall partway through if nothing killed us first
    for i in 0..600 {
        time += DT;
        if i == 300 {
            fall_off(&mut session);
        }
        if game_loop.frame(&mut session, time, &TickInput::default(), &mut sink)
            == LoopControl::Stop
        {
            stopped = true;
            break;
        }
    }
    assert!(stopped);
    assert!(matches!(session.phase(), SessionPhase::Ended { .. }));

    session.exit_to_menu(&mut store).unwrap();
    let board = Leaderboard::fetch(&store, 10);
    assert_eq!(board.entries.len(), 1);
    assert_eq!(board.entries[0].display_name, "demo");
}

#[test]
fn height_meters_is_floor_of_offset() {
    let settings = Settings::default();
    let mut state = SimulationState::new(1, 1, &settings);
    for (offset, meters) in [(0.0, 0), (4.99, 0), (5.0, 1), (1234.5, 246)] {
        state.world_offset_y = offset;
        assert_eq!(state.height_meters(), meters);
        assert_eq!(state.height_meters(), state.height_meters());
    }
}

proptest! {
    #[test]
    fn horizontal_speed_stays_bounded(
        seed in 0u64..10_000,
        mode in prop::sample::select(ChaosMode::ALL.to_vec()),
        inputs in prop::collection::vec((any::<bool>(), any::<bool>()), 1..300),
    ) {
        let settings = Settings::default();
        let mut state = SimulationState::new(seed, 1, &settings);
        apply_mode(&mut state, mode);
        for (move_left, move_right) in inputs {
            let input = TickInput { move_left, move_right, autopilot: false };
            if tick(&mut state, &input, DT, &settings) == TickStatus::Died {
                break;
            }
            let p = &state.player;
            prop_assert!(p.vel.x.abs() <= p.params.max_speed + 1e-4);
            prop_assert!(p.pos.x + p.size.x >= 0.0);
            prop_assert!(p.pos.x <= settings.viewport.width);
        }
    }

    #[test]
    fn same_seed_same_round(seed in 0u64..10_000, frames in 1usize..400) {
        let settings = Settings::default();
        let mut a = SimulationState::new(seed, 1, &settings);
        let mut b = SimulationState::new(seed, 1, &settings);
        for _ in 0..frames {
            let sa = tick(&mut a, &autopilot(), DT, &settings);
            let sb = tick(&mut b, &autopilot(), DT, &settings);
            prop_assert_eq!(sa, sb);
        }
        prop_assert_eq!(&a.player, &b.player);
        prop_assert_eq!(&a.platforms, &b.platforms);
        prop_assert_eq!(a.chaos.mode, b.chaos.mode);
    }

    #[test]
    fn normal_mode_restores_base(
        modes in prop::collection::vec(prop::sample::select(ChaosMode::ALL.to_vec()), 1..10),
    ) {
        let settings = Settings::default();
        let mut state = SimulationState::new(5, 1, &settings);
        for mode in modes {
            apply_mode(&mut state, mode);
        }
        apply_mode(&mut state, ChaosMode::Normal);
        prop_assert_eq!(state.player.params, settings.physics);
        prop_assert_eq!(state.player.color, ChaosMode::Normal.color());
    }

    #[test]
    fn generation_covers_a_screen(seed in 0u64..10_000, scroll in 0.0f32..5_000.0) {
        let settings = Settings::default();
        let h = settings.viewport.height;
        let mut state = SimulationState::new(seed, 1, &settings);
        state.camera_y -= scroll;
        chaos_jump::sim::world::maintain(&mut state, &settings);
        prop_assert!(lookahead(&state, h) >= h);
    }
}
