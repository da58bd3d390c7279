//! Round lifecycle
//!
//! `Idle -> Running <-> Paused`, `Running -> Ended -> Running (revive) | Idle
//! (exit)`. Every action checks the current phase first; a rejected action
//! returns an error and leaves the session untouched.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{GameError, Result, SettingsError, StoreError};
use crate::persistence::{PlayerProfile, ProfileStore};
use crate::render::{FrameView, Hud};
use crate::settings::Settings;
use crate::sim::{
    ChaosMode, Coin, GameEvent, Platform, Player, SimulationState, TickInput, TickStatus,
    apply_mode, tick,
};

pub use crate::error::ReviveBlock;

/// Whether the game-over screen offers a revive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviveStatus {
    Available,
    Exhausted(ReviveBlock),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Menu; no round in progress
    Idle,
    Running,
    Paused,
    /// Game over screen
    Ended { revive: ReviveStatus },
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Running => "running",
            SessionPhase::Paused => "paused",
            SessionPhase::Ended { .. } => "ended",
        }
    }
}

/// How `sign_in` obtained the profile
#[derive(Debug)]
pub enum ProfileLoad {
    Loaded,
    /// First sign-in; defaults were created
    Created,
    /// The store failed; playing on in-memory defaults
    Fallback(StoreError),
}

/// World and player captured at death, restored by a revive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeathSnapshot {
    pub player: Player,
    pub camera_y: f32,
    pub world_offset_y: f32,
    pub platforms: Vec<Platform>,
    pub coins: Vec<Coin>,
}

impl DeathSnapshot {
    fn capture(state: &SimulationState) -> Self {
        Self {
            player: state.player.clone(),
            camera_y: state.camera_y,
            world_offset_y: state.world_offset_y,
            platforms: state.platforms.clone(),
            coins: state.coins.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct Account {
    id: String,
    profile: PlayerProfile,
}

/// One player's game: profile, current round and the phase machine
pub struct Session {
    settings: Settings,
    account: Option<Account>,
    sim: SimulationState,
    phase: SessionPhase,
    round: u32,
    revives_used: u32,
    last_death: Option<DeathSnapshot>,
}

impl Session {
    /// Create a signed-out session. Rejects settings that fail
    /// [`Settings::validate`].
    pub fn new(settings: Settings) -> std::result::Result<Self, SettingsError> {
        settings.validate()?;
        let sim = SimulationState::new(0, 0, &settings);
        Ok(Self {
            settings,
            account: None,
            sim,
            phase: SessionPhase::Idle,
            round: 0,
            revives_used: 0,
            last_death: None,
        })
    }

    /// Attach an account, creating its profile on first sign-in
    pub fn sign_in(&mut self, id: &str, store: &mut dyn ProfileStore) -> ProfileLoad {
        let (profile, load) = match store.load_profile(id) {
            Ok(profile) => (profile, ProfileLoad::Loaded),
            Err(StoreError::NotFound(_)) => {
                let profile = PlayerProfile {
                    hearts: self.settings.economy.starting_hearts,
                    ..Default::default()
                };
                if let Err(err) = store.save_profile(id, &profile) {
                    log::warn!("Could not create profile for {}: {}", id, err);
                }
                (profile, ProfileLoad::Created)
            }
            Err(err) => {
                log::warn!("Profile load failed for {}, using defaults: {}", id, err);
                let profile = PlayerProfile {
                    hearts: self.settings.economy.starting_hearts,
                    ..Default::default()
                };
                (profile, ProfileLoad::Fallback(err))
            }
        };

        log::info!(
            "Signed in as {} ({} coins, {} hearts, best {}m)",
            id,
            profile.total_coins,
            profile.hearts,
            profile.max_height
        );
        self.account = Some(Account {
            id: id.to_string(),
            profile,
        });
        load
    }

    /// Begin a fresh round from the menu
    pub fn start(&mut self, seed: u64) -> Result<()> {
        if self.account.is_none() {
            log::warn!("Start rejected: not signed in");
            return Err(GameError::NotAuthenticated);
        }
        self.require("start", matches!(self.phase, SessionPhase::Idle))?;

        self.round += 1;
        self.sim = SimulationState::new(seed, self.round, &self.settings);
        apply_mode(&mut self.sim, ChaosMode::Normal);
        self.revives_used = 0;
        self.last_death = None;
        self.phase = SessionPhase::Running;

        log::info!("Round {} started (seed {})", self.round, seed);
        Ok(())
    }

    /// Advance the running round by one frame. Ends the round on death.
    pub fn step(&mut self, input: &TickInput, dt_ms: f64) -> TickStatus {
        if self.phase != SessionPhase::Running {
            return if self.sim.alive {
                TickStatus::Alive
            } else {
                TickStatus::Died
            };
        }

        let status = tick(&mut self.sim, input, dt_ms, &self.settings);
        if status == TickStatus::Died {
            self.finish_round();
        }
        status
    }

    /// End the round now (from running or paused)
    pub fn end(&mut self) -> Result<()> {
        self.require(
            "end the round",
            matches!(self.phase, SessionPhase::Running | SessionPhase::Paused),
        )?;
        self.sim.alive = false;
        self.finish_round();
        Ok(())
    }

    fn finish_round(&mut self) {
        self.last_death = Some(DeathSnapshot::capture(&self.sim));
        let revive = self.revive_status();
        self.phase = SessionPhase::Ended { revive };
        log::info!(
            "Round {} over at {}m with {} coins ({:?})",
            self.round,
            self.sim.height_meters(),
            self.sim.round_coins,
            revive
        );
    }

    /// Spend a heart to continue the round just lost.
    ///
    /// The round resumes even when the heart cannot be saved; the store error
    /// is still returned so the caller can tell the player.
    pub fn revive(&mut self, store: &mut dyn ProfileStore) -> Result<()> {
        if !matches!(self.phase, SessionPhase::Ended { .. }) {
            return Err(GameError::ReviveUnavailable(ReviveBlock::NoDeath));
        }
        if let ReviveStatus::Exhausted(block) = self.revive_status() {
            log::warn!("Revive rejected: {}", block);
            return Err(GameError::ReviveUnavailable(block));
        }
        let (Some(snapshot), Some(account)) = (self.last_death.take(), self.account.as_mut())
        else {
            return Err(GameError::ReviveUnavailable(ReviveBlock::NoDeath));
        };

        account.profile.hearts -= 1;
        self.revives_used += 1;
        let saved = store.save_profile(&account.id, &account.profile);

        let h = self.settings.viewport.height;
        let sim = &mut self.sim;
        sim.player = snapshot.player;
        sim.platforms = snapshot.platforms;
        sim.coins = snapshot.coins;
        sim.camera_y = snapshot.camera_y;
        sim.world_offset_y = snapshot.world_offset_y;
        sim.splats.clear();
        sim.alive = true;

        let threshold = sim.camera_threshold(h);
        let player = &mut sim.player;
        player.pos.y = sim.camera_y + threshold;
        player.vel.y = player.params.jump_power * REVIVE_JUMP_FACTOR;
        player.vel.x = player.vel.x.clamp(-REVIVE_MAX_DX, REVIVE_MAX_DX);
        player.squish = 0.0;

        self.phase = SessionPhase::Running;
        log::info!(
            "Revived ({} of {}, {} hearts left)",
            self.revives_used,
            self.settings.economy.max_revives_per_game,
            account.profile.hearts
        );
        saved.map_err(|err| {
            log::warn!("Could not persist heart use: {}", err);
            GameError::from(err)
        })
    }

    pub fn pause(&mut self) -> Result<()> {
        self.require("pause", self.phase == SessionPhase::Running)?;
        self.phase = SessionPhase::Paused;
        log::info!("Paused");
        Ok(())
    }

    /// Back to running; the loop driver restarts its frame clock
    pub fn resume(&mut self) -> Result<()> {
        self.require("resume", self.phase == SessionPhase::Paused)?;
        self.phase = SessionPhase::Running;
        log::info!("Resumed");
        Ok(())
    }

    /// Bank the round's coins and best height, then return to the menu.
    ///
    /// The session is back in `Idle` even when saving fails; the store error
    /// is still returned so the caller can tell the player.
    pub fn exit_to_menu(&mut self, store: &mut dyn ProfileStore) -> Result<()> {
        self.require(
            "exit to menu",
            matches!(self.phase, SessionPhase::Ended { .. } | SessionPhase::Paused),
        )?;

        let height = self.sim.height_meters();
        let coins = std::mem::take(&mut self.sim.round_coins);
        self.sim.alive = false;
        self.phase = SessionPhase::Idle;
        self.last_death = None;

        let Some(account) = self.account.as_mut() else {
            return Ok(());
        };
        account.profile.total_coins += coins;
        account.profile.max_height = account.profile.max_height.max(height);
        log::info!(
            "Banked {} coins (total {}), best {}m",
            coins,
            account.profile.total_coins,
            account.profile.max_height
        );

        store
            .save_profile(&account.id, &account.profile)
            .map_err(|err| {
                log::warn!("Could not save profile: {}", err);
                GameError::from(err)
            })
    }

    /// Trade `heart_cost` banked coins for a heart
    pub fn buy_heart(&mut self, store: &mut dyn ProfileStore) -> Result<()> {
        let cost = self.settings.economy.heart_cost;
        let phase = self.phase;
        let Some(account) = self.account.as_mut() else {
            return Err(GameError::NotAuthenticated);
        };
        if phase == SessionPhase::Running {
            return Err(GameError::InvalidTransition {
                action: "buy a heart",
                phase: phase.name(),
            });
        }
        if account.profile.total_coins < cost {
            return Err(GameError::InsufficientCoins {
                needed: cost - account.profile.total_coins,
            });
        }

        account.profile.total_coins -= cost;
        account.profile.hearts += 1;
        log::info!("Bought a heart ({} hearts)", account.profile.hearts);
        let saved = store.save_profile(&account.id, &account.profile);

        if let SessionPhase::Ended { .. } = self.phase {
            self.phase = SessionPhase::Ended {
                revive: self.revive_status(),
            };
        }
        saved.map_err(GameError::from)
    }

    /// Revive eligibility for the current round
    pub fn revive_status(&self) -> ReviveStatus {
        if self.revives_used >= self.settings.economy.max_revives_per_game {
            return ReviveStatus::Exhausted(ReviveBlock::RevivesUsedUp);
        }
        match &self.account {
            Some(account) if account.profile.hearts > 0 => ReviveStatus::Available,
            _ => ReviveStatus::Exhausted(ReviveBlock::NoHearts),
        }
    }

    fn require(&self, action: &'static str, allowed: bool) -> Result<()> {
        if allowed {
            Ok(())
        } else {
            log::warn!("Cannot {} while {}", action, self.phase.name());
            Err(GameError::InvalidTransition {
                action,
                phase: self.phase.name(),
            })
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn revives_used(&self) -> u32 {
        self.revives_used
    }

    pub fn height_meters(&self) -> u32 {
        self.sim.height_meters()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn account_id(&self) -> Option<&str> {
        self.account.as_ref().map(|a| a.id.as_str())
    }

    pub fn profile(&self) -> Option<&PlayerProfile> {
        self.account.as_ref().map(|a| &a.profile)
    }

    pub fn last_death(&self) -> Option<&DeathSnapshot> {
        self.last_death.as_ref()
    }

    pub fn simulation(&self) -> &SimulationState {
        &self.sim
    }

    /// Direct access for tools and tests
    pub fn simulation_mut(&mut self) -> &mut SimulationState {
        &mut self.sim
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.sim.drain_events()
    }

    /// Snapshot of what to draw this frame
    pub fn frame_view(&self) -> FrameView<'_> {
        let profile = self.profile();
        FrameView {
            state: &self.sim,
            viewport: self.settings.viewport,
            hud: Hud {
                height_m: self.sim.height_meters(),
                round_coins: self.sim.round_coins,
                hearts: profile.map(|p| p.hearts),
                total_coins: profile.map(|p| p.total_coins),
                chaos_mode: self.sim.chaos.mode,
                chaos_countdown_s: self
                    .sim
                    .chaos
                    .seconds_until_next(self.sim.game_time_ms, self.settings.chaos.interval_ms),
            },
        }
    }
}
