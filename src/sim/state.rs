//! Game state and core simulation types
//!
//! All state a revive snapshot or a saved run needs lives here. Positions are
//! always world coordinates; screen positions are derived from `camera_y`.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::chaos::{ChaosMode, ChaosState};
use super::world;
use crate::consts::*;
use crate::settings::Settings;

/// Tunable kinematics, stored once as the base set and once as the live set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    /// Horizontal acceleration per reference frame
    pub speed: f32,
    pub max_speed: f32,
    /// Horizontal velocity kept per reference frame (1.0 = no decay)
    pub friction: f32,
    /// Vertical acceleration per reference frame (positive pulls down)
    pub gravity: f32,
    /// Vertical velocity set on landing (negative launches up)
    pub jump_power: f32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            speed: 0.9,
            max_speed: 6.0,
            friction: 0.86,
            gravity: 0.42,
            jump_power: -10.5,
        }
    }
}

/// The player's blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner (world)
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    /// Values every chaos mode starts from
    pub base: PhysicsParams,
    /// Values the physics tick reads
    pub params: PhysicsParams,
    /// Landing squish (0-1, decays over time)
    pub squish: f32,
    /// Body color (0xRRGGBB), follows the active chaos mode
    pub color: u32,
}

impl Player {
    pub fn new(settings: &Settings) -> Self {
        let size = Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT);
        Self {
            pos: Vec2::new((settings.viewport.width - size.x) / 2.0, PLAYER_SPAWN_Y),
            vel: Vec2::ZERO,
            size,
            base: settings.physics,
            params: settings.physics,
            squish: 0.0,
            color: ChaosMode::Normal.color(),
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    /// Horizontal center (used for splat placement and the autopilot)
    #[inline]
    pub fn center_x(&self) -> f32 {
        self.pos.x + self.size.x / 2.0
    }

    /// Squash/stretch scale for drawing (x narrower, y taller while squished)
    pub fn squish_scale(&self) -> Vec2 {
        Vec2::new(1.0 - 0.12 * self.squish, 1.0 + 0.25 * self.squish)
    }
}

/// Platform variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlatformKind {
    #[default]
    Normal,
    /// Ends the round on contact
    Spike,
    /// Launches the player 1.5x higher
    Bouncy,
}

impl PlatformKind {
    /// Fill color (0xRRGGBB)
    pub fn color(&self) -> u32 {
        match self {
            PlatformKind::Normal => 0x6EA8D6,
            PlatformKind::Spike => 0xE63946,
            PlatformKind::Bouncy => 0x80ED99,
        }
    }
}

/// A platform entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: u32,
    /// Top-left corner (world)
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    /// Wobble animation phase (radians)
    pub phase: f32,
    pub kind: PlatformKind,
}

impl Platform {
    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.height
    }

    /// Strict horizontal overlap with the player
    #[inline]
    pub fn overlaps_x(&self, player: &Player) -> bool {
        player.right() > self.pos.x && player.left() < self.pos.x + self.width
    }
}

/// A collectible coin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    pub id: u32,
    /// Top-left corner (world)
    pub pos: Vec2,
    pub size: f32,
    pub collected: bool,
}

impl Coin {
    /// Axis-aligned overlap with the player's bounding box
    pub fn overlaps(&self, player: &Player) -> bool {
        player.left() < self.pos.x + self.size
            && player.right() > self.pos.x
            && player.top() < self.pos.y + self.size
            && player.bottom() > self.pos.y
    }
}

/// A goo droplet flung off a splat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Droplet {
    pub pos: Vec2,
    /// World units per ms
    pub vel: Vec2,
    pub radius: f32,
    pub age_ms: f32,
    pub life_ms: f32,
}

/// Cosmetic goo left behind on landing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GooSplat {
    pub pos: Vec2,
    /// -1 hangs upward off a platform top, +1 downward off a bottom
    pub dir: f32,
    pub width: f32,
    pub color: u32,
    pub age_ms: f32,
    pub life_ms: f32,
    pub droplets: Vec<Droplet>,
}

impl GooSplat {
    /// Animation progress (0-1)
    pub fn progress(&self) -> f32 {
        (self.age_ms / self.life_ms).clamp(0.0, 1.0)
    }
}

/// Notifications for the presentation layer (fire-and-forget)
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Landed { kind: PlatformKind, at: Vec2 },
    SpikeHit { at: Vec2 },
    CoinCollected { round_coins: u32 },
    ChaosChanged { mode: ChaosMode },
    Died { height: u32 },
}

/// Complete simulation state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Round number; guards deferred chaos reverts
    pub round: u32,
    /// Generator for world layout, chaos draws and goo
    pub rng: Pcg32,
    /// Game time since round start (ms)
    pub game_time_ms: f64,
    /// World Y of the viewport's top edge
    pub camera_y: f32,
    /// Total distance the camera has scrolled this round
    pub world_offset_y: f32,
    /// Coins collected this round (banked on exit)
    pub round_coins: u32,
    /// Cleared when the player dies
    pub alive: bool,
    pub chaos: ChaosState,
    pub player: Player,
    pub platforms: Vec<Platform>,
    pub coins: Vec<Coin>,
    #[serde(default)]
    pub splats: Vec<GooSplat>,
    /// Events raised since the last drain
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    /// Next entity ID
    next_id: u32,
}

impl SimulationState {
    /// Fresh round: player on the spawn row, world seeded above it
    pub fn new(seed: u64, round: u32, settings: &Settings) -> Self {
        let mut state = Self {
            seed,
            round,
            rng: Pcg32::seed_from_u64(seed),
            game_time_ms: 0.0,
            camera_y: 0.0,
            world_offset_y: 0.0,
            round_coins: 0,
            alive: true,
            chaos: ChaosState::default(),
            player: Player::new(settings),
            platforms: Vec::new(),
            coins: Vec::new(),
            splats: Vec::new(),
            events: Vec::new(),
            next_id: 1,
        };

        world::seed_world(&mut state, settings);

        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// World Y to screen Y
    #[inline]
    pub fn to_screen_y(&self, world_y: f32) -> f32 {
        world_y - self.camera_y
    }

    /// Player's top edge in screen space
    #[inline]
    pub fn player_screen_y(&self) -> f32 {
        self.to_screen_y(self.player.pos.y)
    }

    /// Screen row the camera pins the player to
    pub fn camera_threshold(&self, viewport_height: f32) -> f32 {
        let fraction = if self.chaos.mode.is_flipped() {
            CAMERA_THRESHOLD_FLIPPED
        } else {
            CAMERA_THRESHOLD_NORMAL
        };
        viewport_height * fraction
    }

    /// Displayed height in meters
    pub fn height_meters(&self) -> u32 {
        crate::height_meters(self.world_offset_y)
    }

    /// Take all events raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
