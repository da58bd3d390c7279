//! Game tuning and configuration
//!
//! Every gameplay constant that a designer might want to tweak lives here.
//! Persisted separately from player profiles in LocalStorage; partial JSON is
//! accepted and missing fields fall back to defaults.

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::sim::PhysicsParams;

/// Canvas geometry the simulation lays the world out against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 600.0,
        }
    }
}

/// Procedural world generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    pub min_platform_gap: f32,
    pub max_platform_gap: f32,
    pub min_platform_width: f32,
    pub max_platform_width: f32,
    /// Width used while `tiny_platforms` is active
    pub tiny_platform_width: f32,
    pub platform_height: f32,
    pub spike_chance: f64,
    pub bouncy_chance: f64,
    pub coin_chance: f64,
    pub coin_size: f32,
    pub coin_value: u32,
    /// How far behind the camera an entity may drift before it is culled
    pub cull_margin: f32,
    /// How far past the trailing screen edge the player may fall before dying
    pub death_margin: f32,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            min_platform_gap: 90.0,
            max_platform_gap: 125.0,
            min_platform_width: 85.0,
            max_platform_width: 110.0,
            tiny_platform_width: 60.0,
            platform_height: 16.0,
            spike_chance: 0.06,
            bouncy_chance: 0.10,
            coin_chance: 0.2,
            coin_size: 16.0,
            coin_value: 1,
            cull_margin: 60.0,
            death_margin: 60.0,
        }
    }
}

/// Chaos mode timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaosSettings {
    /// Game time between random mode changes (ms)
    pub interval_ms: f64,
    /// When set, a drawn mode reverts to `normal` after this long (ms)
    pub duration_ms: Option<f64>,
    /// Whether `normal` takes part in the random draw
    pub include_normal: bool,
}

impl Default for ChaosSettings {
    fn default() -> Self {
        Self {
            interval_ms: 10_000.0,
            duration_ms: None,
            include_normal: true,
        }
    }
}

/// Coins, hearts and revives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomySettings {
    pub max_revives_per_game: u32,
    pub heart_cost: u32,
    /// Hearts granted to a freshly created profile
    pub starting_hearts: u32,
}

impl Default for EconomySettings {
    fn default() -> Self {
        Self {
            max_revives_per_game: 1,
            heart_cost: 50,
            starting_hearts: 1,
        }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub viewport: Viewport,
    /// Base physics parameters (chaos modes derive from these)
    pub physics: PhysicsParams,
    pub world: WorldSettings,
    pub chaos: ChaosSettings,
    pub economy: EconomySettings,
}

impl Settings {
    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "chaos_jump_settings";

    /// Parse settings from JSON and validate them
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that ranges are ordered and probabilities are sane
    pub fn validate(&self) -> Result<(), SettingsError> {
        let w = &self.world;
        if w.min_platform_gap > w.max_platform_gap {
            return Err(SettingsError::InvalidRange {
                field: "platform_gap",
                min: w.min_platform_gap,
                max: w.max_platform_gap,
            });
        }
        if w.min_platform_width > w.max_platform_width {
            return Err(SettingsError::InvalidRange {
                field: "platform_width",
                min: w.min_platform_width,
                max: w.max_platform_width,
            });
        }
        if w.min_platform_gap <= 0.0 {
            return Err(SettingsError::InvalidParameter {
                field: "min_platform_gap",
                reason: "must be positive",
            });
        }
        if w.max_platform_width.max(w.tiny_platform_width) > self.viewport.width {
            return Err(SettingsError::InvalidParameter {
                field: "max_platform_width",
                reason: "platforms must fit inside the viewport",
            });
        }
        let chances = [w.spike_chance, w.bouncy_chance, w.coin_chance];
        if chances.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(SettingsError::InvalidParameter {
                field: "chance",
                reason: "probabilities must lie in [0, 1]",
            });
        }
        if w.spike_chance + w.bouncy_chance > 1.0 {
            return Err(SettingsError::InvalidParameter {
                field: "spike_chance",
                reason: "spike and bouncy chances must sum to at most 1",
            });
        }
        if self.chaos.interval_ms <= 0.0 {
            return Err(SettingsError::InvalidParameter {
                field: "interval_ms",
                reason: "must be positive",
            });
        }
        let p = &self.physics;
        if !(0.0..=1.0).contains(&p.friction) {
            return Err(SettingsError::InvalidParameter {
                field: "friction",
                reason: "must lie in [0, 1]",
            });
        }
        if p.gravity <= 0.0 || p.jump_power >= 0.0 {
            return Err(SettingsError::InvalidParameter {
                field: "gravity",
                reason: "base gravity pulls down and the jump pushes up",
            });
        }
        Ok(())
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = self.to_json() {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
