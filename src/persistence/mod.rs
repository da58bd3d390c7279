//! Player profile persistence
//!
//! The session talks to storage only through [`ProfileStore`] and
//! [`LeaderboardSource`]. [`MemoryStore`] backs tests and the native binary;
//! on wasm32 [`LocalStorageStore`] keeps every profile in one JSON map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::leaderboard::{Leaderboard, LeaderboardEntry};

/// Persistent per-account progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerProfile {
    /// Banked coins (spent in the heart shop)
    pub total_coins: u32,
    pub hearts: u32,
    /// Best height in meters
    pub max_height: u32,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self {
            total_coins: 0,
            hearts: 1,
            max_height: 0,
        }
    }
}

/// Load/save of player profiles keyed by account id
pub trait ProfileStore {
    /// `StoreError::NotFound` when the account has never been saved
    fn load_profile(&self, id: &str) -> Result<PlayerProfile, StoreError>;
    fn save_profile(&mut self, id: &str, profile: &PlayerProfile) -> Result<(), StoreError>;
}

/// Ranked max heights across all accounts
pub trait LeaderboardSource {
    fn top_scores(&self, n: usize) -> Result<Vec<LeaderboardEntry>, StoreError>;
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    profiles: BTreeMap<String, PlayerProfile>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryStore {
    fn load_profile(&self, id: &str) -> Result<PlayerProfile, StoreError> {
        self.profiles
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn save_profile(&mut self, id: &str, profile: &PlayerProfile) -> Result<(), StoreError> {
        self.profiles.insert(id.to_string(), profile.clone());
        Ok(())
    }
}

impl LeaderboardSource for MemoryStore {
    fn top_scores(&self, n: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
        Ok(Leaderboard::from_profiles(self.profiles.iter(), n).entries)
    }
}

/// LocalStorage-backed store (wasm32 only)
#[cfg(target_arch = "wasm32")]
pub struct LocalStorageStore {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    const STORAGE_KEY: &'static str = "chaos_jump_profiles";

    pub fn open() -> Result<Self, StoreError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| StoreError::Backend("localStorage unavailable".into()))?;
        Ok(Self { storage })
    }

    fn read_all(&self) -> Result<BTreeMap<String, PlayerProfile>, StoreError> {
        match self.storage.get_item(Self::STORAGE_KEY) {
            Ok(Some(json)) => Ok(serde_json::from_str(&json)?),
            Ok(None) => Ok(BTreeMap::new()),
            Err(_) => Err(StoreError::Backend("localStorage read failed".into())),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl ProfileStore for LocalStorageStore {
    fn load_profile(&self, id: &str) -> Result<PlayerProfile, StoreError> {
        self.read_all()?
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn save_profile(&mut self, id: &str, profile: &PlayerProfile) -> Result<(), StoreError> {
        let mut all = self.read_all()?;
        all.insert(id.to_string(), profile.clone());
        let json = serde_json::to_string(&all)?;
        self.storage
            .set_item(Self::STORAGE_KEY, &json)
            .map_err(|_| StoreError::Backend("localStorage write failed".into()))?;
        log::info!("Profile saved for {}", id);
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
impl LeaderboardSource for LocalStorageStore {
    fn top_scores(&self, n: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let all = self.read_all()?;
        Ok(Leaderboard::from_profiles(all.iter(), n).entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_profile_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.load_profile("ghost@example.com"),
            Err(StoreError::NotFound(id)) if id == "ghost@example.com"
        ));
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let profile = PlayerProfile {
            total_coins: 42,
            hearts: 3,
            max_height: 120,
        };
        store.save_profile("ana@example.com", &profile).unwrap();
        assert_eq!(store.load_profile("ana@example.com").unwrap(), profile);
        assert!(matches!(
            store.load_profile("bo@example.com"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_profile_json_shape() {
        let json = serde_json::to_string(&PlayerProfile::default()).unwrap();
        assert_eq!(json, r#"{"totalCoins":0,"hearts":1,"maxHeight":0}"#);

        // Missing fields fall back to defaults
        let partial: PlayerProfile = serde_json::from_str(r#"{"totalCoins":7}"#).unwrap();
        assert_eq!(partial.total_coins, 7);
        assert_eq!(partial.hearts, 1);
    }

    #[test]
    fn test_memory_leaderboard() {
        let mut store = MemoryStore::new();
        for (id, h) in [("a@x.io", 10), ("b@x.io", 30), ("c@x.io", 20)] {
            let profile = PlayerProfile {
                max_height: h,
                ..Default::default()
            };
            store.save_profile(id, &profile).unwrap();
        }
        let top = store.top_scores(2).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].display_name, "b");
        assert_eq!(top[1].max_height, 20);
    }
}
