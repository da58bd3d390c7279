//! Max-height leaderboard
//!
//! Ranked view over every stored profile, best height first.

use serde::{Deserialize, Serialize};

use crate::persistence::{LeaderboardSource, PlayerProfile};

/// Number of rows shown by default
pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;

/// A single leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub display_name: String,
    /// Meters
    pub max_height: u32,
}

/// Public name for an account id: everything before the `@`
pub fn display_name_for(id: &str) -> &str {
    id.split('@').next().unwrap_or(id)
}

/// Top heights, sorted descending
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rank `(id, profile)` pairs and keep the best `n`
    pub fn from_profiles<'a, I>(profiles: I, n: usize) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a PlayerProfile)>,
    {
        let mut entries: Vec<LeaderboardEntry> = profiles
            .into_iter()
            .map(|(id, profile)| LeaderboardEntry {
                display_name: display_name_for(id).to_string(),
                max_height: profile.max_height,
            })
            .collect();
        // Stable: ties keep store order
        entries.sort_by(|a, b| b.max_height.cmp(&a.max_height));
        entries.truncate(n);
        Self { entries }
    }

    /// Query a source; a failing source shows as an empty board
    pub fn fetch(source: &dyn LeaderboardSource, n: usize) -> Self {
        match source.top_scores(n) {
            Ok(mut entries) => {
                entries.truncate(n);
                log::info!("Loaded {} leaderboard entries", entries.len());
                Self { entries }
            }
            Err(err) => {
                log::warn!("Leaderboard unavailable: {}", err);
                Self::new()
            }
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use std::collections::BTreeMap;

    struct Offline;

    impl LeaderboardSource for Offline {
        fn top_scores(&self, _n: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
            Err(StoreError::Backend("offline".into()))
        }
    }

    fn board(heights: &[u32]) -> Leaderboard {
        let profiles: BTreeMap<String, PlayerProfile> = heights
            .iter()
            .enumerate()
            .map(|(i, &h)| {
                (
                    format!("player{i}@example.com"),
                    PlayerProfile {
                        max_height: h,
                        ..Default::default()
                    },
                )
            })
            .collect();
        Leaderboard::from_profiles(profiles.iter(), DEFAULT_LEADERBOARD_SIZE)
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name_for("jumper@example.com"), "jumper");
        assert_eq!(display_name_for("no-at-sign"), "no-at-sign");
        assert_eq!(display_name_for("@weird"), "");
    }

    #[test]
    fn test_sorted_and_truncated() {
        let b = board(&[5, 50, 12, 7, 99, 1, 3, 8, 60, 2, 40, 11]);
        assert_eq!(b.entries.len(), DEFAULT_LEADERBOARD_SIZE);
        assert_eq!(b.entries[0].max_height, 99);
        assert_eq!(b.entries[0].display_name, "player4");
        assert!(b.entries.windows(2).all(|w| w[0].max_height >= w[1].max_height));
    }

    #[test]
    fn test_empty_is_valid() {
        assert!(board(&[]).entries.is_empty());
    }

    #[test]
    fn test_ties_keep_store_order() {
        let b = board(&[30, 30, 10]);
        let names: Vec<_> = b.entries.iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, ["player0", "player1", "player2"]);
    }

    #[test]
    fn test_failing_source_gives_empty_board() {
        assert!(Leaderboard::fetch(&Offline, 10).entries.is_empty());
    }
}
