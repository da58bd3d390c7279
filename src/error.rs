//! Error types for chaos-jump.
//!
//! Nothing here is fatal: invalid transitions are rejected without touching
//! state, and collaborator failures leave the local session playable.

use thiserror::Error;

/// Why a revive was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviveBlock {
    /// No round has ended (nothing to revive)
    NoDeath,
    /// The per-round revive allowance is spent
    RevivesUsedUp,
    /// The profile has no hearts left
    NoHearts,
}

impl std::fmt::Display for ReviveBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            ReviveBlock::NoDeath => "No round to revive.",
            ReviveBlock::RevivesUsedUp => "You've used your only revive for this round.",
            ReviveBlock::NoHearts => "Not enough hearts to revive. Visit the shop!",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("Please login to start a game.")]
    NotAuthenticated,

    #[error("{0}")]
    ReviveUnavailable(ReviveBlock),

    #[error("Cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },

    #[error("Not enough coins! You need {needed} more.")]
    InsufficientCoins { needed: u32 },

    #[error("Profile store error: {0}")]
    Store(#[from] StoreError),
}

/// Failures reported by the profile store / leaderboard collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No profile found for {0}")]
    NotFound(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid range for {field}: {min} > {max}")]
    InvalidRange {
        field: &'static str,
        min: f32,
        max: f32,
    },

    #[error("Invalid parameter {field}: {reason}")]
    InvalidParameter {
        field: &'static str,
        reason: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, GameError>;
