//! Boost Engine - swipe voting game for the agency platform
//!
//! Visitors swipe through a daily deck of profiles, spend coins to amplify
//! likes, draw a daily coin reward, and follow time-windowed leaderboards.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{BoostEngine, GameRules};
pub use error::GameError;
pub use models::{Direction, LeaderboardSnapshot, Profile, ScoreWindow, VoteRequest};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        assert_eq!(ScoreWindow::default(), ScoreWindow::Today);
        assert_eq!(Direction::Like.as_str(), "like");
    }
}
