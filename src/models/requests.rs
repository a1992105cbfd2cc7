use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::domain::{Direction, ScoreWindow};

/// Request to record a swipe
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VoteRequest {
    #[validate(length(min = 1, max = 128))]
    #[serde(alias = "profile_id", rename = "profileId")]
    pub profile_id: String,
    #[serde(alias = "round_id", rename = "roundId")]
    pub round_id: Uuid,
    pub direction: Direction,
    #[validate(length(min = 1, max = 32))]
    #[serde(alias = "boost_tier", rename = "boostTier", default)]
    pub boost_tier: Option<String>,
}

/// Leaderboard query string
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LeaderboardQuery {
    #[serde(default)]
    pub window: ScoreWindow,
    #[validate(range(min = 1, max = 500))]
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

/// Operator credit for coins settled outside the engine
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GrantRequest {
    #[validate(length(min = 1))]
    pub identity: String,
    #[validate(range(min = 1, max = 1_000_000_000))]
    pub amount: i64,
}
