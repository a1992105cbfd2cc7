use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Voteable profile as served by the profile catalog
///
/// The engine only reads catalog fields and mirrors the aggregate score
/// fields back through [`crate::services::ProfileCatalog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "profileId", alias = "$id")]
    pub profile_id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "isVerified", default)]
    pub is_verified: Option<bool>,
    #[serde(rename = "isFeatured", default)]
    pub is_featured: Option<bool>,
    #[serde(rename = "locationTags", default)]
    pub location_tags: Vec<String>,
    #[serde(rename = "categoryTags", default)]
    pub category_tags: Vec<String>,
    #[serde(rename = "imageFileIds", default)]
    pub image_file_ids: Vec<String>,
    #[serde(rename = "todayPoints", default)]
    pub today_points: i64,
    #[serde(rename = "weekPoints", default)]
    pub week_points: i64,
    #[serde(rename = "allTimePoints", default)]
    pub all_time_points: i64,
    #[serde(rename = "todayRank", default)]
    pub today_rank: Option<u32>,
}

impl Profile {
    /// Helper to get is_featured as a bool, defaulting to false
    pub fn featured(&self) -> bool {
        self.is_featured.unwrap_or(false)
    }
}

/// Swipe direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Like,
    Pass,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Like => "like",
            Direction::Pass => "pass",
        }
    }
}

/// Immutable record of one accepted swipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub id: Uuid,
    pub identity: String,
    pub profile_id: String,
    pub round_id: Uuid,
    pub direction: Direction,
    pub tier: String,
    pub multiplier: u32,
    pub points: i64,
    pub revealed: bool,
    pub priority: bool,
    pub created_at: DateTime<Utc>,
}

impl Vote {
    pub fn is_boosted(&self) -> bool {
        self.tier != crate::core::boost::NO_BOOST
    }
}

/// Why a balance changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LedgerReason {
    BoostDebit,
    RewardCredit,
    Grant,
}

impl LedgerReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerReason::BoostDebit => "boost-debit",
            LedgerReason::RewardCredit => "reward-credit",
            LedgerReason::Grant => "grant",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "boost-debit" => Some(LedgerReason::BoostDebit),
            "reward-credit" => Some(LedgerReason::RewardCredit),
            "grant" => Some(LedgerReason::Grant),
            _ => None,
        }
    }
}

/// Signed balance movement; the ledger is append-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTransaction {
    pub id: Uuid,
    pub identity: String,
    pub amount: i64,
    pub reason: LedgerReason,
    pub balance_after: i64,
    pub created_at: DateTime<Utc>,
}

/// Leaderboard time window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScoreWindow {
    #[default]
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "week")]
    Week,
    #[serde(rename = "all-time", alias = "alltime", alias = "all_time")]
    AllTime,
}

impl ScoreWindow {
    pub const ALL: [ScoreWindow; 3] = [ScoreWindow::Today, ScoreWindow::Week, ScoreWindow::AllTime];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreWindow::Today => "today",
            ScoreWindow::Week => "week",
            ScoreWindow::AllTime => "all-time",
        }
    }
}

/// Ranked leaderboard row, derived from the vote log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub profile_id: String,
    pub points: i64,
    pub total_boosts: u32,
    /// When the profile reached its current total
    pub reached_at: DateTime<Utc>,
}

/// Cached leaderboard for one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardSnapshot {
    pub window: ScoreWindow,
    pub window_start: Option<DateTime<Utc>>,
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<LeaderboardEntry>,
}
