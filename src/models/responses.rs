use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::boost::TierSpec;
use crate::models::domain::{LedgerTransaction, Profile};

/// Response for the deck endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckResponse {
    pub can_swipe: bool,
    pub profiles: Vec<Profile>,
    pub round_id: Uuid,
    pub models_swiped: u32,
    pub total_models: u32,
    pub next_reset_at: DateTime<Utc>,
}

/// Response for an accepted vote
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub points_awarded: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_balance: Option<i64>,
    pub multiplier: u32,
    pub revealed: bool,
    pub priority: bool,
    pub models_swiped: u32,
    pub can_swipe: bool,
}

/// Response for the daily reward draw
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawResponse {
    pub payout: i64,
    pub new_balance: i64,
    pub next_draw_at: DateTime<Utc>,
}

/// Wallet view: balance plus most recent ledger entries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletResponse {
    pub identity: String,
    pub balance: i64,
    pub transactions: Vec<LedgerTransaction>,
}

/// One row of the tier table as shown to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierView {
    pub name: String,
    #[serde(flatten)]
    pub spec: TierSpec,
}

/// Response for an operator grant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantResponse {
    pub identity: String,
    pub new_balance: i64,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
