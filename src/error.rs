use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Every outcome the engine can refuse or fail with
///
/// The first six variants are expected, user-facing rejections. The rest are
/// infrastructure failures and never leak their detail to clients.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Profile already voted on in this round")]
    DuplicateVote,

    #[error("Round is not the active round for this visitor")]
    InvalidRound,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not enough coins: balance {balance}, cost {cost}")]
    InsufficientBalance { balance: i64, cost: i64 },

    #[error("Daily reward already drawn, next draw at {next_reset_at}")]
    AlreadyDrawnToday { next_reset_at: DateTime<Utc> },

    #[error("No profiles left in this round, next round at {next_reset_at}")]
    RoundExhausted { next_reset_at: DateTime<Utc> },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Catalog error: {0}")]
    Catalog(String),
}

impl GameError {
    /// Stable machine-readable code for clients
    pub fn code(&self) -> &'static str {
        match self {
            GameError::DuplicateVote => "duplicate_vote",
            GameError::InvalidRound => "invalid_round",
            GameError::InvalidRequest(_) => "invalid_request",
            GameError::InsufficientBalance { .. } => "insufficient_balance",
            GameError::AlreadyDrawnToday { .. } => "already_drawn_today",
            GameError::RoundExhausted { .. } => "round_exhausted",
            GameError::Unauthorized => "unauthorized",
            GameError::Storage(_) => "storage_error",
            GameError::Catalog(_) => "catalog_error",
        }
    }

    /// True for expected game outcomes, false for infrastructure failures
    pub fn is_rejection(&self) -> bool {
        !matches!(self, GameError::Storage(_) | GameError::Catalog(_))
    }
}

/// SQLSTATE for an arithmetic result outside the column type
const NUMERIC_OUT_OF_RANGE: &str = "22003";

impl From<sqlx::Error> for GameError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) => {
                GameError::InvalidRequest("balance out of range".to_string())
            }
            _ => GameError::Storage(err.to_string()),
        }
    }
}

impl ResponseError for GameError {
    fn status_code(&self) -> StatusCode {
        match self {
            GameError::DuplicateVote | GameError::InvalidRound => StatusCode::CONFLICT,
            GameError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GameError::InsufficientBalance { .. } => StatusCode::PAYMENT_REQUIRED,
            GameError::AlreadyDrawnToday { .. } | GameError::RoundExhausted { .. } => {
                StatusCode::TOO_MANY_REQUESTS
            }
            GameError::Unauthorized => StatusCode::UNAUTHORIZED,
            GameError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GameError::Catalog(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = match self {
            GameError::Storage(_) => "Internal server error".to_string(),
            GameError::Catalog(_) => "Profile catalog unavailable".to_string(),
            _ => self.to_string(),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: self.code().to_string(),
            message,
            status_code: status.as_u16(),
        })
    }
}
