// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Direction, LeaderboardEntry, LeaderboardSnapshot, LedgerReason, LedgerTransaction, Profile, ScoreWindow, Vote,
};
pub use requests::{GrantRequest, LeaderboardQuery, VoteRequest};
pub use responses::{
    DeckResponse, DrawResponse, ErrorResponse, GrantResponse, HealthResponse, TierView, VoteResponse, WalletResponse,
};
