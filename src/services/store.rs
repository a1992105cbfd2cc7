use chrono::{DateTime, Utc};
use std::future::Future;

use crate::core::clock::DayWindow;
use crate::core::session::Round;
use crate::error::GameError;
use crate::models::{LeaderboardEntry, LedgerReason, LedgerTransaction, Vote};

/// A vote ready to be committed together with its currency debit
#[derive(Debug, Clone)]
pub struct VoteCommit {
    pub vote: Vote,
    pub cost: i64,
}

/// What a committed vote changed
#[derive(Debug, Clone)]
pub struct VoteReceipt {
    pub vote: Vote,
    /// Present when the vote cost coins
    pub new_balance: Option<i64>,
    pub models_swiped: u32,
    pub remaining: u32,
}

/// Shared game state: rounds, the vote log, balances and the ledger
///
/// Every method that writes more than one record is a single atomic unit.
/// `commit_vote` in particular either records the vote, the swipe and the
/// debit together, or nothing at all.
pub trait GameStore: Send + Sync {
    /// The identity's round if it has not passed its reset time
    fn active_round(
        &self,
        identity: &str,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<Round>, GameError>> + Send;

    /// Store `round` unless the identity already has an active one, and
    /// return whichever round is active afterwards
    fn start_round(&self, round: Round, now: DateTime<Utc>) -> impl Future<Output = Result<Round, GameError>> + Send;

    /// Profiles the identity voted on at or after `since`
    fn voted_profiles_since(
        &self,
        identity: &str,
        since: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<String>, GameError>> + Send;

    fn commit_vote(
        &self,
        commit: VoteCommit,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<VoteReceipt, GameError>> + Send;

    /// Credit a reward payout and mark the identity drawn for `day`.
    /// Returns the new balance.
    fn commit_draw(
        &self,
        identity: &str,
        day: &DayWindow,
        payout: i64,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<i64, GameError>> + Send;

    /// Unconditional credit. Returns the new balance.
    fn credit(
        &self,
        identity: &str,
        amount: i64,
        reason: LedgerReason,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<i64, GameError>> + Send;

    fn balance(&self, identity: &str) -> impl Future<Output = Result<i64, GameError>> + Send;

    /// Most recent ledger entries first
    fn transactions(
        &self,
        identity: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<LedgerTransaction>, GameError>> + Send;

    /// Ranked entries over likes at or after `since` (all time when `None`)
    fn leaderboard(
        &self,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<LeaderboardEntry>, GameError>> + Send;

    fn health_check(&self) -> impl Future<Output = Result<bool, GameError>> + Send;
}
