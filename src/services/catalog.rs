use std::future::Future;

use crate::error::GameError;
use crate::models::{Profile, ScoreWindow};

/// External owner of profiles
///
/// The engine reads decks from it and mirrors aggregate scores back. Score
/// writes must be server-side atomic increments, never read-modify-write.
pub trait ProfileCatalog: Send + Sync {
    /// Up to `limit` active profiles, skipping `exclude`
    fn list_unseen_profiles(
        &self,
        identity: &str,
        exclude: &[String],
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Profile>, GameError>> + Send;

    fn increment_score(
        &self,
        profile_id: &str,
        window: ScoreWindow,
        amount: i64,
    ) -> impl Future<Output = Result<(), GameError>> + Send;

    /// Cached position on today's board; `None` clears it
    fn set_today_rank(
        &self,
        profile_id: &str,
        rank: Option<u32>,
    ) -> impl Future<Output = Result<(), GameError>> + Send;
}
