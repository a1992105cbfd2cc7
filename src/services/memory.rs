use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::core::boost::apply_debit;
use crate::core::clock::DayWindow;
use crate::core::leaderboard::{rank_tallies, tally_votes};
use crate::core::session::Round;
use crate::error::GameError;
use crate::models::{LeaderboardEntry, LedgerReason, LedgerTransaction, Profile, ScoreWindow, Vote};
use crate::services::catalog::ProfileCatalog;
use crate::services::store::{GameStore, VoteCommit, VoteReceipt};

#[derive(Debug, Default)]
struct MemoryState {
    rounds: HashMap<String, Round>,
    votes: Vec<Vote>,
    vote_keys: HashSet<(String, String, Uuid)>,
    balances: HashMap<String, i64>,
    ledger: Vec<LedgerTransaction>,
    draws: HashSet<(String, DateTime<Utc>)>,
}

impl MemoryState {
    fn post(
        &mut self,
        identity: &str,
        amount: i64,
        reason: LedgerReason,
        now: DateTime<Utc>,
    ) -> Result<i64, GameError> {
        let balance = self.balances.entry(identity.to_string()).or_insert(0);
        let balance_after = balance
            .checked_add(amount)
            .ok_or_else(|| GameError::InvalidRequest("balance out of range".to_string()))?;
        *balance = balance_after;

        self.ledger.push(LedgerTransaction {
            id: Uuid::new_v4(),
            identity: identity.to_string(),
            amount,
            reason,
            balance_after,
            created_at: now,
        });
        Ok(balance_after)
    }
}

/// Game store held in process memory
///
/// A single lock guards all state, so every operation is trivially atomic
/// and per-identity operations serialize. Used by tests, benches and local
/// runs without PostgreSQL.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the full vote log
    pub async fn votes(&self) -> Vec<Vote> {
        self.state.lock().await.votes.clone()
    }
}

impl GameStore for MemoryStore {
    async fn active_round(&self, identity: &str, now: DateTime<Utc>) -> Result<Option<Round>, GameError> {
        let state = self.state.lock().await;
        Ok(state.rounds.get(identity).filter(|r| r.is_active(now)).cloned())
    }

    async fn start_round(&self, round: Round, now: DateTime<Utc>) -> Result<Round, GameError> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.rounds.get(&round.identity).filter(|r| r.is_active(now)) {
            return Ok(existing.clone());
        }
        state.rounds.insert(round.identity.clone(), round.clone());
        Ok(round)
    }

    async fn voted_profiles_since(&self, identity: &str, since: DateTime<Utc>) -> Result<Vec<String>, GameError> {
        let state = self.state.lock().await;
        let mut seen: Vec<String> = state
            .votes
            .iter()
            .filter(|v| v.identity == identity && v.created_at >= since)
            .map(|v| v.profile_id.clone())
            .collect();
        seen.sort();
        seen.dedup();
        Ok(seen)
    }

    async fn commit_vote(&self, commit: VoteCommit, now: DateTime<Utc>) -> Result<VoteReceipt, GameError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let vote = commit.vote;

        let round = state.rounds.get_mut(&vote.identity).ok_or(GameError::InvalidRound)?;
        round.check_vote(vote.round_id, &vote.profile_id, now)?;

        let key = (vote.identity.clone(), vote.profile_id.clone(), vote.round_id);
        if state.vote_keys.contains(&key) {
            return Err(GameError::DuplicateVote);
        }

        let balance = state.balances.get(&vote.identity).copied().unwrap_or(0);
        if commit.cost > 0 {
            apply_debit(balance, commit.cost)?;
        }

        // Every check passed; apply all writes under the same lock
        let new_balance = if commit.cost > 0 {
            Some(state.post(&vote.identity, -commit.cost, LedgerReason::BoostDebit, now)?)
        } else {
            None
        };

        let round = state.rounds.get_mut(&vote.identity).ok_or(GameError::InvalidRound)?;
        round.record_swipe(&vote.profile_id);
        let models_swiped = round.consumed();
        let remaining = round.remaining_count() as u32;
        state.vote_keys.insert(key);
        state.votes.push(vote.clone());

        Ok(VoteReceipt {
            vote,
            new_balance,
            models_swiped,
            remaining,
        })
    }

    async fn commit_draw(
        &self,
        identity: &str,
        day: &DayWindow,
        payout: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, GameError> {
        let mut state = self.state.lock().await;
        let key = (identity.to_string(), day.day_start);
        if state.draws.contains(&key) {
            return Err(GameError::AlreadyDrawnToday {
                next_reset_at: day.next_reset,
            });
        }
        let balance = state.post(identity, payout, LedgerReason::RewardCredit, now)?;
        state.draws.insert(key);
        Ok(balance)
    }

    async fn credit(
        &self,
        identity: &str,
        amount: i64,
        reason: LedgerReason,
        now: DateTime<Utc>,
    ) -> Result<i64, GameError> {
        if amount <= 0 {
            return Err(GameError::InvalidRequest("credit amount must be positive".to_string()));
        }
        let mut state = self.state.lock().await;
        state.post(identity, amount, reason, now)
    }

    async fn balance(&self, identity: &str) -> Result<i64, GameError> {
        let state = self.state.lock().await;
        Ok(state.balances.get(identity).copied().unwrap_or(0))
    }

    async fn transactions(&self, identity: &str, limit: usize) -> Result<Vec<LedgerTransaction>, GameError> {
        let state = self.state.lock().await;
        Ok(state
            .ledger
            .iter()
            .rev()
            .filter(|t| t.identity == identity)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn leaderboard(
        &self,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, GameError> {
        let state = self.state.lock().await;
        Ok(rank_tallies(tally_votes(&state.votes, since), limit))
    }

    async fn health_check(&self) -> Result<bool, GameError> {
        Ok(true)
    }
}

/// Profile catalog held in process memory
///
/// Featured profiles are dealt first; otherwise catalog order is kept.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    profiles: Mutex<Vec<Profile>>,
}

impl MemoryCatalog {
    pub fn new(profiles: Vec<Profile>) -> Self {
        Self {
            profiles: Mutex::new(profiles),
        }
    }

    pub async fn profile(&self, profile_id: &str) -> Option<Profile> {
        let profiles = self.profiles.lock().await;
        profiles.iter().find(|p| p.profile_id == profile_id).cloned()
    }
}

impl ProfileCatalog for MemoryCatalog {
    async fn list_unseen_profiles(
        &self,
        _identity: &str,
        exclude: &[String],
        limit: usize,
    ) -> Result<Vec<Profile>, GameError> {
        let profiles = self.profiles.lock().await;
        let mut unseen: Vec<Profile> = profiles
            .iter()
            .filter(|p| !exclude.contains(&p.profile_id))
            .cloned()
            .collect();
        unseen.sort_by_key(|p| !p.featured());
        unseen.truncate(limit);
        Ok(unseen)
    }

    async fn increment_score(&self, profile_id: &str, window: ScoreWindow, amount: i64) -> Result<(), GameError> {
        let mut profiles = self.profiles.lock().await;
        let profile = profiles
            .iter_mut()
            .find(|p| p.profile_id == profile_id)
            .ok_or_else(|| GameError::Catalog(format!("profile {} not found", profile_id)))?;

        match window {
            ScoreWindow::Today => profile.today_points += amount,
            ScoreWindow::Week => profile.week_points += amount,
            ScoreWindow::AllTime => profile.all_time_points += amount,
        }
        Ok(())
    }

    async fn set_today_rank(&self, profile_id: &str, rank: Option<u32>) -> Result<(), GameError> {
        let mut profiles = self.profiles.lock().await;
        if let Some(profile) = profiles.iter_mut().find(|p| p.profile_id == profile_id) {
            profile.today_rank = rank;
        }
        Ok(())
    }
}
