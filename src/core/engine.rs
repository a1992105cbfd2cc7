use chrono::{DateTime, FixedOffset, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::boost::{points_for, TierTable};
use crate::core::clock::{Clock, DayWindow, SystemClock};
use crate::core::leaderboard::window_start;
use crate::core::reward::RewardTable;
use crate::core::session::{build_deck, Round};
use crate::error::GameError;
use crate::models::{
    DeckResponse, Direction, DrawResponse, GrantResponse, LeaderboardEntry, LeaderboardSnapshot, LedgerReason,
    ScoreWindow, TierView, Vote, VoteRequest, VoteResponse, WalletResponse,
};
use crate::services::cache::{CacheError, CacheKey, CacheManager};
use crate::services::catalog::ProfileCatalog;
use crate::services::store::{GameStore, VoteCommit};

/// Recent ledger entries shown in a wallet
const WALLET_HISTORY: usize = 20;

/// Validated game configuration
#[derive(Debug, Clone)]
pub struct GameRules {
    pub tiers: TierTable,
    pub rewards: RewardTable,
    pub deck_size: usize,
    pub base_point: i64,
    /// Day boundaries are midnight at this offset
    pub reset_offset: FixedOffset,
    pub seen_window_days: u32,
    pub leaderboard_max_limit: usize,
}

/// The Boost game: decks, votes, the coin ledger, leaderboards and the daily draw
///
/// Stateless over its store; any number of engines may share one store.
/// Catalog score fields are mirrored best-effort after a vote commits, the
/// vote log stays the source of truth for leaderboards.
pub struct BoostEngine<S, C> {
    store: Arc<S>,
    catalog: Arc<C>,
    rules: GameRules,
    cache: Arc<CacheManager>,
    clock: Arc<dyn Clock>,
    rng: Mutex<StdRng>,
    /// Profiles this engine last wrote a today-rank to
    ranked: Mutex<HashSet<String>>,
}

impl<S, C> BoostEngine<S, C>
where
    S: GameStore,
    C: ProfileCatalog,
{
    pub fn new(store: Arc<S>, catalog: Arc<C>, rules: GameRules, cache: Arc<CacheManager>) -> Self {
        Self {
            store,
            catalog,
            rules,
            cache,
            clock: Arc::new(SystemClock),
            rng: Mutex::new(StdRng::from_entropy()),
            ranked: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Seed the reward RNG for reproducible draws
    pub fn with_rng(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    fn day(&self, now: DateTime<Utc>) -> DayWindow {
        DayWindow::containing(now, self.rules.reset_offset)
    }

    /// Today's deck for an identity, starting a round when it has none
    pub async fn deck(&self, identity: &str) -> Result<DeckResponse, GameError> {
        let now = self.clock.now();

        if let Some(round) = self.store.active_round(identity, now).await? {
            return Ok(round.to_deck(now));
        }

        let day = self.day(now);
        let seen = self
            .store
            .voted_profiles_since(identity, day.seen_since(self.rules.seen_window_days))
            .await?;

        let candidates = self
            .catalog
            .list_unseen_profiles(identity, &seen, self.rules.deck_size)
            .await?;
        let deck = build_deck(candidates, &seen, self.rules.deck_size);

        let fresh = Round::new(identity, deck, now, day.next_reset);
        let fresh_id = fresh.round_id;
        let round = self.store.start_round(fresh, now).await?;

        if round.round_id == fresh_id {
            info!(
                "Started round {} for {} with {} profiles",
                round.round_id,
                identity,
                round.deck.len()
            );
        }

        Ok(round.to_deck(now))
    }

    /// Record one swipe, debiting the boost tier's cost in the same unit
    pub async fn vote(&self, identity: &str, request: &VoteRequest) -> Result<VoteResponse, GameError> {
        let now = self.clock.now();
        let (tier_name, tier) = self
            .rules
            .tiers
            .resolve(request.boost_tier.as_deref(), request.direction)?;

        let multiplier = match request.direction {
            Direction::Like => tier.multiplier,
            Direction::Pass => 1,
        };

        let vote = Vote {
            id: Uuid::new_v4(),
            identity: identity.to_string(),
            profile_id: request.profile_id.clone(),
            round_id: request.round_id,
            direction: request.direction,
            tier: tier_name.to_string(),
            multiplier,
            points: points_for(request.direction, tier, self.rules.base_point),
            revealed: tier.reveal,
            priority: tier.priority,
            created_at: now,
        };

        let receipt = self
            .store
            .commit_vote(VoteCommit { vote, cost: tier.cost }, now)
            .await?;
        let vote = &receipt.vote;

        info!(
            "Vote {} by {} on {}: {} tier={} points={}",
            vote.id,
            identity,
            vote.profile_id,
            vote.direction.as_str(),
            vote.tier,
            vote.points
        );

        if vote.points > 0 {
            self.mirror_points(&vote.profile_id, vote.points).await;
        }

        Ok(VoteResponse {
            points_awarded: vote.points,
            new_balance: receipt.new_balance,
            multiplier: vote.multiplier,
            revealed: vote.revealed,
            priority: vote.priority,
            models_swiped: receipt.models_swiped,
            can_swipe: receipt.remaining > 0,
        })
    }

    async fn mirror_points(&self, profile_id: &str, points: i64) {
        for window in ScoreWindow::ALL {
            if let Err(e) = self.catalog.increment_score(profile_id, window, points).await {
                warn!(
                    "Failed to mirror {} {} points to profile {}: {}",
                    points,
                    window.as_str(),
                    profile_id,
                    e
                );
            }
        }
    }

    /// Ranked snapshot for a window, served from cache while fresh
    pub async fn leaderboard(&self, window: ScoreWindow, limit: usize) -> Result<LeaderboardSnapshot, GameError> {
        let limit = limit.clamp(1, self.rules.leaderboard_max_limit);
        let now = self.clock.now();
        let since = window_start(window, &self.day(now));
        let key = CacheKey::leaderboard(window, since);

        match self.cache.get::<LeaderboardSnapshot>(&key).await {
            Ok(mut snapshot) => {
                debug!("Leaderboard cache hit: {}", key);
                snapshot.entries.truncate(limit);
                return Ok(snapshot);
            }
            Err(CacheError::CacheMiss(_)) => {}
            Err(e) => warn!("Leaderboard cache read failed for {}: {}", key, e),
        }

        let entries = self
            .store
            .leaderboard(since, self.rules.leaderboard_max_limit)
            .await?;

        let mut snapshot = LeaderboardSnapshot {
            window,
            window_start: since,
            generated_at: now,
            entries,
        };

        if let Err(e) = self.cache.set(&key, &snapshot).await {
            warn!("Leaderboard cache write failed for {}: {}", key, e);
        }

        if window == ScoreWindow::Today {
            self.mirror_ranks(&snapshot.entries).await;
        }

        snapshot.entries.truncate(limit);
        Ok(snapshot)
    }

    /// Write today's ranks and clear them on profiles that fell off the board
    async fn mirror_ranks(&self, entries: &[LeaderboardEntry]) {
        let mut ranked = self.ranked.lock().await;
        let current: HashSet<String> = entries.iter().map(|e| e.profile_id.clone()).collect();

        for profile_id in ranked.difference(&current) {
            if let Err(e) = self.catalog.set_today_rank(profile_id, None).await {
                warn!("Failed to clear today rank for {}: {}", profile_id, e);
            }
        }
        for entry in entries {
            if let Err(e) = self.catalog.set_today_rank(&entry.profile_id, Some(entry.rank)).await {
                warn!("Failed to cache today rank for {}: {}", entry.profile_id, e);
            }
        }

        *ranked = current;
    }

    /// Once-per-day weighted coin reward
    pub async fn daily_draw(&self, identity: &str) -> Result<DrawResponse, GameError> {
        let now = self.clock.now();
        let day = self.day(now);

        let index = {
            let mut rng = self.rng.lock().await;
            self.rules.rewards.draw(&mut *rng)
        };
        let payout = self.rules.rewards.entry(index).map(|e| e.payout).unwrap_or(0);

        let new_balance = self.store.commit_draw(identity, &day, payout, now).await?;
        info!("Daily draw for {}: payout {} (balance {})", identity, payout, new_balance);

        Ok(DrawResponse {
            payout,
            new_balance,
            next_draw_at: day.next_reset,
        })
    }

    pub async fn wallet(&self, identity: &str) -> Result<WalletResponse, GameError> {
        let balance = self.store.balance(identity).await?;
        let transactions = self.store.transactions(identity, WALLET_HISTORY).await?;
        Ok(WalletResponse {
            identity: identity.to_string(),
            balance,
            transactions,
        })
    }

    /// Operator credit for coins bought outside the engine
    pub async fn grant(&self, identity: &str, amount: i64) -> Result<GrantResponse, GameError> {
        if identity.trim().is_empty() {
            return Err(GameError::InvalidRequest("identity is required".to_string()));
        }
        if amount <= 0 {
            return Err(GameError::InvalidRequest("grant amount must be positive".to_string()));
        }

        let now = self.clock.now();
        let new_balance = self.store.credit(identity, amount, LedgerReason::Grant, now).await?;
        info!("Granted {} coins to {} (balance {})", amount, identity, new_balance);

        Ok(GrantResponse {
            identity: identity.to_string(),
            new_balance,
        })
    }

    pub fn tiers(&self) -> Vec<TierView> {
        self.rules
            .tiers
            .iter()
            .map(|(name, spec)| TierView {
                name: name.clone(),
                spec: spec.clone(),
            })
            .collect()
    }

    pub async fn health(&self) -> Result<bool, GameError> {
        self.store.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::boost::default_tiers;
    use crate::core::clock::ManualClock;
    use crate::core::reward::{default_rewards, RewardEntry};
    use crate::models::Profile;
    use crate::services::memory::{MemoryCatalog, MemoryStore};

    fn profile(id: &str) -> Profile {
        Profile {
            profile_id: id.to_string(),
            display_name: id.to_uppercase(),
            is_verified: Some(true),
            is_featured: None,
            location_tags: vec![],
            category_tags: vec![],
            image_file_ids: vec![],
            today_points: 0,
            week_points: 0,
            all_time_points: 0,
            today_rank: None,
        }
    }

    fn rules() -> GameRules {
        GameRules {
            tiers: TierTable::new(default_tiers()).unwrap(),
            rewards: RewardTable::new(default_rewards()).unwrap(),
            deck_size: 3,
            base_point: 1,
            reset_offset: FixedOffset::east_opt(0).unwrap(),
            seen_window_days: 1,
            leaderboard_max_limit: 50,
        }
    }

    fn engine(profiles: &[&str]) -> (BoostEngine<MemoryStore, MemoryCatalog>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            DateTime::parse_from_rfc3339("2026-10-16T10:00:00Z").unwrap().with_timezone(&Utc),
        ));
        let catalog = MemoryCatalog::new(profiles.iter().map(|id| profile(id)).collect());
        let engine = BoostEngine::new(
            Arc::new(MemoryStore::new()),
            Arc::new(catalog),
            rules(),
            Arc::new(CacheManager::local(100, 30)),
        )
        .with_clock(clock.clone())
        .with_rng(7);
        (engine, clock)
    }

    fn like(round_id: Uuid, profile_id: &str, tier: Option<&str>) -> VoteRequest {
        VoteRequest {
            profile_id: profile_id.to_string(),
            round_id,
            direction: Direction::Like,
            boost_tier: tier.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_deck_is_stable_within_round() {
        let (engine, _) = engine(&["a", "b", "c", "d"]);
        let first = engine.deck("anon:fp").await.unwrap();
        let second = engine.deck("anon:fp").await.unwrap();

        assert!(first.can_swipe);
        assert_eq!(first.total_models, 3);
        assert_eq!(first.round_id, second.round_id);
    }

    #[tokio::test]
    async fn test_pass_awards_nothing() {
        let (engine, _) = engine(&["a"]);
        let deck = engine.deck("anon:fp").await.unwrap();
        let request = VoteRequest {
            direction: Direction::Pass,
            ..like(deck.round_id, "a", None)
        };

        let response = engine.vote("anon:fp", &request).await.unwrap();
        assert_eq!(response.points_awarded, 0);
        assert_eq!(response.multiplier, 1);
        assert!(!response.can_swipe);
        assert_eq!(engine.catalog().profile("a").await.unwrap().today_points, 0);
    }

    #[tokio::test]
    async fn test_boosted_like_debits_and_mirrors() {
        let (engine, _) = engine(&["a"]);
        engine.grant("anon:fp", 100).await.unwrap();
        let deck = engine.deck("anon:fp").await.unwrap();

        let response = engine.vote("anon:fp", &like(deck.round_id, "a", Some("boost"))).await.unwrap();
        assert_eq!(response.points_awarded, 5);
        assert_eq!(response.new_balance, Some(95));

        let mirrored = engine.catalog().profile("a").await.unwrap();
        assert_eq!(mirrored.today_points, 5);
        assert_eq!(mirrored.all_time_points, 5);
    }

    #[tokio::test]
    async fn test_leaderboard_clamps_limit_and_mirrors_rank() {
        let (engine, _) = engine(&["a", "b"]);
        let deck = engine.deck("anon:fp").await.unwrap();
        engine.vote("anon:fp", &like(deck.round_id, "b", None)).await.unwrap();

        let board = engine.leaderboard(ScoreWindow::Today, 0).await.unwrap();
        assert_eq!(board.entries.len(), 1);
        assert_eq!(board.entries[0].profile_id, "b");
        assert_eq!(engine.catalog().profile("b").await.unwrap().today_rank, Some(1));
    }

    #[tokio::test]
    async fn test_today_rank_cleared_after_rollover() {
        let (engine, clock) = engine(&["a", "b", "c"]);
        let deck = engine.deck("anon:fp").await.unwrap();
        engine.vote("anon:fp", &like(deck.round_id, "a", None)).await.unwrap();
        engine.leaderboard(ScoreWindow::Today, 10).await.unwrap();
        assert_eq!(engine.catalog().profile("a").await.unwrap().today_rank, Some(1));

        clock.set(deck.next_reset_at + chrono::Duration::minutes(5));
        let deck = engine.deck("anon:fp").await.unwrap();
        let fresh = deck.profiles.iter().find(|p| p.profile_id != "a").unwrap().profile_id.clone();
        engine.vote("anon:fp", &like(deck.round_id, &fresh, None)).await.unwrap();
        engine.leaderboard(ScoreWindow::Today, 10).await.unwrap();

        assert_eq!(engine.catalog().profile("a").await.unwrap().today_rank, None);
        assert_eq!(engine.catalog().profile(&fresh).await.unwrap().today_rank, Some(1));
    }

    #[tokio::test]
    async fn test_grant_past_max_balance_is_rejected() {
        let (engine, _) = engine(&[]);
        engine.grant("acct:whale", i64::MAX).await.unwrap();

        let err = engine.grant("acct:whale", 1).await.unwrap_err();
        assert!(matches!(err, GameError::InvalidRequest(_)));
        assert_eq!(engine.wallet("acct:whale").await.unwrap().balance, i64::MAX);
    }

    #[tokio::test]
    async fn test_zero_weight_entries_never_drawn() {
        let (mut engine, _) = engine(&[]);
        engine.rules.rewards = RewardTable::new(vec![
            RewardEntry { payout: 99, weight: 0 },
            RewardEntry { payout: 3, weight: 1 },
        ])
        .unwrap();

        let draw = engine.daily_draw("anon:fp").await.unwrap();
        assert_eq!(draw.payout, 3);
        assert_eq!(draw.new_balance, 3);
    }

    #[tokio::test]
    async fn test_grant_rejects_non_positive() {
        let (engine, _) = engine(&[]);
        assert!(matches!(
            engine.grant("anon:fp", 0).await,
            Err(GameError::InvalidRequest(_))
        ));
    }
}
