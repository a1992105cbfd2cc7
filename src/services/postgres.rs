use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::core::boost::apply_debit;
use crate::core::clock::DayWindow;
use crate::core::leaderboard::{rank_tallies, Tally};
use crate::core::session::Round;
use crate::error::GameError;
use crate::models::{LeaderboardEntry, LedgerReason, LedgerTransaction, Profile};
use crate::services::store::{GameStore, VoteCommit, VoteReceipt};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

impl From<PostgresError> for GameError {
    fn from(err: PostgresError) -> Self {
        GameError::Storage(err.to_string())
    }
}

/// PostgreSQL-backed game store
///
/// Multi-record writes run inside one transaction and lock the identity's
/// round and balance rows with `FOR UPDATE`, so concurrent requests from
/// the same visitor serialize. A transaction that is dropped before commit
/// (client went away, any error) rolls back.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new store from a connection string and run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Add `amount` to the identity's balance and append the ledger entry.
    /// Caller owns the transaction.
    async fn post(
        tx: &mut Transaction<'_, Postgres>,
        identity: &str,
        amount: i64,
        reason: LedgerReason,
        now: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let balance_after: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO balances (identity, balance)
            VALUES ($1, $2)
            ON CONFLICT (identity)
            DO UPDATE SET balance = balances.balance + EXCLUDED.balance
            RETURNING balance
            "#,
        )
        .bind(identity)
        .bind(amount)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO ledger_transactions (id, identity, amount, reason, balance_after, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(identity)
        .bind(amount)
        .bind(reason.as_str())
        .bind(balance_after)
        .bind(now)
        .execute(&mut **tx)
        .await?;

        Ok(balance_after)
    }
}

fn round_from_row(row: &PgRow) -> Result<Round, PostgresError> {
    let deck: Json<Vec<Profile>> = row.try_get("deck")?;
    Ok(Round {
        round_id: row.try_get("round_id")?,
        identity: row.try_get("identity")?,
        deck: deck.0,
        swiped: row.try_get("swiped")?,
        started_at: row.try_get("started_at")?,
        reset_at: row.try_get("reset_at")?,
    })
}

fn transaction_from_row(row: &PgRow) -> Result<LedgerTransaction, PostgresError> {
    let reason: String = row.try_get("reason")?;
    Ok(LedgerTransaction {
        id: row.try_get("id")?,
        identity: row.try_get("identity")?,
        amount: row.try_get("amount")?,
        reason: LedgerReason::parse(&reason)
            .ok_or_else(|| PostgresError::InvalidRow(format!("unknown ledger reason '{}'", reason)))?,
        balance_after: row.try_get("balance_after")?,
        created_at: row.try_get("created_at")?,
    })
}

const ROUND_COLUMNS: &str = "identity, round_id, deck, swiped, started_at, reset_at";

impl GameStore for PostgresStore {
    async fn active_round(&self, identity: &str, now: DateTime<Utc>) -> Result<Option<Round>, GameError> {
        let query = format!(
            "SELECT {} FROM rounds WHERE identity = $1 AND reset_at > $2",
            ROUND_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(identity)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(round_from_row).transpose()?)
    }

    async fn start_round(&self, round: Round, now: DateTime<Utc>) -> Result<Round, GameError> {
        // Replaces only an expired round; a concurrent winner is returned as-is
        sqlx::query(
            r#"
            INSERT INTO rounds (identity, round_id, deck, swiped, started_at, reset_at)
            VALUES ($1, $2, $3, '{}', $4, $5)
            ON CONFLICT (identity)
            DO UPDATE SET
                round_id = EXCLUDED.round_id,
                deck = EXCLUDED.deck,
                swiped = '{}',
                started_at = EXCLUDED.started_at,
                reset_at = EXCLUDED.reset_at
            WHERE rounds.reset_at <= $6
            "#,
        )
        .bind(&round.identity)
        .bind(round.round_id)
        .bind(Json(&round.deck))
        .bind(round.started_at)
        .bind(round.reset_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let query = format!("SELECT {} FROM rounds WHERE identity = $1", ROUND_COLUMNS);
        let row = sqlx::query(&query)
            .bind(&round.identity)
            .fetch_one(&self.pool)
            .await?;

        let stored = round_from_row(&row)?;
        tracing::debug!(
            "Round {} active for {} ({} profiles)",
            stored.round_id,
            stored.identity,
            stored.deck.len()
        );
        Ok(stored)
    }

    async fn voted_profiles_since(&self, identity: &str, since: DateTime<Utc>) -> Result<Vec<String>, GameError> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT profile_id
            FROM votes
            WHERE identity = $1 AND created_at >= $2
            "#,
        )
        .bind(identity)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let seen = rows
            .iter()
            .map(|row| row.try_get("profile_id"))
            .collect::<Result<Vec<String>, _>>()?;
        Ok(seen)
    }

    async fn commit_vote(&self, commit: VoteCommit, now: DateTime<Utc>) -> Result<VoteReceipt, GameError> {
        let vote = commit.vote;
        let mut tx = self.pool.begin().await?;

        let query = format!("SELECT {} FROM rounds WHERE identity = $1 FOR UPDATE", ROUND_COLUMNS);
        let row = sqlx::query(&query)
            .bind(&vote.identity)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(GameError::InvalidRound)?;
        let mut round = round_from_row(&row)?;
        round.check_vote(vote.round_id, &vote.profile_id, now)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO votes
                (id, identity, profile_id, round_id, direction, tier,
                 multiplier, points, revealed, priority, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (identity, profile_id, round_id) DO NOTHING
            "#,
        )
        .bind(vote.id)
        .bind(&vote.identity)
        .bind(&vote.profile_id)
        .bind(vote.round_id)
        .bind(vote.direction.as_str())
        .bind(&vote.tier)
        .bind(vote.multiplier as i32)
        .bind(vote.points)
        .bind(vote.revealed)
        .bind(vote.priority)
        .bind(vote.created_at)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(GameError::DuplicateVote);
        }

        let new_balance = if commit.cost > 0 {
            let balance: Option<i64> =
                sqlx::query_scalar("SELECT balance FROM balances WHERE identity = $1 FOR UPDATE")
                    .bind(&vote.identity)
                    .fetch_optional(&mut *tx)
                    .await?;
            // Rejection drops `tx`, which rolls back the vote insert
            apply_debit(balance.unwrap_or(0), commit.cost)?;
            Some(Self::post(&mut tx, &vote.identity, -commit.cost, LedgerReason::BoostDebit, now).await?)
        } else {
            None
        };

        sqlx::query("UPDATE rounds SET swiped = array_append(swiped, $2) WHERE identity = $1")
            .bind(&vote.identity)
            .bind(&vote.profile_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        round.record_swipe(&vote.profile_id);
        Ok(VoteReceipt {
            models_swiped: round.consumed(),
            remaining: round.remaining_count() as u32,
            vote,
            new_balance,
        })
    }

    async fn commit_draw(
        &self,
        identity: &str,
        day: &DayWindow,
        payout: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, GameError> {
        let mut tx = self.pool.begin().await?;

        let marked = sqlx::query(
            r#"
            INSERT INTO daily_draws (identity, day_start, payout, drawn_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (identity, day_start) DO NOTHING
            "#,
        )
        .bind(identity)
        .bind(day.day_start)
        .bind(payout)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if marked.rows_affected() == 0 {
            return Err(GameError::AlreadyDrawnToday {
                next_reset_at: day.next_reset,
            });
        }

        let balance = Self::post(&mut tx, identity, payout, LedgerReason::RewardCredit, now).await?;
        tx.commit().await?;
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
        let mut tx = self.pool.begin().await?;
        let balance = Self::post(&mut tx, identity, amount, reason, now).await?;
        tx.commit().await?;
        Ok(balance)
    }

    async fn balance(&self, identity: &str) -> Result<i64, GameError> {
        let balance: Option<i64> = sqlx::query_scalar("SELECT balance FROM balances WHERE identity = $1")
            .bind(identity)
            .fetch_optional(&self.pool)
            .await?;
        Ok(balance.unwrap_or(0))
    }

    async fn transactions(&self, identity: &str, limit: usize) -> Result<Vec<LedgerTransaction>, GameError> {
        let rows = sqlx::query(
            r#"
            SELECT id, identity, amount, reason, balance_after, created_at
            FROM ledger_transactions
            WHERE identity = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(identity)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let transactions = rows
            .iter()
            .map(transaction_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(transactions)
    }

    async fn leaderboard(
        &self,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, GameError> {
        let rows = sqlx::query(
            r#"
            SELECT
                profile_id,
                SUM(points)::BIGINT AS points,
                COUNT(*) FILTER (WHERE tier <> 'none') AS total_boosts,
                MAX(created_at) AS reached_at
            FROM votes
            WHERE direction = 'like'
              AND points > 0
              AND ($1::TIMESTAMPTZ IS NULL OR created_at >= $1)
            GROUP BY profile_id
            ORDER BY points DESC, reached_at ASC, profile_id ASC
            LIMIT $2
            "#,
        )
        .bind(since)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let tallies = rows
            .iter()
            .map(|row| -> Result<Tally, sqlx::Error> {
                let total_boosts: i64 = row.try_get("total_boosts")?;
                Ok(Tally {
                    profile_id: row.try_get("profile_id")?,
                    points: row.try_get("points")?,
                    total_boosts: total_boosts as u32,
                    reached_at: row.try_get("reached_at")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rank_tallies(tallies, limit))
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, GameError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
