use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GameError;
use crate::models::{DeckResponse, Profile};

/// Where a visitor stands in today's round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    /// No round yet, or the last one passed its reset time
    Fresh,
    InProgress,
    Exhausted,
}

/// One visitor's daily deck of profiles
///
/// The deck is fixed when the round starts. `swiped` holds the profiles
/// already voted on, in vote order; its length is the consumed counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub round_id: Uuid,
    pub identity: String,
    pub deck: Vec<Profile>,
    pub swiped: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub reset_at: DateTime<Utc>,
}

impl Round {
    pub fn new(identity: &str, deck: Vec<Profile>, now: DateTime<Utc>, reset_at: DateTime<Utc>) -> Self {
        Self {
            round_id: Uuid::new_v4(),
            identity: identity.to_string(),
            deck,
            swiped: Vec::new(),
            started_at: now,
            reset_at,
        }
    }

    pub fn state(&self, now: DateTime<Utc>) -> RoundState {
        if !self.is_active(now) {
            RoundState::Fresh
        } else if self.remaining_count() == 0 {
            RoundState::Exhausted
        } else {
            RoundState::InProgress
        }
    }

    #[inline]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.reset_at
    }

    pub fn consumed(&self) -> u32 {
        self.swiped.len() as u32
    }

    pub fn has_swiped(&self, profile_id: &str) -> bool {
        self.swiped.iter().any(|id| id == profile_id)
    }

    pub fn contains(&self, profile_id: &str) -> bool {
        self.deck.iter().any(|p| p.profile_id == profile_id)
    }

    /// Profiles not yet voted on, in deck order
    pub fn remaining(&self) -> impl Iterator<Item = &Profile> {
        self.deck.iter().filter(move |p| !self.has_swiped(&p.profile_id))
    }

    pub fn remaining_count(&self) -> usize {
        self.remaining().count()
    }

    /// Gate a vote against this round. Does not mutate.
    pub fn check_vote(&self, round_id: Uuid, profile_id: &str, now: DateTime<Utc>) -> Result<(), GameError> {
        if self.round_id != round_id || !self.is_active(now) {
            return Err(GameError::InvalidRound);
        }
        if self.has_swiped(profile_id) {
            return Err(GameError::DuplicateVote);
        }
        if self.remaining_count() == 0 {
            return Err(GameError::RoundExhausted {
                next_reset_at: self.reset_at,
            });
        }
        if !self.contains(profile_id) {
            return Err(GameError::InvalidRequest(format!(
                "profile {} is not in this round",
                profile_id
            )));
        }
        Ok(())
    }

    pub fn record_swipe(&mut self, profile_id: &str) {
        self.swiped.push(profile_id.to_string());
    }

    pub fn to_deck(&self, now: DateTime<Utc>) -> DeckResponse {
        DeckResponse {
            can_swipe: self.state(now) == RoundState::InProgress,
            profiles: self.remaining().cloned().collect(),
            round_id: self.round_id,
            models_swiped: self.consumed(),
            total_models: self.deck.len() as u32,
            next_reset_at: self.reset_at,
        }
    }
}

/// Drop excluded and repeated profiles, keep catalog order, cap at `limit`
pub fn build_deck(candidates: Vec<Profile>, exclude: &[String], limit: usize) -> Vec<Profile> {
    let mut deck: Vec<Profile> = Vec::with_capacity(limit.min(candidates.len()));
    for profile in candidates {
        if deck.len() >= limit {
            break;
        }
        if exclude.contains(&profile.profile_id)
            || deck.iter().any(|p| p.profile_id == profile.profile_id)
        {
            continue;
        }
        deck.push(profile);
    }
    deck
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn profile(id: &str) -> Profile {
        Profile {
            profile_id: id.to_string(),
            display_name: format!("Model {}", id),
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

    fn round(ids: &[&str]) -> (Round, DateTime<Utc>) {
        let now = Utc::now();
        let deck = ids.iter().map(|id| profile(id)).collect();
        (Round::new("anon:fp", deck, now, now + Duration::hours(6)), now)
    }

    #[test]
    fn test_state_transitions() {
        let (mut round, now) = round(&["a", "b"]);
        assert_eq!(round.state(now), RoundState::InProgress);

        round.record_swipe("a");
        round.record_swipe("b");
        assert_eq!(round.state(now), RoundState::Exhausted);

        assert_eq!(round.state(round.reset_at), RoundState::Fresh);
    }

    #[test]
    fn test_empty_deck_is_exhausted() {
        let (round, now) = round(&[]);
        assert_eq!(round.state(now), RoundState::Exhausted);
        assert!(!round.to_deck(now).can_swipe);
    }

    #[test]
    fn test_remaining_skips_out_of_order_swipes() {
        let (mut round, now) = round(&["a", "b", "c"]);
        round.record_swipe("b");
        let ids: Vec<_> = round.remaining().map(|p| p.profile_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);

        let deck = round.to_deck(now);
        assert_eq!(deck.models_swiped, 1);
        assert_eq!(deck.total_models, 3);
    }

    #[test]
    fn test_check_vote_rejections() {
        let (mut round, now) = round(&["a", "b"]);

        assert!(matches!(round.check_vote(Uuid::new_v4(), "a", now), Err(GameError::InvalidRound)));
        assert!(matches!(
            round.check_vote(round.round_id, "a", round.reset_at),
            Err(GameError::InvalidRound)
        ));
        assert!(matches!(
            round.check_vote(round.round_id, "zzz", now),
            Err(GameError::InvalidRequest(_))
        ));

        round.record_swipe("a");
        assert!(matches!(round.check_vote(round.round_id, "a", now), Err(GameError::DuplicateVote)));

        round.record_swipe("b");
        assert!(matches!(
            round.check_vote(round.round_id, "zzz", now),
            Err(GameError::RoundExhausted { .. })
        ));
        assert!(round.check_vote(round.round_id, "b", now).is_err());
    }

    #[test]
    fn test_build_deck_excludes_and_dedupes() {
        let candidates = vec![profile("a"), profile("b"), profile("a"), profile("c"), profile("d")];
        let deck = build_deck(candidates, &["b".to_string()], 2);
        let ids: Vec<_> = deck.iter().map(|p| p.profile_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }
}
