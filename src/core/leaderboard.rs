use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::core::clock::DayWindow;
use crate::models::{Direction, LeaderboardEntry, ScoreWindow, Vote};

/// Aggregated points for one profile inside a window
#[derive(Debug, Clone, PartialEq)]
pub struct Tally {
    pub profile_id: String,
    pub points: i64,
    pub total_boosts: u32,
    pub reached_at: DateTime<Utc>,
}

/// Earliest vote timestamp a window counts; `None` means all time
pub fn window_start(window: ScoreWindow, day: &DayWindow) -> Option<DateTime<Utc>> {
    match window {
        ScoreWindow::Today => Some(day.day_start),
        ScoreWindow::Week => Some(day.week_start),
        ScoreWindow::AllTime => None,
    }
}

/// Sum point-bearing likes per profile
pub fn tally_votes<'a, I>(votes: I, since: Option<DateTime<Utc>>) -> Vec<Tally>
where
    I: IntoIterator<Item = &'a Vote>,
{
    let mut tallies: HashMap<&str, Tally> = HashMap::new();

    for vote in votes {
        if vote.direction != Direction::Like || vote.points <= 0 {
            continue;
        }
        if since.is_some_and(|start| vote.created_at < start) {
            continue;
        }

        let tally = tallies.entry(vote.profile_id.as_str()).or_insert_with(|| Tally {
            profile_id: vote.profile_id.clone(),
            points: 0,
            total_boosts: 0,
            reached_at: vote.created_at,
        });
        tally.points += vote.points;
        if vote.is_boosted() {
            tally.total_boosts += 1;
        }
        if vote.created_at > tally.reached_at {
            tally.reached_at = vote.created_at;
        }
    }

    tallies.into_values().collect()
}

/// Order tallies and assign ranks
///
/// Points descending, then whoever reached the total first, then profile id
/// so that two reads of the same data always agree.
pub fn rank_tallies(mut tallies: Vec<Tally>, limit: usize) -> Vec<LeaderboardEntry> {
    tallies.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| a.reached_at.cmp(&b.reached_at))
            .then_with(|| a.profile_id.cmp(&b.profile_id))
    });

    tallies
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, t)| LeaderboardEntry {
            rank: i as u32 + 1,
            profile_id: t.profile_id,
            points: t.points,
            total_boosts: t.total_boosts,
            reached_at: t.reached_at,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn vote(profile: &str, direction: Direction, tier: &str, points: i64, at: DateTime<Utc>) -> Vote {
        Vote {
            id: Uuid::new_v4(),
            identity: "anon:fp".into(),
            profile_id: profile.into(),
            round_id: Uuid::nil(),
            direction,
            tier: tier.into(),
            multiplier: points.max(1) as u32,
            points,
            revealed: false,
            priority: false,
            created_at: at,
        }
    }

    #[test]
    fn test_points_descending() {
        let t0 = Utc::now();
        let votes = vec![
            vote("a", Direction::Like, "none", 1, t0),
            vote("b", Direction::Like, "boost", 5, t0),
            vote("a", Direction::Like, "none", 1, t0),
        ];
        let ranked = rank_tallies(tally_votes(&votes, None), 10);
        assert_eq!(ranked[0].profile_id, "b");
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[0].total_boosts, 1);
        assert_eq!(ranked[1].profile_id, "a");
        assert_eq!(ranked[1].points, 2);
    }

    #[test]
    fn test_tie_goes_to_earliest_total() {
        let t0 = Utc::now();
        let votes = vec![
            vote("late", Direction::Like, "none", 1, t0),
            vote("early", Direction::Like, "none", 2, t0 + Duration::seconds(1)),
            vote("late", Direction::Like, "none", 1, t0 + Duration::seconds(5)),
        ];
        let ranked = rank_tallies(tally_votes(&votes, None), 10);
        assert_eq!(ranked[0].profile_id, "early");
        assert_eq!(ranked[1].profile_id, "late");
    }

    #[test]
    fn test_passes_and_old_votes_ignored() {
        let t0 = Utc::now();
        let votes = vec![
            vote("a", Direction::Pass, "none", 0, t0),
            vote("b", Direction::Like, "none", 1, t0 - Duration::days(1)),
            vote("c", Direction::Like, "none", 1, t0),
        ];
        let ranked = rank_tallies(tally_votes(&votes, Some(t0)), 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].profile_id, "c");
    }

    #[test]
    fn test_ranking_is_stable_across_input_order() {
        let t0 = Utc::now();
        let mut votes = vec![
            vote("x", Direction::Like, "none", 3, t0),
            vote("y", Direction::Like, "none", 3, t0),
            vote("z", Direction::Like, "none", 3, t0),
        ];
        let first = rank_tallies(tally_votes(&votes, None), 10);
        votes.reverse();
        let second = rank_tallies(tally_votes(&votes, None), 10);
        assert_eq!(first, second);
        assert_eq!(first[0].profile_id, "x");
    }

    #[test]
    fn test_limit() {
        let t0 = Utc::now();
        let votes: Vec<Vote> = (0..20)
            .map(|i| vote(&format!("p{}", i), Direction::Like, "none", i + 1, t0))
            .collect();
        let ranked = rank_tallies(tally_votes(&votes, None), 5);
        assert_eq!(ranked.len(), 5);
        assert_eq!(ranked[4].rank, 5);
        assert_eq!(ranked[0].points, 20);
    }
}
