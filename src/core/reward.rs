use config::ConfigError;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One row of the daily payout table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardEntry {
    pub payout: i64,
    pub weight: u32,
}

pub fn default_rewards() -> Vec<RewardEntry> {
    [(1, 40), (2, 25), (5, 18), (10, 10), (25, 5), (50, 2)]
        .into_iter()
        .map(|(payout, weight)| RewardEntry { payout, weight })
        .collect()
}

/// Payout table with a precomputed weighted sampler
#[derive(Debug, Clone)]
pub struct RewardTable {
    entries: Vec<RewardEntry>,
    index: WeightedIndex<u32>,
    total_weight: u64,
}

impl RewardTable {
    pub fn new(entries: Vec<RewardEntry>) -> Result<Self, ConfigError> {
        if let Some(bad) = entries.iter().find(|e| e.payout < 0) {
            return Err(ConfigError::Message(format!("reward payout {} is negative", bad.payout)));
        }

        let index = WeightedIndex::new(entries.iter().map(|e| e.weight))
            .map_err(|e| ConfigError::Message(format!("invalid reward weights: {}", e)))?;
        let total_weight = entries.iter().map(|e| e.weight as u64).sum();

        Ok(Self {
            entries,
            index,
            total_weight,
        })
    }

    /// Index of the drawn entry. Pure apart from the supplied RNG.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.index.sample(rng)
    }

    pub fn entry(&self, index: usize) -> Option<&RewardEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[RewardEntry] {
        &self.entries
    }

    /// Expected share of draws landing on `index`
    pub fn share(&self, index: usize) -> f64 {
        self.entries
            .get(index)
            .map(|e| e.weight as f64 / self.total_weight as f64)
            .unwrap_or(0.0)
    }
}
