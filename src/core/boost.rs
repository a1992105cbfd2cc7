use config::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::GameError;
use crate::models::Direction;

/// Name of the mandatory zero-cost tier
pub const NO_BOOST: &str = "none";

/// Cost and effect of one amplification tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSpec {
    pub cost: i64,
    pub multiplier: u32,
    /// Disclose the voter to the profile
    #[serde(default)]
    pub reveal: bool,
    /// Flag the vote for priority notification
    #[serde(default)]
    pub priority: bool,
}

pub fn default_tiers() -> BTreeMap<String, TierSpec> {
    let mut tiers = BTreeMap::new();
    tiers.insert(NO_BOOST.to_string(), TierSpec { cost: 0, multiplier: 1, reveal: false, priority: false });
    tiers.insert("boost".to_string(), TierSpec { cost: 5, multiplier: 5, reveal: false, priority: false });
    tiers.insert("reveal".to_string(), TierSpec { cost: 10, multiplier: 5, reveal: true, priority: false });
    tiers.insert("super".to_string(), TierSpec { cost: 20, multiplier: 10, reveal: true, priority: true });
    tiers
}

/// Validated tier table; adding a tier is a configuration change only
#[derive(Debug, Clone)]
pub struct TierTable {
    tiers: BTreeMap<String, TierSpec>,
}

impl TierTable {
    pub fn new(tiers: BTreeMap<String, TierSpec>) -> Result<Self, ConfigError> {
        match tiers.get(NO_BOOST) {
            Some(none) if none.cost == 0 => {}
            Some(_) => {
                return Err(ConfigError::Message(format!("tier '{}' must cost 0", NO_BOOST)));
            }
            None => {
                return Err(ConfigError::Message(format!("tier table must contain '{}'", NO_BOOST)));
            }
        }

        for (name, spec) in &tiers {
            if spec.cost < 0 {
                return Err(ConfigError::Message(format!("tier '{}' has a negative cost", name)));
            }
            if spec.multiplier < 1 {
                return Err(ConfigError::Message(format!("tier '{}' multiplier must be at least 1", name)));
            }
        }

        Ok(Self { tiers })
    }

    pub fn get(&self, name: &str) -> Option<&TierSpec> {
        self.tiers.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TierSpec)> {
        self.tiers.iter()
    }

    /// Pick the tier for a vote request
    ///
    /// A missing tier means `none`. Anything but `none` on a pass is refused.
    pub fn resolve<'a>(
        &'a self,
        requested: Option<&'a str>,
        direction: Direction,
    ) -> Result<(&'a str, &'a TierSpec), GameError> {
        let name = requested.map(str::trim).filter(|n| !n.is_empty()).unwrap_or(NO_BOOST);
        let spec = self
            .tiers
            .get(name)
            .ok_or_else(|| GameError::InvalidRequest(format!("unknown boost tier '{}'", name)))?;

        if direction == Direction::Pass && name != NO_BOOST {
            return Err(GameError::InvalidRequest("boost tiers only apply to likes".to_string()));
        }

        Ok((name, spec))
    }
}

/// Points a vote awards to the profile
#[inline]
pub fn points_for(direction: Direction, tier: &TierSpec, base_point: i64) -> i64 {
    match direction {
        Direction::Like => tier.multiplier as i64 * base_point,
        Direction::Pass => 0,
    }
}

/// Balance after taking `cost`, or the whole debit is refused
#[inline]
pub fn apply_debit(balance: i64, cost: i64) -> Result<i64, GameError> {
    if balance < cost {
        return Err(GameError::InsufficientBalance { balance, cost });
    }
    Ok(balance - cost)
}
