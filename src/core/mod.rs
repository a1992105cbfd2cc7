// Core game exports
pub mod boost;
pub mod clock;
pub mod engine;
pub mod identity;
pub mod leaderboard;
pub mod reward;
pub mod session;

pub use boost::{TierSpec, TierTable, NO_BOOST};
pub use clock::{Clock, DayWindow, ManualClock, SystemClock};
pub use engine::{BoostEngine, GameRules};
pub use identity::{IdentityKey, IdentityResolver, VisitorClaim};
pub use leaderboard::{rank_tallies, tally_votes, Tally};
pub use reward::{RewardEntry, RewardTable};
pub use session::{Round, RoundState};
