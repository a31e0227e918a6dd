mod cache;
mod dispatcher;
mod similarity;
mod splitter;
mod stats;
mod strategies;

pub use cache::{BoundsCache, CacheCounters, CacheState};
pub use dispatcher::{BatchOutcome, CancellationToken, MatchDispatcher};
pub use similarity::similarity;
pub use splitter::{is_value_token, split};
pub use stats::{MATCHED_CONFIDENCE, build_report, compute_statistics};
pub use strategies::{MatchContext, Strategy, StrategyMatch};
