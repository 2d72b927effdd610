//! Pure derivations over a [`ScanResult`](crate::model::ScanResult).
//!
//! Nothing here is cached: callers recompute on every read.

pub mod score;
pub mod tally;

pub use score::{score, HealthScore, HealthStatus, HEALTHY_ABOVE, PENALTY_PER_THREAT};
pub use tally::{tally, CategoryTally};
