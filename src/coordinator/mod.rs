//! Coordinator-side orchestration: distribution, query rounds, harvest.

mod harvest;
mod session;

pub use harvest::{Candidate, HarvestState, RankedWord};
pub use session::{CoordinatorSession, QueryOutcome};
