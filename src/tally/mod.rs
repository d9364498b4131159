//! Vote validation and leaderboard aggregation.
//!
//! Raw [`types::VoteRecord`]s come from the record store, possibly with
//! resubmissions and partial data. [`aggregate::aggregate`] collapses them to
//! the latest vote per judge and participant and ranks the participants.

pub mod aggregate;
pub mod score;
pub mod types;
pub mod validate;

pub use aggregate::{aggregate, aggregate_at};
pub use types::{JudgeDetail, Leaderboard, ParticipantAggregate, ScoreEntry, VoteRecord};
