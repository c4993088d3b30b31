#![forbid(unsafe_code)]
#![deny(clippy::float_arithmetic)]
#![deny(clippy::float_cmp)]

//! Per-scorer state: a weighted badge set, per-account badge membership and
//! the legacy sum/average scoring over held badges. Weights are fixed-point
//! integers pre-multiplied by `10^decimals`.

pub mod scorer;
pub mod set;
pub mod store;

pub use scorer::{LegacyScore, ScorerRecordV1};
pub use set::{ScoreSet, ScoreSetError};
pub use store::{ScorerStore, StoreError};
