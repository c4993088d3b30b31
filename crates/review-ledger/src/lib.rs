#![forbid(unsafe_code)]
#![deny(clippy::float_arithmetic)]
#![deny(clippy::float_cmp)]

//! Review ledger: an append-only sequence of review "stories" per subject
//! and an incrementally maintained running average per grant program.
//!
//! The aggregate is the ceiling-rounded mean of the *latest* story average
//! contributed by each subject; when a subject submits again, its previous
//! contribution is backed out and the new one folded in without replaying
//! history.

pub mod aggregate;
pub mod ledger;
pub mod source;
pub mod story;
pub mod store;

pub use aggregate::{fold_story, ProgramAggregateV1};
pub use ledger::{AdminBootstrap, LedgerError, ReviewLedger};
pub use source::{ScoreSource, SourceError};
pub use story::{ProgramKey, StoryV1};
pub use store::{LedgerStore, StoreError};
