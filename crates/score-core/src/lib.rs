#![forbid(unsafe_code)]
#![deny(clippy::float_arithmetic)]
#![deny(clippy::float_cmp)]

//! Shared primitives for the badge/grant registries and the review
//! scoring engine: 32-byte content-addressed identifiers, scaled-integer
//! (fixed-point) arithmetic, and deterministic canonical JSON hashing.

pub mod arith;
pub mod canonical;
pub mod limits;
pub mod types;

pub use arith::{ceil_div, checked_add, checked_mul, pow10, ArithError, MAX_DECIMALS};
pub use canonical::{canonical_json_bytes, content_hash32, CanonicalizeError};
pub use limits::ValidationLimits;
pub use types::{
    AccountId, BadgeId, ChainId, Hex32, PayloadBytes, ScaledU128, ScorerId, SubjectId,
};
