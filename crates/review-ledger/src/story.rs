#![forbid(unsafe_code)]

use score_core::{BadgeId, Hex32, ScaledU128};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregation unit across many subjects' stories (a grant program label).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgramKey(pub String);

impl ProgramKey {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode a program key from the opaque `score_of` payload: the UTF-8
    /// bytes of the key. `None` for invalid UTF-8 or an empty key.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        let s = std::str::from_utf8(payload).ok()?;
        if s.is_empty() {
            return None;
        }
        Some(Self(s.to_string()))
    }
}

impl fmt::Display for ProgramKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One immutable review record (v1).
///
/// Appended to the subject's sequence and never edited or removed; only its
/// *effect* on the program aggregate can be superseded by a later story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryV1 {
    pub timestamp: u64,
    /// Opaque reference to the submitting transaction.
    pub tx_ref: Hex32,
    pub badge_ids: Vec<BadgeId>,
    /// Raw scores parallel to `badge_ids`.
    pub scores: Vec<u8>,
    /// `ceil(sum(scores) * 10^decimals / len(scores))`, fixed-point.
    pub average_score: ScaledU128,
}
