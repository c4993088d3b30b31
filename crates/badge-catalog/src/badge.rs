#![forbid(unsafe_code)]

use score_core::{content_hash32, BadgeId, CanonicalizeError, PayloadBytes};
use serde::{Deserialize, Serialize};

/// Badge definition (v1).
///
/// Identity is `blake3(canonical_bytes(badge))` over the full structural
/// content, so any differing field yields a different id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeV1 {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata_uri: String,
    /// Opaque application payload, base64 in JSON.
    #[serde(default)]
    pub payload: PayloadBytes,
}

impl BadgeV1 {
    /// Deterministic content address for this badge.
    pub fn derive_id(&self) -> Result<BadgeId, CanonicalizeError> {
        content_hash32(self)
    }
}
