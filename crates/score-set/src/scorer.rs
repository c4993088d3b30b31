#![forbid(unsafe_code)]

use score_core::{AccountId, BadgeId, ScaledU128};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persisted scorer record (v1).
///
/// The badge set is the key set of `badge_weights`; a scorer "exists" iff
/// that set is non-empty. Weights are stored pre-multiplied by
/// `10^decimals`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorerRecordV1 {
    pub badge_weights: BTreeMap<BadgeId, ScaledU128>,
    pub decimals: u8,
    pub manager: AccountId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolver: Option<AccountId>,
    #[serde(default)]
    pub metadata_uri: String,
}

impl ScorerRecordV1 {
    pub fn contains_badge(&self, badge_id: BadgeId) -> bool {
        self.badge_weights.contains_key(&badge_id)
    }

    pub fn is_live(&self) -> bool {
        !self.badge_weights.is_empty()
    }
}

/// Result of the legacy sum/average scoring of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyScore {
    /// Held badges still present in the scorer's current badge set.
    pub badge_ids: Vec<BadgeId>,
    /// Weights parallel to `badge_ids`.
    pub weights: Vec<ScaledU128>,
    /// Sum of the filtered weights.
    pub total: ScaledU128,
    /// `total / badge_ids.len()` with floor division.
    pub average: ScaledU128,
}
