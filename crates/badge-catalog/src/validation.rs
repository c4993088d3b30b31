#![forbid(unsafe_code)]

use crate::badge::BadgeV1;
use score_core::limits::{validate_bounded, validate_bounded_opt};
use score_core::ValidationLimits;

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid field: {0}")]
    Invalid(String),
}

impl From<score_core::limits::LimitError> for ValidationError {
    fn from(e: score_core::limits::LimitError) -> Self {
        ValidationError::Invalid(e.to_string())
    }
}

pub fn validate_badge_v1(b: &BadgeV1) -> Result<(), ValidationError> {
    validate_badge_v1_with_limits(b, &ValidationLimits::default())
}

pub fn validate_badge_v1_with_limits(
    b: &BadgeV1,
    limits: &ValidationLimits,
) -> Result<(), ValidationError> {
    validate_bounded(
        "name",
        &b.name,
        limits.name_max_len.min(limits.max_string_bytes),
    )?;
    validate_bounded_opt(
        "description",
        &b.description,
        limits.description_max_len.min(limits.max_string_bytes),
    )?;
    validate_bounded_opt(
        "metadata_uri",
        &b.metadata_uri,
        limits.metadata_uri_max_len.min(limits.max_string_bytes),
    )?;
    Ok(())
}
