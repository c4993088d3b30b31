#![forbid(unsafe_code)]

/// Configurable admission limits shared by the registries.
///
/// These limits affect *admission* only and must not affect hashing
/// semantics.
#[derive(Debug, Clone)]
pub struct ValidationLimits {
    /// Global max size for generic string fields (UTF-8 bytes).
    pub max_string_bytes: usize,

    pub name_max_len: usize,
    pub description_max_len: usize,
    pub metadata_uri_max_len: usize,
    pub label_max_len: usize,

    /// Max account id length (UTF-8 bytes).
    pub max_account_bytes: usize,

    /// Max entries in a parallel array (badges per review, links per grant).
    pub max_array_len: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_string_bytes: 1024,
            name_max_len: 128,
            description_max_len: 512,
            metadata_uri_max_len: 256,
            label_max_len: 128,
            max_account_bytes: 128,
            max_array_len: 256,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LimitError {
    #[error("invalid field: {0}")]
    Invalid(String),
}

/// Require a non-empty, bounded string field.
pub fn validate_bounded(field: &str, s: &str, max_len: usize) -> Result<(), LimitError> {
    let t = s.trim();
    if t.is_empty() {
        return Err(LimitError::Invalid(format!("{field} is empty")));
    }
    if t.len() > max_len {
        return Err(LimitError::Invalid(format!(
            "{field} exceeds max length {max_len}"
        )));
    }
    Ok(())
}

/// Bounded but allowed to be empty (descriptions, metadata URIs).
pub fn validate_bounded_opt(field: &str, s: &str, max_len: usize) -> Result<(), LimitError> {
    if s.len() > max_len {
        return Err(LimitError::Invalid(format!(
            "{field} exceeds max length {max_len}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_rejects_empty_and_oversize() {
        assert!(validate_bounded("name", "", 8).is_err());
        assert!(validate_bounded("name", "   ", 8).is_err());
        assert!(validate_bounded("name", "123456789", 8).is_err());
        assert!(validate_bounded("name", "ok", 8).is_ok());
    }

    #[test]
    fn bounded_opt_allows_empty() {
        assert!(validate_bounded_opt("uri", "", 8).is_ok());
        assert!(validate_bounded_opt("uri", "123456789", 8).is_err());
    }
}
