#![forbid(unsafe_code)]

//! Unsigned scaled-integer arithmetic for the scoring engine.
//!
//! All scores are fixed-point integers scaled by `10^decimals`. Every
//! widening operation is checked; the scale factor is capped so that
//! `running_average * valid_review_count` stays inside `u128`.

/// Maximum supported `decimals` for scorer fixed-point scaling.
pub const MAX_DECIMALS: u8 = 18;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ArithError {
    #[error("division by zero")]
    DivideByZero,
    #[error("arithmetic overflow: {0}")]
    Overflow(&'static str),
    #[error("decimals out of range (0..={MAX_DECIMALS}): {0}")]
    DecimalsOutOfRange(u8),
}

/// Ceiling division over `u128`.
///
/// Defined as `a == 0 ? 0 : (a - 1) / b + 1`, which rounds up without the
/// `(a + b - 1)` addition that could itself overflow.
pub fn ceil_div(a: u128, b: u128) -> Result<u128, ArithError> {
    if b == 0 {
        return Err(ArithError::DivideByZero);
    }
    if a == 0 {
        return Ok(0);
    }
    Ok((a - 1) / b + 1)
}

/// `10^decimals` with the documented cap.
pub fn pow10(decimals: u8) -> Result<u128, ArithError> {
    if decimals > MAX_DECIMALS {
        return Err(ArithError::DecimalsOutOfRange(decimals));
    }
    Ok(10u128.pow(u32::from(decimals)))
}

pub fn checked_mul(a: u128, b: u128, what: &'static str) -> Result<u128, ArithError> {
    a.checked_mul(b).ok_or(ArithError::Overflow(what))
}

pub fn checked_add(a: u128, b: u128, what: &'static str) -> Result<u128, ArithError> {
    a.checked_add(b).ok_or(ArithError::Overflow(what))
}

pub fn checked_sub(a: u128, b: u128, what: &'static str) -> Result<u128, ArithError> {
    a.checked_sub(b).ok_or(ArithError::Overflow(what))
}
