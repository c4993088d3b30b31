#![forbid(unsafe_code)]

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 32-byte identifier encoded as lowercase hex in JSON.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hex32(pub [u8; 32]);

/// Content hash of a badge definition.
pub type BadgeId = Hex32;
/// Content hash of a grant record at creation time.
pub type SubjectId = Hex32;

impl Hex32 {
    pub const ZERO: Hex32 = Hex32([0u8; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, String> {
        let raw = hex::decode(s).map_err(|e| format!("invalid hex: {e}"))?;
        if raw.len() != 32 {
            return Err(format!("expected 32 bytes, got {}", raw.len()));
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&raw);
        Ok(Self(out))
    }
}

impl fmt::Debug for Hex32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Hex32").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for Hex32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Hex32 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hex32 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Hex32::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Opaque account/address identifier (manager, grantee, submitter).
///
/// The empty string is the unset/vacant value.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monotonically increasing scorer identifier.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ScorerId(pub u64);

impl fmt::Display for ScorerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric chain identifier used to pin grants to an execution context.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unsigned fixed-point amount represented as a scaled integer (`u128`).
///
/// JSON encoding uses a **string** (not a number) to avoid precision loss in
/// JS clients; integers are accepted on input for convenience.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScaledU128(pub u128);

impl ScaledU128 {
    pub const fn new_scaled(v: u128) -> Self {
        Self(v)
    }
}

impl fmt::Display for ScaledU128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ScaledU128 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for ScaledU128 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;
        impl<'de> serde::de::Visitor<'de> for V {
            type Value = ScaledU128;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a u128 encoded as a string or an integer")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let n = v
                    .parse::<u128>()
                    .map_err(|e| E::custom(format!("invalid u128 string: {e}")))?;
                Ok(ScaledU128(n))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ScaledU128(v as u128))
            }
        }
        deserializer.deserialize_any(V)
    }
}

/// Opaque byte payload encoded as base64 in JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PayloadBytes(pub Vec<u8>);

impl PayloadBytes {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for PayloadBytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for PayloadBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(s.as_bytes())
            .map(PayloadBytes)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex32_roundtrips_through_hex() {
        let id = Hex32([0xAB; 32]);
        let s = id.to_hex();
        assert_eq!(s.len(), 64);
        assert_eq!(Hex32::from_hex(&s).unwrap(), id);
    }

    #[test]
    fn hex32_rejects_wrong_length() {
        assert!(Hex32::from_hex("abcd").is_err());
        assert!(Hex32::from_hex("zz").is_err());
    }

    #[test]
    fn scaled_amount_serializes_as_string() {
        let v = ScaledU128(22_000_000_000_000_000_000);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"22000000000000000000\"");
        let back: ScaledU128 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn scaled_amount_accepts_integer_json() {
        let v: ScaledU128 = serde_json::from_str("42").unwrap();
        assert_eq!(v, ScaledU128(42));
    }

    #[test]
    fn payload_bytes_roundtrip_base64() {
        let p = PayloadBytes::new(vec![0u8, 1, 2, 255]);
        let json = serde_json::to_string(&p).unwrap();
        let back: PayloadBytes = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
