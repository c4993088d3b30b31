#![forbid(unsafe_code)]

use crate::types::Hex32;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum CanonicalizeError {
    #[error("serde error: {0}")]
    Serde(String),
}

/// Deterministic canonical JSON bytes.
///
/// Strategy:
/// - Convert to `serde_json::Value`
/// - Recursively sort object keys (stable)
/// - Serialize to compact JSON bytes
pub fn canonical_json_bytes<T: Serialize>(v: &T) -> Result<Vec<u8>, CanonicalizeError> {
    let mut value = serde_json::to_value(v).map_err(|e| CanonicalizeError::Serde(e.to_string()))?;
    canonical_json_sort_in_place(&mut value);
    serde_json::to_vec(&value).map_err(|e| CanonicalizeError::Serde(e.to_string()))
}

/// Content address: `blake3(canonical_json_bytes(v))`.
///
/// Field order inside `v` does not matter; any differing field value yields
/// a different hash.
pub fn content_hash32<T: Serialize>(v: &T) -> Result<Hex32, CanonicalizeError> {
    let bytes = canonical_json_bytes(v)?;
    let mut out = [0u8; 32];
    out.copy_from_slice(blake3::hash(&bytes).as_bytes());
    Ok(Hex32(out))
}

fn canonical_json_sort_in_place(v: &mut serde_json::Value) {
    match v {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<(String, serde_json::Value)> =
                std::mem::take(map).into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            for (_, val) in entries.iter_mut() {
                canonical_json_sort_in_place(val);
            }
            let mut new_map = serde_json::Map::new();
            for (k, val) in entries {
                new_map.insert(k, val);
            }
            *map = new_map;
        }
        serde_json::Value::Array(arr) => {
            for x in arr.iter_mut() {
                canonical_json_sort_in_place(x);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct A {
        b: u32,
        a: String,
    }

    #[derive(Serialize)]
    struct AReordered {
        a: String,
        b: u32,
    }

    #[test]
    fn canonical_bytes_sort_keys() {
        let x = A {
            b: 2,
            a: "x".to_string(),
        };
        let bytes = canonical_json_bytes(&x).unwrap();
        assert_eq!(bytes, br#"{"a":"x","b":2}"#);
    }

    #[test]
    fn content_hash_is_field_order_insensitive_and_value_sensitive() {
        let h1 = content_hash32(&A {
            b: 2,
            a: "x".to_string(),
        })
        .unwrap();
        let h2 = content_hash32(&AReordered {
            a: "x".to_string(),
            b: 2,
        })
        .unwrap();
        let h3 = content_hash32(&A {
            b: 3,
            a: "x".to_string(),
        })
        .unwrap();
        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
    }
}
