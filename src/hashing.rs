//! Hashing - manifest fingerprints
//!
//! `job_hash` fingerprints what was asked for (validated paper, image bytes,
//! engine version); `package_hash` fingerprints the `.docx` that came out.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data).iter().fold(String::with_capacity(64), |mut out, b| {
        let _ = write!(out, "{:02x}", b);
        out
    })
}

// Object keys are re-inserted in sorted order so the digest does not depend
// on serde_json's map representation.
fn key_ordered(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, key_ordered(v)))
                .collect::<BTreeMap<_, _>>()
                .into_iter()
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(key_ordered).collect()),
        other => other,
    }
}

/// sha256 over `<compact key-ordered JSON>:<image digests, comma-joined>:<engine version>`
pub fn compute_job_hash(
    document: &impl Serialize,
    images: &[Vec<u8>],
    engine_version: &str,
) -> Result<String, serde_json::Error> {
    let paper = serde_json::to_string(&key_ordered(serde_json::to_value(document)?))?;
    let digests: Vec<_> = images.iter().map(|i| sha256_hex(i)).collect();
    Ok(sha256_hex(format!("{}:{}:{}", paper, digests.join(","), engine_version).as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_order_is_normalised() {
        let ordered = key_ordered(json!({"z": 1, "a": {"y": 1, "b": [{"d": 1, "c": 2}]}}));
        assert_eq!(
            serde_json::to_string(&ordered).unwrap(),
            r#"{"a":{"b":[{"c":2,"d":1}],"y":1},"z":1}"#
        );
    }

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_job_hash_covers_images_and_version() {
        let doc = json!({"title": "T"});
        let base = compute_job_hash(&doc, &[vec![1, 2, 3]], "1.0.0").unwrap();
        assert_eq!(base, compute_job_hash(&doc, &[vec![1, 2, 3]], "1.0.0").unwrap());
        assert_ne!(base, compute_job_hash(&doc, &[vec![1, 2, 4]], "1.0.0").unwrap());
        assert_ne!(base, compute_job_hash(&doc, &[vec![1, 2, 3]], "1.0.1").unwrap());
    }
}
