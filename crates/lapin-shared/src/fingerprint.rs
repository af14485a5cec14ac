//! Duplicate-check fingerprints.
//!
//! A submission's `duplicate_check_key` is a deterministic BLAKE3 digest of
//! the semantically significant answer fields, so equal answers can be
//! detected at insert time without decrypting earlier submissions.

use serde_json::Value;

use crate::constants::KDF_CONTEXT_DUPLICATE_KEY;

/// Compute the duplicate-check key for a submission payload.
///
/// Only the fields named in `significant_fields` participate; the order the
/// caller lists them in does not matter.  A field absent from `data` hashes
/// as JSON `null`, so "no answer" and an explicit null answer compare equal.
/// Returns 64 lowercase hex characters.
pub fn duplicate_check_key(data: &Value, significant_fields: &[&str]) -> String {
    let mut fields: Vec<&str> = significant_fields.to_vec();
    fields.sort_unstable();
    fields.dedup();

    let mut hasher = blake3::Hasher::new_derive_key(KDF_CONTEXT_DUPLICATE_KEY);
    for field in fields {
        let answer = data.get(field).unwrap_or(&Value::Null);
        // serialization of a Value is deterministic, key order preserved
        let encoded = serde_json::to_string(answer).expect("JSON value always serializes");

        hasher.update(field.as_bytes());
        hasher.update(&[0]);
        hasher.update(encoded.as_bytes());
        hasher.update(&[0]);
    }

    hex::encode(hasher.finalize().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equal_answers_equal_key() {
        let a = json!({"email": "a@example.com", "name": "Ann", "comment": "hi"});
        let b = json!({"email": "a@example.com", "name": "Ann", "comment": "different"});

        // comment is not significant, so the keys match
        assert_eq!(
            duplicate_check_key(&a, &["email", "name"]),
            duplicate_check_key(&b, &["email", "name"]),
        );
    }

    #[test]
    fn differing_answer_changes_key() {
        let a = json!({"email": "a@example.com"});
        let b = json!({"email": "b@example.com"});

        assert_ne!(
            duplicate_check_key(&a, &["email"]),
            duplicate_check_key(&b, &["email"]),
        );
    }

    #[test]
    fn field_order_does_not_matter() {
        let data = json!({"email": "a@example.com", "phone": "555"});

        assert_eq!(
            duplicate_check_key(&data, &["email", "phone"]),
            duplicate_check_key(&data, &["phone", "email"]),
        );
    }

    #[test]
    fn missing_field_hashes_as_null() {
        let absent = json!({"email": "a@example.com"});
        let explicit = json!({"email": "a@example.com", "phone": null});

        assert_eq!(
            duplicate_check_key(&absent, &["email", "phone"]),
            duplicate_check_key(&explicit, &["email", "phone"]),
        );
    }

    #[test]
    fn key_is_lowercase_hex() {
        let key = duplicate_check_key(&json!({"a": 1}), &["a"]);
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
