//! Audit log constants and helpers for dashboard changes.
//!
//! Every create, update and delete call writes one entry per dashboard.
//! Entries form a SHA-256 hash chain so tampering with a stored row breaks
//! every later hash.

use serde::Serialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::types::DbId;

// ---------------------------------------------------------------------------
// Actions and resources
// ---------------------------------------------------------------------------

pub mod actions {
    pub const ADD: &str = "add";
    pub const UPDATE: &str = "update";
    pub const DELETE: &str = "delete";
}

pub mod resources {
    pub const DASHBOARD: &str = "dashboard";
    pub const TEMPLATE_DASHBOARD: &str = "template_dashboard";
}

// ---------------------------------------------------------------------------
// Integrity hash
// ---------------------------------------------------------------------------

/// Seed used in place of the previous hash for the first entry of the chain.
const CHAIN_SEED: &str = "PANORAMA_AUDIT_CHAIN_V1";

/// Hex-encoded SHA-256 digest.
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Hash of one entry chained onto `prev_hash` (`None` for the first entry).
pub fn compute_integrity_hash(prev_hash: Option<&str>, entry_data: &str) -> String {
    let prev = prev_hash.unwrap_or(CHAIN_SEED);
    sha256_hex(format!("{prev}|{entry_data}").as_bytes())
}

/// Canonical string an entry's hash is computed over.
pub fn entry_payload(
    user_id: DbId,
    action: &str,
    resource: &str,
    resource_id: DbId,
    details: &Value,
) -> String {
    json!({
        "user_id": user_id,
        "action": action,
        "resource": resource,
        "resource_id": resource_id,
        "details": details,
    })
    .to_string()
}

// ---------------------------------------------------------------------------
// Details
// ---------------------------------------------------------------------------

/// Keys whose values never reach the audit log.
pub const SENSITIVE_FIELDS: &[&str] = &["password", "token", "secret", "api_key", "authorization"];

/// Replace values of sensitive keys with `"[REDACTED]"`, recursively.
pub fn redact_sensitive_fields(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, val)| {
                    let lower = key.to_lowercase();
                    let val = if SENSITIVE_FIELDS.iter().any(|f| lower.contains(f)) {
                        Value::String("[REDACTED]".to_string())
                    } else {
                        redact_sensitive_fields(val)
                    };
                    (key.clone(), val)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_fields).collect()),
        other => other.clone(),
    }
}

/// `{"before": .., "after": ..}` with sensitive keys redacted. Missing
/// sides serialize as `null`.
pub fn build_details(before: Option<&Value>, after: Option<&Value>) -> Value {
    let side = |v: Option<&Value>| v.map(redact_sensitive_fields).unwrap_or(Value::Null);
    json!({ "before": side(before), "after": side(after) })
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Outcome of re-computing the hash chain over stored entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainCheck {
    /// Entries whose hash matched, counted up to the first break.
    pub verified: usize,
    /// Id of the first entry whose stored hash does not match.
    pub first_break: Option<DbId>,
}

/// Walk entries in chain order as `(id, payload, stored hash)`.
pub fn verify_chain<I, P, H>(entries: I) -> ChainCheck
where
    I: IntoIterator<Item = (DbId, P, H)>,
    P: AsRef<str>,
    H: AsRef<str>,
{
    let mut prev: Option<String> = None;
    let mut verified = 0;

    for (id, payload, stored) in entries {
        let expected = compute_integrity_hash(prev.as_deref(), payload.as_ref());
        if expected != stored.as_ref() {
            return ChainCheck {
                verified,
                first_break: Some(id),
            };
        }
        verified += 1;
        prev = Some(expected);
    }

    ChainCheck {
        verified,
        first_break: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_produces_known_hash() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn first_entry_uses_seed() {
        assert_eq!(
            compute_integrity_hash(None, "data"),
            compute_integrity_hash(Some(CHAIN_SEED), "data")
        );
    }

    #[test]
    fn chain_depends_on_previous_hash() {
        let first = compute_integrity_hash(None, "a");
        let second = compute_integrity_hash(Some(&first), "b");
        assert_ne!(second, compute_integrity_hash(None, "b"));
        assert_eq!(second.len(), 64);
    }

    #[test]
    fn nested_sensitive_keys_are_redacted() {
        let value = json!({
            "name": "Ops",
            "widgets": [{ "fields": { "api_key": "abc" } }],
            "Authorization": "Bearer x"
        });
        let redacted = redact_sensitive_fields(&value);
        assert_eq!(redacted["name"], "Ops");
        assert_eq!(redacted["widgets"][0]["fields"]["api_key"], "[REDACTED]");
        assert_eq!(redacted["Authorization"], "[REDACTED]");
    }

    #[test]
    fn details_keep_both_sides() {
        let before = json!({ "name": "Old" });
        let details = build_details(Some(&before), None);
        assert_eq!(details["before"]["name"], "Old");
        assert!(details["after"].is_null());
    }

    #[test]
    fn payload_is_stable() {
        let details = json!({ "before": null });
        assert_eq!(
            entry_payload(1, actions::ADD, resources::DASHBOARD, 5, &details),
            entry_payload(1, actions::ADD, resources::DASHBOARD, 5, &details)
        );
    }

    #[test]
    fn verification_finds_the_first_tampered_entry() {
        let first = compute_integrity_hash(None, "a");
        let second = compute_integrity_hash(Some(&first), "b");
        let third = compute_integrity_hash(Some(&second), "c");

        let intact = verify_chain([
            (1, "a", first.as_str()),
            (2, "b", second.as_str()),
            (3, "c", third.as_str()),
        ]);
        assert_eq!(intact.verified, 3);
        assert_eq!(intact.first_break, None);

        let tampered = verify_chain([
            (1, "a", first.as_str()),
            (2, "B", second.as_str()),
            (3, "c", third.as_str()),
        ]);
        assert_eq!(tampered.verified, 1);
        assert_eq!(tampered.first_break, Some(2));
    }
}
