//! Simulated A1 policy ingestion: decoding and validation.
//!
//! Policy payloads are JSON documents with the same shape the HTTP surface
//! accepts. Omitted fields get defaults relative to the decode time.

use crate::error::Cause;
use crate::models::A1Policy;
use serde::Deserialize;
use std::collections::HashMap;
use time::{Duration, OffsetDateTime};

const DEFAULT_VALIDITY: Duration = Duration::hours(1);

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PolicyDocument {
    pub policy_id: String,
    #[serde(rename = "type")]
    pub policy_type: String,
    pub parameters: HashMap<String, serde_json::Value>,
    pub scope: Vec<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub valid_from: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub valid_until: Option<OffsetDateTime>,
}

impl PolicyDocument {
    pub fn into_policy(self, now: OffsetDateTime) -> A1Policy {
        A1Policy {
            policy_id: self.policy_id,
            policy_type: self.policy_type,
            parameters: self.parameters,
            scope: self.scope,
            valid_from: self.valid_from.unwrap_or(now),
            valid_until: self.valid_until.unwrap_or(now + DEFAULT_VALIDITY),
        }
    }
}

pub fn decode_policy(payload: &[u8], now: OffsetDateTime) -> Result<A1Policy, Cause> {
    let doc: PolicyDocument = serde_json::from_slice(payload).map_err(Cause::MalformedPolicy)?;
    Ok(doc.into_policy(now))
}

/// Expiry is only checked here, at submission time.
pub fn validate_policy(policy: &A1Policy, now: OffsetDateTime) -> Result<(), Cause> {
    if policy.policy_id.is_empty() {
        return Err(Cause::MissingPolicyId);
    }
    if policy.policy_type.is_empty() {
        return Err(Cause::MissingPolicyType);
    }
    if now > policy.valid_until {
        return Err(Cause::PolicyExpired(policy.valid_until));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2025-03-01 12:00 UTC);

    #[test]
    fn test_decode_full_document() {
        let payload = br#"{
            "policy_id": "ts-1",
            "type": "TrafficSteeringPolicy",
            "parameters": {"load_threshold": 80.0, "handover_preference": "PREFER"},
            "scope": ["cell-1", "cell-2"],
            "valid_from": "2025-03-01T11:00:00Z",
            "valid_until": "2025-03-01T14:00:00Z"
        }"#;
        let p = decode_policy(payload, NOW).unwrap();
        assert_eq!(p.policy_id, "ts-1");
        assert_eq!(p.policy_type, "TrafficSteeringPolicy");
        assert_eq!(p.parameters["handover_preference"], "PREFER");
        assert_eq!(p.scope, vec!["cell-1", "cell-2"]);
        assert_eq!(p.valid_from, datetime!(2025-03-01 11:00 UTC));
        assert_eq!(p.valid_until, datetime!(2025-03-01 14:00 UTC));
    }

    #[test]
    fn test_decode_fills_defaults() {
        let p = decode_policy(br#"{"policy_id":"ts-2","type":"QoS"}"#, NOW).unwrap();
        assert_eq!(p.valid_from, NOW);
        assert_eq!(p.valid_until, NOW + Duration::hours(1));
        assert!(p.parameters.is_empty());
        assert!(p.scope.is_empty());
    }

    #[test]
    fn test_validity_window_defaults_from_decode_time() {
        let p = decode_policy(br#"{"policy_id":"ts-3","type":"QoS","valid_from":"2025-02-01T00:00:00Z"}"#, NOW).unwrap();
        assert_eq!(p.valid_from, datetime!(2025-02-01 0:00 UTC));
        assert_eq!(p.valid_until, NOW + Duration::hours(1));
        assert!(validate_policy(&p, NOW).is_ok());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_policy(&[0xff, 0x00, 0x13], NOW).unwrap_err();
        assert!(matches!(err, Cause::MalformedPolicy(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_validation() {
        let ok = PolicyDocument {
            policy_id: "p".into(),
            policy_type: "X".into(),
            ..Default::default()
        }
        .into_policy(NOW);
        assert!(validate_policy(&ok, NOW).is_ok());

        let mut missing_id = ok.clone();
        missing_id.policy_id.clear();
        assert!(matches!(validate_policy(&missing_id, NOW), Err(Cause::MissingPolicyId)));

        let mut missing_type = ok.clone();
        missing_type.policy_type.clear();
        assert!(matches!(validate_policy(&missing_type, NOW), Err(Cause::MissingPolicyType)));

        let mut expired = ok;
        expired.valid_until = NOW - Duration::seconds(1);
        assert!(matches!(validate_policy(&expired, NOW), Err(Cause::PolicyExpired(_))));
    }
}
