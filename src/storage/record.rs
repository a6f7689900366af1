//! Verification record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Server-side ground truth for verifying one issued token.
///
/// `id` doubles as the token's `kid`. The identity fields are optional
/// because records can come back from an external store incomplete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    /// Record id, also the token `kid`
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Token subject
    pub subject: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Issuing generator id
    pub issuer: Option<String>,
    /// Public key of the pair that signed the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Issue time
    pub issued_at: DateTime<Utc>,
    /// Token expiry
    pub expires_at: DateTime<Utc>,
}

impl VerificationRecord {
    /// Creates a complete record.
    pub fn new(
        id: String,
        subject: Value,
        issuer: String,
        key: String,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        VerificationRecord {
            id,
            subject: Some(subject),
            issuer: Some(issuer),
            key: Some(key),
            issued_at,
            expires_at,
        }
    }

    /// Names of the identity fields that are absent, empty or null.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.key.as_deref().map_or(true, str::is_empty) {
            missing.push("key");
        }
        if self.issuer.as_deref().map_or(true, str::is_empty) {
            missing.push("issuer");
        }
        if self.subject.as_ref().map_or(true, is_blank) {
            missing.push("subject");
        }
        missing
    }

    /// True when no identity field is missing.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Expired once `now` reaches `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
