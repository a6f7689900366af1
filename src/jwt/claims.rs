//! Token claim set and the reserved-claim rule.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claims owned by the issuer. Custom claims can never replace them.
pub const RESERVED_CLAIMS: [&str; 4] = ["sub", "iss", "iat", "exp"];

/// Returns true if `name` is one of [`RESERVED_CLAIMS`].
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    RESERVED_CLAIMS.contains(&name)
}

/// Signed token payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (any JSON value)
    pub sub: Value,
    /// Issuer (generator id)
    pub iss: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,

    // Never holds a reserved name: `with_custom_claim` filters them and
    // deserialization routes them to the fields above.
    #[serde(flatten)]
    custom: Map<String, Value>,
}

impl Claims {
    /// Creates a claim set with no custom claims.
    pub fn new(issuer: String, subject: Value, issued_at: i64, expires_at: i64) -> Self {
        Claims {
            sub: subject,
            iss: issuer,
            iat: issued_at,
            exp: expires_at,
            custom: Map::new(),
        }
    }

    /// Adds a custom claim unless `key` is reserved, in which case the claim
    /// is dropped.
    pub fn with_custom_claim(mut self, key: String, value: Value) -> Self {
        if is_reserved(&key) {
            tracing::debug!(claim = %key, "Dropping custom claim that collides with a reserved claim");
        } else {
            self.custom.insert(key, value);
        }
        self
    }

    /// Looks up a custom claim.
    pub fn custom_claim(&self, key: &str) -> Option<&Value> {
        self.custom.get(key)
    }

    /// All custom claims.
    pub fn custom_claims(&self) -> &Map<String, Value> {
        &self.custom
    }

    /// Expired once `timestamp` reaches `exp`.
    pub fn is_expired_at(&self, timestamp: i64) -> bool {
        timestamp >= self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_claims_creation() {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims::new("issuer-1".to_string(), json!("user-123"), now, now + 900);

        assert_eq!(claims.iss, "issuer-1");
        assert_eq!(claims.sub, json!("user-123"));
        assert!(!claims.is_expired_at(now));
        assert!(claims.is_expired_at(now + 900));
    }

    #[test]
    fn test_reserved_custom_claims_dropped() {
        let claims = Claims::new("issuer-1".to_string(), json!("user-123"), 10, 20)
            .with_custom_claim("sub".to_string(), json!("attacker"))
            .with_custom_claim("exp".to_string(), json!(i64::MAX))
            .with_custom_claim("role".to_string(), json!("admin"));

        assert_eq!(claims.sub, json!("user-123"));
        assert_eq!(claims.exp, 20);
        assert_eq!(claims.custom_claims().len(), 1);
        assert_eq!(claims.custom_claim("role"), Some(&json!("admin")));
    }

    #[test]
    fn test_flattened_serialization() {
        let claims = Claims::new("issuer-1".to_string(), json!({"id": 7}), 10, 20)
            .with_custom_claim("scope".to_string(), json!(["read"]));

        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(
            value,
            json!({"sub": {"id": 7}, "iss": "issuer-1", "iat": 10, "exp": 20, "scope": ["read"]})
        );

        let decoded: Claims = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, claims);
        assert!(decoded.custom_claim("sub").is_none());
    }
}
