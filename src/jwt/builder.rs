//! Builder for [`Claims`].

use crate::error::TokenError;
use crate::jwt::claims::Claims;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Assembles a [`Claims`] value. Subject and expiry are required.
pub struct ClaimsBuilder {
    issuer: String,
    subject: Option<Value>,
    issued_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    custom_claims: Map<String, Value>,
}

impl ClaimsBuilder {
    /// Starts a claim set for `issuer`.
    pub fn new(issuer: String) -> Self {
        ClaimsBuilder {
            issuer,
            subject: None,
            issued_at: None,
            expires_at: None,
            custom_claims: Map::new(),
        }
    }

    /// Sets the subject.
    pub fn subject(mut self, subject: Value) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Sets the issue time. Defaults to now.
    pub fn issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    /// Sets the expiry time.
    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Adds one custom claim.
    pub fn custom_claim(mut self, key: String, value: Value) -> Self {
        self.custom_claims.insert(key, value);
        self
    }

    /// Adds custom claims in bulk.
    pub fn custom_claims(mut self, claims: Map<String, Value>) -> Self {
        self.custom_claims.extend(claims);
        self
    }

    /// Builds the claim set. Reserved names in the custom claims are dropped.
    pub fn build(self) -> Result<Claims, TokenError> {
        let subject = self
            .subject
            .ok_or_else(|| TokenError::internal("Subject is required"))?;
        let issued_at = self.issued_at.unwrap_or_else(Utc::now);
        let expires_at = self
            .expires_at
            .ok_or_else(|| TokenError::internal("Expiry is required"))?;

        let mut claims = Claims::new(
            self.issuer,
            subject,
            issued_at.timestamp(),
            expires_at.timestamp(),
        );

        for (key, value) in self.custom_claims {
            claims = claims.with_custom_claim(key, value);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_basic() {
        let now = Utc::now();
        let claims = ClaimsBuilder::new("issuer".to_string())
            .subject(json!("user-123"))
            .issued_at(now)
            .expires_at(now + chrono::Duration::minutes(5))
            .custom_claim("tenant".to_string(), json!("acme"))
            .build()
            .unwrap();

        assert_eq!(claims.iss, "issuer");
        assert_eq!(claims.sub, json!("user-123"));
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp - claims.iat, 300);
        assert_eq!(claims.custom_claim("tenant"), Some(&json!("acme")));
    }

    #[test]
    fn test_builder_missing_subject() {
        let result = ClaimsBuilder::new("issuer".to_string())
            .expires_at(Utc::now())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_protects_reserved_claims() {
        let now = Utc::now();
        let mut payload = Map::new();
        payload.insert("iss".to_string(), json!("someone-else"));
        payload.insert("iat".to_string(), json!(0));

        let claims = ClaimsBuilder::new("issuer".to_string())
            .subject(json!(42))
            .issued_at(now)
            .expires_at(now)
            .custom_claims(payload)
            .build()
            .unwrap();

        assert_eq!(claims.iss, "issuer");
        assert_eq!(claims.iat, now.timestamp());
        assert!(claims.custom_claims().is_empty());
    }
}
