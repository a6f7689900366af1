//! Generator configuration.
//!
//! Configuration can be assembled in code through the `with_*` builders or
//! loaded from environment variables with [`Config::from_env`].

use crate::error::TokenError;
use std::env;
use std::time::Duration;

/// Default token lifetime.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 30 * 60;

/// Default periodic key rotation interval.
pub const DEFAULT_ROTATION_INTERVAL_SECS: u64 = 60 * 60;

/// Asymmetric signing algorithm used for both key generation and JWT headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyAlgorithm {
    /// Ed25519 signatures
    #[default]
    EdDSA,
    /// ECDSA with P-256 and SHA-256
    ES256,
    /// ECDSA with P-384 and SHA-384
    ES384,
}

impl KeyAlgorithm {
    /// Parse algorithm from string.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unknown or symmetric algorithms.
    pub fn parse(s: &str) -> Result<Self, TokenError> {
        match s.to_uppercase().as_str() {
            "EDDSA" | "ED25519" => Ok(Self::EdDSA),
            "ES256" => Ok(Self::ES256),
            "ES384" => Ok(Self::ES384),
            _ => Err(TokenError::config(format!("Unsupported JWT algorithm: {}", s))),
        }
    }

    /// Get algorithm name for JWT header.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EdDSA => "EdDSA",
            Self::ES256 => "ES256",
            Self::ES384 => "ES384",
        }
    }

    /// The matching `jsonwebtoken` algorithm.
    #[must_use]
    pub const fn jwt_algorithm(&self) -> jsonwebtoken::Algorithm {
        match self {
            Self::EdDSA => jsonwebtoken::Algorithm::EdDSA,
            Self::ES256 => jsonwebtoken::Algorithm::ES256,
            Self::ES384 => jsonwebtoken::Algorithm::ES384,
        }
    }
}

/// How the issuer hands the record write to the store.
///
/// `Awaited` is the default so that a failed write fails the issuance and
/// the caller never holds a token that has no record behind it. `Detached`
/// trades that for latency: the token comes back before the write lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Wait for the write; store failures fail the issuance.
    #[default]
    Awaited,
    /// Spawn the write and return immediately; failures are logged.
    Detached,
}

impl WriteMode {
    fn parse(s: &str) -> Result<Self, TokenError> {
        match s.to_lowercase().as_str() {
            "awaited" => Ok(Self::Awaited),
            "detached" => Ok(Self::Detached),
            _ => Err(TokenError::config(format!("Invalid RECORD_WRITE_MODE: {}", s))),
        }
    }
}

/// Which key rotation strategy a generator runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationPolicy {
    /// Background task rotates on a fixed interval.
    Interval(Duration),
    /// Rotate after every successful issuance.
    PerIssuance,
}

/// Credential generator configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Issuer identity; a random UUID is generated when absent
    pub generator_id: Option<String>,
    /// Signing algorithm
    pub algorithm: KeyAlgorithm,
    /// Periodic rotation interval; zero rotates on every issuance
    pub key_rotation_interval: Duration,
    /// Default token lifetime
    pub token_lifetime: chrono::Duration,
    /// Record write mode
    pub write_mode: WriteMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generator_id: None,
            algorithm: KeyAlgorithm::default(),
            key_rotation_interval: Duration::from_secs(DEFAULT_ROTATION_INTERVAL_SECS),
            token_lifetime: chrono::Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS),
            write_mode: WriteMode::default(),
        }
    }
}

impl Config {
    /// Set the issuer identity.
    #[must_use]
    pub fn with_generator_id(mut self, id: impl Into<String>) -> Self {
        self.generator_id = Some(id.into());
        self
    }

    /// Set the signing algorithm.
    #[must_use]
    pub const fn with_algorithm(mut self, algorithm: KeyAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the rotation interval. `Duration::ZERO` selects per-issuance rotation.
    #[must_use]
    pub const fn with_key_rotation_interval(mut self, interval: Duration) -> Self {
        self.key_rotation_interval = interval;
        self
    }

    /// Set the default token lifetime.
    #[must_use]
    pub const fn with_token_lifetime(mut self, lifetime: chrono::Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }

    /// Set the record write mode.
    #[must_use]
    pub const fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    /// Rotation policy selected by the configured interval.
    #[must_use]
    pub fn rotation_policy(&self) -> RotationPolicy {
        if self.key_rotation_interval.is_zero() {
            RotationPolicy::PerIssuance
        } else {
            RotationPolicy::Interval(self.key_rotation_interval)
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, TokenError> {
        dotenvy::dotenv().ok();

        let generator_id = env::var("GENERATOR_ID").ok().filter(|id| !id.is_empty());
        let algorithm = KeyAlgorithm::parse(
            &env::var("JWT_ALGORITHM").unwrap_or_else(|_| "EdDSA".to_string()),
        )?;
        let key_rotation_interval = Duration::from_secs(parse_env(
            "KEY_ROTATION_INTERVAL",
            DEFAULT_ROTATION_INTERVAL_SECS,
        )?);
        let token_lifetime =
            chrono::Duration::seconds(parse_env("TOKEN_LIFETIME", DEFAULT_TOKEN_LIFETIME_SECS)?);
        let write_mode = WriteMode::parse(
            &env::var("RECORD_WRITE_MODE").unwrap_or_else(|_| "awaited".to_string()),
        )?;

        Ok(Self {
            generator_id,
            algorithm,
            key_rotation_interval,
            token_lifetime,
            write_mode,
        })
    }
}

/// Parse environment variable with default value.
pub(crate) fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, TokenError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|e| TokenError::config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!(KeyAlgorithm::parse("EdDSA").unwrap(), KeyAlgorithm::EdDSA);
        assert_eq!(KeyAlgorithm::parse("ed25519").unwrap(), KeyAlgorithm::EdDSA);
        assert_eq!(KeyAlgorithm::parse("es256").unwrap(), KeyAlgorithm::ES256);
        assert_eq!(KeyAlgorithm::parse("ES384").unwrap(), KeyAlgorithm::ES384);
        assert!(KeyAlgorithm::parse("HS256").is_err());
        assert!(KeyAlgorithm::parse("RS256").is_err());
    }

    #[test]
    fn test_algorithm_as_str() {
        assert_eq!(KeyAlgorithm::EdDSA.as_str(), "EdDSA");
        assert_eq!(KeyAlgorithm::ES256.as_str(), "ES256");
        assert_eq!(
            KeyAlgorithm::ES384.jwt_algorithm(),
            jsonwebtoken::Algorithm::ES384
        );
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.generator_id.is_none());
        assert_eq!(config.algorithm, KeyAlgorithm::EdDSA);
        assert_eq!(config.token_lifetime, chrono::Duration::minutes(30));
        assert_eq!(config.write_mode, WriteMode::Awaited);
        assert_eq!(
            config.rotation_policy(),
            RotationPolicy::Interval(Duration::from_secs(3600))
        );
    }

    #[test]
    fn test_zero_interval_rotates_per_issuance() {
        let config = Config::default().with_key_rotation_interval(Duration::ZERO);
        assert_eq!(config.rotation_policy(), RotationPolicy::PerIssuance);
    }

    #[test]
    fn test_write_mode_parsing() {
        assert_eq!(WriteMode::parse("Detached").unwrap(), WriteMode::Detached);
        assert_eq!(WriteMode::parse("awaited").unwrap(), WriteMode::Awaited);
        assert!(WriteMode::parse("later").is_err());
    }
}
