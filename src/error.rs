//! Error types for credential issuance and record storage.
//!
//! Verification never surfaces these: the verifier collapses every failure
//! into a [`crate::verifier::VerificationOutcome`].

use thiserror::Error;

/// Errors raised while issuing tokens or managing keys.
#[derive(Error, Debug)]
pub enum TokenError {
    /// Key pair generation failed.
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// Token encoding or signing failed.
    #[error("JWT signing error: {0}")]
    Signing(String),

    /// An awaited record write failed.
    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid configuration or options.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TokenError {
    /// Create a key generation error.
    #[must_use]
    pub fn key_generation(msg: impl Into<String>) -> Self {
        TokenError::KeyGeneration(msg.into())
    }

    /// Create a signing error.
    #[must_use]
    pub fn signing(msg: impl Into<String>) -> Self {
        TokenError::Signing(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        TokenError::Config(msg.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        TokenError::Internal(msg.into())
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        TokenError::Signing(err.to_string())
    }
}

/// Errors raised by [`crate::storage::RecordStore`] implementations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backend could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Backend failure that will not go away on retry.
    #[error("Internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Check if the failure is transient.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }

    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        StoreError::Unavailable(msg.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        StoreError::Internal(msg.into())
    }
}
