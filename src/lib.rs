//! Credential Service library.
//!
//! Issues short-lived signed bearer tokens bound to a subject, an issuer
//! identity and a rotating asymmetric key pair, and verifies them against a
//! server-side record that holds the key each token was signed with.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod generator;
pub mod issuer;
pub mod jwt;
pub mod keys;
pub mod metrics;
pub mod storage;
pub mod telemetry;
pub mod verifier;

// Re-exports for convenience
pub use config::{Config, KeyAlgorithm, RotationPolicy, WriteMode};
pub use error::{StoreError, TokenError};
pub use generator::TokenGenerator;
pub use issuer::{IssueOptions, IssuedToken, TokenIssuer};
pub use keys::{KeyRing, RotationTask, SigningKeyPair};
pub use storage::{MemoryRecordStore, RecordStore, VerificationRecord};
pub use verifier::{
    TokenVerifier, VerificationOutcome, VerificationStatus, VerifiedToken, VerifyOptions,
};
