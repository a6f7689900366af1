//! Signing key management.

pub mod keyring;
pub mod pair;

pub use keyring::{KeyRing, RotationTask};
pub use pair::{decoding_key, SigningKeyPair};
