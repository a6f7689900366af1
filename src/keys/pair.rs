//! Asymmetric signing key pairs.

use crate::config::KeyAlgorithm;
use crate::error::TokenError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{DecodingKey, EncodingKey};
use ring::rand::SystemRandom;
use ring::signature::{
    EcdsaKeyPair, Ed25519KeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING,
    ECDSA_P384_SHA384_FIXED_SIGNING,
};
use std::fmt;
use zeroize::Zeroizing;

/// One generated key pair. Immutable once built; rotation replaces the whole value.
pub struct SigningKeyPair {
    algorithm: KeyAlgorithm,
    generation: u64,
    created_at: DateTime<Utc>,
    /// Raw public key bytes, base64url without padding
    public_key: String,
    /// PKCS#8 document
    private_key: Zeroizing<Vec<u8>>,
}

impl SigningKeyPair {
    /// Generate a fresh key pair for `algorithm`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::KeyGeneration`] if the system RNG or key parsing fails.
    pub fn generate(algorithm: KeyAlgorithm, generation: u64) -> Result<Self, TokenError> {
        let rng = SystemRandom::new();

        let (private_key, public_key) = match algorithm {
            KeyAlgorithm::EdDSA => {
                let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng)
                    .map_err(|_| TokenError::key_generation("Ed25519 key generation failed"))?;
                let pair = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref())
                    .map_err(|e| TokenError::key_generation(e.to_string()))?;
                (
                    Zeroizing::new(pkcs8.as_ref().to_vec()),
                    pair.public_key().as_ref().to_vec(),
                )
            }
            KeyAlgorithm::ES256 | KeyAlgorithm::ES384 => {
                let signing_alg = if algorithm == KeyAlgorithm::ES256 {
                    &ECDSA_P256_SHA256_FIXED_SIGNING
                } else {
                    &ECDSA_P384_SHA384_FIXED_SIGNING
                };
                let pkcs8 = EcdsaKeyPair::generate_pkcs8(signing_alg, &rng)
                    .map_err(|_| TokenError::key_generation("ECDSA key generation failed"))?;
                let pair = EcdsaKeyPair::from_pkcs8(signing_alg, pkcs8.as_ref(), &rng)
                    .map_err(|e| TokenError::key_generation(e.to_string()))?;
                (
                    Zeroizing::new(pkcs8.as_ref().to_vec()),
                    pair.public_key().as_ref().to_vec(),
                )
            }
        };

        Ok(Self {
            algorithm,
            generation,
            created_at: Utc::now(),
            public_key: URL_SAFE_NO_PAD.encode(public_key),
            private_key,
        })
    }

    /// Signing algorithm.
    #[must_use]
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// Position of this pair in its key ring's rotation sequence.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Generation time.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Public key as stored in verification records.
    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Signing key built from the PKCS#8 document.
    #[must_use]
    pub fn encoding_key(&self) -> EncodingKey {
        match self.algorithm {
            KeyAlgorithm::EdDSA => EncodingKey::from_ed_der(&self.private_key),
            KeyAlgorithm::ES256 | KeyAlgorithm::ES384 => {
                EncodingKey::from_ec_der(&self.private_key)
            }
        }
    }

    /// Decoding key for this pair's public half.
    ///
    /// # Errors
    ///
    /// Fails only if the stored public key is malformed.
    pub fn decoding_key(&self) -> Result<DecodingKey, JwtError> {
        decoding_key(self.algorithm, &self.public_key)
    }
}

impl fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyPair")
            .field("algorithm", &self.algorithm)
            .field("generation", &self.generation)
            .field("created_at", &self.created_at)
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Build a decoding key from a record's public key.
///
/// Ed25519 keys are the 32 raw bytes; ECDSA keys are the uncompressed SEC1
/// point (`0x04 || x || y`). Both are base64url without padding.
///
/// # Errors
///
/// Returns an error if the key is not valid base64url or has the wrong shape.
pub fn decoding_key(algorithm: KeyAlgorithm, public_key: &str) -> Result<DecodingKey, JwtError> {
    match algorithm {
        KeyAlgorithm::EdDSA => DecodingKey::from_ed_components(public_key),
        KeyAlgorithm::ES256 | KeyAlgorithm::ES384 => {
            let coordinate_len = if algorithm == KeyAlgorithm::ES256 { 32 } else { 48 };
            let point = URL_SAFE_NO_PAD
                .decode(public_key)
                .map_err(|_| JwtError::from(ErrorKind::InvalidEcdsaKey))?;

            if point.len() != 1 + 2 * coordinate_len || point[0] != 0x04 {
                return Err(ErrorKind::InvalidEcdsaKey.into());
            }

            let x = URL_SAFE_NO_PAD.encode(&point[1..=coordinate_len]);
            let y = URL_SAFE_NO_PAD.encode(&point[1 + coordinate_len..]);
            DecodingKey::from_ec_components(&x, &y)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ed25519_generation() {
        let pair = SigningKeyPair::generate(KeyAlgorithm::EdDSA, 3).unwrap();
        assert_eq!(pair.generation(), 3);
        assert_eq!(URL_SAFE_NO_PAD.decode(pair.public_key()).unwrap().len(), 32);
        assert!(pair.decoding_key().is_ok());
    }

    #[test]
    fn test_ecdsa_generation() {
        let p256 = SigningKeyPair::generate(KeyAlgorithm::ES256, 1).unwrap();
        assert_eq!(URL_SAFE_NO_PAD.decode(p256.public_key()).unwrap().len(), 65);

        let p384 = SigningKeyPair::generate(KeyAlgorithm::ES384, 1).unwrap();
        assert_eq!(URL_SAFE_NO_PAD.decode(p384.public_key()).unwrap().len(), 97);
        assert!(p384.decoding_key().is_ok());
    }

    #[test]
    fn test_pairs_are_unique() {
        let a = SigningKeyPair::generate(KeyAlgorithm::EdDSA, 1).unwrap();
        let b = SigningKeyPair::generate(KeyAlgorithm::EdDSA, 2).unwrap();
        assert_ne!(a.public_key(), b.public_key());
        assert!(b.created_at() >= a.created_at());
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let pair = SigningKeyPair::generate(KeyAlgorithm::EdDSA, 1).unwrap();
        let debug = format!("{:?}", pair);
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains(pair.public_key()));
    }

    #[test]
    fn test_malformed_ec_key_rejected() {
        assert!(decoding_key(KeyAlgorithm::ES256, "not base64!").is_err());
        let short = URL_SAFE_NO_PAD.encode([4u8; 10]);
        assert!(decoding_key(KeyAlgorithm::ES256, &short).is_err());
    }
}
