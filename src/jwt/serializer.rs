//! Compact JWS encoding.

use crate::config::KeyAlgorithm;
use crate::error::TokenError;
use crate::jwt::claims::Claims;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{crypto, decode_header, encode, DecodingKey, EncodingKey, Header};

/// Compact JWS encoding and decoding for [`Claims`].
///
/// Signature checks only accept the configured algorithm; claim checks are
/// left to the caller.
pub struct JwtSerializer {
    algorithm: KeyAlgorithm,
}

impl JwtSerializer {
    /// Creates a serializer bound to `algorithm`.
    pub fn new(algorithm: KeyAlgorithm) -> Self {
        JwtSerializer { algorithm }
    }

    /// The algorithm used for signing and accepted when verifying.
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// Signs `claims`, setting `kid` in the header when given.
    pub fn serialize(
        &self,
        claims: &Claims,
        key: &EncodingKey,
        key_id: Option<&str>,
    ) -> Result<String, TokenError> {
        let mut header = Header::new(self.algorithm.jwt_algorithm());
        if let Some(kid) = key_id {
            header.kid = Some(kid.to_string());
        }

        encode(&header, claims, key).map_err(|e| TokenError::signing(e.to_string()))
    }

    /// Splits the token and decodes header and payload without any signature check.
    pub fn decode_unverified(&self, token: &str) -> Result<(Header, Claims), JwtError> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(ErrorKind::InvalidToken.into());
        }

        let header = decode_header(token)?;
        let payload = URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|_| JwtError::from(ErrorKind::InvalidToken))?;
        let claims = serde_json::from_slice(&payload)?;

        Ok((header, claims))
    }

    /// Checks the header algorithm and the signature over `header.payload`.
    pub fn verify_signature(&self, token: &str, key: &DecodingKey) -> Result<(), JwtError> {
        let (message, signature) = token
            .rsplit_once('.')
            .ok_or_else(|| JwtError::from(ErrorKind::InvalidToken))?;

        let header = decode_header(token)?;
        if header.alg != self.algorithm.jwt_algorithm() {
            return Err(ErrorKind::InvalidAlgorithm.into());
        }

        if crypto::verify(signature, message.as_bytes(), key, header.alg)? {
            Ok(())
        } else {
            Err(ErrorKind::InvalidSignature.into())
        }
    }

    /// Verifies the signature, then decodes the payload.
    pub fn deserialize(&self, token: &str, key: &DecodingKey) -> Result<Claims, JwtError> {
        self.verify_signature(token, key)?;
        let (_, claims) = self.decode_unverified(token)?;
        Ok(claims)
    }
}
