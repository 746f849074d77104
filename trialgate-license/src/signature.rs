//! License token verification.
//!
//! A license token is the standard-base64 encoding of an ASN.1 DER ECDSA
//! P-256 signature over the SHA-256 digest of the client identity string.
//! The public key is distributed as base64-encoded PEM (X.509
//! SubjectPublicKeyInfo) and is the only thing that makes a token
//! trustworthy.
//!
//! Malformed input is an error; a well-formed token that does not verify is
//! `Ok(false)`. Callers rely on the two being distinct.

use crate::error::{LicenseError, LicenseResult};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use p256::ecdsa::signature::hazmat::PrehashVerifier;
use p256::ecdsa::{Signature, VerifyingKey};
use p256::pkcs8::DecodePublicKey;
use sha2::{Digest, Sha256};

/// A parsed public key that license tokens are checked against.
#[derive(Debug, Clone)]
pub struct TrustAnchor {
    key: VerifyingKey,
}

impl TrustAnchor {
    /// Parses a base64-encoded PEM public key.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::KeyFormat`] if the base64, the PEM block or
    /// the SubjectPublicKeyInfo cannot be decoded.
    pub fn from_base64_pem(encoded: &str) -> LicenseResult<Self> {
        let pem_bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| LicenseError::KeyFormat(format!("decoding public key: {e}")))?;
        let pem = std::str::from_utf8(&pem_bytes)
            .map_err(|_| LicenseError::KeyFormat("no PEM data found".to_string()))?;
        Self::from_pem(pem)
    }

    /// Parses a PEM `PUBLIC KEY` block.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::KeyFormat`] if the block is not an ECDSA
    /// P-256 SubjectPublicKeyInfo.
    pub fn from_pem(pem: &str) -> LicenseResult<Self> {
        let key = VerifyingKey::from_public_key_pem(pem.trim())
            .map_err(|e| LicenseError::KeyFormat(format!("parsing public key: {e}")))?;
        Ok(Self { key })
    }

    /// Wraps an already parsed key.
    #[must_use]
    pub fn from_verifying_key(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// Checks `signature_b64` against the SHA-256 digest of `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::SignatureFormat`] if the token is not valid
    /// base64. Anything that decodes is answered with `Ok(true)` or
    /// `Ok(false)`.
    pub fn verify(&self, payload: &str, signature_b64: &str) -> LicenseResult<bool> {
        let sig_bytes = BASE64
            .decode(signature_b64)
            .map_err(|e| LicenseError::SignatureFormat(e.to_string()))?;

        // Undecodable DER is a signature that does not verify.
        let Ok(signature) = Signature::from_der(&sig_bytes) else {
            return Ok(false);
        };

        let digest = Sha256::digest(payload.as_bytes());
        Ok(self.key.verify_prehash(digest.as_slice(), &signature).is_ok())
    }
}

/// One-shot verification with a base64-encoded PEM public key.
///
/// # Errors
///
/// [`LicenseError::KeyFormat`] for a bad key, [`LicenseError::SignatureFormat`]
/// for a token that is not base64.
pub fn verify_signature(
    payload: &str,
    signature_b64: &str,
    public_key_b64_pem: &str,
) -> LicenseResult<bool> {
    TrustAnchor::from_base64_pem(public_key_b64_pem)?.verify(payload, signature_b64)
}
