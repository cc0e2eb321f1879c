#![forbid(unsafe_code)]

//! Contexts carrying key material for signing and verification.

use dipsign_core::Error;
use dipsign_crypto::SigningKey;
use dipsign_keys::{Key, X509Certificate};

/// Private key and signer certificate for one signing run.
#[derive(Debug)]
pub struct SigningContext {
    pub key: Key,
    pub certificate: X509Certificate,
}

impl SigningContext {
    /// Pair a private key with the certificate to embed in `KeyInfo`.
    ///
    /// A certificate whose public key does not belong to `key` is accepted
    /// with a warning; signatures produced with it will not verify against
    /// the embedded certificate.
    pub fn new(key: Key, certificate: X509Certificate) -> Result<Self, Error> {
        let private = key
            .rsa_private_key()
            .ok_or_else(|| Error::Key("signing requires an RSA private key".into()))?;
        if !certificate.matches_private_key(private) {
            tracing::warn!(
                subject = %certificate.subject_name(),
                "certificate public key does not match the private key"
            );
        }
        Ok(Self { key, certificate })
    }

    pub fn signing_key(&self) -> SigningKey {
        self.key.to_signing_key()
    }
}

/// Settings for signature verification.
#[derive(Debug, Default)]
pub struct VerifyContext {
    /// Verify with this key instead of the certificate in `KeyInfo`.
    pub key: Option<Key>,
}

impl VerifyContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(key: Key) -> Self {
        Self { key: Some(key) }
    }
}
