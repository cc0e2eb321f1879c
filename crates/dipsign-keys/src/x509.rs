#![forbid(unsafe_code)]

//! X.509 signer certificates.

use base64::Engine;
use der::{Decode, Encode};
use dipsign_core::Error;
use x509_cert::Certificate;

/// A parsed certificate together with its DER encoding and RSA public key.
#[derive(Clone)]
pub struct X509Certificate {
    der: Vec<u8>,
    cert: Certificate,
    public_key: rsa::RsaPublicKey,
}

impl std::fmt::Debug for X509Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X509Certificate")
            .field("subject", &self.subject_name())
            .field("der_len", &self.der.len())
            .finish()
    }
}

impl X509Certificate {
    /// Parse a DER-encoded certificate. The subject public key must be RSA.
    pub fn from_der(data: &[u8]) -> Result<Self, Error> {
        use spki::DecodePublicKey;

        let cert = Certificate::from_der(data)
            .map_err(|e| Error::Certificate(format!("failed to parse X.509 certificate: {e}")))?;
        let spki_der = cert
            .tbs_certificate
            .subject_public_key_info
            .to_der()
            .map_err(|e| Error::Certificate(format!("failed to encode SPKI: {e}")))?;
        let public_key = rsa::RsaPublicKey::from_public_key_der(&spki_der)
            .map_err(|_| Error::Certificate("certificate public key is not RSA".into()))?;

        Ok(Self {
            der: data.to_vec(),
            cert,
            public_key,
        })
    }

    /// Subject distinguished name in RFC 4514 string form.
    pub fn subject_name(&self) -> String {
        self.cert.tbs_certificate.subject.to_string()
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Base64 of the DER bytes, as carried in `<ds:X509Certificate>`.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.der)
    }

    pub fn public_key(&self) -> &rsa::RsaPublicKey {
        &self.public_key
    }

    /// Whether the certificate's public key belongs to `private`.
    pub fn matches_private_key(&self, private: &rsa::RsaPrivateKey) -> bool {
        self.public_key == private.to_public_key()
    }
}
