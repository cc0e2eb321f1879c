#![forbid(unsafe_code)]

//! Key types.

use dipsign_crypto::SigningKey;

/// An RSA key, optionally carrying the private half.
pub struct Key {
    /// Optional name, e.g. the file it was loaded from.
    pub name: Option<String>,
    pub private: Option<rsa::RsaPrivateKey>,
    pub public: rsa::RsaPublicKey,
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use rsa::traits::PublicKeyParts;
        let kind = if self.private.is_some() { "RSA private+public key" } else { "RSA public key" };
        f.debug_struct("Key")
            .field("name", &self.name)
            .field("kind", &kind)
            .field("bits", &(self.public.size() * 8))
            .finish()
    }
}

impl Key {
    /// Wrap a private key; the public half is derived from it.
    pub fn from_private(private: rsa::RsaPrivateKey) -> Self {
        let public = private.to_public_key();
        Self { name: None, private: Some(private), public }
    }

    /// Wrap a public key usable for verification only.
    pub fn from_public(public: rsa::RsaPublicKey) -> Self {
        Self { name: None, private: None, public }
    }

    /// Set the key name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Convert to a `SigningKey` for use with crypto algorithms.
    pub fn to_signing_key(&self) -> SigningKey {
        match &self.private {
            Some(pk) => SigningKey::Rsa(pk.clone()),
            None => SigningKey::RsaPublic(self.public.clone()),
        }
    }

    pub fn rsa_public_key(&self) -> &rsa::RsaPublicKey {
        &self.public
    }

    pub fn rsa_private_key(&self) -> Option<&rsa::RsaPrivateKey> {
        self.private.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkcs8::DecodePrivateKey;

    const KEY_PEM: &str = include_str!("../../../test-data/keys/rsa-2048-key.pem");

    #[test]
    fn test_private_and_public_views() {
        let private = rsa::RsaPrivateKey::from_pkcs8_pem(KEY_PEM).unwrap();
        let key = Key::from_private(private).with_name("signer");
        assert!(matches!(key.to_signing_key(), SigningKey::Rsa(_)));
        assert_eq!(
            format!("{key:?}"),
            r#"Key { name: Some("signer"), kind: "RSA private+public key", bits: 2048 }"#
        );

        let public = Key::from_public(key.public.clone());
        assert!(public.rsa_private_key().is_none());
        assert!(matches!(public.to_signing_key(), SigningKey::RsaPublic(_)));
    }
}
