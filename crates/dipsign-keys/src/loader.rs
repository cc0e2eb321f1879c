#![forbid(unsafe_code)]

//! Key and certificate loading from PEM and DER.

use std::path::Path;

use crate::key::Key;
use crate::x509::X509Certificate;
use dipsign_core::Error;
use pkcs8::ObjectIdentifier;

/// `rsaEncryption` (PKCS#1).
const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

fn read_file(path: &Path) -> Result<Vec<u8>, Error> {
    std::fs::read(path).map_err(|e| Error::Other(format!("{}: {e}", path.display())))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Whether the data looks PEM armored rather than raw DER.
fn is_pem(data: &[u8]) -> bool {
    data.trim_ascii_start().starts_with(b"-----BEGIN")
}

/// Decode a single PEM block, which must carry the `expected` label.
fn decode_pem(data: &[u8], expected: &str) -> Result<Vec<u8>, Error> {
    let (label, der) = pem_rfc7468::decode_vec(data.trim_ascii())
        .map_err(|e| Error::Pem(format!("failed to decode {expected} PEM: {e}")))?;
    if label != expected {
        return Err(Error::Pem(format!(
            "expected {expected} PEM label, got: {label}"
        )));
    }
    Ok(der)
}

/// Load an RSA private key from a PKCS#8 `PRIVATE KEY` PEM block.
pub fn load_private_key_pem(data: &[u8]) -> Result<Key, Error> {
    let der = decode_pem(data, "PRIVATE KEY")?;
    load_private_key_der(&der)
}

/// Load an RSA private key from PKCS#8 DER.
pub fn load_private_key_der(data: &[u8]) -> Result<Key, Error> {
    use der::Decode;
    use pkcs8::DecodePrivateKey;

    let info = pkcs8::PrivateKeyInfo::from_der(data)
        .map_err(|e| Error::Key(format!("malformed PKCS#8 private key: {e}")))?;
    if info.algorithm.oid != RSA_ENCRYPTION {
        return Err(Error::Key(format!(
            "not an RSA key (algorithm {})",
            info.algorithm.oid
        )));
    }
    let pk = rsa::RsaPrivateKey::from_pkcs8_der(data)
        .map_err(|e| Error::Key(format!("failed to parse RSA private key: {e}")))?;
    Ok(Key::from_private(pk))
}

/// Load a private key file: PEM, or raw PKCS#8 DER when not armored.
pub fn load_private_key_file(path: &Path) -> Result<Key, Error> {
    let data = read_file(path)?;
    let key = if is_pem(&data) {
        load_private_key_pem(&data)?
    } else {
        load_private_key_der(&data)?
    };
    Ok(key.with_name(file_name(path)))
}

/// Load an RSA public key from a `PUBLIC KEY` (SubjectPublicKeyInfo) PEM block.
pub fn load_public_key_pem(data: &[u8]) -> Result<Key, Error> {
    use spki::DecodePublicKey;
    let der = decode_pem(data, "PUBLIC KEY")?;
    let pk = rsa::RsaPublicKey::from_public_key_der(&der)
        .map_err(|e| Error::Key(format!("failed to parse RSA public key: {e}")))?;
    Ok(Key::from_public(pk))
}

/// Load an X.509 certificate from PEM or DER data.
pub fn load_certificate(data: &[u8]) -> Result<X509Certificate, Error> {
    if is_pem(data) {
        let der = decode_pem(data, "CERTIFICATE")?;
        X509Certificate::from_der(&der)
    } else {
        X509Certificate::from_der(data)
    }
}

pub fn load_certificate_file(path: &Path) -> Result<X509Certificate, Error> {
    load_certificate(&read_file(path)?)
}
