#![forbid(unsafe_code)]

//! Key and certificate loading for dipsign.
//!
//! RSA private keys come from PKCS#8 (PEM or DER), public keys from
//! SubjectPublicKeyInfo PEM, and certificates from X.509 in PEM or DER.

pub mod key;
pub mod loader;
pub mod x509;

pub use key::Key;
pub use x509::X509Certificate;
