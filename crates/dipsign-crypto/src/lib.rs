#![forbid(unsafe_code)]

//! Cryptographic algorithms used by dipsign: SHA-2 digests for references
//! and RSASSA-PSS (MGF1) for the signature value.

pub mod digest;
pub mod sign;

pub use digest::DigestAlgorithm;
pub use sign::{SignatureAlgorithm, SigningKey};
