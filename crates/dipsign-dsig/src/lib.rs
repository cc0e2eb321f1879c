#![forbid(unsafe_code)]

//! Enveloping XML Digital Signatures.
//!
//! Builds a `<ds:Signature>` template around a payload, fills in digest and
//! signature values, and verifies the result.

pub mod context;
mod reference;
pub mod sign;
pub mod template;
pub mod verify;

pub use context::{SigningContext, VerifyContext};
pub use template::EnvelopingTemplate;
pub use verify::VerifyResult;
