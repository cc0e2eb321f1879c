#![forbid(unsafe_code)]

//! Core definitions shared by the dipsign crates: the error type, the
//! XML-DSig algorithm identifiers and the namespace/element names.

pub mod algorithm;
pub mod error;
pub mod ns;

pub use error::{Error, Result};
