#![forbid(unsafe_code)]

//! XML document handling for dipsign.
//!
//! Wraps `roxmltree` for parsing and lookup, provides the `NodeSet` used
//! for document-subset canonicalization, and an `XmlWriter` over
//! `quick-xml` for emitting signature templates.

pub mod document;
pub mod nodeset;
pub mod writer;

pub use document::XmlDocument;
pub use nodeset::NodeSet;
pub use writer::XmlWriter;
