#![forbid(unsafe_code)]

//! Canonical XML 1.0 (inclusive C14N), with and without comments.
//!
//! This is the canonicalization applied to the `<ds:Object>` before it is
//! digested and to `<ds:SignedInfo>` before it is signed.

pub mod escape;
pub mod inclusive;
pub mod render;

use dipsign_core::{algorithm, Error};
use dipsign_xml::NodeSet;

/// The canonicalization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum C14nMode {
    /// Canonical XML 1.0
    Inclusive,
    /// Canonical XML 1.0 with comments
    InclusiveWithComments,
}

impl C14nMode {
    /// Get the algorithm URI for this mode.
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Inclusive => algorithm::C14N,
            Self::InclusiveWithComments => algorithm::C14N_WITH_COMMENTS,
        }
    }

    /// Parse a C14N mode from an algorithm URI.
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            algorithm::C14N => Some(Self::Inclusive),
            algorithm::C14N_WITH_COMMENTS => Some(Self::InclusiveWithComments),
            _ => None,
        }
    }

    pub fn with_comments(&self) -> bool {
        matches!(self, Self::InclusiveWithComments)
    }
}

/// Canonicalize XML text.
///
/// With a `node_set`, only the nodes in the set are rendered (document
/// subset canonicalization); otherwise the whole document is.
pub fn canonicalize(xml: &str, mode: C14nMode, node_set: Option<&NodeSet>) -> Result<Vec<u8>, Error> {
    let doc = roxmltree::Document::parse_with_options(xml, dipsign_xml::document::parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))?;
    canonicalize_doc(&doc, mode, node_set)
}

/// Canonicalize a pre-parsed document.
///
/// `node_set` must have been built from this same `doc`.
pub fn canonicalize_doc(
    doc: &roxmltree::Document<'_>,
    mode: C14nMode,
    node_set: Option<&NodeSet>,
) -> Result<Vec<u8>, Error> {
    inclusive::canonicalize(doc, mode.with_comments(), node_set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_uri_roundtrip() {
        for mode in [C14nMode::Inclusive, C14nMode::InclusiveWithComments] {
            assert_eq!(C14nMode::from_uri(mode.uri()), Some(mode));
        }
        assert_eq!(
            C14nMode::from_uri("http://www.w3.org/2001/10/xml-exc-c14n#"),
            None
        );
    }

    #[test]
    fn test_comments_follow_mode() {
        let xml = "<r><!-- note --><a/></r>";
        let without = canonicalize(xml, C14nMode::Inclusive, None).unwrap();
        let with = canonicalize(xml, C14nMode::InclusiveWithComments, None).unwrap();
        assert_eq!(without, b"<r><a></a></r>");
        assert_eq!(with, b"<r><!-- note --><a></a></r>");
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            canonicalize("<r>", C14nMode::Inclusive, None),
            Err(Error::XmlParse(_))
        ));
    }
}
