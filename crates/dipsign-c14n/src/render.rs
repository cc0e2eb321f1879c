#![forbid(unsafe_code)]

//! Namespace declarations and attributes as they are rendered on a
//! canonical start tag.
//!
//! Both types order the way C14N requires once sorted: the default
//! namespace before prefixed ones, and attributes by (namespace URI, local
//! name) with unqualified attributes first. The empty string sorts before
//! any other, so the derived orderings give exactly that.

use crate::escape;

/// A namespace declaration to be rendered.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NsDecl {
    /// The prefix ("" for the default namespace).
    pub prefix: String,
    pub uri: String,
}

impl NsDecl {
    pub fn write_to(&self, out: &mut Vec<u8>) {
        if self.prefix.is_empty() {
            out.extend_from_slice(b" xmlns=\"");
        } else {
            out.extend_from_slice(b" xmlns:");
            out.extend_from_slice(self.prefix.as_bytes());
            out.extend_from_slice(b"=\"");
        }
        escape::write_attr(out, &self.uri);
        out.push(b'"');
    }
}

/// An attribute to be rendered.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Attr {
    /// The namespace URI ("" when unqualified).
    pub ns_uri: String,
    pub local_name: String,
    /// The name as written: `prefix:local` or `local`.
    pub qualified_name: String,
    pub value: String,
}

impl Attr {
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(b' ');
        out.extend_from_slice(self.qualified_name.as_bytes());
        out.extend_from_slice(b"=\"");
        escape::write_attr(out, &self.value);
        out.push(b'"');
    }
}
