#![forbid(unsafe_code)]

//! Inclusive Canonical XML 1.0.
//!
//! Algorithm URI: `http://www.w3.org/TR/2001/REC-xml-c14n-20010315`
//! (`#WithComments` keeps comment nodes).
//!
//! The canonical form:
//! - renders every in-scope namespace that the nearest rendered ancestor
//!   did not already render with the same URI, default namespace first
//! - sorts attributes by (namespace URI, local name)
//! - expands empty elements to start/end tag pairs
//! - escapes text and attribute values, keeping character references out
//! - drops the XML declaration and DTD
//!
//! For a document subset, elements whose parent is outside the subset also
//! pick up the `xml:*` attributes in scope from their ancestors.

use crate::escape;
use crate::render::{Attr, NsDecl};
use dipsign_core::{ns, Error};
use dipsign_xml::NodeSet;
use roxmltree::{Node, NodeType};
use std::collections::BTreeMap;

/// Prefix → URI for the namespaces a rendered element has in scope.
type NsMap = BTreeMap<String, String>;

/// Canonicalize a document using Inclusive C14N 1.0.
pub fn canonicalize(
    doc: &roxmltree::Document<'_>,
    with_comments: bool,
    node_set: Option<&NodeSet>,
) -> Result<Vec<u8>, Error> {
    let mut c = Canonicalizer {
        with_comments,
        node_set,
        out: Vec::new(),
    };
    c.process(doc.root(), &NsMap::new());
    Ok(c.out)
}

struct Canonicalizer<'s> {
    with_comments: bool,
    node_set: Option<&'s NodeSet>,
    out: Vec<u8>,
}

impl Canonicalizer<'_> {
    fn is_visible(&self, node: &Node<'_, '_>) -> bool {
        if node.is_comment() && !self.with_comments {
            return false;
        }
        self.node_set.map_or(true, |set| set.contains(node))
    }

    fn process(&mut self, node: Node<'_, '_>, inherited: &NsMap) {
        match node.node_type() {
            NodeType::Root => {
                for child in node.children() {
                    self.process(child, inherited);
                }
            }
            NodeType::Element => {
                if self.is_visible(&node) {
                    self.element(node, inherited);
                } else {
                    for child in node.children() {
                        self.process(child, inherited);
                    }
                }
            }
            NodeType::Text => {
                if self.is_visible(&node) {
                    escape::write_text(&mut self.out, node.text().unwrap_or(""));
                }
            }
            NodeType::Comment => {
                if self.is_visible(&node) {
                    let text = node.text().unwrap_or("");
                    self.top_level(node, |out| {
                        out.extend_from_slice(b"<!--");
                        out.extend_from_slice(text.as_bytes());
                        out.extend_from_slice(b"-->");
                    });
                }
            }
            NodeType::PI => {
                if self.is_visible(&node) {
                    if let Some(pi) = node.pi() {
                        self.top_level(node, |out| {
                            out.extend_from_slice(b"<?");
                            out.extend_from_slice(pi.target.as_bytes());
                            if let Some(value) = pi.value.filter(|v| !v.is_empty()) {
                                out.push(b' ');
                                escape::write_pi(out, value);
                            }
                            out.extend_from_slice(b"?>");
                        });
                    }
                }
            }
        }
    }

    /// Render a comment or PI; outside the document element it is separated
    /// from the element by a line feed.
    fn top_level(&mut self, node: Node<'_, '_>, render: impl FnOnce(&mut Vec<u8>)) {
        let at_root = node
            .parent()
            .is_some_and(|p| p.node_type() == NodeType::Root);
        if at_root && node.prev_siblings().any(|s| s.is_element()) {
            self.out.push(b'\n');
        }
        render(&mut self.out);
        if at_root && node.next_siblings().any(|s| s.is_element()) {
            self.out.push(b'\n');
        }
    }

    fn element(&mut self, node: Node<'_, '_>, inherited: &NsMap) {
        let in_scope = in_scope_namespaces(&node);

        let mut decls: Vec<NsDecl> = in_scope
            .iter()
            .filter(|(prefix, uri)| inherited.get(*prefix) != Some(*uri))
            .map(|(prefix, uri)| NsDecl {
                prefix: prefix.clone(),
                uri: uri.clone(),
            })
            .collect();
        // Default namespace undeclared relative to the rendered ancestor.
        if inherited.get("").is_some_and(|u| !u.is_empty()) && !in_scope.contains_key("") {
            decls.push(NsDecl {
                prefix: String::new(),
                uri: String::new(),
            });
        }
        decls.sort();

        let mut attrs: Vec<Attr> = node
            .attributes()
            .map(|a| {
                let ns_uri = a.namespace().unwrap_or("");
                let qualified_name = match attribute_prefix(&node, ns_uri) {
                    Some(prefix) => format!("{prefix}:{}", a.name()),
                    None => a.name().to_owned(),
                };
                Attr {
                    ns_uri: ns_uri.to_owned(),
                    local_name: a.name().to_owned(),
                    qualified_name,
                    value: a.value().to_owned(),
                }
            })
            .collect();
        if self.node_set.is_some() {
            let parent_rendered = node
                .parent()
                .is_some_and(|p| p.is_element() && self.is_visible(&p));
            if !parent_rendered {
                let inherited_xml = inherited_xml_attrs(&node, &attrs);
                attrs.extend(inherited_xml);
            }
        }
        attrs.sort();

        let name = element_qname(&node);
        self.out.push(b'<');
        self.out.extend_from_slice(name.as_bytes());
        for decl in &decls {
            decl.write_to(&mut self.out);
        }
        for attr in &attrs {
            attr.write_to(&mut self.out);
        }
        self.out.push(b'>');

        for child in node.children() {
            self.process(child, &in_scope);
        }

        self.out.extend_from_slice(b"</");
        self.out.extend_from_slice(name.as_bytes());
        self.out.push(b'>');
    }
}

/// Namespaces in scope at `node`, without the implicit `xml` binding and
/// without undeclared (empty) default namespaces.
fn in_scope_namespaces(node: &Node<'_, '_>) -> NsMap {
    node.namespaces()
        .filter(|n| n.name() != Some("xml") && !n.uri().is_empty())
        .map(|n| (n.name().unwrap_or("").to_owned(), n.uri().to_owned()))
        .collect()
}

/// `xml:*` attributes in scope from ancestors that `node` does not set
/// itself. The nearest ancestor wins.
fn inherited_xml_attrs(node: &Node<'_, '_>, own: &[Attr]) -> Vec<Attr> {
    let mut found: BTreeMap<String, String> = BTreeMap::new();
    for ancestor in node.ancestors().skip(1).filter(|a| a.is_element()) {
        for attr in ancestor.attributes() {
            if attr.namespace() == Some(ns::XML) {
                found
                    .entry(attr.name().to_owned())
                    .or_insert_with(|| attr.value().to_owned());
            }
        }
    }
    found
        .into_iter()
        .filter(|(name, _)| {
            !own.iter()
                .any(|a| a.ns_uri == ns::XML && a.local_name == *name)
        })
        .map(|(name, value)| Attr {
            ns_uri: ns::XML.to_owned(),
            qualified_name: format!("xml:{name}"),
            local_name: name,
            value,
        })
        .collect()
}

/// The element name as written in the source (`prefix:local` or `local`).
fn element_qname(node: &Node<'_, '_>) -> String {
    let source = node
        .document()
        .input_text()
        .get(node.range())
        .unwrap_or("");
    let qname = source
        .strip_prefix('<')
        .and_then(|s| {
            s.split(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
                .next()
        })
        .unwrap_or("");
    if qname.is_empty() {
        node.tag_name().name().to_owned()
    } else {
        qname.to_owned()
    }
}

/// The prefix an attribute in namespace `ns_uri` is written with.
fn attribute_prefix<'a>(node: &Node<'a, '_>, ns_uri: &str) -> Option<&'a str> {
    if ns_uri.is_empty() {
        return None;
    }
    if ns_uri == ns::XML {
        return Some("xml");
    }
    node.namespaces()
        .find(|n| n.name().is_some() && n.uri() == ns_uri)
        .and_then(|n| n.name())
}
