#![forbid(unsafe_code)]

//! `SignedInfo` and `Reference` processing shared by signing and verification.

use std::collections::HashMap;

use dipsign_c14n::C14nMode;
use dipsign_core::{ns, Error};
use dipsign_crypto::digest;
use dipsign_xml::document::{
    algorithm_attr, find_child_element, find_child_elements, require_child_element,
    resolve_fragment,
};
use dipsign_xml::NodeSet;
use roxmltree::{Document, Node, NodeId};

/// Methods declared in `SignedInfo`.
pub(crate) struct SignedInfoMethods<'a> {
    pub c14n: C14nMode,
    pub signature: &'a str,
}

pub(crate) fn read_methods<'a>(signed_info: Node<'a, '_>) -> Result<SignedInfoMethods<'a>, Error> {
    let c14n_node = require_child_element(signed_info, ns::DSIG, ns::node::CANONICALIZATION_METHOD)?;
    let c14n_uri = algorithm_attr(c14n_node)?;
    let c14n = C14nMode::from_uri(c14n_uri)
        .ok_or_else(|| Error::UnsupportedAlgorithm(format!("C14N: {c14n_uri}")))?;
    let sig_node = require_child_element(signed_info, ns::DSIG, ns::node::SIGNATURE_METHOD)?;
    let signature = algorithm_attr(sig_node)?;
    Ok(SignedInfoMethods { c14n, signature })
}

/// Canonical bytes of `SignedInfo`, the input to the signature algorithm.
pub(crate) fn canonicalize_signed_info(
    doc: &Document<'_>,
    signed_info: Node<'_, '_>,
    mode: C14nMode,
) -> Result<Vec<u8>, Error> {
    let node_set = if mode.with_comments() {
        NodeSet::tree_with_comments(signed_info)
    } else {
        NodeSet::tree_without_comments(signed_info)
    };
    let bytes = dipsign_c14n::canonicalize_doc(doc, mode, Some(&node_set))?;
    tracing::debug!(len = bytes.len(), "canonicalized SignedInfo");
    Ok(bytes)
}

/// Resolve a `Reference`, run its transforms and digest the result.
///
/// Returns the digest bytes. Only same-document URIs are supported: the
/// empty URI selects the whole document and `#id` the subtree of the
/// element with that ID, both without comments. The only transforms
/// accepted are inclusive C14N ones; with none listed the node set is
/// serialized with inclusive C14N.
pub(crate) fn digest_reference(
    doc: &Document<'_>,
    id_map: &HashMap<String, NodeId>,
    reference: Node<'_, '_>,
) -> Result<Vec<u8>, Error> {
    let uri = reference.attribute(ns::attr::URI).unwrap_or("");
    let digest_node = require_child_element(reference, ns::DSIG, ns::node::DIGEST_METHOD)?;
    let digest_uri = algorithm_attr(digest_node)?;

    let node_set = if uri.is_empty() {
        NodeSet::tree_without_comments(doc.root())
    } else if uri.starts_with('#') {
        NodeSet::tree_without_comments(resolve_fragment(doc, id_map, uri)?)
    } else {
        return Err(Error::InvalidUri(format!("unsupported URI: {uri}")));
    };

    let mut mode = C14nMode::Inclusive;
    if let Some(transforms) = find_child_element(reference, ns::DSIG, ns::node::TRANSFORMS) {
        for transform in find_child_elements(transforms, ns::DSIG, ns::node::TRANSFORM) {
            let t_uri = algorithm_attr(transform)?;
            mode = C14nMode::from_uri(t_uri)
                .ok_or_else(|| Error::UnsupportedAlgorithm(format!("transform: {t_uri}")))?;
        }
    }

    let bytes = dipsign_c14n::canonicalize_doc(doc, mode, Some(&node_set))?;
    let computed = digest::digest(digest_uri, &bytes)?;
    tracing::debug!(uri, len = bytes.len(), "digested reference");
    Ok(computed)
}
