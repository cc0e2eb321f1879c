#![forbid(unsafe_code)]

//! Node sets for document-subset canonicalization.
//!
//! A same-document reference such as `URI="#object"` selects the referenced
//! element and its descendants, minus comment nodes. SignedInfo is
//! canonicalized the same way before signing.

use std::collections::HashSet;

/// A set of nodes from one parsed document, identified by `NodeId`.
#[derive(Debug, Clone)]
pub struct NodeSet {
    nodes: HashSet<roxmltree::NodeId>,
}

impl NodeSet {
    /// The subtree rooted at `root`, excluding comment nodes.
    pub fn tree_without_comments(root: roxmltree::Node<'_, '_>) -> Self {
        Self::collect(root, false)
    }

    /// The subtree rooted at `root`, comments included.
    pub fn tree_with_comments(root: roxmltree::Node<'_, '_>) -> Self {
        Self::collect(root, true)
    }

    fn collect(root: roxmltree::Node<'_, '_>, include_comments: bool) -> Self {
        let nodes = root
            .descendants()
            .filter(|n| include_comments || !n.is_comment())
            .map(|n| n.id())
            .collect();
        Self { nodes }
    }

    /// Check if a node is in this set.
    pub fn contains(&self, node: &roxmltree::Node<'_, '_>) -> bool {
        self.nodes.contains(&node.id())
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}
