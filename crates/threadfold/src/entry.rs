//! Captured metadata for one conversation entry.

use crate::document::{DocumentAdapter, Role};

/// A handle to one message in the host document plus the metadata captured
/// when it was enumerated.
///
/// The host owns the node; `text` is the only content the engine keeps, and
/// only so that export can still see entries that are currently detached.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<R> {
    pub node: R,
    pub identity_key: String,
    pub role: Role,
    /// Extracted, trimmed text.
    pub text: String,
    /// Position in document order at enumeration time.
    pub ordinal: usize,
}

impl<R: Clone> Entry<R> {
    /// Capture a single node.
    pub fn capture<D>(document: &D, node: &R, ordinal: usize) -> Self
    where
        D: DocumentAdapter<NodeRef = R>,
    {
        Self {
            node: node.clone(),
            identity_key: document.identity_key_of(node),
            role: document.role_of(node),
            text: document.text_of(node).trim().to_string(),
            ordinal,
        }
    }
}

/// Enumerate and capture every attached entry, in document order.
pub fn enumerate<D: DocumentAdapter>(document: &D) -> Vec<Entry<D::NodeRef>> {
    document
        .enumerate_entries()
        .iter()
        .enumerate()
        .map(|(i, node)| Entry::capture(document, node, i))
        .collect()
}

/// Find the attached node currently carrying `key`.
///
/// Used whenever a held reference has gone stale: a host re-render replaces
/// nodes with structurally identical ones under the same key.
pub fn find_attached<D: DocumentAdapter>(document: &D, key: &str) -> Option<D::NodeRef> {
    document
        .enumerate_entries()
        .into_iter()
        .find(|node| document.identity_key_of(node) == key)
}

/// Resolve an entry to a live node: its own reference while attached, else
/// whichever attached node now carries its key.
pub fn live_node<D: DocumentAdapter>(document: &D, entry: &Entry<D::NodeRef>) -> Option<D::NodeRef> {
    if document.is_attached(&entry.node) {
        Some(entry.node.clone())
    } else {
        find_attached(document, &entry.identity_key)
    }
}
