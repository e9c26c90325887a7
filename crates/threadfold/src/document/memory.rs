//! In-memory host document.
//!
//! A small node tree (root → thread container → entries, plus a controls
//! node under the root) with per-entry heights, a scrollable viewport, and
//! host-side mutation methods that mimic what a real page does behind the
//! engine's back: appending new replies, deleting nodes, re-rendering the
//! whole thread with fresh nodes, and navigating to another conversation.
//! Every structural mutation is broadcast to subscribers as a
//! [`StructuralChange`].

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::trace;

use super::{BoundingBox, DocumentAdapter, DocumentError, Location, Role, StructuralChange};

/// Height given to entries that do not specify one.
pub const DEFAULT_ENTRY_HEIGHT: f64 = 120.0;

pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 800.0;

/// Handle to a node in a [`MemoryDocument`]. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Content of one rendered message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySpec {
    #[serde(default, alias = "id")]
    pub message_id: Option<String>,
    #[serde(default)]
    pub role: Role,
    pub text: String,
    #[serde(default = "default_entry_height")]
    pub height: f64,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

fn default_entry_height() -> f64 {
    DEFAULT_ENTRY_HEIGHT
}

impl EntrySpec {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            message_id: None,
            role,
            text: text.into(),
            height: DEFAULT_ENTRY_HEIGHT,
            conversation_id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    /// Identity key: the message id, else role, content hash and the
    /// render serial of the node showing it.
    fn identity_key(&self, serial: u64) -> String {
        match &self.message_id {
            Some(id) => id.clone(),
            None => format!("{}-{:016x}-{serial}", self.role.as_str(), fnv1a(&self.text)),
        }
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Root,
    Thread { conversation_id: Option<String> },
    /// `serial` is assigned on first render and carried across re-renders,
    /// so entries with equal content still get distinct keys.
    Entry { spec: EntrySpec, serial: u64 },
    Controls,
    /// A destroyed node whose content has been released.
    Tombstone,
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    destroyed: bool,
    highlighted: bool,
}

/// In-process [`DocumentAdapter`] implementation.
///
/// Nodes live in an append-only arena so that a [`NodeId`] held by the
/// engine never aliases a newer node. Destroying a node releases its content
/// and child list and leaves an empty tombstone slot behind, so a long
/// session of re-renders grows the arena by one empty slot per node.
#[derive(Debug)]
pub struct MemoryDocument {
    nodes: Vec<Node>,
    next_serial: u64,
    root: NodeId,
    thread: NodeId,
    controls: Option<NodeId>,
    location: Location,
    scroll_top: f64,
    viewport_height: f64,
    observers: Vec<UnboundedSender<StructuralChange>>,
}

impl MemoryDocument {
    /// An empty document showing `href`.
    pub fn new(href: impl Into<String>) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            next_serial: 0,
            root: NodeId(0),
            thread: NodeId(0),
            controls: None,
            location: Location::new(href),
            scroll_top: 0.0,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            observers: Vec::new(),
        };
        doc.root = doc.alloc(NodeKind::Root, None);
        doc.thread = doc.alloc(
            NodeKind::Thread {
                conversation_id: None,
            },
            Some(doc.root),
        );
        doc
    }

    /// A document pre-populated with `entries`, scrolled to the bottom the
    /// way a chat page opens.
    pub fn from_entries(href: impl Into<String>, entries: impl IntoIterator<Item = EntrySpec>) -> Self {
        let mut doc = Self::new(href);
        for spec in entries {
            doc.push_entry(spec);
        }
        doc.scroll_to_bottom();
        doc
    }

    /// Put a conversation id attribute on the thread container.
    pub fn with_conversation_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        if let Some(node) = self.nodes.get_mut(self.thread.0) {
            node.kind = NodeKind::Thread {
                conversation_id: Some(id),
            };
        }
        self
    }

    pub fn with_viewport_height(mut self, height: f64) -> Self {
        self.viewport_height = height.max(0.0);
        self.clamp_scroll();
        self
    }

    /// Append an entry during setup. Does not notify observers.
    pub fn push_entry(&mut self, spec: EntrySpec) -> NodeId {
        let serial = self.next_serial;
        self.next_serial += 1;
        self.push_rendered(spec, serial)
    }

    fn push_rendered(&mut self, spec: EntrySpec, serial: u64) -> NodeId {
        let thread = self.thread;
        self.alloc(NodeKind::Entry { spec, serial }, Some(thread))
    }

    // ── Host-side mutations ────────────────────────────────────────

    /// The host appends a new reply to the thread.
    pub fn append_entry(&mut self, spec: EntrySpec) -> NodeId {
        let id = self.push_entry(spec);
        self.notify(StructuralChange::EntriesChanged);
        id
    }

    /// The host deletes a node for good, attached or not.
    pub fn destroy(&mut self, node: NodeId) -> Result<(), DocumentError> {
        let n = self.node(node)?;
        if n.destroyed {
            return Err(DocumentError::Destroyed(node.to_string()));
        }
        self.unlink(node);
        self.destroy_subtree(node);
        if self.controls == Some(node) {
            self.controls = None;
            self.notify(StructuralChange::ControlsRemoved);
        }
        self.clamp_scroll();
        self.notify(StructuralChange::EntriesChanged);
        Ok(())
    }

    /// Destroy the live entry (attached or detached) carrying `key`.
    /// Returns `false` when no such entry exists.
    pub fn destroy_by_key(&mut self, key: &str) -> bool {
        let found = self.nodes.iter().enumerate().find_map(|(i, n)| match &n.kind {
            NodeKind::Entry { spec, serial } if !n.destroyed && spec.identity_key(*serial) == key => {
                Some(NodeId(i))
            }
            _ => None,
        });
        match found {
            Some(id) => self.destroy(id).is_ok(),
            None => false,
        }
    }

    /// Full re-render: every attached entry is replaced by a structurally
    /// identical new node under a new thread container, and the controls are
    /// wiped. Detached nodes are left alone.
    pub fn rerender(&mut self) {
        let old_thread = self.thread;
        let conversation_id = match self.nodes.get(old_thread.0).map(|n| &n.kind) {
            Some(NodeKind::Thread { conversation_id }) => conversation_id.clone(),
            _ => None,
        };
        let rendered: Vec<(EntrySpec, u64)> = self
            .children_of(old_thread)
            .into_iter()
            .filter_map(|id| match self.nodes.get(id.0).map(|n| &n.kind) {
                Some(NodeKind::Entry { spec, serial }) => Some((spec.clone(), *serial)),
                _ => None,
            })
            .collect();

        let new_thread = self.alloc(NodeKind::Thread { conversation_id }, None);
        self.replace_child(self.root, old_thread, new_thread);
        self.destroy_subtree(old_thread);
        self.thread = new_thread;
        for (spec, serial) in rendered {
            self.push_rendered(spec, serial);
        }

        if let Some(controls) = self.controls.take() {
            self.unlink(controls);
            self.destroy_subtree(controls);
            self.notify(StructuralChange::ControlsRemoved);
        }
        self.clamp_scroll();
        trace!("memory document re-rendered, thread {old_thread} -> {new_thread}");
        self.notify(StructuralChange::EntriesChanged);
    }

    /// Navigate to another conversation: new location, new thread content.
    pub fn navigate(
        &mut self,
        href: impl Into<String>,
        conversation_id: Option<String>,
        entries: impl IntoIterator<Item = EntrySpec>,
    ) {
        let old_thread = self.thread;
        let new_thread = self.alloc(NodeKind::Thread { conversation_id }, None);
        self.replace_child(self.root, old_thread, new_thread);
        self.destroy_subtree(old_thread);
        self.thread = new_thread;
        for spec in entries {
            self.push_entry(spec);
        }
        self.location = Location::new(href);
        self.scroll_to_bottom();
        self.notify(StructuralChange::LocationChanged);
        self.notify(StructuralChange::EntriesChanged);
    }

    /// The host wipes the engine's controls without touching entries.
    pub fn unmount_controls(&mut self) {
        if let Some(controls) = self.controls.take() {
            self.unlink(controls);
            self.destroy_subtree(controls);
            self.notify(StructuralChange::ControlsRemoved);
        }
    }

    // ── Inspection ─────────────────────────────────────────────────

    /// The attached entry carrying `key`, if any.
    pub fn find_attached(&self, key: &str) -> Option<NodeId> {
        self.entries_in_order()
            .into_iter()
            .find(|id| self.key_of(*id).is_some_and(|k| k == key))
    }

    /// Identity keys of the attached entries, in document order.
    pub fn attached_keys(&self) -> Vec<String> {
        self.entries_in_order()
            .into_iter()
            .filter_map(|id| self.key_of(id))
            .collect()
    }

    /// Live nodes currently bearing the highlight.
    pub fn highlighted(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.highlighted && !n.destroyed)
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    pub fn is_highlighted(&self, node: NodeId) -> bool {
        self.nodes
            .get(node.0)
            .is_some_and(|n| n.highlighted && !n.destroyed)
    }

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    pub fn set_scroll_top(&mut self, y: f64) {
        self.scroll_top = y;
        self.clamp_scroll();
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_top = f64::MAX;
        self.clamp_scroll();
    }

    /// Total height of the attached entries.
    pub fn content_height(&self) -> f64 {
        self.entries_in_order()
            .into_iter()
            .filter_map(|id| self.spec(id).map(|s| s.height))
            .sum()
    }

    /// The current thread container.
    pub fn thread(&self) -> NodeId {
        self.thread
    }

    pub fn is_destroyed(&self, node: NodeId) -> bool {
        self.nodes.get(node.0).is_none_or(|n| n.destroyed)
    }

    // ── Internals ──────────────────────────────────────────────────

    fn alloc(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent,
            children: Vec::new(),
            destroyed: false,
            highlighted: false,
        });
        if let Some(p) = parent
            && let Some(pn) = self.nodes.get_mut(p.0)
        {
            pn.children.push(id);
        }
        id
    }

    fn node(&self, id: NodeId) -> Result<&Node, DocumentError> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| DocumentError::UnknownNode(id.to_string()))
    }

    fn spec(&self, id: NodeId) -> Option<&EntrySpec> {
        match self.nodes.get(id.0).map(|n| &n.kind) {
            Some(NodeKind::Entry { spec, .. }) => Some(spec),
            _ => None,
        }
    }

    fn key_of(&self, id: NodeId) -> Option<String> {
        match self.nodes.get(id.0).map(|n| &n.kind) {
            Some(NodeKind::Entry { spec, serial }) => Some(spec.identity_key(*serial)),
            _ => None,
        }
    }

    fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(id.0)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Attached entries in document order (depth-first from the root).
    fn entries_in_order(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id.0) else {
                continue;
            };
            if node.destroyed {
                continue;
            }
            if matches!(node.kind, NodeKind::Entry { .. }) {
                out.push(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    fn attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        // Bounded walk; the tree is shallow but never trust a cycle.
        for _ in 0..=self.nodes.len() {
            let Some(c) = current else {
                return false;
            };
            let Some(node) = self.nodes.get(c.0) else {
                return false;
            };
            if node.destroyed {
                return false;
            }
            if c == self.root {
                return true;
            }
            current = node.parent;
        }
        false
    }

    fn offset_of(&self, id: NodeId) -> Option<f64> {
        let mut offset = 0.0;
        for entry in self.entries_in_order() {
            if entry == id {
                return Some(offset);
            }
            offset += self.spec(entry).map_or(0.0, |s| s.height);
        }
        None
    }

    fn unlink(&mut self, id: NodeId) {
        let parent = self.nodes.get_mut(id.0).and_then(|n| n.parent.take());
        if let Some(p) = parent
            && let Some(pn) = self.nodes.get_mut(p.0)
        {
            pn.children.retain(|c| *c != id);
        }
    }

    fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        if let Some(pn) = self.nodes.get_mut(parent.0) {
            match pn.children.iter().position(|c| *c == old) {
                Some(i) => pn.children[i] = new,
                None => pn.children.push(new),
            }
        }
        if let Some(n) = self.nodes.get_mut(new.0) {
            n.parent = Some(parent);
        }
        if let Some(n) = self.nodes.get_mut(old.0) {
            n.parent = None;
        }
    }

    fn destroy_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(c) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(c.0) {
                node.destroyed = true;
                node.highlighted = false;
                node.kind = NodeKind::Tombstone;
                stack.append(&mut node.children);
            }
        }
    }

    fn clamp_scroll(&mut self) {
        let max = (self.content_height() - self.viewport_height).max(0.0);
        self.scroll_top = self.scroll_top.clamp(0.0, max);
    }

    fn notify(&mut self, change: StructuralChange) {
        self.observers.retain(|tx| tx.send(change).is_ok());
    }

    /// Validate that `node` is a live entry that is currently detached.
    fn check_reattachable(&self, node: NodeId) -> Result<(), DocumentError> {
        let n = self.node(node)?;
        if n.destroyed {
            return Err(DocumentError::Destroyed(node.to_string()));
        }
        if n.parent.is_some() {
            return Err(DocumentError::AlreadyAttached(node.to_string()));
        }
        Ok(())
    }

    /// Validate that `target` is live and rendered.
    fn check_target(&self, target: NodeId) -> Result<(), DocumentError> {
        if self.node(target)?.destroyed {
            return Err(DocumentError::Destroyed(target.to_string()));
        }
        if !self.attached(target) {
            return Err(DocumentError::NotAttached(target.to_string()));
        }
        Ok(())
    }
}

impl DocumentAdapter for MemoryDocument {
    type NodeRef = NodeId;

    fn enumerate_entries(&self) -> Vec<NodeId> {
        self.entries_in_order()
    }

    fn identity_key_of(&self, node: &NodeId) -> String {
        self.key_of(*node).unwrap_or_else(|| format!("node-{}", node.0))
    }

    fn role_of(&self, node: &NodeId) -> Role {
        self.spec(*node).map_or(Role::Unknown, |s| s.role)
    }

    fn text_of(&self, node: &NodeId) -> String {
        self.spec(*node).map(|s| s.text.clone()).unwrap_or_default()
    }

    fn parent_of(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    fn is_attached(&self, node: &NodeId) -> bool {
        self.attached(*node)
    }

    fn detach(&mut self, node: &NodeId) -> Result<(), DocumentError> {
        if self.node(*node)?.destroyed {
            return Err(DocumentError::Destroyed(node.to_string()));
        }
        if !self.attached(*node) {
            return Err(DocumentError::NotAttached(node.to_string()));
        }
        self.unlink(*node);
        self.clamp_scroll();
        self.notify(StructuralChange::EntriesChanged);
        Ok(())
    }

    fn reattach_before(&mut self, node: &NodeId, anchor: &NodeId) -> Result<(), DocumentError> {
        self.check_reattachable(*node)?;
        self.check_target(*anchor)?;
        let parent = self
            .parent_of(anchor)
            .ok_or_else(|| DocumentError::NotAttached(anchor.to_string()))?;
        let Some(pn) = self.nodes.get_mut(parent.0) else {
            return Err(DocumentError::UnknownNode(parent.to_string()));
        };
        let index = pn
            .children
            .iter()
            .position(|c| c == anchor)
            .unwrap_or(pn.children.len());
        pn.children.insert(index, *node);
        if let Some(n) = self.nodes.get_mut(node.0) {
            n.parent = Some(parent);
        }
        self.notify(StructuralChange::EntriesChanged);
        Ok(())
    }

    fn reattach_append(&mut self, node: &NodeId, parent: &NodeId) -> Result<(), DocumentError> {
        self.check_reattachable(*node)?;
        self.check_target(*parent)?;
        if let Some(pn) = self.nodes.get_mut(parent.0) {
            pn.children.push(*node);
        }
        if let Some(n) = self.nodes.get_mut(node.0) {
            n.parent = Some(*parent);
        }
        self.notify(StructuralChange::EntriesChanged);
        Ok(())
    }

    fn bounding_box(&self, node: &NodeId) -> Option<BoundingBox> {
        let height = self.spec(*node)?.height;
        let offset = self.offset_of(*node)?;
        Some(BoundingBox {
            top: offset - self.scroll_top,
            height,
        })
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    fn scroll_by(&mut self, dy: f64) {
        self.scroll_top += dy;
        self.clamp_scroll();
    }

    fn scroll_into_view(&mut self, node: &NodeId) {
        if let Some(offset) = self.offset_of(*node) {
            self.scroll_top = offset;
            self.clamp_scroll();
        }
    }

    fn set_highlight(&mut self, node: &NodeId, highlighted: bool) {
        if let Some(n) = self.nodes.get_mut(node.0)
            && !n.destroyed
        {
            n.highlighted = highlighted;
        }
    }

    fn conversation_attribute(&self) -> Option<String> {
        self.entries_in_order().into_iter().find_map(|id| {
            if let Some(own) = self.spec(id).and_then(|s| s.conversation_id.clone()) {
                return Some(own);
            }
            let parent = self.parent_of(&id)?;
            match self.nodes.get(parent.0).map(|n| &n.kind) {
                Some(NodeKind::Thread { conversation_id }) => conversation_id.clone(),
                _ => None,
            }
        })
    }

    fn location(&self) -> Location {
        self.location.clone()
    }

    fn controls_mounted(&self) -> bool {
        self.controls.is_some_and(|c| self.attached(c))
    }

    fn mount_controls(&mut self) {
        if self.controls_mounted() {
            return;
        }
        let root = self.root;
        self.controls = Some(self.alloc(NodeKind::Controls, Some(root)));
    }

    fn observe_structural_change(&mut self) -> UnboundedReceiver<StructuralChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.push(tx);
        rx
    }
}

/// FNV-1a 64-bit hash.
fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in s.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(n: usize) -> MemoryDocument {
        MemoryDocument::from_entries(
            "https://chat.example.com/c/abc",
            (1..=n).map(|i| EntrySpec::new(Role::User, format!("message {i}")).with_id(format!("m{i}"))),
        )
    }

    #[test]
    fn enumerates_in_document_order() {
        let doc = doc_with(3);
        assert_eq!(doc.attached_keys(), vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn detach_and_reattach_before_anchor() {
        let mut doc = doc_with(3);
        let m1 = doc.find_attached("m1").unwrap();
        let m2 = doc.find_attached("m2").unwrap();
        doc.detach(&m1).unwrap();
        assert!(!doc.is_attached(&m1));
        assert_eq!(doc.attached_keys(), vec!["m2", "m3"]);
        doc.reattach_before(&m1, &m2).unwrap();
        assert_eq!(doc.attached_keys(), vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn reattach_rejects_destroyed_and_attached_nodes() {
        let mut doc = doc_with(3);
        let m1 = doc.find_attached("m1").unwrap();
        let m2 = doc.find_attached("m2").unwrap();
        assert_eq!(
            doc.reattach_before(&m1, &m2),
            Err(DocumentError::AlreadyAttached(m1.to_string()))
        );
        doc.detach(&m1).unwrap();
        doc.destroy(m1).unwrap();
        assert_eq!(
            doc.reattach_before(&m1, &m2),
            Err(DocumentError::Destroyed(m1.to_string()))
        );
    }

    #[test]
    fn rerender_replaces_references_but_keeps_keys() {
        let mut doc = doc_with(3);
        let old = doc.find_attached("m2").unwrap();
        doc.rerender();
        let new = doc.find_attached("m2").unwrap();
        assert_ne!(old, new);
        assert!(doc.is_destroyed(old));
        assert_eq!(doc.attached_keys(), vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn rerender_wipes_controls_and_notifies() {
        let mut doc = doc_with(1);
        doc.mount_controls();
        let mut rx = doc.observe_structural_change();
        doc.rerender();
        assert!(!doc.controls_mounted());
        let mut seen = Vec::new();
        while let Ok(change) = rx.try_recv() {
            seen.push(change);
        }
        assert!(seen.contains(&StructuralChange::ControlsRemoved));
        assert!(seen.contains(&StructuralChange::EntriesChanged));
    }

    #[test]
    fn geometry_follows_scroll() {
        let mut doc = doc_with(10).with_viewport_height(300.0);
        doc.set_scroll_top(0.0);
        let m3 = doc.find_attached("m3").unwrap();
        assert_eq!(doc.bounding_box(&m3).unwrap().top, 240.0);
        doc.scroll_by(100.0);
        assert_eq!(doc.bounding_box(&m3).unwrap().top, 140.0);
    }

    #[test]
    fn scroll_is_clamped_to_content() {
        let mut doc = doc_with(2);
        doc.scroll_by(10_000.0);
        assert_eq!(doc.scroll_top(), 0.0);
    }

    #[test]
    fn conversation_attribute_prefers_entry_then_container() {
        let doc = doc_with(1).with_conversation_id("thread-1");
        assert_eq!(doc.conversation_attribute().as_deref(), Some("thread-1"));
        let mut spec = EntrySpec::new(Role::Assistant, "hi");
        spec.conversation_id = Some("own".into());
        let doc = MemoryDocument::from_entries("/", [spec]).with_conversation_id("thread-1");
        assert_eq!(doc.conversation_attribute().as_deref(), Some("own"));
    }

    #[test]
    fn structural_keys_separate_identical_content() {
        let mut doc = MemoryDocument::from_entries(
            "/c/twins",
            [
                EntrySpec::new(Role::User, "continue"),
                EntrySpec::new(Role::Assistant, "part one"),
                EntrySpec::new(Role::User, "continue"),
            ],
        );
        let keys = doc.attached_keys();
        assert!(keys[0].starts_with("user-"));
        assert_ne!(keys[0], keys[2]);

        let second = doc.find_attached(&keys[2]).unwrap();
        assert_eq!(doc.enumerate_entries()[2], second);

        // Keys survive a re-render even though every node is replaced.
        doc.rerender();
        assert_eq!(doc.attached_keys(), keys);
        assert!(doc.destroy_by_key(&keys[2]));
        assert_eq!(doc.attached_keys(), keys[..2].to_vec());
    }

    #[test]
    fn destroyed_nodes_release_their_content() {
        let mut doc = doc_with(3);
        let old = doc.find_attached("m2").unwrap();
        doc.rerender();
        assert!(doc.is_destroyed(old));
        assert_eq!(doc.text_of(&old), "");
        assert_eq!(doc.role_of(&old), Role::Unknown);
        assert!(doc.children_of(doc.root).iter().all(|c| !doc.is_destroyed(*c)));
    }

    #[test]
    fn destroy_by_key_reaches_detached_entries() {
        let mut doc = doc_with(2);
        let m1 = doc.find_attached("m1").unwrap();
        doc.detach(&m1).unwrap();
        assert!(doc.destroy_by_key("m1"));
        assert!(doc.is_destroyed(m1));
        assert!(!doc.destroy_by_key("m1"));
    }
}
