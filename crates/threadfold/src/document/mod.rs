//! The host-document seam.
//!
//! The engine never touches rendered nodes directly. Everything it needs from
//! the host (enumeration, detaching, reinsertion, geometry, scrolling,
//! highlighting, control mounting) goes through [`DocumentAdapter`]. The
//! adapter owns the real nodes; the engine only holds [`NodeRef`]s plus the
//! metadata captured in an [`Entry`](crate::Entry).
//!
//! [`MemoryDocument`] is a complete in-process implementation used by the
//! shell and by the test suites.
//!
//! [`NodeRef`]: DocumentAdapter::NodeRef

pub mod memory;

pub use memory::{EntrySpec, MemoryDocument, NodeId};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;

// ── Roles ──────────────────────────────────────────────────────────

/// Author role of a conversation entry.
///
/// Classifying a raw node is the adapter's job; the engine only carries the
/// result through to search and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    #[default]
    Unknown,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a role attribute value. Anything unrecognised is `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Self::User,
            "assistant" => Self::Assistant,
            _ => Self::Unknown,
        }
    }
}

// ── Geometry ───────────────────────────────────────────────────────

/// Vertical extent of a node relative to the top of the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub top: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Whether any part of the box lies inside a viewport of the given height.
    pub fn intersects_viewport(&self, viewport_height: f64) -> bool {
        self.bottom() > 0.0 && self.top < viewport_height
    }
}

// ── Location ───────────────────────────────────────────────────────

/// The address the host document is currently showing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Location {
    href: String,
}

impl Location {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }

    /// The full address as given, used as the export's source location.
    pub fn href(&self) -> &str {
        &self.href
    }

    /// Path component: scheme and host stripped, query and fragment removed.
    /// Always starts with `/`.
    pub fn path(&self) -> &str {
        let rest = match self.href.find("://") {
            Some(i) => {
                let after_scheme = self.href.get(i + 3..).unwrap_or("");
                match after_scheme.find('/') {
                    Some(j) => after_scheme.get(j..).unwrap_or("/"),
                    None => "/",
                }
            }
            None => self.href.as_str(),
        };
        let end = rest.find(['?', '#']).unwrap_or(rest.len());
        match rest.get(..end) {
            Some("") | None => "/",
            Some(path) => path,
        }
    }

    /// Query string without the leading `?`, if any.
    pub fn query(&self) -> Option<&str> {
        let start = self.href.find('?')? + 1;
        let rest = self.href.get(start..)?;
        let end = rest.find('#').unwrap_or(rest.len());
        rest.get(..end).filter(|q| !q.is_empty())
    }
}

// ── Structural changes ─────────────────────────────────────────────

/// Notification that the host document's structure changed.
///
/// Delivered over the channel returned by
/// [`DocumentAdapter::observe_structural_change`]. The session's
/// reconciliation step consumes these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralChange {
    /// Entries were added, removed, or moved.
    EntriesChanged,
    /// The engine's injected controls are no longer in the document.
    ControlsRemoved,
    /// The document now shows a different address.
    LocationChanged,
}

// ── Errors ─────────────────────────────────────────────────────────

/// Failure of a single structural mutation.
///
/// The engine treats all of these as stale-reference conditions: the affected
/// entry is dropped from the operation and the rest carries on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("node {0} was destroyed by the host document")]
    Destroyed(String),
    #[error("node {0} is not attached to the document")]
    NotAttached(String),
    #[error("node {0} is already attached")]
    AlreadyAttached(String),
    #[error("unknown node {0}")]
    UnknownNode(String),
    #[error("no placement target available")]
    MissingTarget,
}

// ── Adapter ────────────────────────────────────────────────────────

/// Everything the engine consumes from the host document.
///
/// Node references must stay comparable after detaching: the engine compares
/// a recorded parent against [`parent_of`](Self::parent_of) to decide whether
/// an anchor is still where it was left.
pub trait DocumentAdapter {
    /// Handle to a rendered node (entry or container).
    type NodeRef: Clone + PartialEq + std::fmt::Debug;

    /// Attached message entries in document order.
    fn enumerate_entries(&self) -> Vec<Self::NodeRef>;

    /// Stable identity of an entry: a document-provided message id when one
    /// exists, otherwise a structural fallback.
    fn identity_key_of(&self, node: &Self::NodeRef) -> String;

    fn role_of(&self, node: &Self::NodeRef) -> Role;

    /// Raw text content. The engine trims it.
    fn text_of(&self, node: &Self::NodeRef) -> String;

    fn parent_of(&self, node: &Self::NodeRef) -> Option<Self::NodeRef>;

    /// Whether the node is currently part of the rendered document.
    fn is_attached(&self, node: &Self::NodeRef) -> bool;

    fn detach(&mut self, node: &Self::NodeRef) -> Result<(), DocumentError>;

    /// Insert a detached node immediately before `anchor`, under the
    /// anchor's parent.
    fn reattach_before(
        &mut self,
        node: &Self::NodeRef,
        anchor: &Self::NodeRef,
    ) -> Result<(), DocumentError>;

    /// Append a detached node as the last child of `parent`.
    fn reattach_append(
        &mut self,
        node: &Self::NodeRef,
        parent: &Self::NodeRef,
    ) -> Result<(), DocumentError>;

    /// Geometry relative to the viewport. `None` when not rendered.
    fn bounding_box(&self, node: &Self::NodeRef) -> Option<BoundingBox>;

    fn viewport_height(&self) -> f64;

    fn scroll_by(&mut self, dy: f64);

    fn scroll_into_view(&mut self, node: &Self::NodeRef);

    fn set_highlight(&mut self, node: &Self::NodeRef, highlighted: bool);

    /// A conversation identifier attribute carried by any attached entry or
    /// its container.
    fn conversation_attribute(&self) -> Option<String>;

    fn location(&self) -> Location;

    /// Whether the engine's controls are present in the document.
    fn controls_mounted(&self) -> bool;

    fn mount_controls(&mut self);

    /// Subscribe to structural-change notifications.
    fn observe_structural_change(&mut self) -> UnboundedReceiver<StructuralChange>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_path_strips_origin_query_and_fragment() {
        let loc = Location::new("https://chat.example.com/c/abc-123?model=x#bottom");
        assert_eq!(loc.path(), "/c/abc-123");
        assert_eq!(loc.query(), Some("model=x"));
    }

    #[test]
    fn location_path_of_bare_origin_is_root() {
        assert_eq!(Location::new("https://chat.example.com").path(), "/");
        assert_eq!(Location::new("https://chat.example.com?x=1").path(), "/");
        assert_eq!(Location::new("").path(), "/");
    }

    #[test]
    fn location_accepts_relative_paths() {
        let loc = Location::new("/g/g-1/c/xyz");
        assert_eq!(loc.path(), "/g/g-1/c/xyz");
        assert_eq!(loc.query(), None);
    }

    #[test]
    fn role_parse_is_lenient() {
        assert_eq!(Role::parse("Assistant "), Role::Assistant);
        assert_eq!(Role::parse("user"), Role::User);
        assert_eq!(Role::parse("tool"), Role::Unknown);
    }

    #[test]
    fn bounding_box_viewport_intersection() {
        let visible = BoundingBox {
            top: -50.0,
            height: 100.0,
        };
        let above = BoundingBox {
            top: -100.0,
            height: 100.0,
        };
        let below = BoundingBox {
            top: 800.0,
            height: 10.0,
        };
        assert!(visible.intersects_viewport(800.0));
        assert!(!above.intersects_viewport(800.0));
        assert!(!below.intersects_viewport(800.0));
    }
}
