//! Conversation identity: which conversation is the document showing?
//!
//! Every public engine operation resolves the key first. When it differs from
//! the key seen last, every entry reference held by the engine belongs to a
//! conversation that is gone, and the session resets.
//!
//! The resolver tries an ordered list of [`IdentitySource`]s. The default
//! order is attribute, then path segment, then path. The path fallback is
//! always tried last even when the configured list omits it, so resolution
//! never fails.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::document::DocumentAdapter;

/// One way of deriving a conversation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    /// A conversation id attribute on an attached entry or its container.
    Attribute,
    /// The segment following a conversation marker in the path, e.g. the
    /// `abc` in `/c/abc` or `/g/g-123/c/abc`.
    PathSegment,
    /// The literal path (query string only when configured).
    Path,
}

/// Resolver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Sources tried in order.
    pub precedence: Vec<IdentitySource>,
    /// Path segments that introduce a conversation id.
    pub path_markers: Vec<String>,
    /// Keep the query string in the path fallback.
    pub include_query: bool,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            precedence: vec![
                IdentitySource::Attribute,
                IdentitySource::PathSegment,
                IdentitySource::Path,
            ],
            path_markers: vec!["c".into(), "chat".into(), "share".into()],
            include_query: false,
        }
    }
}

impl IdentityConfig {
    pub fn with_precedence(mut self, precedence: impl IntoIterator<Item = IdentitySource>) -> Self {
        self.precedence = precedence.into_iter().collect();
        self
    }

    pub fn with_query(mut self, include: bool) -> Self {
        self.include_query = include;
        self
    }
}

/// Key identifying the displayed conversation.
///
/// Keys compare by value only: an attribute and a path segment that carry
/// the same id name the same conversation.
#[derive(Debug, Clone)]
pub struct ConversationKey {
    value: String,
    source: IdentitySource,
}

impl ConversationKey {
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The source that produced this key.
    pub fn source(&self) -> IdentitySource {
        self.source
    }
}

impl PartialEq for ConversationKey {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for ConversationKey {}

impl std::fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// Derives [`ConversationKey`]s from a document.
#[derive(Debug, Clone, Default)]
pub struct ConversationResolver {
    config: IdentityConfig,
}

impl ConversationResolver {
    pub fn new(config: IdentityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    /// Resolve the key for the document's current state.
    pub fn resolve<D: DocumentAdapter>(&self, document: &D) -> ConversationKey {
        for source in &self.config.precedence {
            if let Some(value) = self.try_source(*source, document) {
                trace!("conversation key {value:?} from {source:?}");
                return ConversationKey {
                    value,
                    source: *source,
                };
            }
        }
        ConversationKey {
            value: self.path_key(document),
            source: IdentitySource::Path,
        }
    }

    fn try_source<D: DocumentAdapter>(&self, source: IdentitySource, document: &D) -> Option<String> {
        match source {
            IdentitySource::Attribute => document
                .conversation_attribute()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            IdentitySource::PathSegment => {
                let location = document.location();
                conversation_segment(location.path(), &self.config.path_markers)
            }
            IdentitySource::Path => Some(self.path_key(document)),
        }
    }

    fn path_key<D: DocumentAdapter>(&self, document: &D) -> String {
        let location = document.location();
        match (self.config.include_query, location.query()) {
            (true, Some(query)) => format!("{}?{query}", location.path()),
            _ => location.path().to_string(),
        }
    }
}

/// Extract the id segment that follows the first conversation marker.
pub fn conversation_segment(path: &str, markers: &[String]) -> Option<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    segments.windows(2).find_map(|pair| {
        let (marker, id) = (pair[0], pair[1]);
        let is_marker = markers.iter().any(|m| m == marker);
        let looks_like_id = id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        (is_marker && looks_like_id).then(|| id.to_string())
    })
}

/// What happened when a freshly resolved key was compared to the last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// No key had been seen yet.
    First,
    Unchanged,
    /// The document moved to another conversation.
    Changed { from: ConversationKey },
}

/// Remembers the last key seen.
#[derive(Debug, Clone, Default)]
pub struct ConversationContext {
    current: Option<ConversationKey>,
}

impl ConversationContext {
    pub fn current(&self) -> Option<&ConversationKey> {
        self.current.as_ref()
    }

    /// Record `key` as current and report how it relates to the previous one.
    pub fn observe(&mut self, key: ConversationKey) -> Transition {
        match self.current.replace(key) {
            None => Transition::First,
            Some(previous) if Some(&previous) == self.current.as_ref() => Transition::Unchanged,
            Some(previous) => Transition::Changed { from: previous },
        }
    }
}
