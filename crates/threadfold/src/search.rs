//! Search over the materialized window.
//!
//! Matching only ever sees attached entries. Searching while collapsed would
//! silently miss most of the conversation, so it is refused outright with
//! [`SearchOutcome::RestoreFirst`] and the caller is expected to restore.
//!
//! At most one entry carries the highlight. Focusing a match clears the
//! previous highlight first, then highlights and scrolls the new one into
//! view.

use tracing::debug;

use crate::document::DocumentAdapter;
use crate::entry::{self, Entry};

/// Trim and case-fold a raw query.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Whether `text` contains the already-normalized `needle`, ignoring case.
pub fn text_matches(text: &str, needle: &str) -> bool {
    !needle.is_empty() && text.to_lowercase().contains(needle)
}

/// Matches for the current query.
#[derive(Debug, Clone)]
pub struct SearchState<R> {
    query: String,
    matches: Vec<Entry<R>>,
    current: Option<usize>,
    highlighted: Option<R>,
}

impl<R> Default for SearchState<R> {
    fn default() -> Self {
        Self {
            query: String::new(),
            matches: Vec::new(),
            current: None,
            highlighted: None,
        }
    }
}

impl<R> SearchState<R> {
    /// Normalized query of the last search.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self) -> &[Entry<R>] {
        &self.matches
    }

    /// Index of the focused match; `None` when there are no matches.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_match(&self) -> Option<&Entry<R>> {
        self.current.and_then(|i| self.matches.get(i))
    }
}

/// Result of [`SearchIndex::search`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Refused: the window is collapsed.
    RestoreFirst,
    /// Empty query; matches and highlight cleared.
    Cleared,
    NoMatches { query: String },
    Found { count: usize, current: usize },
}

/// Result of [`SearchIndex::next`] / [`SearchIndex::previous`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigateOutcome {
    RestoreFirst,
    NoMatches,
    Focused { index: usize, count: usize },
}

/// Builds and walks the match list.
#[derive(Debug, Clone)]
pub struct SearchIndex<R> {
    state: SearchState<R>,
}

impl<R> Default for SearchIndex<R> {
    fn default() -> Self {
        Self {
            state: SearchState::default(),
        }
    }
}

impl<R: Clone + PartialEq + std::fmt::Debug> SearchIndex<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SearchState<R> {
        &self.state
    }

    /// Run `query` against the attached entries.
    pub fn search<D>(&mut self, document: &mut D, query: &str, collapsed: bool) -> SearchOutcome
    where
        D: DocumentAdapter<NodeRef = R>,
    {
        if collapsed {
            self.clear(document);
            return SearchOutcome::RestoreFirst;
        }

        let needle = normalize_query(query);
        self.clear(document);
        if needle.is_empty() {
            return SearchOutcome::Cleared;
        }

        let matches: Vec<Entry<R>> = entry::enumerate(document)
            .into_iter()
            .filter(|e| text_matches(&e.text, &needle))
            .collect();
        debug!("search {needle:?}: {} matches", matches.len());

        self.state.query = needle;
        self.state.matches = matches;
        if self.state.matches.is_empty() {
            return SearchOutcome::NoMatches {
                query: self.state.query.clone(),
            };
        }
        self.state.current = Some(0);
        self.focus(document);
        SearchOutcome::Found {
            count: self.state.matches.len(),
            current: 0,
        }
    }

    /// Move to the following match, wrapping past the end.
    pub fn next<D>(&mut self, document: &mut D, collapsed: bool) -> NavigateOutcome
    where
        D: DocumentAdapter<NodeRef = R>,
    {
        self.step(document, collapsed, 1)
    }

    /// Move to the preceding match, wrapping past the start.
    pub fn previous<D>(&mut self, document: &mut D, collapsed: bool) -> NavigateOutcome
    where
        D: DocumentAdapter<NodeRef = R>,
    {
        self.step(document, collapsed, -1)
    }

    /// Drop matches and remove the highlight from the document.
    pub fn clear<D>(&mut self, document: &mut D)
    where
        D: DocumentAdapter<NodeRef = R>,
    {
        if let Some(node) = self.state.highlighted.take() {
            document.set_highlight(&node, false);
        }
        self.state = SearchState::default();
    }

    /// Forget matches without touching the document. Used when the
    /// conversation changed and held references are meaningless.
    pub fn reset(&mut self) {
        self.state = SearchState::default();
    }

    fn step<D>(&mut self, document: &mut D, collapsed: bool, direction: isize) -> NavigateOutcome
    where
        D: DocumentAdapter<NodeRef = R>,
    {
        if collapsed {
            return NavigateOutcome::RestoreFirst;
        }
        let count = self.state.matches.len();
        if count == 0 {
            return NavigateOutcome::NoMatches;
        }
        let index = match self.state.current {
            Some(i) if direction >= 0 => (i + 1) % count,
            Some(i) => (i + count - 1) % count,
            None => 0,
        };
        self.state.current = Some(index);
        self.focus(document);
        NavigateOutcome::Focused { index, count }
    }

    /// Highlight and reveal the current match, exclusively.
    fn focus<D>(&mut self, document: &mut D)
    where
        D: DocumentAdapter<NodeRef = R>,
    {
        if let Some(previous) = self.state.highlighted.take() {
            document.set_highlight(&previous, false);
        }
        let Some(index) = self.state.current else {
            return;
        };
        let Some(current) = self.state.matches.get_mut(index) else {
            return;
        };
        let Some(node) = entry::live_node(document, current) else {
            debug!("match {} is no longer in the document", current.identity_key);
            return;
        };
        // Re-rendered under the same key: follow the new reference.
        current.node = node.clone();
        document.set_highlight(&node, true);
        document.scroll_into_view(&node);
        self.state.highlighted = Some(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{EntrySpec, MemoryDocument, NodeId, Role};

    fn doc() -> MemoryDocument {
        let texts = [
            "Please retry the upload",
            "ok",
            "RETRY failed again",
            "what now",
            "try again",
            "nothing",
            "I will retry tomorrow",
            "bye",
        ];
        MemoryDocument::from_entries(
            "/c/search",
            texts
                .iter()
                .enumerate()
                .map(|(i, t)| EntrySpec::new(Role::User, *t).with_id(format!("m{}", i + 1))),
        )
    }

    #[test]
    fn normalizes_queries() {
        assert_eq!(normalize_query("  ReTry \n"), "retry");
        assert!(text_matches("Please RETRY", "retry"));
        assert!(!text_matches("anything", ""));
    }

    #[test]
    fn finds_matches_in_document_order() {
        let mut doc = doc();
        let mut index = SearchIndex::<NodeId>::new();
        assert_eq!(
            index.search(&mut doc, " Retry ", false),
            SearchOutcome::Found { count: 3, current: 0 }
        );
        let keys: Vec<_> = index
            .state()
            .matches()
            .iter()
            .map(|e| e.identity_key.as_str())
            .collect();
        assert_eq!(keys, vec!["m1", "m3", "m7"]);
        let m1 = doc.find_attached("m1").unwrap();
        assert_eq!(doc.highlighted(), vec![m1]);
    }

    #[test]
    fn navigation_wraps_both_ways_with_exclusive_highlight() {
        let mut doc = doc();
        let mut index = SearchIndex::<NodeId>::new();
        index.search(&mut doc, "retry", false);

        assert_eq!(index.next(&mut doc, false), NavigateOutcome::Focused { index: 1, count: 3 });
        assert_eq!(index.next(&mut doc, false), NavigateOutcome::Focused { index: 2, count: 3 });
        assert_eq!(index.next(&mut doc, false), NavigateOutcome::Focused { index: 0, count: 3 });
        assert_eq!(
            index.previous(&mut doc, false),
            NavigateOutcome::Focused { index: 2, count: 3 }
        );
        let m7 = doc.find_attached("m7").unwrap();
        assert_eq!(doc.highlighted(), vec![m7]);
    }

    #[test]
    fn empty_query_clears_highlight() {
        let mut doc = doc();
        let mut index = SearchIndex::<NodeId>::new();
        index.search(&mut doc, "retry", false);
        assert_eq!(index.search(&mut doc, "   ", false), SearchOutcome::Cleared);
        assert!(doc.highlighted().is_empty());
        assert_eq!(index.state().current_index(), None);
    }

    #[test]
    fn no_matches_leaves_nothing_focused() {
        let mut doc = doc();
        let mut index = SearchIndex::<NodeId>::new();
        assert_eq!(
            index.search(&mut doc, "zebra", false),
            SearchOutcome::NoMatches {
                query: "zebra".into()
            }
        );
        assert_eq!(index.next(&mut doc, false), NavigateOutcome::NoMatches);
        assert_eq!(index.state().current_index(), None);
    }

    #[test]
    fn refuses_while_collapsed() {
        let mut doc = doc();
        let mut index = SearchIndex::<NodeId>::new();
        index.search(&mut doc, "retry", false);
        assert_eq!(index.search(&mut doc, "retry", true), SearchOutcome::RestoreFirst);
        assert!(index.state().matches().is_empty());
        assert_eq!(index.state().current_index(), None);
        assert!(doc.highlighted().is_empty());
        assert_eq!(index.previous(&mut doc, true), NavigateOutcome::RestoreFirst);
    }

    #[test]
    fn focus_follows_rerendered_match() {
        let mut doc = doc();
        let mut index = SearchIndex::<NodeId>::new();
        index.search(&mut doc, "retry", false);
        doc.rerender();
        index.next(&mut doc, false);
        let m3 = doc.find_attached("m3").unwrap();
        assert_eq!(doc.highlighted(), vec![m3]);
        assert_eq!(index.state().current_match().unwrap().node, m3);
    }
}
