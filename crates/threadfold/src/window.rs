//! Window manager: detach all but the most recent entries, restore them
//! losslessly.
//!
//! The window is always "everything except the newest `keep_latest`". A
//! collapse detaches the older prefix in one pass; a restore puts that prefix
//! back as one contiguous block in front of the anchor (the first entry that
//! stayed attached), then corrects the scroll position so the content the
//! user was looking at does not jump.
//!
//! Reinsertion targets are tried through an ordered list of [`Placement`]
//! strategies. An entry that no strategy can place, because the host
//! destroyed it or everything it could be placed against, is dropped from
//! the restore and reported back; nothing here ever fails the operation.

use tracing::{debug, info};

use crate::document::{DocumentAdapter, DocumentError};
use crate::entry::{self, Entry};

/// Default number of recent entries left attached by a collapse.
pub const DEFAULT_KEEP_LATEST: usize = 20;

/// A detached entry and the parent it was removed from.
#[derive(Debug, Clone)]
pub struct DetachedRecord<R> {
    pub entry: Entry<R>,
    pub original_parent: Option<R>,
}

/// The first entry left attached by the most recent collapse.
#[derive(Debug, Clone)]
pub struct AnchorRecord<R> {
    pub entry: Entry<R>,
    pub parent: Option<R>,
}

/// Collapse bookkeeping for one conversation.
///
/// While collapsed, `detached` holds exactly the snapshot prefix that was
/// removed, and the snapshot is `detached` followed by the entries that were
/// left attached at collapse time.
#[derive(Debug, Clone)]
pub struct WindowState<R> {
    collapsed: bool,
    keep_latest: usize,
    snapshot: Vec<Entry<R>>,
    detached: Vec<DetachedRecord<R>>,
    anchor: Option<AnchorRecord<R>>,
}

impl<R> WindowState<R> {
    fn new(keep_latest: usize) -> Self {
        Self {
            collapsed: false,
            keep_latest,
            snapshot: Vec::new(),
            detached: Vec::new(),
            anchor: None,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn keep_latest(&self) -> usize {
        self.keep_latest
    }

    /// Full sequence captured by the most recent collapse.
    pub fn snapshot(&self) -> &[Entry<R>] {
        &self.snapshot
    }

    pub fn detached(&self) -> &[DetachedRecord<R>] {
        &self.detached
    }

    pub fn anchor(&self) -> Option<&AnchorRecord<R>> {
        self.anchor.as_ref()
    }
}

/// Result of [`WindowManager::collapse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollapseOutcome {
    /// `count <= keep_latest`: the document was not touched.
    NothingToOptimize { count: usize, keep_latest: usize },
    Collapsed {
        /// Entries detached by this call.
        detached: usize,
        /// Entries left attached.
        kept: usize,
        /// Entries detached in total, including earlier collapses.
        total_detached: usize,
    },
}

/// Result of [`WindowManager::restore`].
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreOutcome {
    NotCollapsed,
    Restored {
        restored: usize,
        /// Identity keys of entries that could not be placed.
        dropped: Vec<String>,
        /// Scroll correction applied after reinsertion.
        scroll_delta: f64,
    },
}

/// One way of putting a detached entry back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Before the recorded anchor, provided it is still attached under its
    /// recorded parent.
    BeforeAnchor,
    /// Before whichever attached entry now carries the anchor's identity key
    /// (the host re-rendered the anchor).
    BeforeReconciledAnchor,
    /// Appended to the parent the entry was detached from.
    AppendToOriginalParent,
}

/// Strategy order used unless configured otherwise.
pub const DEFAULT_PLACEMENTS: [Placement; 3] = [
    Placement::BeforeAnchor,
    Placement::BeforeReconciledAnchor,
    Placement::AppendToOriginalParent,
];

/// Anchor targets resolved once per restore, before anything moves.
struct Targets<R> {
    anchor: Option<R>,
    reconciled: Option<R>,
}

impl Placement {
    fn try_place<D: DocumentAdapter>(
        self,
        document: &mut D,
        record: &DetachedRecord<D::NodeRef>,
        targets: &Targets<D::NodeRef>,
    ) -> Result<(), DocumentError> {
        let node = &record.entry.node;
        match self {
            Self::BeforeAnchor => {
                let anchor = targets.anchor.as_ref().ok_or(DocumentError::MissingTarget)?;
                document.reattach_before(node, anchor)
            }
            Self::BeforeReconciledAnchor => {
                let anchor = targets
                    .reconciled
                    .as_ref()
                    .ok_or(DocumentError::MissingTarget)?;
                document.reattach_before(node, anchor)
            }
            Self::AppendToOriginalParent => {
                let parent = record
                    .original_parent
                    .as_ref()
                    .ok_or(DocumentError::MissingTarget)?;
                document.reattach_append(node, parent)
            }
        }
    }
}

/// Where the user was looking before a restore.
struct ScrollAnchor<R> {
    entry: Entry<R>,
    top: f64,
}

/// The collapse/restore engine.
#[derive(Debug, Clone)]
pub struct WindowManager<R> {
    state: WindowState<R>,
    placements: Vec<Placement>,
    scroll_continuity: bool,
}

impl<R: Clone + PartialEq + std::fmt::Debug> WindowManager<R> {
    pub fn new(keep_latest: usize) -> Self {
        Self {
            state: WindowState::new(keep_latest),
            placements: DEFAULT_PLACEMENTS.to_vec(),
            scroll_continuity: true,
        }
    }

    pub fn with_placements(mut self, placements: impl IntoIterator<Item = Placement>) -> Self {
        self.placements = placements.into_iter().collect();
        self
    }

    /// Enable or disable the post-restore scroll correction.
    pub fn with_scroll_continuity(mut self, enabled: bool) -> Self {
        self.scroll_continuity = enabled;
        self
    }

    pub fn state(&self) -> &WindowState<R> {
        &self.state
    }

    pub fn is_collapsed(&self) -> bool {
        self.state.collapsed
    }

    /// Change the window size. Takes effect at the next collapse.
    pub fn set_keep_latest(&mut self, keep_latest: usize) {
        self.state.keep_latest = keep_latest;
    }

    /// Forget everything. References from a previous conversation are
    /// useless, so nothing is reattached.
    pub fn reset(&mut self) {
        self.state = WindowState::new(self.state.keep_latest);
    }

    /// Detach every attached entry except the newest `keep_latest`.
    ///
    /// Collapsing again while collapsed detaches whatever has overflowed the
    /// window since (the host appended entries); the new records go after the
    /// existing ones and the anchor moves to the new first kept entry.
    pub fn collapse<D>(&mut self, document: &mut D) -> CollapseOutcome
    where
        D: DocumentAdapter<NodeRef = R>,
    {
        let entries = entry::enumerate(document);
        let count = entries.len();
        let keep_latest = self.state.keep_latest;
        if count <= keep_latest {
            debug!("collapse skipped: {count} entries, keeping {keep_latest}");
            return CollapseOutcome::NothingToOptimize { count, keep_latest };
        }

        let cut = count - keep_latest;

        // The anchor must be captured before anything is detached. With
        // `keep_latest == 0` there is none and restore falls back to the
        // original parents.
        let anchor = entries.get(cut).map(|first_kept| AnchorRecord {
            entry: first_kept.clone(),
            parent: document.parent_of(&first_kept.node),
        });

        let mut snapshot: Vec<Entry<R>> = self.state.detached.iter().map(|r| r.entry.clone()).collect();
        snapshot.extend(entries.iter().cloned());

        let mut detached_now = 0;
        for item in &entries[..cut] {
            let parent = document.parent_of(&item.node);
            match document.detach(&item.node) {
                Ok(()) => {
                    self.state.detached.push(DetachedRecord {
                        entry: item.clone(),
                        original_parent: parent,
                    });
                    detached_now += 1;
                }
                Err(e) => {
                    // Left out of the snapshot so it still equals
                    // detached + kept.
                    info!("could not detach entry {}: {e}", item.identity_key);
                    snapshot.retain(|s| s.node != item.node);
                }
            }
        }

        if detached_now == 0 {
            return CollapseOutcome::NothingToOptimize { count, keep_latest };
        }

        self.state.snapshot = snapshot;
        self.state.anchor = anchor;
        self.state.collapsed = true;

        info!(
            "collapsed {detached_now} entries, {keep_latest} kept, {} detached in total",
            self.state.detached.len()
        );
        CollapseOutcome::Collapsed {
            detached: detached_now,
            kept: keep_latest,
            total_detached: self.state.detached.len(),
        }
    }

    /// Reattach every detached entry in original order and keep the viewport
    /// steady. No-op when not collapsed.
    pub fn restore<D>(&mut self, document: &mut D) -> RestoreOutcome
    where
        D: DocumentAdapter<NodeRef = R>,
    {
        if !self.state.collapsed {
            return RestoreOutcome::NotCollapsed;
        }

        let scroll_anchor = capture_scroll_anchor(document);
        let targets = self.resolve_targets(document);

        let mut restored = 0;
        let mut dropped = Vec::new();
        for record in &self.state.detached {
            if self.place(document, record, &targets) {
                restored += 1;
            } else {
                info!(
                    "entry {} could not be restored, dropping it",
                    record.entry.identity_key
                );
                dropped.push(record.entry.identity_key.clone());
            }
        }

        let scroll_delta = match (&scroll_anchor, self.scroll_continuity) {
            (Some(anchor), true) => correct_scroll(document, anchor),
            _ => 0.0,
        };

        self.state.detached.clear();
        self.state.anchor = None;
        self.state.snapshot.clear();
        self.state.collapsed = false;

        info!("restored {restored} entries, {} dropped", dropped.len());
        RestoreOutcome::Restored {
            restored,
            dropped,
            scroll_delta,
        }
    }

    fn resolve_targets<D>(&self, document: &D) -> Targets<R>
    where
        D: DocumentAdapter<NodeRef = R>,
    {
        let Some(anchor) = &self.state.anchor else {
            return Targets {
                anchor: None,
                reconciled: None,
            };
        };
        let node = &anchor.entry.node;
        let in_place = document.is_attached(node) && document.parent_of(node) == anchor.parent;
        let reconciled = if in_place {
            None
        } else {
            entry::find_attached(document, &anchor.entry.identity_key)
        };
        if !in_place {
            debug!(
                "anchor {} moved or vanished, reconciled: {}",
                anchor.entry.identity_key,
                reconciled.is_some()
            );
        }
        Targets {
            anchor: in_place.then(|| node.clone()),
            reconciled,
        }
    }

    fn place<D>(&self, document: &mut D, record: &DetachedRecord<R>, targets: &Targets<R>) -> bool
    where
        D: DocumentAdapter<NodeRef = R>,
    {
        for placement in &self.placements {
            match placement.try_place(document, record, targets) {
                Ok(()) => return true,
                Err(e) => debug!("{placement:?} failed for {}: {e}", record.entry.identity_key),
            }
        }
        false
    }
}

impl<R: Clone + PartialEq + std::fmt::Debug> Default for WindowManager<R> {
    fn default() -> Self {
        Self::new(DEFAULT_KEEP_LATEST)
    }
}

/// First attached entry at least partly in the viewport, else the first
/// attached entry.
fn capture_scroll_anchor<D: DocumentAdapter>(document: &D) -> Option<ScrollAnchor<D::NodeRef>> {
    let viewport = document.viewport_height();
    let entries = entry::enumerate(document);
    let with_boxes: Vec<_> = entries
        .into_iter()
        .filter_map(|e| document.bounding_box(&e.node).map(|b| (e, b)))
        .collect();
    let chosen = with_boxes
        .iter()
        .position(|(_, b)| b.intersects_viewport(viewport))
        .unwrap_or(0);
    with_boxes
        .into_iter()
        .nth(chosen)
        .map(|(entry, b)| ScrollAnchor { entry, top: b.top })
}

/// Scroll by however far the scroll anchor moved. Returns the delta applied.
fn correct_scroll<D: DocumentAdapter>(document: &mut D, anchor: &ScrollAnchor<D::NodeRef>) -> f64 {
    let Some(node) = entry::live_node(document, &anchor.entry) else {
        return 0.0;
    };
    let Some(after) = document.bounding_box(&node) else {
        return 0.0;
    };
    let delta = after.top - anchor.top;
    if delta != 0.0 {
        document.scroll_by(delta);
    }
    delta
}
