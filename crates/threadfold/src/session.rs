//! Engine session: one per page context.
//!
//! [`EngineSession`] owns the document adapter together with the window
//! manager, search index and conversation context, and turns toolbar
//! [`Command`]s into [`Status`] lines. Every public operation resolves the
//! conversation key first; when it changed since the last call, all window
//! and search state is dropped before the operation runs, so entries from
//! one conversation can never be reinserted into another.
//!
//! Host mutations are not observed by the session itself. The caller
//! subscribes through [`EngineSession::subscribe`] and feeds each
//! [`StructuralChange`] back through [`EngineSession::reconcile`]:
//!
//! ```ignore
//! let mut session = EngineSession::new(document, EngineConfig::default())
//!     .with_event_handler(LoggingHandler);
//! let mut changes = session.subscribe();
//! loop {
//!     tokio::select! {
//!         Some(change) = changes.recv() => { session.reconcile(change); }
//!         Some(command) = commands.recv() => { let status = session.dispatch(command); }
//!     }
//! }
//! ```

use chrono::Utc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::conversation::{ConversationContext, ConversationKey, ConversationResolver, Transition};
use crate::document::{DocumentAdapter, StructuralChange};
use crate::entry::Entry;
use crate::events::{EventHandler, NoopHandler, SessionEvent};
use crate::export::{self, ExportPayload, ExportSink};
use crate::search::{NavigateOutcome, SearchIndex, SearchOutcome, SearchState};
use crate::ui::Status;
use crate::window::{CollapseOutcome, RestoreOutcome, WindowManager, WindowState};

/// A toolbar action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Collapse,
    Restore,
    Search(String),
    NextMatch,
    PreviousMatch,
    Export,
}

/// What [`EngineSession::reconcile`] had to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Controls were missing and have been mounted again.
    pub remounted: bool,
    /// The conversation key changed and the session was reset.
    pub conversation_changed: bool,
}

const RESTORE_FIRST: &str = "Restore collapsed messages before searching.";

/// The windowing engine bound to one document.
pub struct EngineSession<D: DocumentAdapter> {
    document: D,
    config: EngineConfig,
    resolver: ConversationResolver,
    context: ConversationContext,
    window: WindowManager<D::NodeRef>,
    search: SearchIndex<D::NodeRef>,
    event_handler: Box<dyn EventHandler>,
    export_sink: Option<Box<dyn ExportSink>>,
    status: Status,
}

impl<D: DocumentAdapter> EngineSession<D> {
    /// Bind a session to `document`. Mounts the controls when configured and
    /// records the conversation currently shown.
    pub fn new(mut document: D, config: EngineConfig) -> Self {
        if config.mount_controls {
            document.mount_controls();
        }
        let resolver = ConversationResolver::new(config.identity.clone());
        let mut context = ConversationContext::default();
        let key = resolver.resolve(&document);
        debug!("session started on conversation {key}");
        context.observe(key);

        let window = WindowManager::new(config.keep_latest).with_scroll_continuity(config.scroll_continuity);
        Self {
            document,
            config,
            resolver,
            context,
            window,
            search: SearchIndex::new(),
            event_handler: Box::new(NoopHandler),
            export_sink: None,
            status: Status::default(),
        }
    }

    pub fn with_event_handler(mut self, handler: impl EventHandler + 'static) -> Self {
        self.event_handler = Box::new(handler);
        self
    }

    /// Where [`export`](Self::export) delivers payloads.
    pub fn with_export_sink(mut self, sink: impl ExportSink + 'static) -> Self {
        self.export_sink = Some(Box::new(sink));
        self
    }

    // ── Accessors ──────────────────────────────────────────────────

    pub fn document(&self) -> &D {
        &self.document
    }

    /// Mutable access for host-side changes. The session notices their
    /// effects on its next operation or reconciliation.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn window_state(&self) -> &WindowState<D::NodeRef> {
        self.window.state()
    }

    pub fn search_state(&self) -> &SearchState<D::NodeRef> {
        self.search.state()
    }

    pub fn is_collapsed(&self) -> bool {
        self.window.is_collapsed()
    }

    /// Conversation seen by the last operation.
    pub fn conversation(&self) -> Option<&ConversationKey> {
        self.context.current()
    }

    /// Status of the last operation.
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Change the window size for subsequent collapses.
    pub fn set_keep_latest(&mut self, keep_latest: usize) {
        self.config.keep_latest = keep_latest;
        self.window.set_keep_latest(keep_latest);
    }

    /// Subscribe to structural changes of the underlying document.
    pub fn subscribe(&mut self) -> UnboundedReceiver<StructuralChange> {
        self.document.observe_structural_change()
    }

    // ── Operations ─────────────────────────────────────────────────

    pub fn dispatch(&mut self, command: Command) -> Status {
        match command {
            Command::Collapse => self.collapse(),
            Command::Restore => self.restore(),
            Command::Search(query) => self.search(&query),
            Command::NextMatch => self.next_match(),
            Command::PreviousMatch => self.previous_match(),
            Command::Export => self.export(),
        }
    }

    /// Detach all but the newest `keep_latest` entries.
    pub fn collapse(&mut self) -> Status {
        self.sync_conversation();
        // Matches may be about to leave the document.
        self.search.clear(&mut self.document);

        let status = match self.window.collapse(&mut self.document) {
            CollapseOutcome::NothingToOptimize { count, keep_latest } => {
                self.emit(&SessionEvent::NothingToOptimize { count, keep_latest });
                Status::info(format!(
                    "Nothing to optimize: {count} messages, the latest {keep_latest} are always kept."
                ))
            }
            CollapseOutcome::Collapsed {
                detached,
                kept,
                total_detached,
            } => {
                self.emit(&SessionEvent::Collapsed {
                    detached,
                    kept,
                    total_detached,
                });
                Status::success(format!("Collapsed {detached} older messages."))
            }
        };
        self.finish(status)
    }

    /// Reattach everything a collapse removed.
    pub fn restore(&mut self) -> Status {
        self.sync_conversation();
        let status = match self.window.restore(&mut self.document) {
            RestoreOutcome::NotCollapsed => Status::info("No collapsed messages to restore."),
            RestoreOutcome::Restored {
                restored,
                dropped,
                scroll_delta,
            } => {
                for key in &dropped {
                    self.emit(&SessionEvent::EntryDropped { identity_key: key });
                }
                self.emit(&SessionEvent::Restored {
                    restored,
                    dropped: dropped.len(),
                    scroll_delta,
                });
                if dropped.is_empty() {
                    Status::success(format!("Restored {restored} messages."))
                } else {
                    Status::warning(format!(
                        "Restored {restored} messages, {} could not be restored.",
                        dropped.len()
                    ))
                }
            }
        };
        self.finish(status)
    }

    /// Search the attached entries. Refused while collapsed.
    pub fn search(&mut self, query: &str) -> Status {
        self.sync_conversation();
        let collapsed = self.window.is_collapsed();
        let status = match self.search.search(&mut self.document, query, collapsed) {
            SearchOutcome::RestoreFirst => {
                self.emit(&SessionEvent::Refused {
                    operation: "search",
                    reason: "collapsed",
                });
                Status::warning(RESTORE_FIRST)
            }
            SearchOutcome::Cleared => {
                self.emit(&SessionEvent::SearchCompleted { query: "", matches: 0 });
                Status::info("Search cleared.")
            }
            SearchOutcome::NoMatches { query } => {
                self.emit(&SessionEvent::SearchCompleted {
                    query: &query,
                    matches: 0,
                });
                Status::info(format!("No matches for \"{query}\"."))
            }
            SearchOutcome::Found { count, current } => {
                let query = self.search.state().query().to_string();
                self.emit(&SessionEvent::SearchCompleted {
                    query: &query,
                    matches: count,
                });
                self.emit_focus(current, count);
                Status::success(format!("Match {} of {count}.", current + 1))
            }
        };
        self.finish(status)
    }

    pub fn next_match(&mut self) -> Status {
        self.sync_conversation();
        let collapsed = self.window.is_collapsed();
        let outcome = self.search.next(&mut self.document, collapsed);
        self.navigated("next", outcome)
    }

    pub fn previous_match(&mut self) -> Status {
        self.sync_conversation();
        let collapsed = self.window.is_collapsed();
        let outcome = self.search.previous(&mut self.document, collapsed);
        self.navigated("previous", outcome)
    }

    /// The complete conversation, whether collapsed or not.
    pub fn build_export_set(&mut self) -> Vec<Entry<D::NodeRef>> {
        self.sync_conversation();
        export::build_export_set(self.window.state(), &self.document)
    }

    /// Assemble the export payload without delivering it.
    pub fn export_payload(&mut self) -> ExportPayload {
        let entries = self.build_export_set();
        ExportPayload::assemble(&entries, &self.document.location(), Utc::now())
    }

    /// Assemble the export payload and hand it to the configured sink.
    pub fn export(&mut self) -> Status {
        let Some(mut sink) = self.export_sink.take() else {
            self.sync_conversation();
            return self.finish(Status::warning("No export destination configured."));
        };
        let status = self.export_to(sink.as_mut());
        self.export_sink = Some(sink);
        status
    }

    /// Assemble the export payload and hand it to `sink`.
    pub fn export_to(&mut self, sink: &mut dyn ExportSink) -> Status {
        let payload = self.export_payload();
        let status = match sink.deliver(&payload) {
            Ok(destination) => {
                self.emit(&SessionEvent::Exported {
                    count: payload.message_count,
                    destination: &destination,
                });
                Status::success(format!(
                    "Exported {} messages to {destination}.",
                    payload.message_count
                ))
            }
            Err(e) => {
                warn!("export failed: {e}");
                Status::warning(format!("Export failed: {e}"))
            }
        };
        self.finish(status)
    }

    // ── Reconciliation ─────────────────────────────────────────────

    /// React to one structural change: remount missing controls and reset
    /// if the conversation changed underneath us.
    pub fn reconcile(&mut self, change: StructuralChange) -> Reconciliation {
        let mut result = Reconciliation::default();
        if self.config.mount_controls && !self.document.controls_mounted() {
            self.document.mount_controls();
            info!("controls missing after {change:?}, remounted");
            self.emit(&SessionEvent::ControlsRemounted);
            result.remounted = true;
        }
        if matches!(change, StructuralChange::LocationChanged | StructuralChange::EntriesChanged) {
            result.conversation_changed = self.sync_conversation();
        }
        result
    }

    /// Reconcile every change already queued on `changes`. Returns how many
    /// were processed.
    pub fn drain(&mut self, changes: &mut UnboundedReceiver<StructuralChange>) -> usize {
        let mut processed = 0;
        while let Ok(change) = changes.try_recv() {
            self.reconcile(change);
            processed += 1;
        }
        processed
    }

    // ── Internals ──────────────────────────────────────────────────

    /// Re-resolve the conversation key and reset on change. Returns whether
    /// a reset happened.
    fn sync_conversation(&mut self) -> bool {
        let key = self.resolver.resolve(&self.document);
        let Transition::Changed { from } = self.context.observe(key) else {
            return false;
        };
        self.window.reset();
        self.search.reset();
        let to = self.context.current().map(|k| k.as_str()).unwrap_or_default();
        self.event_handler.on_event(&SessionEvent::ConversationChanged {
            from: from.as_str(),
            to,
        });
        true
    }

    fn navigated(&mut self, operation: &str, outcome: NavigateOutcome) -> Status {
        let status = match outcome {
            NavigateOutcome::RestoreFirst => {
                self.emit(&SessionEvent::Refused {
                    operation,
                    reason: "collapsed",
                });
                Status::warning(RESTORE_FIRST)
            }
            NavigateOutcome::NoMatches => Status::info("No matches."),
            NavigateOutcome::Focused { index, count } => {
                self.emit_focus(index, count);
                Status::info(format!("Match {} of {count}.", index + 1))
            }
        };
        self.finish(status)
    }

    fn emit_focus(&self, index: usize, count: usize) {
        if let Some(current) = self.search.state().current_match() {
            self.event_handler.on_event(&SessionEvent::MatchFocused {
                index,
                count,
                identity_key: &current.identity_key,
            });
        }
    }

    fn emit(&self, event: &SessionEvent<'_>) {
        self.event_handler.on_event(event);
    }

    fn finish(&mut self, status: Status) -> Status {
        self.status = status.clone();
        status
    }
}
