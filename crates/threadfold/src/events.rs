//! Session events and handlers.
//!
//! The [`EngineSession`](crate::session::EngineSession) reports everything it
//! decides through [`SessionEvent`] variants: collapses, restores, dropped
//! entries, conversation resets, remounted controls, search results, exports.
//! Callers implement [`EventHandler`] to observe them.
//!
//! | Handler | Use case |
//! |---------|----------|
//! | [`NoopHandler`] | Tests, embedding without observation |
//! | [`LoggingHandler`] | Structured logging via `tracing` |
//! | [`FnEventHandler`] | Quick closures |
//! | [`CompositeEventHandler`] | Several handlers in order |

use tracing::{debug, info};

/// Something the session did or refused to do.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent<'a> {
    /// The displayed conversation changed; window and search state were reset.
    ConversationChanged { from: &'a str, to: &'a str },
    /// A collapse detached entries.
    Collapsed {
        detached: usize,
        kept: usize,
        total_detached: usize,
    },
    /// A collapse found nothing to do.
    NothingToOptimize { count: usize, keep_latest: usize },
    /// A restore finished.
    Restored {
        restored: usize,
        dropped: usize,
        scroll_delta: f64,
    },
    /// A detached entry could not be put back.
    EntryDropped { identity_key: &'a str },
    /// A search ran over the attached entries.
    SearchCompleted { query: &'a str, matches: usize },
    /// A match received the highlight.
    MatchFocused {
        index: usize,
        count: usize,
        identity_key: &'a str,
    },
    /// The host removed the engine's controls and they were mounted again.
    ControlsRemounted,
    /// An export was handed to the sink.
    Exported {
        count: usize,
        destination: &'a str,
    },
    /// An operation was refused because of the current state.
    Refused {
        operation: &'a str,
        reason: &'a str,
    },
}

/// Observer of [`SessionEvent`]s.
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: &SessionEvent<'_>) {
        let _ = event;
    }
}

/// Ignores every event.
pub struct NoopHandler;
impl EventHandler for NoopHandler {}

/// An event handler backed by a closure.
pub struct FnEventHandler<F>(F)
where
    F: Fn(&SessionEvent<'_>) + Send + Sync;

impl<F> FnEventHandler<F>
where
    F: Fn(&SessionEvent<'_>) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EventHandler for FnEventHandler<F>
where
    F: Fn(&SessionEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &SessionEvent<'_>) {
        (self.0)(event)
    }
}

/// Dispatches to several handlers in registration order.
///
/// ```ignore
/// let handler = CompositeEventHandler::new()
///     .with(LoggingHandler)
///     .with(my_panel_handler);
/// ```
#[derive(Default)]
pub struct CompositeEventHandler {
    handlers: Vec<Box<dyn EventHandler>>,
}

impl CompositeEventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, handler: impl EventHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Add a handler only when `condition` holds.
    pub fn with_if(self, condition: bool, handler: impl EventHandler + 'static) -> Self {
        if condition { self.with(handler) } else { self }
    }
}

impl EventHandler for CompositeEventHandler {
    fn on_event(&self, event: &SessionEvent<'_>) {
        for handler in &self.handlers {
            handler.on_event(event);
        }
    }
}

/// Logs events via `tracing`.
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn on_event(&self, event: &SessionEvent<'_>) {
        match event {
            SessionEvent::ConversationChanged { from, to } => {
                info!("Conversation changed {from} → {to}, state reset");
            }
            SessionEvent::Collapsed {
                detached,
                kept,
                total_detached,
            } => {
                info!("Collapsed {detached} entries ({total_detached} held), {kept} kept attached");
            }
            SessionEvent::NothingToOptimize { count, keep_latest } => {
                debug!("Nothing to optimize ({count} entries, window {keep_latest})");
            }
            SessionEvent::Restored {
                restored,
                dropped,
                scroll_delta,
            } => {
                info!("Restored {restored} entries ({dropped} dropped), scroll corrected by {scroll_delta}");
            }
            SessionEvent::EntryDropped { identity_key } => {
                info!("Entry {identity_key} could not be restored");
            }
            SessionEvent::SearchCompleted { query, matches } => {
                debug!("Search {query:?}: {matches} match(es)");
            }
            SessionEvent::MatchFocused {
                index,
                count,
                identity_key,
            } => {
                debug!("Match {}/{count}: {identity_key}", index + 1);
            }
            SessionEvent::ControlsRemounted => {
                info!("Controls were removed by the host, remounted");
            }
            SessionEvent::Exported { count, destination } => {
                info!("Exported {count} entries to {destination}");
            }
            SessionEvent::Refused { operation, reason } => {
                debug!("{operation} refused: {reason}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn composite_dispatches_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let first = seen.clone();
        let second = seen.clone();
        let handler = CompositeEventHandler::new()
            .with(FnEventHandler::new(move |_| first.lock().unwrap().push("first")))
            .with_if(false, NoopHandler)
            .with(FnEventHandler::new(move |_| second.lock().unwrap().push("second")));
        handler.on_event(&SessionEvent::ControlsRemounted);
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn logging_handler_accepts_every_variant() {
        let events = [
            SessionEvent::ConversationChanged { from: "a", to: "b" },
            SessionEvent::Collapsed {
                detached: 1,
                kept: 2,
                total_detached: 1,
            },
            SessionEvent::NothingToOptimize {
                count: 1,
                keep_latest: 20,
            },
            SessionEvent::Restored {
                restored: 1,
                dropped: 0,
                scroll_delta: 0.0,
            },
            SessionEvent::EntryDropped { identity_key: "k" },
            SessionEvent::SearchCompleted { query: "q", matches: 0 },
            SessionEvent::MatchFocused {
                index: 0,
                count: 1,
                identity_key: "k",
            },
            SessionEvent::ControlsRemounted,
            SessionEvent::Exported {
                count: 0,
                destination: "memory",
            },
            SessionEvent::Refused {
                operation: "search",
                reason: "collapsed",
            },
        ];
        for event in &events {
            LoggingHandler.on_event(event);
        }
    }
}
