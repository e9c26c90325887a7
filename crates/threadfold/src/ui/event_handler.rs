//! `EventHandler` → `PanelState` bridge.
//!
//! ```ignore
//! let handler = CompositeEventHandler::new()
//!     .with(LoggingHandler)
//!     .with(PanelEventHandler::new(panel.clone()));
//! ```

use std::sync::{Arc, Mutex};

use crate::events::{EventHandler, SessionEvent};

use super::{PanelState, record_remount, update_conversation, update_match, update_window};

/// Mirrors session events into a shared [`PanelState`].
///
/// Status lines are not handled here: every session operation returns its
/// [`Status`](super::Status) directly and the caller stores it.
pub struct PanelEventHandler {
    state: Arc<Mutex<PanelState>>,
}

impl PanelEventHandler {
    pub fn new(state: Arc<Mutex<PanelState>>) -> Self {
        Self { state }
    }
}

impl EventHandler for PanelEventHandler {
    fn on_event(&self, event: &SessionEvent<'_>) {
        match event {
            SessionEvent::ConversationChanged { to, .. } => {
                update_conversation(&self.state, to);
            }
            SessionEvent::Collapsed { total_detached, .. } => {
                update_window(&self.state, true, *total_detached);
                update_match(&self.state, None);
            }
            SessionEvent::Restored { .. } => {
                update_window(&self.state, false, 0);
            }
            SessionEvent::SearchCompleted { matches, .. } => {
                let position = (*matches > 0).then_some((1, *matches));
                update_match(&self.state, position);
            }
            SessionEvent::MatchFocused { index, count, .. } => {
                update_match(&self.state, Some((index + 1, *count)));
            }
            SessionEvent::ControlsRemounted => {
                record_remount(&self.state);
            }
            SessionEvent::NothingToOptimize { .. }
            | SessionEvent::EntryDropped { .. }
            | SessionEvent::Exported { .. }
            | SessionEvent::Refused { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_and_restore_update_counters() {
        let state = Arc::new(Mutex::new(PanelState::default()));
        let handler = PanelEventHandler::new(state.clone());
        handler.on_event(&SessionEvent::Collapsed {
            detached: 5,
            kept: 20,
            total_detached: 5,
        });
        handler.on_event(&SessionEvent::Collapsed {
            detached: 2,
            kept: 20,
            total_detached: 7,
        });
        {
            let s = state.lock().unwrap();
            assert!(s.collapsed);
            assert_eq!(s.detached, 7);
        }
        handler.on_event(&SessionEvent::Restored {
            restored: 7,
            dropped: 0,
            scroll_delta: 0.0,
        });
        assert!(!state.lock().unwrap().collapsed);
    }

    #[test]
    fn search_events_drive_match_label() {
        let state = Arc::new(Mutex::new(PanelState::default()));
        let handler = PanelEventHandler::new(state.clone());
        handler.on_event(&SessionEvent::SearchCompleted {
            query: "retry",
            matches: 3,
        });
        assert_eq!(state.lock().unwrap().match_label(), "1/3");
        handler.on_event(&SessionEvent::MatchFocused {
            index: 2,
            count: 3,
            identity_key: "m7",
        });
        assert_eq!(state.lock().unwrap().match_label(), "3/3");
        handler.on_event(&SessionEvent::SearchCompleted {
            query: "none",
            matches: 0,
        });
        assert_eq!(state.lock().unwrap().match_label(), "");
    }

    #[test]
    fn remounts_are_counted() {
        let state = Arc::new(Mutex::new(PanelState::default()));
        let handler = PanelEventHandler::new(state.clone());
        handler.on_event(&SessionEvent::ControlsRemounted);
        handler.on_event(&SessionEvent::ControlsRemounted);
        assert_eq!(state.lock().unwrap().remounts, 2);
    }
}
