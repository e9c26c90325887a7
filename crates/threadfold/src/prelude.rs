//! Convenience re-exports for common `threadfold` types.
//!
//! ```ignore
//! use threadfold::prelude::*;
//! ```
//!
//! Covers the session, its configuration, the adapter trait with the
//! in-memory document, event handlers and export sinks. Window and search
//! internals (placements, outcomes, state) stay in their modules.

// ── Session ─────────────────────────────────────────────────────────
pub use crate::{Command, EngineConfig, EngineSession, Entry, Reconciliation, Status, Tone};

// ── Document ────────────────────────────────────────────────────────
pub use crate::conversation::{ConversationKey, IdentityConfig, IdentitySource};
pub use crate::document::{
    BoundingBox, DocumentAdapter, DocumentError, EntrySpec, Location, MemoryDocument, NodeId, Role,
    StructuralChange,
};

// ── Events ──────────────────────────────────────────────────────────
pub use crate::events::{
    CompositeEventHandler, EventHandler, FnEventHandler, LoggingHandler, NoopHandler, SessionEvent,
};

// ── Export ──────────────────────────────────────────────────────────
pub use crate::export::{ExportPayload, ExportRecord, ExportSink, JsonFileSink, MemorySink};

// ── UI state ────────────────────────────────────────────────────────
pub use crate::ui::event_handler::PanelEventHandler;
pub use crate::ui::tracing::{LogBuffer, PanelTracingLayer};
pub use crate::ui::{LogLevel, LogLine, PanelState};
