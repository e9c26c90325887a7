//! Windowing engine for very long conversation threads rendered in a host
//! document.
//!
//! `threadfold` keeps a long chat transcript responsive by detaching every
//! message except the most recent ones, and puts them back losslessly on
//! demand. The core abstraction is the [`EngineSession`]: it owns a
//! [`DocumentAdapter`](document::DocumentAdapter) and maps toolbar
//! [`Command`]s onto collapse, restore, search and export, answering each
//! with a [`Status`] line.
//!
//! The engine never reaches into the host's nodes itself. A browser
//! extension, a terminal renderer or a test harness implements the adapter;
//! [`MemoryDocument`](document::MemoryDocument) is the in-process reference
//! implementation used by the shell and the test suites.
//!
//! # Getting started
//!
//! ```
//! use threadfold::prelude::*;
//!
//! let entries = (1..=25).map(|i| {
//!     EntrySpec::new(Role::Assistant, format!("reply {i}")).with_id(format!("m{i}"))
//! });
//! let document = MemoryDocument::from_entries("https://chat.example.com/c/abc", entries);
//!
//! let mut session = EngineSession::new(document, EngineConfig::default())
//!     .with_event_handler(LoggingHandler);
//!
//! let status = session.collapse();
//! assert_eq!(status.tone, Tone::Success);
//! assert_eq!(session.document().attached_keys().len(), 20);
//!
//! // Search only sees the attached window, so it refuses while collapsed.
//! assert_eq!(session.search("reply").tone, Tone::Warning);
//!
//! session.restore();
//! assert_eq!(session.document().attached_keys().len(), 25);
//! ```
//!
//! # Where to find things
//!
//! - **Plug in a host document:** implement
//!   [`DocumentAdapter`](document::DocumentAdapter). Mutations report
//!   [`DocumentError`](document::DocumentError); the engine treats every one
//!   of them as a stale reference and carries on.
//!
//! - **Collapse and restore:** see [`window::WindowManager`] and its
//!   [`Placement`](window::Placement) strategies.
//!
//! - **Tell conversations apart:** see
//!   [`ConversationResolver`](conversation::ConversationResolver) and
//!   [`IdentityConfig`](conversation::IdentityConfig).
//!
//! - **Observe the engine:** implement [`EventHandler`](events::EventHandler),
//!   or compose [`LoggingHandler`](events::LoggingHandler) with
//!   [`PanelEventHandler`](ui::event_handler::PanelEventHandler) to drive a
//!   toolbar from [`PanelState`](ui::PanelState).
//!
//! - **Export:** [`export::ExportPayload`] plus an
//!   [`ExportSink`](export::ExportSink) such as
//!   [`JsonFileSink`](export::JsonFileSink).
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`document`] | Adapter trait, geometry, structural changes, in-memory document |
//! | [`entry`] | Captured entry metadata and reconciliation by identity key |
//! | [`conversation`] | Conversation key resolution and change detection |
//! | [`window`] | Collapse/restore, placement strategies, scroll continuity |
//! | [`search`] | Case-insensitive search over the attached window |
//! | [`export`] | Export set assembly, payload, sinks |
//! | [`session`] | [`EngineSession`], [`Command`], reconciliation loop |
//! | [`events`] | [`SessionEvent`](events::SessionEvent) and handlers |
//! | [`ui`] | Status, panel state and the tracing capture layer |

pub mod config;
pub mod conversation;
pub mod document;
pub mod entry;
pub mod events;
pub mod export;
pub mod prelude;
pub mod search;
pub mod session;
pub mod ui;
pub mod window;

pub use config::EngineConfig;
pub use entry::Entry;
pub use session::{Command, EngineSession, Reconciliation};
pub use ui::{Status, Tone};
