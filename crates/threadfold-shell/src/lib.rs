//! Interactive terminal driver for the threadfold windowing engine.
//!
//! `threadfold-shell` loads a conversation transcript into a
//! [`MemoryDocument`](threadfold::document::MemoryDocument) and lets you
//! drive an [`EngineSession`](threadfold::EngineSession) from typed
//! commands, including the host-side mutations (appending replies,
//! deleting entries, re-rendering, navigating) the engine has to survive.
//!
//! # Library usage
//!
//! ```ignore
//! use threadfold_shell::{ShellCommand, ShellConfig};
//!
//! let config = ShellConfig::default();
//! let document = config.build_document()?;
//! let command = ShellCommand::parse("search retry")?;
//! ```
//!
//! # Binary
//!
//! ```sh
//! # Synthetic 60-message thread
//! threadfold
//!
//! # Your own transcript, smaller window, exports next to it
//! threadfold --transcript chat.json --keep 10 --export-dir ./exports
//! ```

pub mod command;
pub mod config;
pub mod transcript;
pub mod view;

pub use command::ShellCommand;
pub use config::ShellConfig;
pub use transcript::Transcript;
