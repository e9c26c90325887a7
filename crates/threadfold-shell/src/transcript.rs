//! Transcript files: what the shell renders into its in-memory document.
//!
//! Either a bare array of entries or an object with an address:
//!
//! ```json
//! {
//!   "url": "https://chat.example.com/c/abc",
//!   "conversation_id": "abc",
//!   "entries": [
//!     { "id": "m1", "role": "user", "text": "hello" },
//!     { "id": "m2", "role": "assistant", "text": "hi there", "height": 240 }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use threadfold::document::{EntrySpec, Role};

/// Address used when a transcript does not carry one.
pub const DEFAULT_URL: &str = "https://chat.example.com/c/demo";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub entries: Vec<EntrySpec>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TranscriptFile {
    Full(Transcript),
    Bare(Vec<EntrySpec>),
}

impl Transcript {
    pub fn parse(json: &str) -> Result<Self, String> {
        let file: TranscriptFile = serde_json::from_str(json).map_err(|e| format!("invalid transcript: {e}"))?;
        Ok(match file {
            TranscriptFile::Full(t) => t,
            TranscriptFile::Bare(entries) => Self {
                url: None,
                conversation_id: None,
                entries,
            },
        })
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let json =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        Self::parse(&json)
    }

    /// A synthetic alternating user/assistant thread of `count` entries.
    pub fn synthetic(prefix: &str, count: usize) -> Self {
        Self {
            url: None,
            conversation_id: None,
            entries: synthetic_entries(prefix, count),
        }
    }
}

/// Alternating user/assistant entries with ids `{prefix}1..={count}` and
/// uneven heights.
pub fn synthetic_entries(prefix: &str, count: usize) -> Vec<EntrySpec> {
    (1..=count)
        .map(|i| {
            let (role, text) = if i % 2 == 1 {
                (Role::User, format!("Question {i}: could you retry step {}?", i % 7))
            } else {
                (Role::Assistant, format!("Answer {i}: here is the output of step {}.", i % 7))
            };
            EntrySpec::new(role, text)
                .with_id(format!("{prefix}{i}"))
                .with_height(80.0 + (i % 5) as f64 * 40.0)
        })
        .collect()
}
