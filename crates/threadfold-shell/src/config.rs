//! Shell configuration with sensible defaults.
//!
//! [`ShellConfig`] collects what the binary needs to set up a session: the
//! transcript to render, viewport size, export directory and the engine
//! settings. Engine settings may come from a JSON file (`--config`); flags
//! given on the command line override it.

use std::path::{Path, PathBuf};

use threadfold::EngineConfig;
use threadfold::document::MemoryDocument;

use crate::transcript::{DEFAULT_URL, Transcript};

/// Entries in the synthetic thread used when no transcript is given.
pub const SYNTHETIC_ENTRIES: usize = 60;

#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Transcript file. `None` renders a synthetic thread.
    pub transcript: Option<PathBuf>,
    /// Address override. Default: the transcript's, else [`DEFAULT_URL`].
    pub url: Option<String>,
    /// Viewport height of the in-memory document. Default: `800`.
    pub viewport_height: f64,
    /// Where `export` writes. Default: `"."`.
    pub export_dir: PathBuf,
    /// Mirror logs to stderr. Default: `false`.
    pub verbose: bool,
    pub engine: EngineConfig,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            transcript: None,
            url: None,
            viewport_height: 800.0,
            export_dir: PathBuf::from("."),
            verbose: false,
            engine: EngineConfig::default(),
        }
    }
}

impl ShellConfig {
    /// Read engine settings from a JSON file.
    pub fn with_engine_file(mut self, path: &Path) -> Result<Self, String> {
        let json =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        self.engine = EngineConfig::from_json_str(&json)?;
        Ok(self)
    }

    pub fn with_keep_latest(mut self, keep_latest: Option<usize>) -> Self {
        if let Some(keep) = keep_latest {
            self.engine.keep_latest = keep;
        }
        self
    }

    /// Load the transcript (or synthesize one).
    pub fn load_transcript(&self) -> Result<Transcript, String> {
        match &self.transcript {
            Some(path) => Transcript::load(path),
            None => Ok(Transcript::synthetic("m", SYNTHETIC_ENTRIES)),
        }
    }

    /// Render the transcript into a fresh document.
    pub fn build_document(&self) -> Result<MemoryDocument, String> {
        let transcript = self.load_transcript()?;
        let url = self
            .url
            .clone()
            .or(transcript.url)
            .unwrap_or_else(|| DEFAULT_URL.to_string());
        let mut document =
            MemoryDocument::from_entries(url, transcript.entries).with_viewport_height(self.viewport_height);
        if let Some(id) = transcript.conversation_id {
            document = document.with_conversation_id(id);
        }
        document.scroll_to_bottom();
        Ok(document)
    }
}
