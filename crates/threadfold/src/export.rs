//! Export assembly: the complete conversation regardless of collapse state.
//!
//! While collapsed, the detached entries only exist in the window manager's
//! snapshot, so the export set is the snapshot followed by anything the host
//! appended afterwards; a live entry already in the snapshot is skipped by
//! identity key. Otherwise it is simply the attached entries, as enumerated.
//!
//! Serialization and delivery belong to an [`ExportSink`].

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{DocumentAdapter, Location, Role};
use crate::entry::{self, Entry};
use crate::window::WindowState;

/// Merge the snapshot (when collapsed) with the attached entries.
pub fn build_export_set<D: DocumentAdapter>(
    window: &WindowState<D::NodeRef>,
    document: &D,
) -> Vec<Entry<D::NodeRef>> {
    let live = entry::enumerate(document);
    if !window.is_collapsed() {
        return live;
    }
    let captured: HashSet<&str> = window.snapshot().iter().map(|e| e.identity_key.as_str()).collect();
    let appended: Vec<_> = live
        .into_iter()
        .filter(|e| !captured.contains(e.identity_key.as_str()))
        .collect();
    window.snapshot().iter().cloned().chain(appended).collect()
}

/// One exported message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// 1-based position in the export set.
    pub index: usize,
    pub role: Role,
    pub text: String,
}

/// What an [`ExportSink`] receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    /// RFC 3339 timestamp, UTC.
    pub exported_at: String,
    /// Source location of the conversation.
    pub url: String,
    /// Size of the export set, including entries without text.
    pub message_count: usize,
    pub messages: Vec<ExportRecord>,
}

impl ExportPayload {
    /// Build the payload. Indices are positions in `entries`; entries whose
    /// text is empty are skipped but keep their slot in the numbering.
    pub fn assemble<R>(entries: &[Entry<R>], location: &Location, exported_at: DateTime<Utc>) -> Self {
        let messages = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.text.is_empty())
            .map(|(i, e)| ExportRecord {
                index: i + 1,
                role: e.role,
                text: e.text.clone(),
            })
            .collect();
        Self {
            exported_at: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            url: location.href().to_string(),
            message_count: entries.len(),
            messages,
        }
    }
}

/// File name for an export taken at `at`: `conversation-<timestamp>.json`
/// with `:` and `.` replaced so it is valid on every filesystem.
pub fn export_file_name(at: DateTime<Utc>) -> String {
    let tag = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("conversation-{tag}.json")
}

/// Consumer of export payloads.
pub trait ExportSink {
    /// Deliver the payload. Returns a short description of where it went.
    fn deliver(&mut self, payload: &ExportPayload) -> Result<String, String>;
}

/// Writes pretty-printed JSON files into a directory.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ExportSink for JsonFileSink {
    fn deliver(&mut self, payload: &ExportPayload) -> Result<String, String> {
        let at = DateTime::parse_from_rfc3339(&payload.exported_at)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        let path = self.dir.join(export_file_name(at));
        let json = serde_json::to_string_pretty(payload)
            .map_err(|e| format!("failed to serialize export: {e}"))?;
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| format!("failed to create {}: {e}", self.dir.display()))?;
        std::fs::write(&path, json).map_err(|e| format!("failed to write {}: {e}", path.display()))?;
        Ok(path.display().to_string())
    }
}

/// Keeps payloads in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub delivered: Vec<ExportPayload>,
}

impl ExportSink for MemorySink {
    fn deliver(&mut self, payload: &ExportPayload) -> Result<String, String> {
        self.delivered.push(payload.clone());
        Ok(format!("memory #{}", self.delivered.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{EntrySpec, MemoryDocument, NodeId};
    use crate::window::WindowManager;
    use chrono::TimeZone;

    fn doc_with(n: usize) -> MemoryDocument {
        MemoryDocument::from_entries(
            "https://chat.example.com/c/export",
            (1..=n).map(|i| EntrySpec::new(Role::User, format!("line {i}")).with_id(format!("m{i}"))),
        )
    }

    fn keys(entries: &[Entry<NodeId>]) -> Vec<&str> {
        entries.iter().map(|e| e.identity_key.as_str()).collect()
    }

    #[test]
    fn expanded_export_is_the_attached_entries() {
        let doc = doc_with(4);
        let wm = WindowManager::<NodeId>::new(2);
        assert_eq!(keys(&build_export_set(wm.state(), &doc)), vec!["m1", "m2", "m3", "m4"]);
    }

    #[test]
    fn collapsed_export_merges_snapshot_and_new_entries() {
        let mut doc = doc_with(4);
        let mut wm = WindowManager::<NodeId>::new(2);
        wm.collapse(&mut doc);
        doc.append_entry(EntrySpec::new(Role::Assistant, "late reply").with_id("m5"));
        let set = build_export_set(wm.state(), &doc);
        assert_eq!(keys(&set), vec!["m1", "m2", "m3", "m4", "m5"]);
        assert_eq!(set[0].text, "line 1");
    }

    #[test]
    fn collapsed_export_dedups_rerendered_entries() {
        let mut doc = doc_with(4);
        let mut wm = WindowManager::<NodeId>::new(2);
        wm.collapse(&mut doc);
        doc.rerender();
        assert_eq!(keys(&build_export_set(wm.state(), &doc)), vec!["m1", "m2", "m3", "m4"]);
    }

    #[test]
    fn repeated_messages_without_ids_are_all_exported() {
        let texts = ["continue", "part one", "continue", "part two", "continue", "part three"];
        let mut doc = MemoryDocument::from_entries(
            "https://chat.example.com/c/twins",
            texts.iter().enumerate().map(|(i, t)| {
                let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
                EntrySpec::new(role, *t)
            }),
        );
        let texts_of = |set: &[Entry<NodeId>]| set.iter().map(|e| e.text.clone()).collect::<Vec<_>>();

        let mut wm = WindowManager::<NodeId>::new(3);
        assert_eq!(texts_of(&build_export_set(wm.state(), &doc)), texts);

        wm.collapse(&mut doc);
        assert_eq!(texts_of(&build_export_set(wm.state(), &doc)), texts);

        doc.rerender();
        doc.append_entry(EntrySpec::new(Role::User, "continue"));
        let set = build_export_set(wm.state(), &doc);
        assert_eq!(set.len(), 7);
        assert_eq!(set.iter().filter(|e| e.text == "continue").count(), 4);
    }

    #[test]
    fn payload_skips_empty_text_but_keeps_numbering() {
        let doc = MemoryDocument::from_entries(
            "https://chat.example.com/c/p?x=1",
            [
                EntrySpec::new(Role::User, "hi").with_id("a"),
                EntrySpec::new(Role::Assistant, "   ").with_id("b"),
                EntrySpec::new(Role::Assistant, "hello").with_id("c"),
            ],
        );
        let set = entry::enumerate(&doc);
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
        let payload = ExportPayload::assemble(&set, &doc.location(), at);
        assert_eq!(payload.message_count, 3);
        assert_eq!(payload.url, "https://chat.example.com/c/p?x=1");
        assert_eq!(payload.exported_at, "2026-10-18T09:30:00.000Z");
        let indices: Vec<_> = payload.messages.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![1, 3]);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["messageCount"], 3);
        assert_eq!(json["messages"][1]["role"], "assistant");
    }

    #[test]
    fn file_name_is_filesystem_safe() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(export_file_name(at), "conversation-2026-01-02T03-04-05-000Z.json");
    }

    #[test]
    fn json_file_sink_writes_payload() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonFileSink::new(dir.path());
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let payload = ExportPayload::assemble::<NodeId>(&[], &Location::new("/c/x"), at);
        let written = sink.deliver(&payload).unwrap();
        let contents = std::fs::read_to_string(&written).unwrap();
        let back: ExportPayload = serde_json::from_str(&contents).unwrap();
        assert_eq!(back, payload);
    }
}
