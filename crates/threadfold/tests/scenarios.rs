//! End-to-end scenarios driving `EngineSession` over the in-memory document.

use std::sync::{Arc, Mutex};

use threadfold::prelude::*;

fn conversation(n: usize) -> MemoryDocument {
    MemoryDocument::from_entries(
        "https://chat.example.com/c/long-thread",
        (1..=n).map(|i| {
            let role = if i % 2 == 1 { Role::User } else { Role::Assistant };
            EntrySpec::new(role, format!("message number {i}"))
                .with_id(format!("m{i}"))
                .with_height(90.0)
        }),
    )
}

fn keys(range: std::ops::RangeInclusive<usize>) -> Vec<String> {
    range.map(|i| format!("m{i}")).collect()
}

/// Top of the first entry intersecting the viewport, with its key.
fn first_visible(doc: &MemoryDocument) -> (String, f64) {
    let viewport = doc.viewport_height();
    doc.enumerate_entries()
        .into_iter()
        .filter_map(|node| doc.bounding_box(&node).map(|b| (node, b)))
        .find(|(_, b)| b.intersects_viewport(viewport))
        .map(|(node, b)| (doc.identity_key_of(&node), b.top))
        .unwrap()
}

// ── Collapse and restore ─────────────────────────────────────────────

#[test]
fn collapse_twenty_five_keeps_twenty_and_restores_all() {
    let mut session = EngineSession::new(conversation(25), EngineConfig::default());

    let status = session.collapse();
    assert_eq!(status, Status::success("Collapsed 5 older messages."));
    assert_eq!(session.document().attached_keys(), keys(6..=25));

    let before = first_visible(session.document());
    let status = session.restore();
    assert_eq!(status, Status::success("Restored 5 messages."));
    assert_eq!(session.document().attached_keys(), keys(1..=25));

    let (key, top) = before;
    let node = session.document().find_attached(&key).unwrap();
    assert_eq!(session.document().bounding_box(&node).unwrap().top, top);
}

#[test]
fn short_conversation_is_left_alone() {
    let mut session = EngineSession::new(conversation(10), EngineConfig::default());
    let scroll = session.document().scroll_top();

    let status = session.collapse();
    assert_eq!(status.tone, Tone::Info);
    assert!(status.message.starts_with("Nothing to optimize"));
    assert!(!session.is_collapsed());
    assert_eq!(session.document().attached_keys(), keys(1..=10));
    assert_eq!(session.document().scroll_top(), scroll);
}

// ── Search ───────────────────────────────────────────────────────────

#[test]
fn search_is_refused_while_collapsed() {
    let mut session = EngineSession::new(conversation(25), EngineConfig::default());
    session.collapse();

    let status = session.search("message");
    assert_eq!(status.tone, Tone::Warning);
    assert!(session.search_state().matches().is_empty());
    assert_eq!(session.search_state().current_index(), None);
    assert!(session.document().highlighted().is_empty());

    assert_eq!(session.next_match().tone, Tone::Warning);
    assert!(session.is_collapsed());
}

#[test]
fn retry_matches_three_of_eight_and_wraps() {
    let texts = [
        "Can you retry the build?",
        "Sure, running it again.",
        "It failed. Retry once more.",
        "Still red.",
        "Let me look at the logs.",
        "Found the flaky test.",
        "Great, RETRY now please.",
        "All green.",
    ];
    let doc = MemoryDocument::from_entries(
        "https://chat.example.com/c/retry",
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| EntrySpec::new(Role::User, *t).with_id(format!("m{}", i + 1))),
    );
    let mut session = EngineSession::new(doc, EngineConfig::default());

    assert_eq!(session.search("retry"), Status::success("Match 1 of 3."));
    let highlighted_key = |s: &EngineSession<MemoryDocument>| {
        let nodes = s.document().highlighted();
        assert_eq!(nodes.len(), 1, "exactly one entry is highlighted");
        s.document().identity_key_of(&nodes[0])
    };
    assert_eq!(highlighted_key(&session), "m1");

    session.next_match();
    assert_eq!(highlighted_key(&session), "m3");
    session.next_match();
    assert_eq!(highlighted_key(&session), "m7");
    assert_eq!(session.next_match(), Status::info("Match 1 of 3."));
    assert_eq!(highlighted_key(&session), "m1");
    assert_eq!(session.previous_match(), Status::info("Match 3 of 3."));
    assert_eq!(highlighted_key(&session), "m7");
}

// ── Host interference ────────────────────────────────────────────────

#[test]
fn detached_entry_removed_by_host_is_dropped() {
    let dropped = Arc::new(Mutex::new(Vec::new()));
    let sink = dropped.clone();
    let handler = FnEventHandler::new(move |event: &SessionEvent<'_>| {
        if let SessionEvent::EntryDropped { identity_key } = event {
            sink.lock().unwrap().push(identity_key.to_string());
        }
    });
    let mut session = EngineSession::new(conversation(25), EngineConfig::default()).with_event_handler(handler);
    session.collapse();

    assert!(session.document_mut().destroy_by_key("m3"));
    let status = session.restore();

    assert_eq!(status.tone, Tone::Warning);
    assert_eq!(*dropped.lock().unwrap(), vec!["m3".to_string()]);
    let mut expected = keys(1..=25);
    expected.retain(|k| k != "m3");
    assert_eq!(session.document().attached_keys(), expected);
    assert!(!session.is_collapsed());
}

#[test]
fn restore_survives_full_rerender() {
    let mut session = EngineSession::new(conversation(30), EngineConfig::default());
    session.collapse();
    session.document_mut().rerender();

    assert_eq!(session.restore(), Status::success("Restored 10 messages."));
    assert_eq!(session.document().attached_keys(), keys(1..=30));
}

#[test]
fn entries_appended_while_collapsed_are_kept_in_order() {
    let mut session = EngineSession::new(conversation(22), EngineConfig::default());
    session.collapse();
    for i in 23..=24 {
        session
            .document_mut()
            .append_entry(EntrySpec::new(Role::Assistant, format!("late {i}")).with_id(format!("m{i}")));
    }

    // Collapsing again folds the new overflow into the detached prefix.
    assert_eq!(session.collapse(), Status::success("Collapsed 2 older messages."));
    assert_eq!(session.window_state().detached().len(), 4);
    assert_eq!(session.document().attached_keys(), keys(5..=24));

    session.restore();
    assert_eq!(session.document().attached_keys(), keys(1..=24));
}

// ── Export ───────────────────────────────────────────────────────────

#[test]
fn repeated_replies_without_ids_survive_export() {
    let texts = ["continue", "part one", "continue", "part two"];
    let doc = MemoryDocument::from_entries(
        "https://chat.example.com/c/no-ids",
        texts.iter().enumerate().map(|(i, t)| {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            EntrySpec::new(role, *t)
        }),
    );
    let config = EngineConfig::default().with_keep_latest(2);
    let mut session = EngineSession::new(doc, config);

    let exported = |s: &mut EngineSession<MemoryDocument>| {
        s.build_export_set().into_iter().map(|e| e.text).collect::<Vec<_>>()
    };
    assert_eq!(exported(&mut session), texts);

    assert_eq!(session.collapse(), Status::success("Collapsed 2 older messages."));
    assert_eq!(exported(&mut session), texts);
    let payload = session.export_payload();
    assert_eq!(payload.message_count, 4);
    assert_eq!(payload.messages.len(), 4);

    assert_eq!(session.restore(), Status::success("Restored 2 messages."));
    assert_eq!(session.document().attached_keys().len(), 4);
    assert_eq!(exported(&mut session), texts);
}
