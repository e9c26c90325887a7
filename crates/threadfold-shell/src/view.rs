//! Plain-text rendering of the document and the panel.

use threadfold::document::{DocumentAdapter, MemoryDocument};
use threadfold::ui::{LogLine, PanelState};
use threadfold::{Status, Tone};

const PREVIEW_CHARS: usize = 60;

pub fn tone_label(tone: Tone) -> &'static str {
    match tone {
        Tone::Info => "info",
        Tone::Success => " ok ",
        Tone::Warning => "warn",
    }
}

pub fn render_status(status: &Status) -> String {
    format!("[{}] {}", tone_label(status.tone), status.message)
}

/// One line per attached entry: highlight marker, key, role, geometry and a
/// text preview.
pub fn render_list(document: &MemoryDocument) -> String {
    let viewport = document.viewport_height();
    let mut out = Vec::new();
    for node in document.enumerate_entries() {
        let marker = if document.is_highlighted(node) { '*' } else { ' ' };
        let visible = document
            .bounding_box(&node)
            .is_some_and(|b| b.intersects_viewport(viewport));
        out.push(format!(
            "{marker}{} {:<12} {:<9} {}",
            if visible { '|' } else { ' ' },
            document.identity_key_of(&node),
            document.role_of(&node).as_str(),
            preview(&document.text_of(&node)),
        ));
    }
    if out.is_empty() {
        return "(no attached entries)".to_string();
    }
    out.join("\n")
}

pub fn render_panel(panel: &PanelState) -> String {
    let conversation = panel.conversation.as_deref().unwrap_or("-");
    let window = if panel.collapsed {
        format!("collapsed, {} held", panel.detached)
    } else {
        "expanded".to_string()
    };
    let matches = match panel.match_label().as_str() {
        "" => "-".to_string(),
        label => label.to_string(),
    };
    format!(
        "{}\nconversation: {conversation}\nwindow: {window}\nmatch: {matches}\nremounts: {}",
        render_status(&panel.status),
        panel.remounts
    )
}

pub fn render_logs(lines: &[LogLine], last: usize) -> String {
    let start = lines.len().saturating_sub(last);
    lines
        .iter()
        .skip(start)
        .map(|l| format!("{} {} {}", l.time, l.level.label(), l.message))
        .collect::<Vec<_>>()
        .join("\n")
}

fn preview(text: &str) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(PREVIEW_CHARS - 1).collect();
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use threadfold::document::{EntrySpec, Role};
    use threadfold::ui::LogLevel;

    #[test]
    fn status_carries_tone() {
        assert_eq!(render_status(&Status::warning("Restore first.")), "[warn] Restore first.");
    }

    #[test]
    fn list_marks_highlight_and_truncates() {
        let mut doc = MemoryDocument::from_entries(
            "/c/v",
            [
                EntrySpec::new(Role::User, "short").with_id("a"),
                EntrySpec::new(Role::Assistant, "x".repeat(100)).with_id("b"),
            ],
        );
        let a = doc.find_attached("a").unwrap();
        doc.set_highlight(&a, true);
        let text = render_list(&doc);
        let lines: Vec<_> = text.lines().collect();
        assert!(lines[0].starts_with('*'));
        assert!(lines[0].contains("short"));
        assert!(lines[1].ends_with('…'));
        assert_eq!(render_list(&MemoryDocument::new("/")), "(no attached entries)");
    }

    #[test]
    fn panel_summary() {
        let panel = PanelState {
            conversation: Some("abc".into()),
            collapsed: true,
            detached: 40,
            match_position: Some((2, 3)),
            ..Default::default()
        };
        let text = render_panel(&panel);
        assert!(text.contains("conversation: abc"));
        assert!(text.contains("collapsed, 40 held"));
        assert!(text.contains("match: 2/3"));
    }

    #[test]
    fn logs_show_the_tail() {
        let lines: Vec<LogLine> = (0..5)
            .map(|i| LogLine {
                time: "12:00:00".into(),
                level: LogLevel::Info,
                message: format!("line {i}"),
            })
            .collect();
        let text = render_logs(&lines, 2);
        assert_eq!(text.lines().count(), 2);
        assert!(text.ends_with("line 4"));
    }
}
