//! Typed shell commands.
//!
//! Toolbar actions map straight onto [`threadfold::Command`]; everything
//! else either inspects the document or plays the host page and mutates it
//! behind the engine's back.

use std::path::PathBuf;

use threadfold::Command;
use threadfold::document::Role;

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    /// A toolbar action.
    Engine(Command),
    /// Export into a directory other than the configured one.
    ExportTo(PathBuf),
    /// Print the attached entries.
    List,
    /// Print the panel: status, counters, conversation.
    Status,
    /// Print the most recent captured log lines.
    Logs(usize),
    /// Host appends a reply.
    Append { role: Role, text: String },
    /// Host deletes the entry with this key, attached or not.
    Remove(String),
    /// Host re-renders the whole thread.
    Rerender,
    /// Host navigates to another conversation with `count` synthetic entries.
    Navigate { path: String, count: usize },
    /// Host scrolls the viewport.
    Scroll(f64),
    /// Change the window size.
    Keep(usize),
    Help,
    Quit,
}

pub const HELP: &str = "\
toolbar:  collapse | restore | search <query> | next | prev | export [dir]
inspect:  list | status | logs [n]
host:     append <user|assistant> <text> | remove <key> | rerender
          navigate <path> [count] | scroll <dy>
settings: keep <n>
          help | quit";

const DEFAULT_NAVIGATE_COUNT: usize = 30;
const DEFAULT_LOG_LINES: usize = 20;

impl ShellCommand {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "collapse" | "c" => Self::Engine(Command::Collapse),
            "restore" | "r" => Self::Engine(Command::Restore),
            "search" | "/" => Self::Engine(Command::Search(rest.to_string())),
            "next" | "n" => Self::Engine(Command::NextMatch),
            "prev" | "previous" | "p" => Self::Engine(Command::PreviousMatch),
            "export" if rest.is_empty() => Self::Engine(Command::Export),
            "export" => Self::ExportTo(PathBuf::from(rest)),
            "list" | "ls" => Self::List,
            "status" => Self::Status,
            "logs" => Self::Logs(optional_number(rest, DEFAULT_LOG_LINES)?),
            "append" => {
                let (role, text) = rest
                    .split_once(char::is_whitespace)
                    .ok_or("usage: append <user|assistant> <text>")?;
                Self::Append {
                    role: Role::parse(role),
                    text: text.trim().to_string(),
                }
            }
            "remove" | "rm" => {
                if rest.is_empty() {
                    return Err("usage: remove <key>".into());
                }
                Self::Remove(rest.to_string())
            }
            "rerender" => Self::Rerender,
            "navigate" | "nav" => {
                let mut parts = rest.split_whitespace();
                let path = parts.next().ok_or("usage: navigate <path> [count]")?.to_string();
                let count = optional_number(parts.next().unwrap_or(""), DEFAULT_NAVIGATE_COUNT)?;
                Self::Navigate { path, count }
            }
            "scroll" => Self::Scroll(
                rest.parse()
                    .map_err(|_| format!("usage: scroll <dy>, got {rest:?}"))?,
            ),
            "keep" => Self::Keep(
                rest.parse()
                    .map_err(|_| format!("usage: keep <n>, got {rest:?}"))?,
            ),
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(format!("unknown command {other:?}, try `help`")),
        };
        Ok(Some(command))
    }
}

fn optional_number(raw: &str, default: usize) -> Result<usize, String> {
    if raw.is_empty() {
        return Ok(default);
    }
    raw.parse().map_err(|_| format!("expected a number, got {raw:?}"))
}
