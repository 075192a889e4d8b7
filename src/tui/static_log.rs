//! The frozen, write-once region of the interactive UI.
//!
//! Entries are appended and rendered exactly once; the header is always
//! entry 0. Committed rows are never redrawn. Anything that changes over
//! time (the elapsed-time indicator) belongs to [`crate::tui::progress`].
//!
//! Item ids are not unique across a resumed session, so an entry is keyed by
//! `(id, index)`.

use crossterm::style::Stylize;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::approval::ApprovalMode;
use crate::format::{content_part_text, format_command_for_display, parse_command_arguments};
use crate::items::{ContentPart, MessageItem, ResponseItem};
use crate::tui::markdown::render_markdown_for_terminal;
use crate::tui::settings;
use crate::tui::text::{indent_rows, snippet_preview, truncate_single_line};

/// Session facts shown once at the top of the log.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderInfo {
    pub version: String,
    pub model: String,
    pub provider: String,
    pub approval_mode: ApprovalMode,
    pub cwd: PathBuf,
    pub session_id: Option<String>,
}

/// One row source in the static log.
#[derive(Debug, Clone, PartialEq)]
pub enum LogEntry {
    Header(HeaderInfo),
    Item(ResponseItem),
}

/// Reconciliation key: item id (empty for the header or id-less items) and
/// position.
pub type EntryKey = (String, usize);

impl LogEntry {
    pub fn key(&self, index: usize) -> EntryKey {
        let id = match self {
            Self::Header(_) => "",
            Self::Item(item) => item.id().unwrap_or_default(),
        };
        (id.to_string(), index)
    }
}

/// Rendering switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub color: bool,
    /// Show complete command output instead of a short preview.
    pub full_stdout: bool,
}

/// Append-only log writing committed rows to `out`.
pub struct StaticLog<W: Write> {
    out: W,
    entries: Vec<LogEntry>,
    committed: usize,
    options: RenderOptions,
}

impl<W: Write> StaticLog<W> {
    pub fn new(header: HeaderInfo, out: W, options: RenderOptions) -> Self {
        Self {
            out,
            entries: vec![LogEntry::Header(header)],
            committed: 0,
            options,
        }
    }

    pub fn push(&mut self, item: ResponseItem) {
        self.entries.push(LogEntry::Item(item));
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = ResponseItem>) {
        self.entries.extend(items.into_iter().map(LogEntry::Item));
    }

    /// Render and write every entry not yet committed.
    pub fn flush(&mut self) -> io::Result<()> {
        for entry in &self.entries[self.committed..] {
            for row in render_entry(entry, self.options) {
                writeln!(self.out, "{row}")?;
            }
        }
        self.committed = self.entries.len();
        self.out.flush()
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Number of entries already written.
    pub fn committed(&self) -> usize {
        self.committed
    }

    pub fn keys(&self) -> Vec<EntryKey> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| entry.key(index))
            .collect()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Rows for one entry. May be empty.
pub fn render_entry(entry: &LogEntry, options: RenderOptions) -> Vec<String> {
    match entry {
        LogEntry::Header(header) => render_header(header, options.color),
        LogEntry::Item(item) => render_item(item, options),
    }
}

fn render_header(header: &HeaderInfo, color: bool) -> Vec<String> {
    let title = format!("{} OpenAI Codex (research preview) v{}", settings::GLYPH_HEADER, header.version);
    let mut fields = vec![
        ("workdir", header.cwd.display().to_string()),
        ("model", header.model.clone()),
        ("provider", header.provider.clone()),
        ("approval", header.approval_mode.to_string()),
    ];
    if let Some(id) = &header.session_id {
        fields.insert(0, ("session", id.clone()));
    }

    let mut rows = Vec::with_capacity(fields.len() + 2);
    rows.push(if color {
        title.as_str().with(settings::COLOR_HEADER_TITLE).bold().to_string()
    } else {
        title
    });
    for (key, value) in fields {
        rows.push(if color {
            format!(
                "{}{} {}",
                settings::ITEM_INDENT,
                format!("{key}:").with(settings::COLOR_HEADER_KEY),
                value.as_str().with(settings::COLOR_HEADER_VALUE)
            )
        } else {
            format!("{}{key}: {value}", settings::ITEM_INDENT)
        });
    }
    rows.push(String::new());
    rows
}

fn render_item(item: &ResponseItem, options: RenderOptions) -> Vec<String> {
    let color = options.color;
    match item {
        ResponseItem::Message(message) => render_message(message, color),
        ResponseItem::Reasoning(reasoning) => match &reasoning.summary {
            Some(summary) if summary.is_empty() => Vec::new(),
            summary => {
                let mut rows = vec![label(settings::LABEL_THINKING, settings::COLOR_REASONING_LABEL, color)];
                for part in summary.iter().flatten() {
                    let text = part
                        .get("text")
                        .and_then(serde_json::Value::as_str)
                        .unwrap_or_default();
                    rows.extend(text.lines().map(|line| tint(line, settings::COLOR_REASONING_TEXT, color)));
                }
                indent_rows(rows, settings::ITEM_INDENT)
            }
        },
        ResponseItem::FunctionCall(call) => {
            let command = parse_command_arguments(&call.arguments)
                .map(|argv| format_command_for_display(&argv))
                .unwrap_or_else(|| call.name.clone());
            let rows = vec![
                label(settings::LABEL_COMMAND, settings::COLOR_COMMAND_LABEL, color),
                tint(&format!("$ {command}"), settings::COLOR_COMMAND_TEXT, color),
            ];
            indent_rows(rows, settings::ITEM_INDENT)
        }
        ResponseItem::FunctionCallOutput(output) => {
            let (text, metadata) = output.parsed();
            let heading = match metadata {
                Some(meta) => {
                    let plain = format!(
                        "{} (code: {}, duration: {}s)",
                        settings::LABEL_COMMAND_OUTPUT,
                        meta.exit_code,
                        meta.duration_seconds
                    );
                    let tone = if meta.exit_code == 0 {
                        settings::COLOR_OUTPUT_OK
                    } else {
                        settings::COLOR_OUTPUT_FAILED
                    };
                    tint(&plain, tone, color)
                }
                None => tint(settings::LABEL_COMMAND_OUTPUT, settings::COLOR_OUTPUT_OK, color),
            };
            let mut rows = vec![heading];
            if options.full_stdout {
                rows.extend(text.lines().map(|line| tint(line, settings::COLOR_OUTPUT_TEXT, color)));
            } else {
                let preview = snippet_preview(&text, settings::COMMAND_PREVIEW_LINES);
                rows.extend(preview.lines.iter().map(|line| tint(line, settings::COLOR_OUTPUT_TEXT, color)));
                if preview.remaining_lines > 0 {
                    rows.push(tint(
                        &format!("... ({} more lines)", preview.remaining_lines),
                        settings::COLOR_OUTPUT_TEXT,
                        color,
                    ));
                }
            }
            indent_rows(rows, settings::ITEM_INDENT)
        }
        ResponseItem::Other(raw) => {
            let rows = vec![
                label(item.kind(), settings::COLOR_SYSTEM_LABEL, color),
                truncate_single_line(&raw.to_string(), 200),
            ];
            indent_rows(rows, settings::ITEM_INDENT)
        }
    }
}

fn render_message(message: &MessageItem, color: bool) -> Vec<String> {
    let (name, tone) = match message.role.as_str() {
        "user" => (settings::LABEL_USER, settings::COLOR_USER_LABEL),
        "assistant" => (settings::LABEL_ASSISTANT, settings::COLOR_ASSISTANT_LABEL),
        "system" | "developer" => (settings::LABEL_SYSTEM, settings::COLOR_SYSTEM_LABEL),
        other => (other, settings::COLOR_SYSTEM_LABEL),
    };
    let mut rows = vec![label(name, tone, color)];
    let body: String = message
        .content
        .iter()
        .map(|part| match part {
            ContentPart::OutputText { text } => render_markdown_for_terminal(text, color),
            other => content_part_text(other),
        })
        .collect();
    rows.extend(body.lines().map(str::to_string));
    if message.role == "assistant" {
        rows.push(String::new());
    }
    rows
}

fn label(text: &str, tone: crossterm::style::Color, color: bool) -> String {
    if color {
        text.with(tone).bold().to_string()
    } else {
        text.to_string()
    }
}

fn tint(text: &str, tone: crossterm::style::Color, color: bool) -> String {
    if color {
        text.with(tone).to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::{reasoning, shell_call};
    use crate::items::FunctionCallOutputItem;

    const PLAIN: RenderOptions = RenderOptions {
        color: false,
        full_stdout: false,
    };

    fn header() -> HeaderInfo {
        HeaderInfo {
            version: "0.1.0".into(),
            model: "o4-mini".into(),
            provider: "openai".into(),
            approval_mode: ApprovalMode::Suggest,
            cwd: PathBuf::from("/work"),
            session_id: None,
        }
    }

    fn rows(item: ResponseItem) -> Vec<String> {
        render_entry(&LogEntry::Item(item), PLAIN)
    }

    #[test]
    fn empty_reasoning_summary_renders_nothing_but_keeps_its_slot() {
        let mut log = StaticLog::new(header(), Vec::new(), PLAIN);
        log.push(reasoning("rs_1", Some(vec![])));
        log.push(ResponseItem::user_text("next"));
        assert!(render_entry(&log.entries()[1], PLAIN).is_empty());
        assert_eq!(log.keys()[1], ("rs_1".to_string(), 1));
        assert_eq!(log.keys()[2], (String::new(), 2));
    }

    #[test]
    fn missing_reasoning_summary_renders_normally() {
        assert_eq!(rows(reasoning("rs_1", None)), vec!["  thinking".to_string()]);
        assert_eq!(
            rows(reasoning("rs_2", Some(vec!["checked the tests"]))),
            vec!["  thinking".to_string(), "  checked the tests".to_string()]
        );
    }

    #[test]
    fn user_message_has_no_leading_blank_and_assistant_has_trailing_blank() {
        let user = rows(ResponseItem::user_text("hello"));
        assert_eq!(user, vec!["user".to_string(), "hello".to_string()]);

        let assistant = rows(ResponseItem::assistant_text("done"));
        assert_eq!(assistant.first().map(String::as_str), Some("codex"));
        assert_eq!(assistant.last().map(String::as_str), Some(""));
    }

    #[test]
    fn non_message_items_are_indented() {
        let call = rows(shell_call("c1", &["ls", "-la"]));
        assert_eq!(call, vec!["  command".to_string(), "  $ ls -la".to_string()]);
        assert!(call.iter().all(|row| row.starts_with(settings::ITEM_INDENT)));
    }

    #[test]
    fn command_output_is_previewed_unless_full_stdout() {
        let output = ResponseItem::FunctionCallOutput(FunctionCallOutputItem {
            id: None,
            call_id: "c1".into(),
            output: r#"{"output":"1\n2\n3\n4\n5\n6","metadata":{"exit_code":0,"duration_seconds":0.2}}"#
                .into(),
        });
        let preview = rows(output.clone());
        assert_eq!(preview[0], "  command.stdout (code: 0, duration: 0.2s)");
        assert_eq!(preview.len(), 1 + settings::COMMAND_PREVIEW_LINES + 1);
        assert_eq!(preview.last().map(String::as_str), Some("  ... (2 more lines)"));

        let full = render_entry(
            &LogEntry::Item(output),
            RenderOptions {
                color: false,
                full_stdout: true,
            },
        );
        assert_eq!(full.len(), 7);
    }

    #[test]
    fn flush_writes_each_entry_once() {
        let mut log = StaticLog::new(header(), Vec::new(), PLAIN);
        log.flush().expect("flush header");
        let after_header = log.committed();
        log.push(ResponseItem::user_text("one"));
        log.flush().expect("flush");
        log.flush().expect("flush again");
        assert_eq!(after_header, 1);
        assert_eq!(log.committed(), 2);

        let text = String::from_utf8(log.into_inner()).expect("utf8");
        assert_eq!(text.matches("OpenAI Codex").count(), 1);
        assert_eq!(text.matches("one").count(), 1);
        assert!(text.starts_with("● OpenAI Codex"));
        assert!(text.contains("  model: o4-mini\n"));
    }
}
