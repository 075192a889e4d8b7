//! `--view <rollout>`: print a saved session through the static-log renderer.

use codex::items::{group_batch, BatchEntry, ResponseItem};
use codex::rollout::{load_rollout, resolve_rollout_path, Rollout};
use codex::tui::{render_entry, LogEntry, RenderOptions};
use crossterm::style::Stylize;
use std::io::{self, Write};
use std::path::Path;

use codex::tui::settings;

/// Load `path` (absolute or relative to `cwd`) and print it to stdout.
pub(crate) fn view_rollout_file(path: &Path, cwd: &Path, options: RenderOptions) -> Result<(), String> {
    let path = resolve_rollout_path(path, cwd);
    let rollout =
        load_rollout(&path).map_err(|err| format!("Error reading rollout file: {err}"))?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_rollout(&rollout, &mut out, options).map_err(|err| err.to_string())
}

/// Session line followed by every item, in order. A command and its output
/// are printed as one block with a blank row after it.
pub(crate) fn write_rollout<W: Write>(
    rollout: &Rollout,
    out: &mut W,
    options: RenderOptions,
) -> io::Result<()> {
    let session = format!(
        "{} session {} ({})",
        settings::GLYPH_HEADER,
        rollout.session.id,
        rollout.session.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if options.color {
        writeln!(out, "{}", session.as_str().with(settings::COLOR_HEADER_TITLE).bold())?;
    } else {
        writeln!(out, "{session}")?;
    }
    writeln!(out)?;
    for entry in group_batch(&rollout.items) {
        match entry {
            BatchEntry::Item(item) => write_item(out, item, options)?,
            BatchEntry::Group { items, .. } => {
                for item in items {
                    write_item(out, item, options)?;
                }
                writeln!(out)?;
            }
        }
    }
    out.flush()
}

fn write_item<W: Write>(out: &mut W, item: ResponseItem, options: RenderOptions) -> io::Result<()> {
    for row in render_entry(&LogEntry::Item(item), options) {
        writeln!(out, "{row}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use codex::items::ResponseItem;

    #[test]
    fn invalid_json_reports_read_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("broken.json"), "{ not json").expect("write");
        let err = view_rollout_file(
            Path::new("broken.json"),
            dir.path(),
            RenderOptions::default(),
        )
        .expect_err("invalid rollout");
        assert!(err.starts_with("Error reading rollout file:"), "got: {err}");
    }

    #[test]
    fn missing_file_reports_read_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = view_rollout_file(
            &dir.path().join("absent.json"),
            Path::new("/unused"),
            RenderOptions::default(),
        )
        .expect_err("missing rollout");
        assert!(err.starts_with("Error reading rollout file:"));
    }

    #[test]
    fn items_render_after_the_session_line() {
        let rollout = Rollout::new(
            None,
            vec![
                ResponseItem::user_text("hello"),
                ResponseItem::assistant_text("hi there"),
            ],
        );
        let mut out = Vec::new();
        write_rollout(&rollout, &mut out, RenderOptions::default()).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.starts_with(&format!("● session {}", rollout.session.id)));
        assert!(text.contains("\nuser\nhello\n"));
        assert!(text.contains("hi there"));
    }

    #[test]
    fn command_and_output_print_as_one_block() {
        let call = ResponseItem::from_value(serde_json::json!({
            "type": "function_call",
            "call_id": "c1",
            "name": "shell",
            "arguments": r#"{"command":["ls"]}"#,
        }));
        let output = ResponseItem::from_value(serde_json::json!({
            "type": "function_call_output",
            "call_id": "c1",
            "output": "a.txt",
        }));
        let rollout = Rollout::new(None, vec![call, output, ResponseItem::user_text("next")]);
        let mut out = Vec::new();
        write_rollout(&rollout, &mut out, RenderOptions::default()).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("$ ls\n"), "{text}");
        assert!(text.contains("a.txt\n\nuser\nnext\n"), "{text}");
    }
}
