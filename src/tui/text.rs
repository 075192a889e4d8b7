//! Shared text helpers used by terminal rendering.

/// A clipped text preview of command output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetPreview<'a> {
    pub lines: Vec<&'a str>,
    pub remaining_lines: usize,
}

/// Return up to `max_lines` lines from `text` and count the lines omitted.
pub fn snippet_preview(text: &str, max_lines: usize) -> SnippetPreview<'_> {
    let all_lines: Vec<&str> = text.lines().collect();
    let shown = all_lines.len().min(max_lines);
    SnippetPreview {
        lines: all_lines[..shown].to_vec(),
        remaining_lines: all_lines.len() - shown,
    }
}

/// Prefix every line of `rows` with `indent`; blank rows stay blank.
pub fn indent_rows(rows: Vec<String>, indent: &str) -> Vec<String> {
    rows.into_iter()
        .map(|row| {
            if row.is_empty() {
                row
            } else {
                format!("{indent}{row}")
            }
        })
        .collect()
}

/// Truncate text for single-line display and replace newlines with spaces.
pub fn truncate_single_line(s: &str, max_chars: usize) -> String {
    let flat: String = s.chars().map(|c| if c == '\n' { ' ' } else { c }).collect();
    if flat.chars().count() > max_chars {
        let clipped: String = flat.chars().take(max_chars).collect();
        format!("{clipped}...")
    } else {
        flat
    }
}
