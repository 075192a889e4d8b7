//! Markdown-to-terminal rendering for assistant messages.
//!
//! `termimad` lays out lists, headings, code fences and tables without a
//! full-screen view, which fits the append-only log.

use termimad::MadSkin;

/// Render markdown into terminal text with structure preserved.
///
/// `color` selects the default styled skin; otherwise the output carries no
/// ANSI styling.
pub fn render_markdown_for_terminal(input: &str, color: bool) -> String {
    let skin = if color {
        MadSkin::default()
    } else {
        MadSkin::no_style()
    };
    let formatted = skin.text(input, None).to_string();
    formatted.trim_end_matches('\n').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_list_layout() {
        let out = render_markdown_for_terminal("# Title\n\n- a\n- b", false);
        assert!(out.contains("Title"));
        assert!(out.contains("a"));
        assert!(out.contains("b"));
    }

    #[test]
    fn keeps_code_content_without_trailing_newlines() {
        let out = render_markdown_for_terminal("```rust\nfn main() {}\n```", false);
        assert!(out.contains("fn main() {}"));
        assert!(!out.ends_with('\n'));
    }
}
