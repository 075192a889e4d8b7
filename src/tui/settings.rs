//! Centralized, hardcoded UI settings for the terminal interface.
//!
//! This is the single place to tweak prompt strings, glyphs, colors,
//! indentation, and spinner behavior.

use crossterm::style::Color;

// ---------------------------------------------------------------------------
// Layout / indentation
// ---------------------------------------------------------------------------

/// Margin applied to every row of a non-message item.
pub const ITEM_INDENT: &str = "  ";
/// Command output rows shown before truncation (unless `--full-stdout`).
pub const COMMAND_PREVIEW_LINES: usize = 4;

// ---------------------------------------------------------------------------
// Prompt strings
// ---------------------------------------------------------------------------

pub const PROMPT_PRIMARY: &str = "> ";
pub const PROMPT_EXIT_HINT: &str = "ctrl+c to exit | \"/clear\" to reset context | \"/help\" for commands";

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

pub const LABEL_USER: &str = "user";
pub const LABEL_ASSISTANT: &str = "codex";
pub const LABEL_SYSTEM: &str = "system";
pub const LABEL_COMMAND: &str = "command";
pub const LABEL_COMMAND_OUTPUT: &str = "command.stdout";
pub const LABEL_THINKING: &str = "thinking";
pub const LABEL_STATUS: &str = "Thinking";

pub const GLYPH_HEADER: &str = "●";

// ---------------------------------------------------------------------------
// Spinner / progress
// ---------------------------------------------------------------------------

pub const PROGRESS_CLEAR_LINE: &str = "\r\x1b[2K";
pub const PROGRESS_FRAMES: [char; 4] = ['|', '/', '-', '\\'];
pub const PROGRESS_TICK_MS: u64 = 100;

pub const EVENT_POLL_MS: u64 = 80;

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

pub const COLOR_HEADER_TITLE: Color = Color::Magenta;
pub const COLOR_HEADER_KEY: Color = Color::DarkGrey;
pub const COLOR_HEADER_VALUE: Color = Color::White;

pub const COLOR_USER_LABEL: Color = Color::Blue;
pub const COLOR_ASSISTANT_LABEL: Color = Color::Magenta;
pub const COLOR_SYSTEM_LABEL: Color = Color::DarkGrey;
pub const COLOR_COMMAND_LABEL: Color = Color::Magenta;
pub const COLOR_COMMAND_TEXT: Color = Color::Cyan;
pub const COLOR_OUTPUT_OK: Color = Color::Green;
pub const COLOR_OUTPUT_FAILED: Color = Color::Red;
pub const COLOR_OUTPUT_TEXT: Color = Color::DarkGrey;
pub const COLOR_REASONING_LABEL: Color = Color::DarkGrey;
pub const COLOR_REASONING_TEXT: Color = Color::DarkGrey;

pub const COLOR_PROMPT_SYMBOL: Color = Color::Cyan;
pub const COLOR_HINT: Color = Color::DarkGrey;
pub const COLOR_WARNING: Color = Color::Yellow;
pub const COLOR_ERROR: Color = Color::Red;

pub const COLOR_PICKER_TITLE: Color = Color::Cyan;
pub const COLOR_PICKER_HELP: Color = Color::DarkGrey;
pub const COLOR_PICKER_SELECTED: Color = Color::DarkYellow;
pub const COLOR_PICKER_UNSELECTED: Color = Color::DarkGrey;

pub const COLOR_PROGRESS_FRAME: Color = Color::Cyan;
pub const COLOR_PROGRESS_LABEL: Color = Color::DarkGrey;
pub const COLOR_PROGRESS_ELAPSED: Color = Color::DarkGrey;
