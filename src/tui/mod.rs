//! Terminal user-interface building blocks.
//!
//! The screen has two regions: the static log on stdout, which only ever
//! grows, and transient chrome on stderr (the status line, the prompt and
//! pickers). Keeping them on separate streams means committed output is
//! never redrawn.

pub mod input;
mod markdown;
pub mod progress;
pub mod settings;
pub mod static_log;
pub mod text;

pub use input::{
    confirm_command, pick_from_list, read_prompt_line, restore_terminal, PickOutcome,
    ReadOutcome,
};
pub use markdown::render_markdown_for_terminal;
pub use progress::{set_progress_enabled, start_status_line, StatusLine};
pub use static_log::{render_entry, HeaderInfo, LogEntry, RenderOptions, StaticLog};
