//! Prompt input: a raw-mode line editor, the command-confirmation picker and
//! terminal restoration.
//!
//! Everything here draws on stderr so the static log on stdout stays
//! append-only.

use crate::approval::ReviewDecision;
use crate::tui::settings;
use crossterm::cursor::{MoveToColumn, MoveUp, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Print, PrintStyledContent, Stylize};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{execute, QueueableCommand};
use std::io::{self, IsTerminal, Write};
use std::time::Duration;

/// Result of reading one prompt line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// User submitted a line.
    Line(String),
    /// End-of-file (`Ctrl-D` on an empty buffer, or stdin closed).
    Eof,
    /// `Ctrl-C` while editing.
    Interrupted,
}

/// Result of a list picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    Selected(usize),
    /// `Esc`, an empty answer, or closed stdin.
    Cancelled,
    /// `Ctrl-C`; callers route this to the interrupt shutdown path.
    Interrupted,
}

impl PickOutcome {
    pub fn selected(self) -> Option<usize> {
        match self {
            Self::Selected(index) => Some(index),
            Self::Cancelled | Self::Interrupted => None,
        }
    }
}

/// Single-line edit buffer. The cursor is a char index, never a byte index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBuffer {
    text: String,
    cursor: usize,
}

impl EditBuffer {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map(|(idx, _)| idx)
            .unwrap_or(self.text.len())
    }

    pub fn insert(&mut self, ch: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let at = self.byte_index(self.cursor - 1);
        self.text.remove(at);
        self.cursor -= 1;
    }

    pub fn delete(&mut self) {
        if self.cursor < self.len() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.len());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.len();
    }

    pub fn kill_to_end(&mut self) {
        let at = self.byte_index(self.cursor);
        self.text.truncate(at);
    }

    pub fn kill_to_start(&mut self) {
        let at = self.byte_index(self.cursor);
        self.text.replace_range(..at, "");
        self.cursor = 0;
    }

    /// Replace the whole buffer and move the cursor to the end.
    pub fn replace(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.len();
    }
}

/// Walks submitted prompts with Up/Down, keeping the unsent draft.
#[derive(Debug, Clone, Default)]
struct HistoryCursor {
    index: Option<usize>,
    draft: String,
}

impl HistoryCursor {
    fn up(&mut self, history: &[String], buffer: &mut EditBuffer) {
        if history.is_empty() {
            return;
        }
        let next = match self.index {
            None => {
                self.draft = buffer.text().to_string();
                history.len() - 1
            }
            Some(idx) => idx.saturating_sub(1),
        };
        self.index = Some(next);
        buffer.replace(&history[next]);
    }

    fn down(&mut self, history: &[String], buffer: &mut EditBuffer) {
        let Some(idx) = self.index else {
            return;
        };
        if idx + 1 < history.len() {
            self.index = Some(idx + 1);
            buffer.replace(&history[idx + 1]);
        } else {
            self.index = None;
            buffer.replace(&self.draft);
        }
    }
}

/// Read one prompt line. `history` is oldest first.
///
/// Falls back to a plain blocking read when stdin or stderr is not a terminal.
pub fn read_prompt_line(color: bool, history: &[String]) -> io::Result<ReadOutcome> {
    if !io::stdin().is_terminal() || !io::stderr().is_terminal() {
        return read_line_fallback(color);
    }
    read_line_interactive(color, history)
}

fn write_prompt(stderr: &mut io::Stderr, color: bool) -> io::Result<()> {
    if color {
        stderr.queue(PrintStyledContent(
            settings::PROMPT_PRIMARY.with(settings::COLOR_PROMPT_SYMBOL).bold(),
        ))?;
    } else {
        stderr.queue(Print(settings::PROMPT_PRIMARY))?;
    }
    Ok(())
}

fn read_line_fallback(color: bool) -> io::Result<ReadOutcome> {
    let mut stderr = io::stderr();
    write_prompt(&mut stderr, color)?;
    stderr.flush()?;

    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        eprintln!();
        return Ok(ReadOutcome::Eof);
    }
    Ok(ReadOutcome::Line(
        line.trim_end_matches(['\n', '\r']).to_string(),
    ))
}

fn read_line_interactive(color: bool, history: &[String]) -> io::Result<ReadOutcome> {
    let _guard = RawModeGuard::acquire()?;
    let mut stderr = io::stderr();
    let mut buffer = EditBuffer::default();
    let mut walker = HistoryCursor::default();
    let mut cursor_row = 0usize;
    let mut dirty = true;

    loop {
        if dirty {
            cursor_row = render_line(&mut stderr, color, &buffer, cursor_row)?;
            dirty = false;
        }
        if !event::poll(Duration::from_millis(settings::EVENT_POLL_MS))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press && key.kind != KeyEventKind::Repeat {
            continue;
        }
        dirty = true;
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Enter => {
                buffer.end();
                render_line(&mut stderr, color, &buffer, cursor_row)?;
                stderr.queue(Print("\r\n"))?;
                stderr.flush()?;
                return Ok(ReadOutcome::Line(buffer.text().to_string()));
            }
            KeyCode::Char('c') if ctrl => {
                clear_rows(&mut stderr, cursor_row)?;
                return Ok(ReadOutcome::Interrupted);
            }
            KeyCode::Char('d') if ctrl => {
                if buffer.is_empty() {
                    clear_rows(&mut stderr, cursor_row)?;
                    return Ok(ReadOutcome::Eof);
                }
                buffer.delete();
            }
            KeyCode::Char('a') if ctrl => buffer.home(),
            KeyCode::Char('e') if ctrl => buffer.end(),
            KeyCode::Char('b') if ctrl => buffer.left(),
            KeyCode::Char('f') if ctrl => buffer.right(),
            KeyCode::Char('k') if ctrl => buffer.kill_to_end(),
            KeyCode::Char('u') if ctrl => buffer.kill_to_start(),
            KeyCode::Char(ch) if !ctrl => buffer.insert(ch),
            KeyCode::Up => walker.up(history, &mut buffer),
            KeyCode::Down => walker.down(history, &mut buffer),
            KeyCode::Left => buffer.left(),
            KeyCode::Right => buffer.right(),
            KeyCode::Home => buffer.home(),
            KeyCode::End => buffer.end(),
            KeyCode::Backspace => buffer.backspace(),
            KeyCode::Delete => buffer.delete(),
            _ => dirty = false,
        }
    }
}

/// Redraw prompt and buffer; returns the row the cursor ends on.
fn render_line(
    stderr: &mut io::Stderr,
    color: bool,
    buffer: &EditBuffer,
    previous_cursor_row: usize,
) -> io::Result<usize> {
    if previous_cursor_row > 0 {
        stderr.queue(MoveUp(previous_cursor_row as u16))?;
    }
    stderr.queue(MoveToColumn(0))?;
    stderr.queue(Clear(ClearType::FromCursorDown))?;
    write_prompt(stderr, color)?;
    stderr.queue(Print(buffer.text()))?;

    let cols = terminal_columns();
    let prompt_width = settings::PROMPT_PRIMARY.chars().count();
    let end = prompt_width + buffer.text().chars().count();
    let at = prompt_width + buffer.cursor();
    let (end_row, cursor_row) = (end / cols, at / cols);
    if end_row > cursor_row {
        stderr.queue(MoveUp((end_row - cursor_row) as u16))?;
    }
    stderr.queue(MoveToColumn((at % cols) as u16))?;
    stderr.flush()?;
    Ok(cursor_row)
}

fn terminal_columns() -> usize {
    terminal::size()
        .map(|(cols, _)| usize::from(cols))
        .unwrap_or(80)
        .max(1)
}

/// Labels offered when the agent wants to run a command.
pub const CONFIRM_OPTIONS: [&str; 4] = [
    "Yes, run it",
    "Yes, and don't ask again this session",
    "No, but keep going",
    "No, and stop for now",
];

/// Map a picker answer to a decision; cancelling means stop.
///
/// `None` means the user interrupted and no decision was made.
pub fn review_decision_for(outcome: PickOutcome) -> Option<ReviewDecision> {
    match outcome {
        PickOutcome::Selected(0) => Some(ReviewDecision::Yes),
        PickOutcome::Selected(1) => Some(ReviewDecision::Always),
        PickOutcome::Selected(2) => Some(ReviewDecision::NoContinue),
        PickOutcome::Selected(_) | PickOutcome::Cancelled => Some(ReviewDecision::NoExit),
        PickOutcome::Interrupted => None,
    }
}

/// Ask whether `command` may run. `Ok(None)` on `Ctrl-C`.
pub fn confirm_command(color: bool, command: &str) -> io::Result<Option<ReviewDecision>> {
    let options: Vec<String> = CONFIRM_OPTIONS.iter().map(|s| s.to_string()).collect();
    let title = format!("Allow command? $ {command}");
    let outcome = pick_from_list(color, &title, "↑/↓ to move, enter to select, esc to stop", &options, 0)?;
    Ok(review_decision_for(outcome))
}

/// Present a list picker.
///
/// In TTY mode, use arrow keys and Enter to select, Esc to cancel, or
/// `Ctrl-C` to interrupt. Otherwise a numeric selection prompt is shown.
pub fn pick_from_list(
    color: bool,
    title: &str,
    help: &str,
    options: &[String],
    initial_selection: usize,
) -> io::Result<PickOutcome> {
    if options.is_empty() {
        return Ok(PickOutcome::Cancelled);
    }
    if !io::stdin().is_terminal() || !io::stderr().is_terminal() {
        return pick_from_list_fallback(title, options);
    }
    pick_from_list_interactive(color, title, help, options, initial_selection)
}

fn pick_from_list_fallback(title: &str, options: &[String]) -> io::Result<PickOutcome> {
    eprintln!("{title}");
    for (idx, option) in options.iter().enumerate() {
        eprintln!("  {}. {}", idx + 1, option);
    }
    eprint!("  pick (empty to cancel): ");
    io::stderr().flush()?;

    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        eprintln!();
        return Ok(PickOutcome::Cancelled);
    }
    Ok(parse_pick(&line, options.len()).map_or(PickOutcome::Cancelled, PickOutcome::Selected))
}

/// 1-based numeric answer to a 0-based index.
fn parse_pick(line: &str, len: usize) -> Option<usize> {
    let index = line.trim().parse::<usize>().ok()?;
    (1..=len).contains(&index).then(|| index - 1)
}

fn pick_from_list_interactive(
    color: bool,
    title: &str,
    help: &str,
    options: &[String],
    initial_selection: usize,
) -> io::Result<PickOutcome> {
    let _guard = RawModeGuard::acquire()?;
    let mut stderr = io::stderr();
    let mut selected = initial_selection.min(options.len().saturating_sub(1));
    let mut previous_rows = 0usize;

    loop {
        previous_rows = render_picker(&mut stderr, color, title, help, options, selected, previous_rows)?;

        if !event::poll(Duration::from_millis(settings::EVENT_POLL_MS))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press && key.kind != KeyEventKind::Repeat {
            continue;
        }

        let outcome = match picker_key(&key) {
            PickerKey::Up => {
                selected = if selected == 0 {
                    options.len() - 1
                } else {
                    selected - 1
                };
                continue;
            }
            PickerKey::Down => {
                selected = (selected + 1) % options.len();
                continue;
            }
            PickerKey::Ignore => continue,
            PickerKey::Select => PickOutcome::Selected(selected),
            PickerKey::Cancel => PickOutcome::Cancelled,
            PickerKey::Interrupt => PickOutcome::Interrupted,
        };
        clear_rows(&mut stderr, previous_rows)?;
        return Ok(outcome);
    }
}

/// What one key press does to an open picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PickerKey {
    Up,
    Down,
    Select,
    Cancel,
    Interrupt,
    Ignore,
}

fn picker_key(key: &KeyEvent) -> PickerKey {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => PickerKey::Interrupt,
        KeyCode::Up => PickerKey::Up,
        KeyCode::Down => PickerKey::Down,
        KeyCode::Enter => PickerKey::Select,
        KeyCode::Esc => PickerKey::Cancel,
        _ => PickerKey::Ignore,
    }
}

/// Draw picker rows and return the index of the last drawn row.
fn render_picker(
    stderr: &mut io::Stderr,
    color: bool,
    title: &str,
    help: &str,
    options: &[String],
    selected: usize,
    previous_rows: usize,
) -> io::Result<usize> {
    if previous_rows > 0 {
        stderr.queue(MoveUp(previous_rows as u16))?;
    }
    stderr.queue(MoveToColumn(0))?;
    stderr.queue(Clear(ClearType::FromCursorDown))?;

    let cols = terminal_columns();
    let mut rows = Vec::with_capacity(options.len() + 2);
    rows.push((title.to_string(), settings::COLOR_PICKER_TITLE));
    rows.push((format!("  {help}"), settings::COLOR_PICKER_HELP));
    for (idx, option) in options.iter().enumerate() {
        let active = idx == selected;
        let marker = if active { "▶" } else { "·" };
        let tone = if active {
            settings::COLOR_PICKER_SELECTED
        } else {
            settings::COLOR_PICKER_UNSELECTED
        };
        rows.push((format!("  {marker} {option}"), tone));
    }

    let mut total_rows = 0usize;
    for (idx, (text, tone)) in rows.iter().enumerate() {
        if idx > 0 {
            stderr.queue(Print("\r\n"))?;
        }
        total_rows += text.chars().count().max(1).div_ceil(cols);
        if color {
            stderr.queue(PrintStyledContent(text.as_str().with(*tone)))?;
        } else {
            stderr.queue(Print(text))?;
        }
    }
    stderr.flush()?;
    Ok(total_rows.saturating_sub(1))
}

fn clear_rows(stderr: &mut io::Stderr, previous_rows: usize) -> io::Result<()> {
    if previous_rows > 0 {
        stderr.queue(MoveUp(previous_rows as u16))?;
    }
    stderr.queue(MoveToColumn(0))?;
    stderr.queue(Clear(ClearType::FromCursorDown))?;
    stderr.flush()
}

/// Leave raw mode and show the cursor. Safe to call when neither is active.
pub fn restore_terminal() {
    if let Err(err) = terminal::disable_raw_mode() {
        tracing::debug!(%err, "disable raw mode failed");
    }
    if let Err(err) = execute!(io::stderr(), Show) {
        tracing::debug!(%err, "show cursor failed");
    }
}

struct RawModeGuard;

impl RawModeGuard {
    /// Enable terminal raw mode and return a guard that disables it on drop.
    fn acquire() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(text: &str) -> EditBuffer {
        let mut buffer = EditBuffer::default();
        buffer.replace(text);
        buffer
    }

    #[test]
    fn edit_buffer_works_on_chars_not_bytes() {
        let mut buf = buffer("héllo");
        buf.left();
        buf.left();
        buf.backspace();
        assert_eq!(buf.text(), "hélo");
        buf.home();
        buf.right();
        buf.insert('€');
        assert_eq!(buf.text(), "h€élo");
        assert_eq!(buf.cursor(), 2);
        buf.delete();
        assert_eq!(buf.text(), "h€lo");
    }

    #[test]
    fn kill_commands_split_at_cursor() {
        let mut buf = buffer("fix the bug");
        buf.home();
        for _ in 0..3 {
            buf.right();
        }
        let mut tail = buf.clone();
        tail.kill_to_end();
        assert_eq!(tail.text(), "fix");
        buf.kill_to_start();
        assert_eq!(buf.text(), " the bug");
        assert_eq!(buf.cursor(), 0);
    }

    #[test]
    fn history_walk_restores_the_draft() {
        let history = vec!["first".to_string(), "second".to_string()];
        let mut walker = HistoryCursor::default();
        let mut buf = buffer("draft");
        walker.up(&history, &mut buf);
        assert_eq!(buf.text(), "second");
        walker.up(&history, &mut buf);
        walker.up(&history, &mut buf);
        assert_eq!(buf.text(), "first");
        walker.down(&history, &mut buf);
        assert_eq!(buf.text(), "second");
        walker.down(&history, &mut buf);
        assert_eq!(buf.text(), "draft");
    }

    #[test]
    fn picker_answers_map_to_decisions() {
        let decide = |index| review_decision_for(PickOutcome::Selected(index));
        assert_eq!(decide(0), Some(ReviewDecision::Yes));
        assert_eq!(decide(1), Some(ReviewDecision::Always));
        assert_eq!(decide(2), Some(ReviewDecision::NoContinue));
        assert_eq!(decide(3), Some(ReviewDecision::NoExit));
        assert_eq!(review_decision_for(PickOutcome::Cancelled), Some(ReviewDecision::NoExit));
        assert_eq!(review_decision_for(PickOutcome::Interrupted), None);
    }

    #[test]
    fn ctrl_c_in_picker_interrupts_instead_of_cancelling() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(picker_key(&ctrl_c), PickerKey::Interrupt);
        let plain_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
        assert_eq!(picker_key(&plain_c), PickerKey::Ignore);
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(picker_key(&esc), PickerKey::Cancel);
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(picker_key(&enter), PickerKey::Select);
        assert_eq!(PickOutcome::Interrupted.selected(), None);
        assert_eq!(PickOutcome::Selected(2).selected(), Some(2));
    }

    #[test]
    fn numeric_picks_are_one_based_and_bounded() {
        assert_eq!(parse_pick("2\n", 3), Some(1));
        assert_eq!(parse_pick("0", 3), None);
        assert_eq!(parse_pick("4", 3), None);
        assert_eq!(parse_pick("x", 3), None);
    }
}
