//! `--history`: pick a saved session, then view or resume it.

use codex::rollout::{list_sessions, SessionSummary};
use codex::tui::{pick_from_list, PickOutcome};
use codex::tui::text::truncate_single_line;
use std::io;
use std::path::{Path, PathBuf};

/// What the user chose in the history browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HistoryChoice {
    View(PathBuf),
    Resume(PathBuf),
    Cancel,
    /// `Ctrl-C` in either picker.
    Interrupted,
}

/// One picker row for a saved session.
pub(crate) fn session_label(summary: &SessionSummary) -> String {
    let preview = summary
        .first_message
        .as_deref()
        .map(|text| truncate_single_line(text.trim(), 60))
        .unwrap_or_else(|| "(no user message)".to_string());
    format!(
        "{}  {:>3} items  {}",
        summary.timestamp.format("%Y-%m-%d %H:%M"),
        summary.item_count,
        preview
    )
}

/// Map picker answers to a choice.
pub(crate) fn history_choice(
    sessions: &[SessionSummary],
    session: PickOutcome,
    action: PickOutcome,
) -> HistoryChoice {
    if session == PickOutcome::Interrupted || action == PickOutcome::Interrupted {
        return HistoryChoice::Interrupted;
    }
    let Some(summary) = session.selected().and_then(|index| sessions.get(index)) else {
        return HistoryChoice::Cancel;
    };
    match action {
        PickOutcome::Selected(0) => HistoryChoice::View(summary.path.clone()),
        PickOutcome::Selected(1) => HistoryChoice::Resume(summary.path.clone()),
        _ => HistoryChoice::Cancel,
    }
}

/// Run the two-step picker over the newest `limit` sessions in
/// `sessions_dir`.
pub(crate) fn browse_history(
    color: bool,
    sessions_dir: &Path,
    limit: usize,
) -> io::Result<HistoryChoice> {
    let sessions = list_sessions(sessions_dir, limit);
    if sessions.is_empty() {
        eprintln!("No saved sessions in {}", sessions_dir.display());
        return Ok(HistoryChoice::Cancel);
    }
    let labels: Vec<String> = sessions.iter().map(session_label).collect();
    let session = pick_from_list(
        color,
        "Previous sessions",
        "↑/↓ to move, enter to select, esc to cancel",
        &labels,
        0,
    )?;
    if session.selected().is_none() {
        return Ok(history_choice(&sessions, session, PickOutcome::Cancelled));
    }
    let actions = vec!["View".to_string(), "Resume".to_string()];
    let action = pick_from_list(color, "Session", "enter to select, esc to cancel", &actions, 0)?;
    Ok(history_choice(&sessions, session, action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn summary(first: Option<&str>) -> SessionSummary {
        SessionSummary {
            path: PathBuf::from("/s/rollout-a.json"),
            id: "abc".into(),
            timestamp: chrono::Utc
                .with_ymd_and_hms(2025, 4, 16, 10, 30, 0)
                .single()
                .expect("timestamp"),
            item_count: 12,
            first_message: first.map(str::to_string),
        }
    }

    #[test]
    fn label_shows_time_count_and_preview() {
        assert_eq!(
            session_label(&summary(Some("fix the\nbug"))),
            "2025-04-16 10:30   12 items  fix the bug"
        );
        assert!(session_label(&summary(None)).ends_with("(no user message)"));
    }

    #[test]
    fn choices_follow_picker_answers() {
        let sessions = vec![summary(None)];
        let path = PathBuf::from("/s/rollout-a.json");
        let (first, second) = (PickOutcome::Selected(0), PickOutcome::Selected(1));
        assert_eq!(history_choice(&sessions, first, first), HistoryChoice::View(path.clone()));
        assert_eq!(history_choice(&sessions, first, second), HistoryChoice::Resume(path));
        assert_eq!(history_choice(&sessions, first, PickOutcome::Cancelled), HistoryChoice::Cancel);
        assert_eq!(history_choice(&sessions, PickOutcome::Cancelled, first), HistoryChoice::Cancel);
        assert_eq!(history_choice(&sessions, PickOutcome::Selected(3), first), HistoryChoice::Cancel);
    }

    #[test]
    fn ctrl_c_in_either_picker_interrupts() {
        let sessions = vec![summary(None)];
        let first = PickOutcome::Selected(0);
        assert_eq!(
            history_choice(&sessions, PickOutcome::Interrupted, PickOutcome::Cancelled),
            HistoryChoice::Interrupted
        );
        assert_eq!(
            history_choice(&sessions, first, PickOutcome::Interrupted),
            HistoryChoice::Interrupted
        );
    }

    #[test]
    fn empty_sessions_dir_cancels() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(
            browse_history(false, dir.path(), 10).expect("browse"),
            HistoryChoice::Cancel
        );
    }
}
