//! Saved session transcripts ("rollouts").
//!
//! Rollouts live under `$CODEX_HOME/sessions/rollout-<timestamp>-<id>.json`.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::RolloutError;
use crate::items::ResponseItem;

/// Session header stored at the top of a rollout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMeta {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// A saved session transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rollout {
    pub session: SessionMeta,
    #[serde(default)]
    pub items: Vec<ResponseItem>,
}

/// Summary of one saved session, for the history browser.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub path: PathBuf,
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub item_count: usize,
    /// First user message text, if any.
    pub first_message: Option<String>,
}

impl Rollout {
    /// New rollout with a fresh random session id.
    pub fn new(instructions: Option<String>, items: Vec<ResponseItem>) -> Self {
        Self {
            session: SessionMeta {
                id: new_session_id(),
                timestamp: Utc::now(),
                instructions: instructions.filter(|text| !text.is_empty()),
            },
            items,
        }
    }

    fn file_name(&self) -> String {
        format!(
            "rollout-{}-{}.json",
            self.session.timestamp.format("%Y-%m-%dT%H-%M-%S"),
            self.session.id
        )
    }
}

/// Resolve `path` against `cwd` unless it is already absolute.
pub fn resolve_rollout_path(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Read and parse a rollout file.
pub fn load_rollout(path: &Path) -> Result<Rollout, RolloutError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Write `rollout` into `sessions_dir`, returning the file path.
pub fn save_rollout(sessions_dir: &Path, rollout: &Rollout) -> Result<PathBuf, RolloutError> {
    std::fs::create_dir_all(sessions_dir)?;
    let path = sessions_dir.join(rollout.file_name());
    let text = serde_json::to_string_pretty(rollout)?;
    std::fs::write(&path, text)?;
    tracing::debug!(path = %path.display(), items = rollout.items.len(), "saved rollout");
    Ok(path)
}

/// List saved sessions newest first, at most `limit` entries.
///
/// Unreadable or malformed files are skipped.
pub fn list_sessions(sessions_dir: &Path, limit: usize) -> Vec<SessionSummary> {
    let entries = match std::fs::read_dir(sessions_dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!(dir = %sessions_dir.display(), %err, "no sessions directory");
            return Vec::new();
        }
    };
    let mut sessions: Vec<SessionSummary> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == "json")
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with("rollout-"))
        })
        .filter_map(|path| {
            let rollout = load_rollout(&path)
                .map_err(|err| tracing::debug!(path = %path.display(), %err, "skipping rollout"))
                .ok()?;
            Some(SessionSummary {
                first_message: first_user_message(&rollout.items),
                id: rollout.session.id,
                timestamp: rollout.session.timestamp,
                item_count: rollout.items.len(),
                path,
            })
        })
        .collect();
    sessions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    sessions.truncate(limit);
    sessions
}

fn first_user_message(items: &[ResponseItem]) -> Option<String> {
    items.iter().find_map(|item| match item {
        ResponseItem::Message(message) if message.role == "user" => {
            let text = message
                .content
                .iter()
                .map(crate::format::content_part_text)
                .collect::<Vec<_>>()
                .join("");
            Some(text)
        }
        _ => None,
    })
}

fn new_session_id() -> String {
    let mut rng = rand::thread_rng();
    (0..4)
        .map(|_| format!("{:04x}", rng.gen::<u16>()))
        .collect::<Vec<_>>()
        .join("")
}
