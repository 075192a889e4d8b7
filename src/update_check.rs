//! Best-effort check for a newer published release.
//!
//! Runs at most once per [`CHECK_INTERVAL`]; the last check time is kept in
//! `update-check.json` under the codex home. Every failure is swallowed.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// npm registry document for the latest published CLI.
pub const REGISTRY_URL: &str = "https://registry.npmjs.org/@openai/codex/latest";
/// Set to any non-empty value to skip the check.
pub const DISABLE_UPDATE_CHECK_ENV: &str = "CODEX_DISABLE_UPDATE_CHECK";
pub const STATE_FILE_NAME: &str = "update-check.json";

const CHECK_INTERVAL_HOURS: i64 = 24;
const REQUEST_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCheckState {
    pub last_update_check: DateTime<Utc>,
}

/// A newer version is available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateNotice {
    pub current: String,
    pub latest: String,
}

impl UpdateNotice {
    pub fn message(&self) -> String {
        format!(
            "Update available! {} -> {}. Run `npm install -g @openai/codex` to update.",
            self.current, self.latest
        )
    }
}

#[derive(Debug, Deserialize)]
struct RegistryLatest {
    version: String,
}

/// Whether enough time has passed since the previous check.
pub fn is_check_due(state: Option<&UpdateCheckState>, now: DateTime<Utc>) -> bool {
    match state {
        Some(state) => now - state.last_update_check >= Duration::hours(CHECK_INTERVAL_HOURS),
        None => true,
    }
}

/// Compare dotted numeric versions; pre-release suffixes are ignored.
pub fn is_newer(latest: &str, current: &str) -> bool {
    fn parts(version: &str) -> Vec<u64> {
        version
            .trim()
            .trim_start_matches('v')
            .split(['-', '+'])
            .next()
            .unwrap_or_default()
            .split('.')
            .map(|part| part.parse().unwrap_or(0))
            .collect()
    }
    let (mut latest, mut current) = (parts(latest), parts(current));
    let width = latest.len().max(current.len());
    latest.resize(width, 0);
    current.resize(width, 0);
    latest > current
}

fn read_state(path: &Path) -> Option<UpdateCheckState> {
    let text = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&text).ok()
}

fn write_state(path: &Path, state: &UpdateCheckState) {
    let result = serde_json::to_string(state)
        .map_err(std::io::Error::other)
        .and_then(|text| {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, text)
        });
    if let Err(err) = result {
        tracing::debug!(%err, "could not record update check");
    }
}

async fn fetch_latest_version() -> Option<String> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .ok()?;
    let response = client.get(REGISTRY_URL).send().await.ok()?;
    if !response.status().is_success() {
        tracing::debug!(status = %response.status(), "registry lookup failed");
        return None;
    }
    let latest: RegistryLatest = response.json().await.ok()?;
    Some(latest.version)
}

/// Check for an update, recording the attempt in `state_path`.
///
/// Returns `None` when the check is disabled, not yet due, fails, or finds
/// nothing newer.
pub async fn check_for_update(
    state_path: &Path,
    current: &str,
    now: DateTime<Utc>,
) -> Option<UpdateNotice> {
    let disabled = std::env::var(DISABLE_UPDATE_CHECK_ENV)
        .map(|value| !value.trim().is_empty())
        .unwrap_or(false);
    if disabled || !is_check_due(read_state(state_path).as_ref(), now) {
        return None;
    }
    write_state(state_path, &UpdateCheckState { last_update_check: now });

    let latest = fetch_latest_version().await?;
    tracing::debug!(%latest, %current, "update check finished");
    is_newer(&latest, current).then(|| UpdateNotice {
        current: current.to_string(),
        latest,
    })
}
