//! Configuration data model.
//!
//! `FileConfig` mirrors `config.toml`; `EffectiveConfig` is the merged value
//! handed to every dispatch branch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::approval::ApprovalMode;

use super::defaults::{DEFAULT_HISTORY_MAX_SIZE, DEFAULT_MODEL, DEFAULT_PROVIDER};

/// Reasoning effort requested from reasoning-capable models.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

impl ReasoningEffort {
    /// Wire value used in API requests.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Connection details for one model provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProviderInfo {
    /// Human-readable provider name.
    pub name: String,
    /// OpenAI-compatible base URL (without trailing `/responses`).
    pub base_url: String,
    /// Environment variable holding the provider API key.
    pub env_key: String,
}

/// Session-history persistence settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Persist rollouts under `$CODEX_HOME/sessions`.
    pub save_history: bool,
    /// Maximum number of sessions listed by the history browser.
    pub max_size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            save_history: true,
            max_size: DEFAULT_HISTORY_MAX_SIZE,
        }
    }
}

/// On-disk shape of `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct FileConfig {
    pub(super) model: Option<String>,
    pub(super) provider: Option<String>,
    pub(super) approval_mode: Option<ApprovalMode>,
    pub(super) notify: bool,
    pub(super) reasoning_effort: Option<ReasoningEffort>,
    pub(super) flex_mode: bool,
    pub(super) disable_response_storage: bool,
    pub(super) full_stdout: bool,
    pub(super) history: HistoryConfig,
    pub(super) providers: BTreeMap<String, ProviderInfo>,
}

/// How the project doc (`AGENTS.md` / `codex.md`) is discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProjectDocMode {
    /// Walk up from the working directory to the git root.
    #[default]
    Auto,
    /// Use exactly this file.
    Path(PathBuf),
    /// Skip project docs entirely (`--no-project-doc`).
    Disabled,
}

/// Command-line values layered over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model: Option<String>,
    pub provider: Option<String>,
    pub notify: bool,
    pub reasoning_effort: Option<ReasoningEffort>,
    pub flex_mode: bool,
    pub disable_response_storage: bool,
    pub full_stdout: bool,
    pub project_doc: ProjectDocMode,
}

/// Merged configuration for one process run.
///
/// Built once before dispatch. Only the API key, model, and provider may be
/// patched afterwards (see the `with_*` helpers).
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig {
    pub model: String,
    pub provider: String,
    /// Base URL of the active provider, after env overrides.
    pub base_url: String,
    /// Default approval mode from the config file, if any.
    pub approval_mode: Option<ApprovalMode>,
    /// Resolved credential; `None` until auth resolution ran.
    pub api_key: Option<String>,
    pub notify: bool,
    pub reasoning_effort: Option<ReasoningEffort>,
    pub flex_mode: bool,
    pub disable_response_storage: bool,
    /// User instructions plus the project doc, if any.
    pub instructions: String,
    pub full_stdout: bool,
    pub history: HistoryConfig,
    /// Built-in providers merged with `[providers.*]` entries.
    pub providers: BTreeMap<String, ProviderInfo>,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        let providers = super::providers::builtin_providers();
        let base_url = providers
            .get(DEFAULT_PROVIDER)
            .map(|info| info.base_url.clone())
            .unwrap_or_default();
        Self {
            model: DEFAULT_MODEL.to_string(),
            provider: DEFAULT_PROVIDER.to_string(),
            base_url,
            approval_mode: None,
            api_key: None,
            notify: false,
            reasoning_effort: None,
            flex_mode: false,
            disable_response_storage: false,
            instructions: String::new(),
            full_stdout: false,
            history: HistoryConfig::default(),
            providers,
        }
    }
}

impl EffectiveConfig {
    /// Patch in the resolved API key.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Patch the active model id.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Switch provider, updating the base URL from the provider table.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into().to_ascii_lowercase();
        if let Some(info) = self.providers.get(&self.provider) {
            self.base_url = info.base_url.clone();
        }
        self
    }

    /// Provider record for the active provider, when known.
    pub fn provider_info(&self) -> Option<&ProviderInfo> {
        self.providers.get(&self.provider)
    }
}

/// Result of ensuring the config file exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigFileInitResult {
    Created { path: PathBuf },
    AlreadyExists { path: PathBuf },
}
