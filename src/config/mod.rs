//! Configuration loading from `config.toml`, the project doc, and CLI flags.
//!
//! The loader produces one [`EffectiveConfig`] per process run. File reads
//! and environment lookups go through injectable closures so precedence can
//! be tested without touching the real home directory.

mod defaults;
mod init;
mod loader;
mod project_doc;
mod providers;
mod types;

pub use init::{
    codex_home, default_config_path, default_instructions_path, default_log_dir,
    default_sessions_dir, ensure_config_file_at_path, ensure_default_config, CODEX_HOME_ENV,
};
pub use loader::{compose_instructions, load_config, LoadedConfig};
pub use project_doc::{discover_project_doc, load_project_doc, ProjectDoc};
pub use providers::{
    api_key_env_var, base_url_env_var, builtin_providers, is_openai_provider,
    provider_requires_key, OPENAI_API_KEY_ENV, OPENAI_PROVIDER,
};
pub use types::{
    ConfigFileInitResult, ConfigOverrides, EffectiveConfig, HistoryConfig, ProjectDocMode,
    ProviderInfo, ReasoningEffort,
};
use types::FileConfig;
