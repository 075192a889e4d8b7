//! Top-level config loading pipeline.
//!
//! Precedence (highest wins): command-line flags, `<PROVIDER>_BASE_URL`
//! env override (base URL only), `$CODEX_HOME/config.toml`, built-in
//! defaults.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ConfigError;

use super::defaults::{DEFAULT_MODEL, DEFAULT_PROVIDER, FLEX_MODE_MODELS, PROJECT_DOC_SEPARATOR};
use super::init::codex_home_with;
use super::project_doc::load_project_doc;
use super::providers::{base_url_env_var, builtin_providers};
use super::{ConfigOverrides, EffectiveConfig, FileConfig, ProviderInfo};

/// Effective config plus non-fatal warnings gathered while loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: EffectiveConfig,
    pub warnings: Vec<String>,
}

/// Load configuration from `$CODEX_HOME`, the project doc, and CLI flags.
pub fn load_config(overrides: &ConfigOverrides, cwd: &Path) -> Result<LoadedConfig, ConfigError> {
    load_config_from_sources(
        overrides,
        cwd,
        |path| std::fs::read_to_string(path),
        |name| std::env::var(name).ok(),
    )
}

pub(crate) fn load_config_from_sources<FRead, FEnv>(
    overrides: &ConfigOverrides,
    cwd: &Path,
    read_file: FRead,
    env_lookup: FEnv,
) -> Result<LoadedConfig, ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
{
    let home = codex_home_with(&env_lookup);
    let mut warnings = Vec::new();

    let parsed: FileConfig = match home.as_ref().map(|dir| dir.join("config.toml")) {
        Some(path) => match read_file(&path) {
            Ok(text) => toml::from_str(&text)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => FileConfig::default(),
            Err(err) => return Err(ConfigError::Io(err)),
        },
        None => FileConfig::default(),
    };

    let providers = merge_providers(parsed.providers.clone());
    let provider = first_non_empty(&[overrides.provider.as_deref(), parsed.provider.as_deref()])
        .unwrap_or(DEFAULT_PROVIDER)
        .to_ascii_lowercase();
    let model = first_non_empty(&[overrides.model.as_deref(), parsed.model.as_deref()])
        .unwrap_or(DEFAULT_MODEL)
        .to_string();
    let base_url = resolve_base_url(&provider, &providers, &env_lookup)?;

    let flex_mode = overrides.flex_mode || parsed.flex_mode;
    if flex_mode && !FLEX_MODE_MODELS.contains(&model.as_str()) {
        return Err(ConfigError::Invalid(format!(
            "flex mode is only supported with the {} models (got `{model}`)",
            FLEX_MODE_MODELS
                .iter()
                .map(|m| format!("`{m}`"))
                .collect::<Vec<_>>()
                .join(" or ")
        )));
    }

    let user_instructions = home
        .as_ref()
        .and_then(|dir| read_file(&dir.join("instructions.md")).ok())
        .unwrap_or_default();
    let project_doc = load_project_doc(cwd, &overrides.project_doc);
    if let Some(doc) = project_doc.as_ref().filter(|doc| doc.truncated) {
        warnings.push(format!(
            "Project doc `{}` exceeds the size limit and was truncated.",
            doc.path.display()
        ));
    }
    let instructions = compose_instructions(
        user_instructions.trim(),
        project_doc.as_ref().map(|doc| doc.text.trim()),
    );

    let config = EffectiveConfig {
        model,
        provider,
        base_url,
        approval_mode: parsed.approval_mode,
        api_key: None,
        notify: overrides.notify || parsed.notify,
        reasoning_effort: overrides.reasoning_effort.or(parsed.reasoning_effort),
        flex_mode,
        disable_response_storage: overrides.disable_response_storage
            || parsed.disable_response_storage,
        instructions,
        full_stdout: overrides.full_stdout || parsed.full_stdout,
        history: parsed.history,
        providers,
    };
    tracing::debug!(
        model = %config.model,
        provider = %config.provider,
        base_url = %config.base_url,
        "configuration loaded"
    );

    Ok(LoadedConfig { config, warnings })
}

/// Join user instructions and the project doc with the doc separator.
pub fn compose_instructions(user: &str, project_doc: Option<&str>) -> String {
    match project_doc.filter(|doc| !doc.is_empty()) {
        Some(doc) if user.is_empty() => doc.to_string(),
        Some(doc) => format!("{user}{PROJECT_DOC_SEPARATOR}{doc}"),
        None => user.to_string(),
    }
}

fn merge_providers(
    configured: BTreeMap<String, ProviderInfo>,
) -> BTreeMap<String, ProviderInfo> {
    let mut providers = builtin_providers();
    for (key, info) in configured {
        providers.insert(key.to_ascii_lowercase(), info);
    }
    providers
}

fn resolve_base_url<FEnv>(
    provider: &str,
    providers: &BTreeMap<String, ProviderInfo>,
    env_lookup: &FEnv,
) -> Result<String, ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(url) = env_lookup(&base_url_env_var(provider))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
    {
        return Ok(url);
    }
    providers
        .get(provider)
        .map(|info| info.base_url.trim_end_matches('/').to_string())
        .ok_or_else(|| {
            ConfigError::Invalid(format!(
                "unknown provider `{provider}`; add a [providers.{provider}] entry to config.toml or set {}",
                base_url_env_var(provider)
            ))
        })
}

fn first_non_empty<'a>(values: &[Option<&'a str>]) -> Option<&'a str> {
    values
        .iter()
        .flatten()
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
}
