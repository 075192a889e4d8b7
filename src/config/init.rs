//! Per-user path helpers and config-file bootstrap.
//!
//! Writes use `create_new` so two processes bootstrapping at once never
//! clobber a user's file.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::defaults::DEFAULT_CONFIG_TEMPLATE;
use super::ConfigFileInitResult;

/// Env var that relocates the per-user state directory.
pub const CODEX_HOME_ENV: &str = "CODEX_HOME";

/// Resolve the per-user state directory (`$CODEX_HOME` or `~/.codex`).
pub fn codex_home() -> Option<PathBuf> {
    codex_home_with(|name| std::env::var(name).ok())
}

pub(crate) fn codex_home_with<FEnv>(env_lookup: FEnv) -> Option<PathBuf>
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(path) = env_lookup(CODEX_HOME_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    dirs::home_dir().map(|home| home.join(".codex"))
}

/// `$CODEX_HOME/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    codex_home().map(|dir| dir.join("config.toml"))
}

/// `$CODEX_HOME/instructions.md`.
pub fn default_instructions_path() -> Option<PathBuf> {
    codex_home().map(|dir| dir.join("instructions.md"))
}

/// `$CODEX_HOME/sessions`.
pub fn default_sessions_dir() -> Option<PathBuf> {
    codex_home().map(|dir| dir.join("sessions"))
}

/// `$CODEX_HOME/log`.
pub fn default_log_dir() -> Option<PathBuf> {
    codex_home().map(|dir| dir.join("log"))
}

/// Ensure the default config file exists, writing the template if missing.
pub fn ensure_default_config() -> Result<ConfigFileInitResult, ConfigError> {
    let path = default_config_path().ok_or_else(|| {
        ConfigError::Invalid("unable to resolve home directory for config.toml".to_string())
    })?;
    ensure_config_file_at_path(&path)
}

/// Ensure `path` exists, creating parent directories and the template.
pub fn ensure_config_file_at_path(path: &Path) -> Result<ConfigFileInitResult, ConfigError> {
    if path.exists() {
        return Ok(ConfigFileInitResult::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            file.write_all(DEFAULT_CONFIG_TEMPLATE.as_bytes())?;
            Ok(ConfigFileInitResult::Created {
                path: path.to_path_buf(),
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            Ok(ConfigFileInitResult::AlreadyExists {
                path: path.to_path_buf(),
            })
        }
        Err(e) => Err(ConfigError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codex_home_prefers_env_override() {
        let home = codex_home_with(|name| {
            (name == CODEX_HOME_ENV).then(|| "/tmp/codex-home".to_string())
        });
        assert_eq!(home, Some(PathBuf::from("/tmp/codex-home")));
    }

    #[test]
    fn codex_home_ignores_blank_env_value() {
        let home = codex_home_with(|_| Some("   ".to_string()));
        assert_eq!(home, dirs::home_dir().map(|h| h.join(".codex")));
    }

    #[test]
    fn ensure_config_file_writes_template_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let first = ensure_config_file_at_path(&path).expect("create");
        assert!(matches!(first, ConfigFileInitResult::Created { .. }));
        let text = std::fs::read_to_string(&path).expect("read");
        assert!(text.contains("approval_mode"));

        std::fs::write(&path, "model = \"o3\"\n").expect("overwrite");
        let second = ensure_config_file_at_path(&path).expect("exists");
        assert!(matches!(second, ConfigFileInitResult::AlreadyExists { .. }));
        assert_eq!(
            std::fs::read_to_string(&path).expect("read"),
            "model = \"o3\"\n"
        );
    }
}
