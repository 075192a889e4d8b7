//! Default configuration constants.

/// Embedded `config.toml` template written on first use.
pub(super) const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../templates/config.toml");
/// Model id used when neither flags nor config name one.
pub(super) const DEFAULT_MODEL: &str = "codex-mini-latest";
/// Provider key used when neither flags nor config name one.
pub(super) const DEFAULT_PROVIDER: &str = "openai";
/// Number of sessions listed by the history browser.
pub(super) const DEFAULT_HISTORY_MAX_SIZE: usize = 1000;
/// Largest project doc we will inline into the instructions.
pub(super) const PROJECT_DOC_MAX_BYTES: usize = 32 * 1024;
/// Separator placed between user instructions and the project doc.
pub(super) const PROJECT_DOC_SEPARATOR: &str = "\n\n--- project-doc ---\n\n";
/// File names recognised as project docs, in lookup order.
pub(super) const PROJECT_DOC_FILENAMES: &[&str] = &["AGENTS.md", "codex.md", ".codex.md", "CODEX.md"];
/// Models that accept the `flex` service tier.
pub(super) const FLEX_MODE_MODELS: &[&str] = &["o3", "o4-mini"];
