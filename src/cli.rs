//! CLI argument parsing via clap.

use clap::Parser;
use codex::approval::{ApprovalFlags, ApprovalMode};
use codex::config::{ConfigOverrides, ProjectDocMode, ReasoningEffort};
use std::path::PathBuf;

/// Interactive REPL for AI coding assistance in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "codex",
    disable_version_flag = true,
    after_help = "Examples:\n  codex \"Write and run a python program that prints ASCII art\"\n  codex -q \"fix build issues\"\n  codex completion bash"
)]
pub struct Args {
    /// Optional prompt, or `completion <bash|zsh|fish>`.
    pub input: Vec<String>,

    /// Model to use for completions.
    #[arg(short = 'm', long = "model")]
    pub model: Option<String>,

    /// Provider to use for completions (default: openai).
    #[arg(short = 'p', long = "provider")]
    pub provider: Option<String>,

    /// Path(s) to image files to include as input.
    #[arg(short = 'i', long = "image", value_name = "PATH")]
    pub images: Vec<PathBuf>,

    /// Inspect a saved rollout instead of starting a session.
    #[arg(short = 'v', long = "view", value_name = "PATH")]
    pub view: Option<PathBuf>,

    /// Browse previous sessions.
    #[arg(long = "history")]
    pub history: bool,

    /// Start a new login flow even if cached credentials exist.
    #[arg(long = "login")]
    pub login: bool,

    /// Retry redeeming free credits after login.
    #[arg(long = "free")]
    pub free: bool,

    /// Non-interactive mode that only prints the assistant's output.
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Open the config file (config.toml) in your editor.
    #[arg(short = 'c', long = "config")]
    pub config: bool,

    /// Writable folder for sandbox in full-auto mode (can be specified
    /// multiple times).
    #[arg(short = 'w', long = "writable-root", value_name = "DIR")]
    pub writable_roots: Vec<PathBuf>,

    /// Override the approval policy.
    #[arg(short = 'a', long = "approval-mode", value_enum)]
    pub approval_mode: Option<ApprovalMode>,

    /// Automatically approve file edits; still prompt for commands.
    #[arg(long = "auto-edit")]
    pub auto_edit: bool,

    /// Automatically approve edits and commands when executed in the sandbox.
    #[arg(long = "full-auto")]
    pub full_auto: bool,

    /// Do not automatically include the repository's project doc.
    #[arg(long = "no-project-doc")]
    pub no_project_doc: bool,

    /// Include an additional markdown file at PATH as context.
    #[arg(long = "project-doc", value_name = "PATH", conflicts_with = "no_project_doc")]
    pub project_doc: Option<PathBuf>,

    /// Do not truncate command stdout/stderr output.
    #[arg(long = "full-stdout")]
    pub full_stdout: bool,

    /// Enable desktop notifications for responses.
    #[arg(long = "notify")]
    pub notify: bool,

    /// Disable server-side response storage (sends full context each request).
    #[arg(long = "disable-response-storage")]
    pub disable_response_storage: bool,

    /// Enable "flex-mode" service tier (only supported by o3 and o4-mini).
    #[arg(long = "flex-mode")]
    pub flex_mode: bool,

    /// Reasoning effort level.
    #[arg(long = "reasoning", value_enum, value_name = "EFFORT")]
    pub reasoning: Option<ReasoningEffort>,

    /// Skip all confirmation prompts and execute commands without sandboxing.
    /// Intended solely for ephemeral local testing.
    #[arg(long = "dangerously-auto-approve-everything")]
    pub dangerously_auto_approve_everything: bool,

    /// Launch in "full-context" mode which loads the entire repository into
    /// context and applies a batch of edits in one go.
    #[arg(short = 'f', long = "full-context")]
    pub full_context: bool,

    /// Print version information.
    #[arg(long = "version")]
    pub version: bool,
}

impl Args {
    /// The prompt formed by the positional words, if any.
    pub fn prompt(&self) -> Option<String> {
        let joined = self.input.join(" ");
        (!joined.trim().is_empty()).then_some(joined)
    }

    /// Shell name when invoked as `codex completion <shell>`.
    ///
    /// A missing shell name yields an empty string so the dispatcher can
    /// report it as unsupported.
    pub fn completion_shell(&self) -> Option<&str> {
        match self.input.as_slice() {
            [first, rest @ ..] if first == "completion" => {
                Some(rest.first().map(String::as_str).unwrap_or_default())
            }
            _ => None,
        }
    }

    pub fn approval_flags(&self) -> ApprovalFlags {
        ApprovalFlags {
            approval_mode: self.approval_mode,
            auto_edit: self.auto_edit,
            full_auto: self.full_auto,
            dangerously_auto_approve_everything: self.dangerously_auto_approve_everything,
        }
    }

    pub fn config_overrides(&self) -> ConfigOverrides {
        let project_doc = if self.no_project_doc {
            ProjectDocMode::Disabled
        } else if let Some(path) = &self.project_doc {
            ProjectDocMode::Path(path.clone())
        } else {
            ProjectDocMode::Auto
        };
        ConfigOverrides {
            model: self.model.clone(),
            provider: self.provider.clone(),
            notify: self.notify,
            reasoning_effort: self.reasoning,
            flex_mode: self.flex_mode,
            disable_response_storage: self.disable_response_storage,
            full_stdout: self.full_stdout,
            project_doc,
        }
    }
}
