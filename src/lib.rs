//! codex: a terminal coding assistant for OpenAI-compatible Responses APIs.
//!
//! The library holds everything the `codex` binary dispatches to: config
//! and credential resolution, the agent loop seam, the quiet and full-context
//! runners, rollout persistence, and the terminal renderer.
//!
//! # Quick start
//!
//! ```no_run
//! use codex::agent::{AgentOptions, ResponsesAgent};
//! use codex::approval::{resolve_approval_policy, ApprovalFlags};
//! use codex::config::{load_config, ConfigOverrides};
//! use codex::quiet::{run_quiet, QuietRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cwd = std::env::current_dir()?;
//! let config = load_config(&ConfigOverrides::default(), &cwd)?.config;
//! let policy = resolve_approval_policy(&ApprovalFlags::default(), config.approval_mode);
//! let agent = ResponsesAgent::new(AgentOptions {
//!     config,
//!     policy,
//!     writable_roots: Vec::new(),
//!     cwd,
//! })?;
//! let request = QuietRequest {
//!     prompt: "explain this repo".to_string(),
//!     images: Vec::new(),
//!     policy,
//! };
//! run_quiet(&agent, &request, &mut std::io::stdout()).await?;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod approval;
pub mod auth;
pub mod build_info;
pub mod config;
pub mod editor;
pub mod error;
pub mod format;
pub mod full_context;
pub mod items;
pub mod logging;
pub mod native;
pub mod notify;
pub mod quiet;
pub mod rollout;
#[cfg(test)]
pub mod testsupport;
pub mod tui;
pub mod update_check;
