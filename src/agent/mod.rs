//! The agent collaborator seam.
//!
//! An [`AgentLoop`] turns an input transcript into new response items. It
//! reports every item through [`AgentHooks::on_item`] as soon as it exists
//! and asks [`AgentHooks::confirm_command`] before running any command.
//! [`ResponsesAgent`] is the HTTP implementation used by the binary; tests
//! substitute a scripted agent.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::approval::{ApprovalPolicy, ReviewDecision};
use crate::config::EffectiveConfig;
use crate::error::AgentError;
use crate::items::ResponseItem;

mod exec;
mod responses;

pub use exec::{run_command, CommandOutput};
pub use responses::ResponsesAgent;

/// Callbacks a front end supplies to one agent run.
#[async_trait]
pub trait AgentHooks: Send {
    /// Called once per produced item, in order.
    fn on_item(&mut self, item: &ResponseItem);

    /// Decide whether `command` may run.
    async fn confirm_command(&mut self, command: &[String]) -> ReviewDecision;
}

/// Something that can run one user turn to completion.
#[async_trait]
pub trait AgentLoop: Send + Sync {
    /// Run the model over `input` and return the items it produced.
    async fn run(
        &self,
        input: Vec<ResponseItem>,
        hooks: &mut dyn AgentHooks,
    ) -> Result<Vec<ResponseItem>, AgentError>;
}

/// Everything an agent needs for a session.
#[derive(Debug, Clone)]
pub struct AgentOptions {
    pub config: EffectiveConfig,
    pub policy: ApprovalPolicy,
    /// Extra directories commands may write to, besides `cwd`.
    pub writable_roots: Vec<PathBuf>,
    pub cwd: PathBuf,
}
