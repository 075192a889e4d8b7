//! Approval policy resolution and review decisions.
//!
//! The policy governs whether a proposed command needs confirmation before
//! the agent runs it.

use serde::{Deserialize, Serialize};

/// How much the agent may do without asking.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ApprovalMode {
    /// Ask before every action.
    #[default]
    Suggest,
    /// Apply file edits automatically, ask before commands.
    AutoEdit,
    /// Run everything without asking.
    FullAuto,
}

impl ApprovalMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Suggest => "suggest",
            Self::AutoEdit => "auto-edit",
            Self::FullAuto => "full-auto",
        }
    }
}

impl std::fmt::Display for ApprovalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Approval-related command-line flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApprovalFlags {
    pub approval_mode: Option<ApprovalMode>,
    pub auto_edit: bool,
    pub full_auto: bool,
    pub dangerously_auto_approve_everything: bool,
}

/// Resolved approval policy for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalPolicy {
    pub mode: ApprovalMode,
    /// Skip every confirmation, including ones full-auto would still ask.
    pub auto_approve_everything: bool,
}

impl ApprovalPolicy {
    pub fn is_full_auto(&self) -> bool {
        self.mode == ApprovalMode::FullAuto
    }
}

/// Resolve the policy from flags and the configured default.
///
/// Highest first: `--dangerously-auto-approve-everything`, full-auto
/// (either flag form), auto-edit (either flag form), config, `suggest`.
pub fn resolve_approval_policy(
    flags: &ApprovalFlags,
    config_default: Option<ApprovalMode>,
) -> ApprovalPolicy {
    if flags.dangerously_auto_approve_everything {
        return ApprovalPolicy {
            mode: ApprovalMode::FullAuto,
            auto_approve_everything: true,
        };
    }
    let mode = if flags.full_auto || flags.approval_mode == Some(ApprovalMode::FullAuto) {
        ApprovalMode::FullAuto
    } else if flags.auto_edit || flags.approval_mode == Some(ApprovalMode::AutoEdit) {
        ApprovalMode::AutoEdit
    } else {
        config_default.unwrap_or_default()
    };
    ApprovalPolicy {
        mode,
        auto_approve_everything: false,
    }
}

/// Answer to a command confirmation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    /// Run the command.
    Yes,
    /// Run it and stop asking for the rest of the session.
    Always,
    /// Skip the command, keep going.
    NoContinue,
    /// Skip the command and end the run.
    NoExit,
}

impl ReviewDecision {
    pub fn is_approved(self) -> bool {
        matches!(self, Self::Yes | Self::Always)
    }
}
