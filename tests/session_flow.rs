//! End-to-end checks over the public library surface: a quiet run, the
//! rollout it leaves behind, and how that rollout renders when viewed.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;

use codex::agent::{AgentHooks, AgentLoop};
use codex::approval::{resolve_approval_policy, ApprovalFlags, ApprovalMode, ReviewDecision};
use codex::error::AgentError;
use codex::items::ResponseItem;
use codex::quiet::{run_quiet, QuietRequest};
use codex::rollout::{list_sessions, load_rollout, save_rollout, Rollout};
use codex::tui::{render_entry, LogEntry, RenderOptions};

/// Proposes one `ls -la`, then reports on it.
#[derive(Default)]
struct ListingAgent {
    decisions: Mutex<Vec<ReviewDecision>>,
}

#[async_trait]
impl AgentLoop for ListingAgent {
    async fn run(
        &self,
        _input: Vec<ResponseItem>,
        hooks: &mut dyn AgentHooks,
    ) -> Result<Vec<ResponseItem>, AgentError> {
        let call = ResponseItem::from_value(json!({
            "type": "function_call",
            "id": "fc_1",
            "call_id": "call_1",
            "name": "shell",
            "arguments": json!({"command": ["ls", "-la"]}).to_string(),
        }));
        hooks.on_item(&call);
        let decision = hooks.confirm_command(&["ls".to_string(), "-la".to_string()]).await;
        self.decisions.lock().expect("decisions lock").push(decision);

        let output = ResponseItem::from_value(json!({
            "type": "function_call_output",
            "call_id": "call_1",
            "output": json!({
                "output": "a\nb\nc\nd\ne\nf",
                "metadata": {"exit_code": 0, "duration_seconds": 0.2},
            })
            .to_string(),
        }));
        hooks.on_item(&output);
        let reply = ResponseItem::assistant_text("Six files.");
        hooks.on_item(&reply);
        Ok(vec![call, output, reply])
    }
}

fn quiet_policy(full_auto: bool) -> codex::approval::ApprovalPolicy {
    resolve_approval_policy(
        &ApprovalFlags {
            full_auto,
            ..ApprovalFlags::default()
        },
        None,
    )
}

#[tokio::test]
async fn quiet_run_prints_items_and_declines_outside_full_auto() {
    let agent = ListingAgent::default();
    let request = QuietRequest {
        prompt: "list files".to_string(),
        images: Vec::new(),
        policy: quiet_policy(false),
    };
    let mut out = Vec::new();
    let transcript = run_quiet(&agent, &request, &mut out).await.expect("quiet run");

    let printed = String::from_utf8(out).expect("utf8");
    assert!(printed.contains("$ ls -la"), "{printed}");
    assert!(printed.contains("command.stdout (code: 0, duration: 0.2s)"), "{printed}");
    assert!(printed.contains("assistant: Six files."), "{printed}");
    assert_eq!(transcript.len(), 4);
    assert_eq!(
        *agent.decisions.lock().expect("decisions lock"),
        vec![ReviewDecision::NoExit]
    );
}

#[tokio::test]
async fn full_auto_quiet_run_approves_commands() {
    let agent = ListingAgent::default();
    let request = QuietRequest {
        prompt: "list files".to_string(),
        images: Vec::new(),
        policy: quiet_policy(true),
    };
    run_quiet(&agent, &request, &mut Vec::new()).await.expect("quiet run");
    assert_eq!(
        *agent.decisions.lock().expect("decisions lock"),
        vec![ReviewDecision::Yes]
    );
}

#[tokio::test]
async fn saved_rollout_lists_and_renders() {
    let agent = ListingAgent::default();
    let request = QuietRequest {
        prompt: "list files".to_string(),
        images: Vec::new(),
        policy: quiet_policy(true),
    };
    let transcript = run_quiet(&agent, &request, &mut Vec::new()).await.expect("quiet run");

    let dir = tempfile::tempdir().expect("tempdir");
    let rollout = Rollout::new(None, transcript);
    let path = save_rollout(dir.path(), &rollout).expect("save");

    let sessions = list_sessions(dir.path(), 10);
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, rollout.session.id);
    assert_eq!(sessions[0].item_count, 4);
    assert_eq!(sessions[0].first_message.as_deref(), Some("list files"));
    assert!(list_sessions(dir.path(), 0).is_empty());

    let loaded = load_rollout(&path).expect("load");
    assert_eq!(loaded, rollout);

    let rows: Vec<String> = loaded
        .items
        .iter()
        .flat_map(|item| render_entry(&LogEntry::Item(item.clone()), RenderOptions::default()))
        .collect();
    let text = rows.join("\n");
    assert!(text.contains("$ ls -la"), "{text}");
    assert!(text.contains("... (2 more lines)"), "{text}");
    assert!(text.contains("Six files."), "{text}");
}

#[test]
fn empty_reasoning_summary_renders_nothing() {
    let hidden = ResponseItem::from_value(json!({"type": "reasoning", "id": "rs_1", "summary": []}));
    assert!(render_entry(&LogEntry::Item(hidden), RenderOptions::default()).is_empty());

    let shown = ResponseItem::from_value(json!({
        "type": "reasoning",
        "id": "rs_2",
        "summary": [{"type": "summary_text", "text": "checking the tree"}],
    }));
    let rows = render_entry(&LogEntry::Item(shown), RenderOptions::default());
    assert!(rows.iter().any(|row| row.contains("checking the tree")));
}

#[test]
fn dangerous_flag_outranks_every_mode() {
    let policy = resolve_approval_policy(
        &ApprovalFlags {
            approval_mode: Some(ApprovalMode::Suggest),
            dangerously_auto_approve_everything: true,
            ..ApprovalFlags::default()
        },
        Some(ApprovalMode::AutoEdit),
    );
    assert_eq!(policy.mode, ApprovalMode::FullAuto);
    assert!(policy.auto_approve_everything);
}
