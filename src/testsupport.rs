//! Shared test fixtures: a scripted agent and item builders.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;

use crate::agent::{AgentHooks, AgentLoop};
use crate::approval::ReviewDecision;
use crate::error::AgentError;
use crate::items::{FunctionCallItem, FunctionCallOutputItem, ResponseItem};

/// Agent that replays a fixed list of items.
///
/// Function calls go through the hooks' confirmation exactly like the real
/// agent; approved commands are recorded instead of executed.
#[derive(Debug, Default)]
pub struct ScriptedAgent {
    script: Vec<ResponseItem>,
    inputs: Mutex<Vec<Vec<ResponseItem>>>,
    decisions: Mutex<Vec<ReviewDecision>>,
    executed: Mutex<Vec<Vec<String>>>,
}

impl ScriptedAgent {
    pub fn new(script: Vec<ResponseItem>) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    /// Number of times `run` was called.
    pub fn run_count(&self) -> usize {
        self.inputs.lock().expect("inputs lock").len()
    }

    /// Input transcripts seen by each run.
    pub fn inputs(&self) -> Vec<Vec<ResponseItem>> {
        self.inputs.lock().expect("inputs lock").clone()
    }

    /// Confirmation answers received, in order.
    pub fn decisions(&self) -> Vec<ReviewDecision> {
        self.decisions.lock().expect("decisions lock").clone()
    }

    /// Commands that would have run.
    pub fn executed(&self) -> Vec<Vec<String>> {
        self.executed.lock().expect("executed lock").clone()
    }
}

#[async_trait]
impl AgentLoop for ScriptedAgent {
    async fn run(
        &self,
        input: Vec<ResponseItem>,
        hooks: &mut dyn AgentHooks,
    ) -> Result<Vec<ResponseItem>, AgentError> {
        self.inputs.lock().expect("inputs lock").push(input);
        let mut produced = Vec::new();
        for item in &self.script {
            hooks.on_item(item);
            produced.push(item.clone());
            let ResponseItem::FunctionCall(call) = item else {
                continue;
            };
            let argv = crate::format::parse_command_arguments(&call.arguments).unwrap_or_default();
            let decision = hooks.confirm_command(&argv).await;
            self.decisions.lock().expect("decisions lock").push(decision);
            let output = if decision.is_approved() {
                self.executed.lock().expect("executed lock").push(argv);
                json!({"output": "ok", "metadata": {"exit_code": 0, "duration_seconds": 0.1}})
                    .to_string()
            } else {
                "aborted by user".to_string()
            };
            let reply = ResponseItem::FunctionCallOutput(FunctionCallOutputItem {
                id: None,
                call_id: call.call_id.clone(),
                output,
            });
            hooks.on_item(&reply);
            produced.push(reply);
            if decision == ReviewDecision::NoExit {
                break;
            }
        }
        Ok(produced)
    }
}

/// A `shell` function call for `argv`.
pub fn shell_call(call_id: &str, argv: &[&str]) -> ResponseItem {
    ResponseItem::FunctionCall(FunctionCallItem {
        id: Some(format!("fc_{call_id}")),
        call_id: call_id.to_string(),
        name: "shell".to_string(),
        arguments: json!({ "command": argv }).to_string(),
    })
}

/// A reasoning item; `None` omits the summary field.
pub fn reasoning(id: &str, summary: Option<Vec<&str>>) -> ResponseItem {
    let mut value = json!({"type": "reasoning", "id": id});
    if let Some(parts) = summary {
        value["summary"] = parts
            .into_iter()
            .map(|text| json!({"type": "summary_text", "text": text}))
            .collect();
    }
    ResponseItem::from_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_call_encodes_command_array() {
        let ResponseItem::FunctionCall(call) = shell_call("c", &["echo", "hi"]) else {
            panic!("expected function call");
        };
        assert_eq!(
            crate::format::parse_command_arguments(&call.arguments),
            Some(vec!["echo".to_string(), "hi".to_string()])
        );
    }

    #[test]
    fn reasoning_fixture_tracks_summary_presence() {
        let missing = reasoning("r1", None).to_value();
        assert!(missing.get("summary").is_none());
        let empty = reasoning("r2", Some(vec![])).to_value();
        assert_eq!(empty["summary"], json!([]));
    }
}
