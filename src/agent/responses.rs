//! `/responses` implementation of [`AgentLoop`].

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::approval::ReviewDecision;
use crate::error::AgentError;
use crate::format::parse_command_arguments;
use crate::items::{FunctionCallItem, FunctionCallOutputItem, ResponseItem};

use super::exec::run_command;
use super::{AgentHooks, AgentLoop, AgentOptions};

/// Upper bound on model round-trips for one user turn.
const MAX_TURNS: usize = 50;
/// Default per-command timeout when the model gives none.
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);
/// HTTP timeout for model requests; flex tier is allowed to queue longer.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
const FLEX_REQUEST_TIMEOUT: Duration = Duration::from_secs(900);
/// Name of the only tool this agent exposes.
const SHELL_TOOL: &str = "shell";

/// Agent that drives a Responses-compatible endpoint and runs approved
/// shell commands locally.
pub struct ResponsesAgent {
    options: AgentOptions,
    http: reqwest::Client,
    tools_enabled: bool,
}

/// What to do after a turn's calls were handled.
enum TurnOutcome {
    Continue,
    Stop,
}

impl ResponsesAgent {
    pub fn new(options: AgentOptions) -> Result<Self, AgentError> {
        let timeout = if options.config.flex_mode {
            FLEX_REQUEST_TIMEOUT
        } else {
            REQUEST_TIMEOUT
        };
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("codex/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            options,
            http,
            tools_enabled: true,
        })
    }

    /// Single-pass mode: no tools, one model call.
    pub fn without_tools(mut self) -> Self {
        self.tools_enabled = false;
        self
    }

    pub fn options(&self) -> &AgentOptions {
        &self.options
    }

    fn instructions(&self) -> String {
        let mut text = self.options.config.instructions.clone();
        if self.tools_enabled {
            let mut roots = vec![self.options.cwd.display().to_string()];
            roots.extend(
                self.options
                    .writable_roots
                    .iter()
                    .map(|root| root.display().to_string()),
            );
            if !text.is_empty() {
                text.push_str("\n\n");
            }
            text.push_str(&format!(
                "Approval mode: {}. Writable roots: {}.",
                self.options.policy.mode,
                roots.join(", ")
            ));
        }
        text
    }

    fn build_payload(&self, transcript: &[ResponseItem]) -> Value {
        let config = &self.options.config;
        let input: Vec<Value> = transcript
            .iter()
            .filter(|item| !matches!(item, ResponseItem::Reasoning(_)))
            .map(replay_value)
            .collect();

        let mut payload = Map::new();
        payload.insert("model".to_string(), Value::String(config.model.clone()));
        payload.insert("input".to_string(), Value::Array(input));
        let instructions = self.instructions();
        if !instructions.is_empty() {
            payload.insert("instructions".to_string(), Value::String(instructions));
        }
        if self.tools_enabled {
            payload.insert("tools".to_string(), json!([shell_tool_definition()]));
        }
        if config.disable_response_storage {
            payload.insert("store".to_string(), Value::Bool(false));
        }
        if let Some(effort) = config.reasoning_effort {
            payload.insert(
                "reasoning".to_string(),
                json!({ "effort": effort.as_str(), "summary": "auto" }),
            );
        }
        if config.flex_mode {
            payload.insert("service_tier".to_string(), Value::String("flex".to_string()));
        }
        Value::Object(payload)
    }

    async fn request(&self, transcript: &[ResponseItem]) -> Result<Vec<ResponseItem>, AgentError> {
        let url = format!("{}/responses", self.options.config.base_url.trim_end_matches('/'));
        let mut req = self.http.post(&url).json(&self.build_payload(transcript));
        if let Some(key) = self
            .options
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
        {
            req = req.header("Authorization", format!("Bearer {key}"));
        }
        tracing::debug!(%url, items = transcript.len(), "sending responses request");

        let response = req.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Status(status, body));
        }
        let body: Value = response.json().await?;
        parse_output_items(&body)
    }

    async fn handle_call(
        &self,
        call: &FunctionCallItem,
        hooks: &mut dyn AgentHooks,
    ) -> (ResponseItem, TurnOutcome) {
        let reply = |output: String| {
            ResponseItem::FunctionCallOutput(FunctionCallOutputItem {
                id: None,
                call_id: call.call_id.clone(),
                output,
            })
        };
        if call.name != SHELL_TOOL {
            return (
                reply(format!("unsupported call: {}", call.name)),
                TurnOutcome::Continue,
            );
        }
        let Some(argv) = parse_command_arguments(&call.arguments) else {
            return (
                reply("invalid arguments: expected {\"command\": [..]}".to_string()),
                TurnOutcome::Continue,
            );
        };

        match hooks.confirm_command(&argv).await {
            ReviewDecision::Yes | ReviewDecision::Always => {
                let timeout = command_timeout(&call.arguments);
                let workdir = command_workdir(&call.arguments, &self.options.cwd);
                let output = run_command(&argv, &workdir, timeout).await;
                tracing::debug!(exit_code = output.exit_code, "command finished");
                (reply(output.to_function_output()), TurnOutcome::Continue)
            }
            ReviewDecision::NoContinue => (
                reply("aborted by user: command was not run".to_string()),
                TurnOutcome::Continue,
            ),
            ReviewDecision::NoExit => (
                reply("aborted by user: command was not run".to_string()),
                TurnOutcome::Stop,
            ),
        }
    }
}

#[async_trait]
impl AgentLoop for ResponsesAgent {
    async fn run(
        &self,
        input: Vec<ResponseItem>,
        hooks: &mut dyn AgentHooks,
    ) -> Result<Vec<ResponseItem>, AgentError> {
        let mut transcript = input;
        let mut produced = Vec::new();

        for _ in 0..MAX_TURNS {
            let output = self.request(&transcript).await?;
            let mut outcome = TurnOutcome::Stop;
            for item in output {
                hooks.on_item(&item);
                transcript.push(item.clone());
                produced.push(item.clone());

                if let ResponseItem::FunctionCall(call) = &item {
                    let (reply, next) = self.handle_call(call, hooks).await;
                    hooks.on_item(&reply);
                    transcript.push(reply.clone());
                    produced.push(reply);
                    if matches!(next, TurnOutcome::Stop) {
                        return Ok(produced);
                    }
                    outcome = TurnOutcome::Continue;
                }
            }
            if matches!(outcome, TurnOutcome::Stop) || !self.tools_enabled {
                return Ok(produced);
            }
        }
        Err(AgentError::MaxTurnsReached)
    }
}

fn shell_tool_definition() -> Value {
    json!({
        "type": "function",
        "name": SHELL_TOOL,
        "description": "Runs a command and returns its output.",
        "strict": false,
        "parameters": {
            "type": "object",
            "properties": {
                "command": { "type": "array", "items": { "type": "string" } },
                "workdir": { "type": "string" },
                "timeout": { "type": "number", "description": "Timeout in milliseconds." }
            },
            "required": ["command"],
            "additionalProperties": false
        }
    })
}

fn command_timeout(arguments: &str) -> Duration {
    serde_json::from_str::<Value>(arguments)
        .ok()
        .and_then(|args| args.get("timeout").and_then(Value::as_u64))
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_COMMAND_TIMEOUT)
}

/// `workdir` from the call arguments, resolved against `cwd`.
fn command_workdir(arguments: &str, cwd: &Path) -> PathBuf {
    serde_json::from_str::<Value>(arguments)
        .ok()
        .and_then(|args| args.get("workdir").and_then(Value::as_str).map(str::to_string))
        .filter(|dir| !dir.trim().is_empty())
        .map_or_else(|| cwd.to_path_buf(), |dir| cwd.join(dir))
}

/// An item as sent back in `input`.
///
/// Server ids are dropped: they reference stored items, and a replayed
/// `function_call` id is rejected once its paired reasoning item is gone.
fn replay_value(item: &ResponseItem) -> Value {
    let mut value = item.to_value();
    if let Value::Object(map) = &mut value {
        map.remove("id");
    }
    value
}

/// Pull the `output` array out of a `/responses` body.
fn parse_output_items(body: &Value) -> Result<Vec<ResponseItem>, AgentError> {
    let output = body
        .get("output")
        .and_then(Value::as_array)
        .ok_or_else(|| AgentError::InvalidResponse("missing `output` array".to_string()))?;
    Ok(output.iter().cloned().map(ResponseItem::from_value).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::{ApprovalMode, ApprovalPolicy};
    use crate::config::{EffectiveConfig, ReasoningEffort};
    use std::path::PathBuf;

    fn agent(config: EffectiveConfig) -> ResponsesAgent {
        ResponsesAgent::new(AgentOptions {
            config,
            policy: ApprovalPolicy {
                mode: ApprovalMode::Suggest,
                auto_approve_everything: false,
            },
            writable_roots: vec![PathBuf::from("/tmp/extra")],
            cwd: PathBuf::from("/work"),
        })
        .expect("agent")
    }

    /// Approves every command.
    struct ApproveAll;

    #[async_trait]
    impl AgentHooks for ApproveAll {
        fn on_item(&mut self, _item: &ResponseItem) {}

        async fn confirm_command(&mut self, _command: &[String]) -> ReviewDecision {
            ReviewDecision::Yes
        }
    }

    #[test]
    fn payload_carries_model_options_and_drops_reasoning_items() {
        let mut config = EffectiveConfig::default().with_model("o3");
        config.flex_mode = true;
        config.disable_response_storage = true;
        config.reasoning_effort = Some(ReasoningEffort::High);
        config.instructions = "Be careful.".into();
        let agent = agent(config);

        let transcript = vec![
            ResponseItem::user_text("hi"),
            ResponseItem::from_value(json!({"type": "reasoning", "summary": []})),
        ];
        let payload = agent.build_payload(&transcript);
        assert_eq!(payload["model"], "o3");
        assert_eq!(payload["store"], false);
        assert_eq!(payload["service_tier"], "flex");
        assert_eq!(payload["reasoning"]["effort"], "high");
        assert_eq!(payload["input"].as_array().map(Vec::len), Some(1));
        assert_eq!(payload["tools"][0]["name"], "shell");
        let instructions = payload["instructions"].as_str().unwrap_or_default();
        assert!(instructions.starts_with("Be careful."));
        assert!(instructions.contains("/work, /tmp/extra"));
    }

    #[test]
    fn replayed_items_lose_server_ids_but_keep_call_pairing() {
        let agent = agent(EffectiveConfig::default());
        let transcript = vec![
            ResponseItem::user_text("list"),
            ResponseItem::from_value(json!({"type": "reasoning", "id": "rs_1", "summary": []})),
            ResponseItem::from_value(json!({
                "type": "function_call",
                "id": "fc_1",
                "call_id": "call_1",
                "name": "shell",
                "arguments": "{\"command\":[\"ls\"]}",
            })),
            ResponseItem::from_value(json!({
                "type": "function_call_output",
                "call_id": "call_1",
                "output": "ok",
            })),
        ];
        let payload = agent.build_payload(&transcript);
        let input = payload["input"].as_array().cloned().unwrap_or_default();
        assert_eq!(input.len(), 3);
        assert!(input.iter().all(|item| item.get("id").is_none()));
        assert_eq!(input[1]["type"], "function_call");
        assert_eq!(input[1]["call_id"], "call_1");
        assert_eq!(input[2]["call_id"], "call_1");
    }

    #[test]
    fn workdir_resolves_against_cwd() {
        let cwd = Path::new("/work");
        assert_eq!(
            command_workdir(r#"{"command":["ls"],"workdir":"sub/dir"}"#, cwd),
            PathBuf::from("/work/sub/dir")
        );
        assert_eq!(
            command_workdir(r#"{"command":["ls"],"workdir":"/elsewhere"}"#, cwd),
            PathBuf::from("/elsewhere")
        );
        assert_eq!(command_workdir(r#"{"command":["ls"]}"#, cwd), PathBuf::from("/work"));
        assert_eq!(command_workdir(r#"{"command":["ls"],"workdir":""}"#, cwd), PathBuf::from("/work"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn approved_command_runs_in_requested_workdir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().canonicalize().expect("canonical tempdir");
        let mut runner = agent(EffectiveConfig::default());
        runner.options.cwd = PathBuf::from("/");
        let call = FunctionCallItem {
            id: Some("fc_1".into()),
            call_id: "call_1".into(),
            name: SHELL_TOOL.into(),
            arguments: json!({"command": ["pwd"], "workdir": target.display().to_string()})
                .to_string(),
        };
        let (reply, _) = runner.handle_call(&call, &mut ApproveAll).await;
        let ResponseItem::FunctionCallOutput(output) = reply else {
            panic!("expected function call output");
        };
        let (text, metadata) = output.parsed();
        assert_eq!(metadata.map(|meta| meta.exit_code), Some(0));
        assert_eq!(text.trim_end(), target.display().to_string());
    }

    #[test]
    fn single_pass_mode_sends_no_tools() {
        let agent = agent(EffectiveConfig::default()).without_tools();
        let payload = agent.build_payload(&[ResponseItem::user_text("hi")]);
        assert!(payload.get("tools").is_none());
        assert!(payload.get("instructions").is_none());
        assert!(payload.get("store").is_none());
    }

    #[test]
    fn output_items_are_parsed_with_fallback() {
        let items = parse_output_items(&json!({
            "output": [
                {"type": "message", "role": "assistant", "content": [{"type": "output_text", "text": "ok"}]},
                {"type": "web_search_call", "id": "ws"}
            ]
        }))
        .expect("items");
        assert!(matches!(items[0], ResponseItem::Message(_)));
        assert!(matches!(items[1], ResponseItem::Other(_)));
        assert!(parse_output_items(&json!({"error": "x"})).is_err());
    }

    #[test]
    fn command_timeout_reads_milliseconds() {
        assert_eq!(
            command_timeout(r#"{"command":["ls"],"timeout":2500}"#),
            Duration::from_millis(2500)
        );
        assert_eq!(command_timeout("{}"), DEFAULT_COMMAND_TIMEOUT);
    }
}
