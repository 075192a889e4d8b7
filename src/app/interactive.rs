//! The default interactive session.
//!
//! Items go to the static log on stdout as they arrive; the status line,
//! prompt and confirmation picker live on stderr.

use async_trait::async_trait;
use codex::agent::{AgentHooks, AgentLoop};
use codex::approval::{ApprovalPolicy, ReviewDecision};
use codex::config::EffectiveConfig;
use codex::error::AgentError;
use codex::format::format_command_for_display;
use codex::items::{create_input_item, ResponseItem};
use codex::notify::{notification_body, send_notification};
use codex::rollout::{save_rollout, Rollout};
use codex::tui::{self, settings, HeaderInfo, ReadOutcome, RenderOptions, StaticLog, StatusLine};
use crossterm::style::Stylize;
use std::io::Write;
use std::path::PathBuf;

use crate::app::signals;

/// Slash command metadata shown by `/help`.
pub(crate) struct SlashCommand {
    pub name: &'static str,
    pub description: &'static str,
}

pub(crate) const SLASH_COMMANDS: [SlashCommand; 4] = [
    SlashCommand {
        name: "/clear",
        description: "Clear the conversation context.",
    },
    SlashCommand {
        name: "/help",
        description: "List available slash commands.",
    },
    SlashCommand {
        name: "/exit",
        description: "Exit interactive mode.",
    },
    SlashCommand {
        name: "/q",
        description: "Short alias for exit.",
    },
];

/// What one submitted line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineAction {
    Empty,
    Prompt(String),
    Clear,
    Help,
    Quit,
    Unknown(String),
}

pub(crate) fn parse_line(line: &str) -> LineAction {
    let trimmed = line.trim();
    match trimmed {
        "" => LineAction::Empty,
        "/clear" => LineAction::Clear,
        "/help" => LineAction::Help,
        "/exit" | "/quit" | "/q" | "exit" | "quit" | "q" | ":q" => LineAction::Quit,
        other if other.starts_with('/') => LineAction::Unknown(other.to_string()),
        other => LineAction::Prompt(other.to_string()),
    }
}

/// Everything the interactive loop needs.
pub(crate) struct InteractiveSetup {
    pub header: HeaderInfo,
    pub config: EffectiveConfig,
    pub policy: ApprovalPolicy,
    pub color: bool,
    pub initial_prompt: Option<String>,
    /// Attached to the first prompt only.
    pub images: Vec<PathBuf>,
    /// Items of a resumed session, used as context.
    pub resumed: Vec<ResponseItem>,
    pub sessions_dir: Option<PathBuf>,
}

/// Hooks that append to the static log and ask before commands run.
struct InteractiveHooks<'a, W: Write> {
    log: &'a mut StaticLog<W>,
    status: StatusLine,
    policy: ApprovalPolicy,
    color: bool,
    always_approved: &'a mut bool,
}

impl<W: Write> InteractiveHooks<'_, W> {
    fn resume_status(&mut self) {
        self.status = tui::start_status_line(settings::LABEL_STATUS, self.color);
    }
}

#[async_trait]
impl<W: Write + Send> AgentHooks for InteractiveHooks<'_, W> {
    fn on_item(&mut self, item: &ResponseItem) {
        self.status.finish();
        self.log.push(item.clone());
        if let Err(err) = self.log.flush() {
            tracing::debug!(%err, "log write failed");
        }
        self.resume_status();
    }

    async fn confirm_command(&mut self, command: &[String]) -> ReviewDecision {
        if self.policy.auto_approve_everything || self.policy.is_full_auto() || *self.always_approved
        {
            return ReviewDecision::Yes;
        }
        self.status.finish();
        let display = format_command_for_display(command);
        let color = self.color;
        let decision = tokio::task::spawn_blocking(move || tui::confirm_command(color, &display))
            .await
            .map_err(|err| err.to_string())
            .and_then(|answer| answer.map_err(|err| err.to_string()));
        let decision = match decision {
            Ok(Some(decision)) => decision,
            Ok(None) => signals::shutdown(),
            Err(err) => {
                tracing::debug!(%err, "confirmation prompt failed");
                ReviewDecision::NoExit
            }
        };
        if decision == ReviewDecision::Always {
            *self.always_approved = true;
        }
        tracing::info!(?command, ?decision, "command reviewed");
        self.resume_status();
        decision
    }
}

/// Conversation state carried across turns.
pub(crate) struct Conversation {
    pub transcript: Vec<ResponseItem>,
    pub always_approved: bool,
}

/// Run one user turn: log the input, run the agent, extend the transcript.
pub(crate) async fn run_turn<A, W>(
    agent: &A,
    conversation: &mut Conversation,
    log: &mut StaticLog<W>,
    input: ResponseItem,
    policy: ApprovalPolicy,
    color: bool,
) -> Result<Vec<ResponseItem>, AgentError>
where
    A: AgentLoop + ?Sized,
    W: Write + Send,
{
    log.push(input.clone());
    if let Err(err) = log.flush() {
        tracing::debug!(%err, "log write failed");
    }
    conversation.transcript.push(input);
    let transcript = conversation.transcript.clone();

    let mut hooks = InteractiveHooks {
        log,
        status: tui::start_status_line(settings::LABEL_STATUS, color),
        policy,
        color,
        always_approved: &mut conversation.always_approved,
    };
    let result = agent.run(transcript, &mut hooks).await;
    hooks.status.finish();
    drop(hooks);
    let produced = result?;
    conversation.transcript.extend(produced.iter().cloned());
    Ok(produced)
}

fn last_assistant_text(items: &[ResponseItem]) -> Option<String> {
    items.iter().rev().find_map(|item| match item {
        ResponseItem::Message(message) if message.role == "assistant" => Some(
            message
                .content
                .iter()
                .map(codex::format::content_part_text)
                .collect::<String>(),
        ),
        _ => None,
    })
}

fn print_notice(color: bool, text: &str) {
    if color {
        eprintln!("{}", text.with(settings::COLOR_HINT));
    } else {
        eprintln!("{text}");
    }
}

fn print_error(color: bool, text: &str) {
    if color {
        eprintln!("{}", text.with(settings::COLOR_ERROR));
    } else {
        eprintln!("{text}");
    }
}

fn print_help(color: bool) {
    for command in &SLASH_COMMANDS {
        print_notice(color, &format!("  {:<8} {}", command.name, command.description));
    }
}

/// Run the interactive loop until EOF or `/exit`. Returns the exit code.
pub(crate) async fn run_interactive<A: AgentLoop + ?Sized>(agent: &A, setup: InteractiveSetup) -> i32 {
    let InteractiveSetup {
        mut header,
        config,
        policy,
        color,
        initial_prompt,
        mut images,
        resumed,
        sessions_dir,
    } = setup;
    let options = RenderOptions {
        color,
        full_stdout: config.full_stdout,
    };
    let mut rollout = Rollout::new(Some(config.instructions.clone()), Vec::new());
    header.session_id = Some(rollout.session.id.clone());
    let mut log = StaticLog::new(header, std::io::stdout(), options);
    log.extend(resumed.iter().cloned());
    if let Err(err) = log.flush() {
        print_error(color, &format!("error: {err}"));
        return 1;
    }

    let mut conversation = Conversation {
        transcript: resumed,
        always_approved: false,
    };
    let mut prompts: Vec<String> = Vec::new();
    let mut pending = initial_prompt;
    print_notice(color, settings::PROMPT_EXIT_HINT);

    loop {
        let line = match pending.take() {
            Some(prompt) => prompt,
            None => match tui::read_prompt_line(color, &prompts) {
                Ok(ReadOutcome::Line(line)) => line,
                Ok(ReadOutcome::Eof) => break,
                Ok(ReadOutcome::Interrupted) => signals::shutdown(),
                Err(err) => {
                    print_error(color, &format!("error: {err}"));
                    return 1;
                }
            },
        };

        let prompt = match parse_line(&line) {
            LineAction::Empty => continue,
            LineAction::Quit => break,
            LineAction::Help => {
                print_help(color);
                continue;
            }
            LineAction::Clear => {
                conversation.transcript.clear();
                print_notice(color, "Context cleared.");
                continue;
            }
            LineAction::Unknown(command) => {
                print_error(color, &format!("Unknown command: {command} (try /help)"));
                continue;
            }
            LineAction::Prompt(prompt) => prompt,
        };
        prompts.push(prompt.clone());

        let input = match create_input_item(&prompt, &std::mem::take(&mut images)) {
            Ok(input) => input,
            Err(err) => {
                print_error(color, &format!("error: {err}"));
                continue;
            }
        };
        match run_turn(agent, &mut conversation, &mut log, input, policy, color).await {
            Ok(produced) => {
                if config.notify {
                    if let Some(reply) = last_assistant_text(&produced) {
                        send_notification("Codex", &notification_body(&reply)).await;
                    }
                }
            }
            Err(err) => print_error(color, &format!("error: {err}")),
        }

        if config.history.save_history {
            if let Some(dir) = sessions_dir.as_deref() {
                rollout.items = conversation.transcript.clone();
                if let Err(err) = save_rollout(dir, &rollout) {
                    tracing::debug!(%err, "could not save rollout");
                }
            }
        }
    }
    0
}
