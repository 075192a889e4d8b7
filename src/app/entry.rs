//! Application entry orchestration for the codex CLI.
//!
//! Exactly one branch runs per invocation, picked by [`select_branch`] in a
//! fixed precedence order. Every branch returns the process exit code.

use crate::app::completion::write_completion;
use crate::app::history::{browse_history, HistoryChoice};
use crate::app::interactive::{run_interactive, InteractiveSetup};
use crate::app::signals;
use crate::app::viewer::view_rollout_file;
use crate::cli::Args;
use chrono::Utc;
use codex::agent::{AgentOptions, ResponsesAgent};
use codex::approval::{resolve_approval_policy, ApprovalPolicy};
use codex::auth::{
    default_auth_path, load_credentials, redeem_free_credits, resolve_api_key, AuthRequest,
    AuthSource,
};
use codex::build_info::{cli_version_text, VERSION};
use codex::config::{
    codex_home, default_config_path, default_log_dir, default_sessions_dir, ensure_default_config,
    load_config, EffectiveConfig,
};
use codex::editor::open_in_editor;
use codex::error::AgentError;
use codex::full_context::{collect_project_context, run_full_context};
use codex::items::ResponseItem;
use codex::logging::init_file_logging;
use codex::native::{native_requested, run_native};
use codex::quiet::{run_quiet, QuietRequest};
use codex::rollout::{load_rollout, resolve_rollout_path, save_rollout, Rollout};
use codex::tui::{self, HeaderInfo, ReadOutcome, RenderOptions};
use codex::update_check::{check_for_update, STATE_FILE_NAME};
use std::ffi::OsString;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

/// Env var that forces plain, progress-free output.
const QUIET_MODE_ENV: &str = "CODEX_QUIET_MODE";

/// The mutually exclusive dispatch branches, in precedence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Branch {
    Version,
    Completion(String),
    EditConfig,
    History,
    View(PathBuf),
    FullContext,
    Quiet,
    Interactive,
}

/// Pick the branch for `args`.
pub(crate) fn select_branch(args: &Args) -> Branch {
    if args.version {
        return Branch::Version;
    }
    if let Some(shell) = args.completion_shell() {
        return Branch::Completion(shell.to_string());
    }
    if args.config {
        return Branch::EditConfig;
    }
    if args.history {
        return Branch::History;
    }
    if let Some(path) = &args.view {
        return Branch::View(path.clone());
    }
    if args.full_context {
        return Branch::FullContext;
    }
    if args.quiet {
        return Branch::Quiet;
    }
    Branch::Interactive
}

/// Branches that only read saved sessions and can run on default config.
fn tolerates_config_errors(branch: &Branch) -> bool {
    matches!(branch, Branch::View(_) | Branch::History)
}

/// Defaults plus the display flags given on the command line.
fn viewing_config(args: &Args) -> EffectiveConfig {
    EffectiveConfig {
        full_stdout: args.full_stdout,
        ..EffectiveConfig::default()
    }
}

fn quiet_env_enabled(env_lookup: impl Fn(&str) -> Option<String>) -> bool {
    env_lookup(QUIET_MODE_ENV).as_deref() == Some("1")
}

/// Top-level CLI entrypoint.
pub(crate) async fn run(args: Args) -> i32 {
    let branch = select_branch(&args);
    match &branch {
        Branch::Version => {
            println!("{}", cli_version_text());
            return 0;
        }
        // Completion output must stay clean for `source <(codex completion bash)`.
        Branch::Completion(shell) => {
            return match write_completion(shell, &mut io::stdout()) {
                Ok(()) => 0,
                Err(msg) => {
                    eprintln!("{msg}");
                    1
                }
            };
        }
        _ => {}
    }

    if let Some(dir) = default_log_dir() {
        init_file_logging(&dir);
    }
    signals::spawn_signal_listener();
    tracing::info!(?branch, "dispatching");

    let quiet_env = quiet_env_enabled(|name| std::env::var(name).ok());
    let color = !quiet_env && io::stdout().is_terminal();
    if quiet_env || branch == Branch::Quiet {
        tui::set_progress_enabled(false);
    }

    if branch == Branch::EditConfig {
        return edit_config().await;
    }

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(err) => {
            eprintln!("error: {err}");
            return 1;
        }
    };
    let mut config_error = None;
    let config = match load_config(&args.config_overrides(), &cwd) {
        Ok(loaded) => {
            for warning in &loaded.warnings {
                eprintln!("warning: {warning}");
            }
            loaded.config
        }
        Err(err) if tolerates_config_errors(&branch) => {
            tracing::warn!(%err, "config unusable, viewing with defaults");
            eprintln!("warning: {err}");
            config_error = Some(err.to_string());
            viewing_config(&args)
        }
        Err(err) => {
            eprintln!("error: {err}");
            return 1;
        }
    };
    let render_options = RenderOptions {
        color,
        full_stdout: config.full_stdout,
    };

    let mut resume_path = None;
    match &branch {
        Branch::History => {
            let Some(dir) = default_sessions_dir() else {
                eprintln!("error: unable to resolve home directory for sessions");
                return 1;
            };
            match browse_history(color, &dir, config.history.max_size) {
                Ok(HistoryChoice::View(path)) => return view(&path, &cwd, render_options),
                Ok(HistoryChoice::Resume(path)) => resume_path = Some(path),
                Ok(HistoryChoice::Cancel) => return 0,
                Ok(HistoryChoice::Interrupted) => signals::shutdown(),
                Err(err) => {
                    eprintln!("error: {err}");
                    return 1;
                }
            }
        }
        Branch::View(path) => return view(path, &cwd, render_options),
        _ => {}
    }
    // Resuming a session needs the real config.
    if let Some(err) = config_error {
        eprintln!("error: {err}");
        return 1;
    }

    if native_requested(|name| std::env::var(name).ok()) {
        let forwarded: Vec<OsString> = std::env::args_os().skip(1).collect();
        return match run_native(&forwarded).await {
            Ok(code) => code,
            Err(err) => {
                eprintln!("{err}");
                1
            }
        };
    }

    if branch == Branch::Quiet && args.prompt().is_none() {
        eprintln!("{}", AgentError::EmptyPrompt);
        return 1;
    }

    let interactive = matches!(branch, Branch::Interactive | Branch::History);
    if interactive && io::stderr().is_terminal() {
        notify_if_outdated().await;
    }

    let config = match resolve_credentials(&args, config).await {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("{msg}");
            return 1;
        }
    };
    let policy = resolve_approval_policy(&args.approval_flags(), config.approval_mode);
    tracing::info!(mode = %policy.mode, everything = policy.auto_approve_everything, "approval policy");

    let agent = match ResponsesAgent::new(AgentOptions {
        config: config.clone(),
        policy,
        writable_roots: args.writable_roots.clone(),
        cwd: cwd.clone(),
    }) {
        Ok(agent) => agent,
        Err(err) => {
            eprintln!("error: {err}");
            return 1;
        }
    };

    match branch {
        Branch::FullContext => full_context_mode(agent.without_tools(), &args, &cwd, color).await,
        Branch::Quiet => quiet_mode(&agent, &args, policy, &config).await,
        _ => {
            let (resumed, initial_prompt) =
                match resume_path.as_deref().map(|path| load_resumed(path, &cwd)) {
                    Some(Ok((items, directive))) => (items, Some(directive)),
                    Some(Err(msg)) => {
                        eprintln!("{msg}");
                        return 1;
                    }
                    None => (Vec::new(), args.prompt()),
                };
            let setup = InteractiveSetup {
                header: HeaderInfo {
                    version: VERSION.to_string(),
                    model: config.model.clone(),
                    provider: config.provider.clone(),
                    approval_mode: policy.mode,
                    cwd: cwd.clone(),
                    session_id: None,
                },
                policy,
                color,
                initial_prompt,
                images: args.images.clone(),
                resumed,
                sessions_dir: default_sessions_dir(),
                config,
            };
            run_interactive(&agent, setup).await
        }
    }
}

/// `--config`: make sure the file exists, then hand it to the editor.
async fn edit_config() -> i32 {
    if let Err(err) = ensure_default_config() {
        tracing::debug!(%err, "could not create config file");
    }
    let Some(path) = default_config_path() else {
        eprintln!("error: unable to resolve home directory for config.toml");
        return 1;
    };
    match open_in_editor(&path).await {
        Ok(status) => {
            tracing::debug!(%status, "editor exited");
            0
        }
        Err(err) => {
            eprintln!("error: failed to launch editor: {err}");
            1
        }
    }
}

fn view(path: &Path, cwd: &Path, options: RenderOptions) -> i32 {
    match view_rollout_file(path, cwd, options) {
        Ok(()) => 0,
        Err(msg) => {
            eprintln!("{msg}");
            1
        }
    }
}

/// Items of the session being resumed plus the directive that opens the
/// next turn.
fn load_resumed(path: &Path, cwd: &Path) -> Result<(Vec<ResponseItem>, String), String> {
    let path = resolve_rollout_path(path, cwd);
    let rollout =
        load_rollout(&path).map_err(|err| format!("Error reading rollout file: {err}"))?;
    Ok((rollout.items, resume_directive(&path)))
}

fn resume_directive(path: &Path) -> String {
    format!("Resume this session: {}", path.display())
}

async fn notify_if_outdated() {
    let Some(home) = codex_home() else {
        return;
    };
    if let Some(notice) = check_for_update(&home.join(STATE_FILE_NAME), VERSION, Utc::now()).await
    {
        eprintln!("{}", notice.message());
    }
}

/// Resolve the API key and thread it into the config.
async fn resolve_credentials(
    args: &Args,
    config: EffectiveConfig,
) -> Result<EffectiveConfig, String> {
    let request = AuthRequest {
        provider: &config.provider,
        providers: &config.providers,
        force_login: args.login,
        redeem_credits: args.free,
        interactive: !args.quiet && io::stdin().is_terminal(),
    };
    let resolved = resolve_api_key(&request).await.map_err(|err| err.to_string())?;
    tracing::info!(source = ?resolved.source, provider = %config.provider, "credentials resolved");
    if args.free && resolved.source == AuthSource::Cache {
        redeem_with_cached_login().await;
    }
    Ok(config.with_api_key(resolved.api_key))
}

/// `--free` without a fresh login: redeem with the cached id token.
async fn redeem_with_cached_login() {
    let id_token = default_auth_path()
        .and_then(|path| load_credentials(&path).ok().flatten())
        .and_then(|record| record.tokens)
        .map(|tokens| tokens.id_token);
    let Some(id_token) = id_token else {
        eprintln!("No cached ChatGPT login found; run with --login --free to redeem credits.");
        return;
    };
    match redeem_free_credits(&id_token).await {
        Ok(message) => eprintln!("{message}"),
        Err(err) => eprintln!("Unable to redeem ChatGPT subscriber API credits: {err}"),
    }
}

async fn quiet_mode(
    agent: &ResponsesAgent,
    args: &Args,
    policy: ApprovalPolicy,
    config: &EffectiveConfig,
) -> i32 {
    let request = QuietRequest {
        prompt: args.prompt().unwrap_or_default(),
        images: args.images.clone(),
        policy,
    };
    match run_quiet(agent, &request, &mut io::stdout()).await {
        Ok(transcript) => {
            save_transcript(config, transcript);
            0
        }
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

async fn full_context_mode(agent: ResponsesAgent, args: &Args, cwd: &Path, color: bool) -> i32 {
    let request = match args.prompt() {
        Some(prompt) => prompt,
        None => match tui::read_prompt_line(color, &[]) {
            Ok(ReadOutcome::Line(line)) => line,
            Ok(ReadOutcome::Eof) => return 0,
            Ok(ReadOutcome::Interrupted) => signals::shutdown(),
            Err(err) => {
                eprintln!("error: {err}");
                return 1;
            }
        },
    };
    let context = match collect_project_context(cwd) {
        Ok(context) => context,
        Err(err) => {
            eprintln!("error: {err}");
            return 1;
        }
    };
    if context.truncated {
        eprintln!("warning: project exceeds the context budget; some files were left out");
    }
    match run_full_context(&agent, &request, cwd, &context, &mut io::stdout()).await {
        Ok(_) => 0,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

/// Best-effort rollout save.
fn save_transcript(config: &EffectiveConfig, items: Vec<ResponseItem>) {
    if !config.history.save_history {
        return;
    }
    let Some(dir) = default_sessions_dir() else {
        return;
    };
    let rollout = Rollout::new(Some(config.instructions.clone()), items);
    if let Err(err) = save_rollout(&dir, &rollout) {
        tracing::debug!(%err, "could not save rollout");
    }
}
