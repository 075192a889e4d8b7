//! Full-context mode: load the project's text files into one prompt and run
//! a single tool-less pass.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::agent::AgentLoop;
use crate::approval::{ApprovalMode, ApprovalPolicy};
use crate::error::AgentError;
use crate::items::ResponseItem;
use crate::quiet::{run_quiet, QuietRequest};

/// Largest single file included.
pub const MAX_FILE_BYTES: u64 = 64 * 1024;
/// Budget for all included files together.
pub const MAX_TOTAL_BYTES: u64 = 2 * 1024 * 1024;

const SKIPPED_DIRS: [&str; 2] = ["target", "node_modules"];
const BINARY_SNIFF_BYTES: usize = 8 * 1024;

/// One included file, path relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Files gathered from a project root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectContext {
    pub files: Vec<ContextFile>,
    /// Files left out for size or content.
    pub skipped: usize,
    /// The total budget ran out before the walk finished.
    pub truncated: bool,
}

impl ProjectContext {
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|file| file.contents.len() as u64).sum()
    }

    /// All files as one document, each under its own heading.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for file in &self.files {
            out.push_str(&format!("## {}\n```\n", file.path.display()));
            out.push_str(&file.contents);
            if !file.contents.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n\n");
        }
        out
    }
}

fn skip_dir(name: &str) -> bool {
    name.starts_with('.') || SKIPPED_DIRS.contains(&name)
}

/// Read `path` as text, or `None` for binary or non-UTF-8 content.
fn read_text_file(path: &Path) -> io::Result<Option<String>> {
    let mut bytes = Vec::new();
    fs::File::open(path)?.read_to_end(&mut bytes)?;
    if bytes.iter().take(BINARY_SNIFF_BYTES).any(|byte| *byte == 0) {
        return Ok(None);
    }
    Ok(String::from_utf8(bytes).ok())
}

/// Walk `root` depth-first in name order and collect text files.
pub fn collect_project_context(root: &Path) -> io::Result<ProjectContext> {
    let mut context = ProjectContext::default();
    let mut budget = MAX_TOTAL_BYTES;
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let mut entries = fs::read_dir(&dir)?
            .filter_map(Result::ok)
            .collect::<Vec<_>>();
        entries.sort_by_key(|entry| entry.file_name());

        let mut subdirs = Vec::new();
        for entry in entries {
            let name = entry.file_name().to_string_lossy().into_owned();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let path = entry.path();
            if file_type.is_dir() {
                if !skip_dir(&name) {
                    subdirs.push(path);
                }
                continue;
            }
            if !file_type.is_file() || name.starts_with('.') {
                continue;
            }
            let size = entry.metadata().map(|meta| meta.len()).unwrap_or(u64::MAX);
            if size > MAX_FILE_BYTES {
                context.skipped += 1;
                continue;
            }
            if size > budget {
                context.truncated = true;
                return Ok(context);
            }
            match read_text_file(&path) {
                Ok(Some(contents)) => {
                    if !take_budget(&mut budget, contents.len() as u64) {
                        context.truncated = true;
                        return Ok(context);
                    }
                    let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
                    context.files.push(ContextFile {
                        path: relative,
                        contents,
                    });
                }
                Ok(None) => context.skipped += 1,
                Err(err) => {
                    tracing::debug!(path = %path.display(), %err, "skipping unreadable file");
                    context.skipped += 1;
                }
            }
        }
        stack.extend(subdirs.into_iter().rev());
    }
    Ok(context)
}

/// The single user message sent in full-context mode.
pub fn full_context_prompt(request: &str, root: &Path, context: &ProjectContext) -> String {
    format!(
        "Below are the contents of the project at {}.\n\n{}# Task\n\n{}",
        root.display(),
        context.render(),
        request.trim()
    )
}

/// Charge `len` bytes against `budget`; `false` leaves it untouched when the
/// bytes do not fit. The size seen by the read can exceed the earlier
/// metadata check if the file grew.
fn take_budget(budget: &mut u64, len: u64) -> bool {
    match budget.checked_sub(len) {
        Some(left) => {
            *budget = left;
            true
        }
        None => false,
    }
}

/// Run one pass with the whole project as context, printing items to `out`.
pub async fn run_full_context<A, W>(
    agent: &A,
    request: &str,
    root: &Path,
    context: &ProjectContext,
    out: &mut W,
) -> Result<Vec<ResponseItem>, AgentError>
where
    A: AgentLoop + ?Sized,
    W: Write + Send,
{
    if request.trim().is_empty() {
        return Err(AgentError::EmptyPrompt);
    }
    tracing::info!(
        files = context.files.len(),
        bytes = context.total_bytes(),
        truncated = context.truncated,
        "running full-context pass"
    );
    let quiet = QuietRequest {
        prompt: full_context_prompt(request, root, context),
        images: Vec::new(),
        policy: ApprovalPolicy {
            mode: ApprovalMode::Suggest,
            auto_approve_everything: false,
        },
    };
    run_quiet(agent, &quiet, out).await
}
