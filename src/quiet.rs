//! Quiet mode: one non-interactive agent cycle printed as plain text.

use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;

use crate::agent::{AgentHooks, AgentLoop};
use crate::approval::{ApprovalPolicy, ReviewDecision};
use crate::error::AgentError;
use crate::format::format_response_item;
use crate::items::{create_input_item, ResponseItem};

/// Inputs for one quiet run.
#[derive(Debug, Clone)]
pub struct QuietRequest {
    pub prompt: String,
    pub images: Vec<PathBuf>,
    pub policy: ApprovalPolicy,
}

/// Hooks that stream formatted items to a writer.
///
/// Commands run only under full-auto; everything else is declined and the
/// run stops.
struct QuietHooks<'a, W> {
    out: &'a mut W,
    policy: ApprovalPolicy,
}

#[async_trait]
impl<W: Write + Send> AgentHooks for QuietHooks<'_, W> {
    fn on_item(&mut self, item: &ResponseItem) {
        let text = format_response_item(item);
        let mut written = writeln!(self.out, "{text}");
        if written.is_ok() {
            written = self.out.flush();
        }
        if let Err(err) = written {
            tracing::debug!(%err, "quiet output write failed");
        }
    }

    async fn confirm_command(&mut self, command: &[String]) -> ReviewDecision {
        if self.policy.is_full_auto() {
            ReviewDecision::Yes
        } else {
            tracing::info!(?command, "declining command outside full-auto");
            ReviewDecision::NoExit
        }
    }
}

/// Run one cycle, writing each item to `out` as it arrives.
///
/// Returns the full transcript (input plus produced items). A blank prompt is
/// rejected before the agent is invoked.
pub async fn run_quiet<A, W>(
    agent: &A,
    request: &QuietRequest,
    out: &mut W,
) -> Result<Vec<ResponseItem>, AgentError>
where
    A: AgentLoop + ?Sized,
    W: Write + Send,
{
    if request.prompt.trim().is_empty() {
        return Err(AgentError::EmptyPrompt);
    }
    let input = create_input_item(&request.prompt, &request.images)?;
    let mut hooks = QuietHooks {
        out,
        policy: request.policy,
    };
    let produced = agent.run(vec![input.clone()], &mut hooks).await?;

    let mut transcript = Vec::with_capacity(produced.len() + 1);
    transcript.push(input);
    transcript.extend(produced);
    Ok(transcript)
}
