//! Local command execution for approved shell calls.

use serde_json::json;
use std::path::Path;
use std::time::{Duration, Instant};

/// Captured result of one command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl CommandOutput {
    /// Encode as the `{output, metadata}` string sent back to the model.
    pub fn to_function_output(&self) -> String {
        let mut output = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !output.is_empty() && !output.ends_with('\n') {
                output.push('\n');
            }
            output.push_str(&self.stderr);
        }
        json!({
            "output": output,
            "metadata": {
                "exit_code": self.exit_code,
                "duration_seconds": (self.duration.as_secs_f64() * 10.0).round() / 10.0,
            }
        })
        .to_string()
    }
}

/// Run `argv` in `cwd`, killing it after `timeout`.
///
/// Spawn failures and timeouts are reported as a non-zero exit code with the
/// reason on stderr so the model can react to them.
pub async fn run_command(argv: &[String], cwd: &Path, timeout: Duration) -> CommandOutput {
    let started = Instant::now();
    let Some((program, args)) = argv.split_first() else {
        return CommandOutput {
            stdout: String::new(),
            stderr: "empty command".to_string(),
            exit_code: 1,
            duration: started.elapsed(),
        };
    };

    let child = tokio::process::Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(std::process::Stdio::null())
        .kill_on_drop(true)
        .output();

    let result = tokio::time::timeout(timeout, child).await;
    let duration = started.elapsed();
    match result {
        Ok(Ok(output)) => CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
            duration,
        },
        Ok(Err(err)) => {
            tracing::debug!(%program, %err, "command failed to start");
            CommandOutput {
                stdout: String::new(),
                stderr: format!("failed to run `{program}`: {err}"),
                exit_code: 127,
                duration,
            }
        }
        Err(_) => CommandOutput {
            stdout: String::new(),
            stderr: format!("command timed out after {}s", timeout.as_secs()),
            exit_code: 124,
            duration,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_output_merges_streams_and_rounds_duration() {
        let output = CommandOutput {
            stdout: "out".into(),
            stderr: "err\n".into(),
            exit_code: 2,
            duration: Duration::from_millis(1234),
        };
        let value: serde_json::Value =
            serde_json::from_str(&output.to_function_output()).expect("json");
        assert_eq!(value["output"], "out\nerr\n");
        assert_eq!(value["metadata"]["exit_code"], 2);
        assert_eq!(value["metadata"]["duration_seconds"], 1.2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_commands_in_cwd() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("marker.txt"), "").expect("write");
        let output = run_command(
            &["ls".to_string()],
            dir.path(),
            Duration::from_secs(10),
        )
        .await;
        assert_eq!(output.exit_code, 0);
        assert!(output.stdout.contains("marker.txt"));
    }

    #[tokio::test]
    async fn missing_program_reports_127() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = run_command(
            &["definitely-not-a-real-program-xyz".to_string()],
            dir.path(),
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(output.exit_code, 127);
        assert!(output.stderr.contains("failed to run"));
    }

    #[tokio::test]
    async fn empty_argv_is_rejected() {
        let output = run_command(&[], Path::new("."), Duration::from_secs(1)).await;
        assert_eq!(output.exit_code, 1);
    }
}
