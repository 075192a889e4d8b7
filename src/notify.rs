//! Desktop notifications after a completed turn. Best-effort only.

/// Command that shows a notification on this platform, if one is known.
pub fn notification_command(title: &str, body: &str) -> Option<(String, Vec<String>)> {
    if cfg!(target_os = "macos") {
        let script = format!(
            "display notification \"{}\" with title \"{}\"",
            applescript_escape(body),
            applescript_escape(title)
        );
        Some(("osascript".to_string(), vec!["-e".to_string(), script]))
    } else if cfg!(target_os = "linux") {
        Some((
            "notify-send".to_string(),
            vec![title.to_string(), body.to_string()],
        ))
    } else {
        None
    }
}

fn applescript_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Notification body for an assistant reply: the first non-blank line,
/// clipped.
pub fn notification_body(reply: &str) -> String {
    let line = reply.lines().find(|line| !line.trim().is_empty()).unwrap_or("Done");
    crate::tui::text::truncate_single_line(line.trim(), 120)
}

/// Show a notification; failures are logged and otherwise ignored.
pub async fn send_notification(title: &str, body: &str) {
    let Some((program, args)) = notification_command(title, body) else {
        tracing::debug!("no notification command for this platform");
        return;
    };
    let status = tokio::process::Command::new(&program)
        .args(&args)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await;
    match status {
        Ok(status) if status.success() => {}
        Ok(status) => tracing::debug!(%program, %status, "notification command failed"),
        Err(err) => tracing::debug!(%program, %err, "notification command did not start"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_uses_first_non_blank_line() {
        assert_eq!(notification_body("\n\n  Fixed it.\nDetails"), "Fixed it.");
        assert_eq!(notification_body(""), "Done");
    }

    #[test]
    fn escapes_quotes_for_applescript() {
        assert_eq!(applescript_escape(r#"say "hi" \ bye"#), r#"say \"hi\" \\ bye"#);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_uses_notify_send() {
        let (program, args) = notification_command("Codex", "done").expect("command");
        assert_eq!(program, "notify-send");
        assert_eq!(args, vec!["Codex".to_string(), "done".to_string()]);
    }
}
