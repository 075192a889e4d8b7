//! Best-effort browser launching for the device login.

/// Platform launcher command and its leading arguments.
fn launcher() -> Option<(&'static str, &'static [&'static str])> {
    if cfg!(target_os = "macos") {
        Some(("open", &[]))
    } else if cfg!(target_os = "windows") {
        Some(("cmd", &["/C", "start", ""]))
    } else if cfg!(unix) {
        Some(("xdg-open", &[]))
    } else {
        None
    }
}

/// Open `url` in the user's browser; `false` when that failed.
pub fn try_open_browser(url: &str) -> bool {
    let Some((program, args)) = launcher() else {
        return false;
    };
    let opened = std::process::Command::new(program)
        .args(args)
        .arg(url)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok_and(|status| status.success());
    tracing::debug!(program, opened, "browser launch");
    opened
}
