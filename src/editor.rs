//! Opening files in the user's editor.

use std::io;
use std::path::Path;
use std::process::ExitStatus;

/// Editor used when `$EDITOR` is unset or blank.
#[cfg(windows)]
pub const PLATFORM_EDITOR: &str = "notepad";
#[cfg(not(windows))]
pub const PLATFORM_EDITOR: &str = "vi";

/// Program and leading arguments for the editor.
///
/// `$EDITOR` may carry flags (`code --wait`), so it is split on whitespace.
pub fn editor_command(env_lookup: impl Fn(&str) -> Option<String>) -> (String, Vec<String>) {
    let configured = env_lookup("EDITOR").filter(|value| !value.trim().is_empty());
    if let Some(value) = configured {
        let mut parts = value.split_whitespace().map(str::to_string);
        if let Some(program) = parts.next() {
            return (program, parts.collect());
        }
    }
    (PLATFORM_EDITOR.to_string(), Vec::new())
}

/// Open `path` in the editor and wait for it to exit.
pub async fn open_in_editor(path: &Path) -> io::Result<ExitStatus> {
    let (program, args) = editor_command(|key| std::env::var(key).ok());
    tracing::debug!(%program, path = %path.display(), "launching editor");
    tokio::process::Command::new(&program)
        .args(&args)
        .arg(path)
        .status()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_splits_flags_from_program() {
        let (program, args) = editor_command(|_| Some("code --wait".to_string()));
        assert_eq!(program, "code");
        assert_eq!(args, vec!["--wait".to_string()]);
    }

    #[test]
    fn blank_editor_falls_back_to_platform_default() {
        for value in [None, Some("   ".to_string())] {
            let (program, args) = editor_command(|_| value.clone());
            assert_eq!(program, PLATFORM_EDITOR);
            assert!(args.is_empty());
        }
    }
}
