//! Hand-off to a platform-specific native executable (`CODEX_RUST=1`).
//!
//! The binary is named `codex-<target-triple>` and is looked up next to the
//! running executable first, then on `PATH`.

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Opt-in switch.
pub const CODEX_RUST_ENV: &str = "CODEX_RUST";

/// Errors from the native hand-off.
#[derive(Debug)]
pub enum NativeError {
    /// No native build exists for this OS/arch pair.
    UnsupportedPlatform { os: String, arch: String },
    /// No executable with this name was found.
    NotFound(String),
    Io(io::Error),
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedPlatform { os, arch } => {
                write!(f, "Unsupported platform: {os} ({arch})")
            }
            Self::NotFound(name) => write!(f, "Native executable not found: {name}"),
            Self::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for NativeError {}

impl From<io::Error> for NativeError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Whether the hand-off was requested.
pub fn native_requested(env_lookup: impl Fn(&str) -> Option<String>) -> bool {
    env_lookup(CODEX_RUST_ENV).as_deref() == Some("1")
}

/// Target triple of the native build for `os`/`arch`.
pub fn target_triple(os: &str, arch: &str) -> Result<&'static str, NativeError> {
    let triple = match (os, arch) {
        ("linux" | "android", "x86_64") => "x86_64-unknown-linux-musl",
        ("linux" | "android", "aarch64") => "aarch64-unknown-linux-musl",
        ("macos", "x86_64") => "x86_64-apple-darwin",
        ("macos", "aarch64") => "aarch64-apple-darwin",
        ("windows", "x86_64") => "x86_64-pc-windows-msvc",
        ("windows", "aarch64") => "aarch64-pc-windows-msvc",
        _ => {
            return Err(NativeError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            })
        }
    };
    Ok(triple)
}

/// File name of the native executable for `triple`.
pub fn native_binary_name(triple: &str) -> String {
    if triple.contains("windows") {
        format!("codex-{triple}.exe")
    } else {
        format!("codex-{triple}")
    }
}

/// Look for `name` in `exe_dir`, then in each `PATH` entry.
pub fn locate_native_binary(
    name: &str,
    exe_dir: Option<&Path>,
    path_var: Option<OsString>,
) -> Option<PathBuf> {
    let path_dirs = path_var
        .map(|value| std::env::split_paths(&value).collect::<Vec<_>>())
        .unwrap_or_default();
    exe_dir
        .map(Path::to_path_buf)
        .into_iter()
        .chain(path_dirs)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Run the native executable with `args` and return its exit code.
pub async fn run_native(args: &[OsString]) -> Result<i32, NativeError> {
    let triple = target_triple(std::env::consts::OS, std::env::consts::ARCH)?;
    let name = native_binary_name(triple);
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let binary = locate_native_binary(&name, exe_dir.as_deref(), std::env::var_os("PATH"))
        .ok_or_else(|| NativeError::NotFound(name.clone()))?;

    tracing::info!(binary = %binary.display(), "handing off to native executable");
    let status = tokio::process::Command::new(&binary)
        .args(args)
        .status()
        .await?;
    Ok(status.code().unwrap_or(1))
}
