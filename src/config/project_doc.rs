//! Project doc discovery (`AGENTS.md`, `codex.md`, ...).
//!
//! The nearest doc between the working directory and the enclosing git root
//! wins. Docs larger than the inline cap are truncated.

use std::path::{Path, PathBuf};

use super::defaults::{PROJECT_DOC_FILENAMES, PROJECT_DOC_MAX_BYTES};
use super::ProjectDocMode;

/// A project doc that was found and read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDoc {
    pub path: PathBuf,
    pub text: String,
    /// True when the file exceeded the inline cap.
    pub truncated: bool,
}

/// Resolve and read the project doc for `cwd` under `mode`.
///
/// Missing or unreadable files are not errors; they yield `None`.
pub fn load_project_doc(cwd: &Path, mode: &ProjectDocMode) -> Option<ProjectDoc> {
    let path = match mode {
        ProjectDocMode::Disabled => return None,
        ProjectDocMode::Path(path) => {
            if path.is_absolute() {
                path.clone()
            } else {
                cwd.join(path)
            }
        }
        ProjectDocMode::Auto => discover_project_doc(cwd)?,
    };
    read_capped(&path)
}

/// Walk from `cwd` up to the git root returning the first doc found.
pub fn discover_project_doc(cwd: &Path) -> Option<PathBuf> {
    for dir in cwd.ancestors() {
        for name in PROJECT_DOC_FILENAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        if dir.join(".git").exists() {
            break;
        }
    }
    None
}

fn read_capped(path: &Path) -> Option<ProjectDoc> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "project doc unreadable");
            return None;
        }
    };
    let truncated = bytes.len() > PROJECT_DOC_MAX_BYTES;
    let slice = if truncated {
        &bytes[..PROJECT_DOC_MAX_BYTES]
    } else {
        &bytes[..]
    };
    if truncated {
        tracing::warn!(
            path = %path.display(),
            limit = PROJECT_DOC_MAX_BYTES,
            "project doc exceeds size limit; truncating"
        );
    }
    Some(ProjectDoc {
        path: path.to_path_buf(),
        text: String::from_utf8_lossy(slice).into_owned(),
        truncated,
    })
}
