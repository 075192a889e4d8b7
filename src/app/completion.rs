//! `codex completion <shell>`.

use crate::cli::Args;
use clap::CommandFactory;
use clap_complete::{generate, shells};
use std::io::{self, Write};

/// Write the completion script for `shell`.
///
/// Unknown shells produce `Unsupported shell: <name>`.
pub(crate) fn write_completion<W: Write>(shell: &str, writer: &mut W) -> Result<(), String> {
    let mut cmd = Args::command();
    let bin_name = cmd.get_name().to_string();
    match shell {
        "bash" => generate(shells::Bash, &mut cmd, bin_name, writer),
        "zsh" => generate(shells::Zsh, &mut cmd, bin_name, writer),
        "fish" => generate(shells::Fish, &mut cmd, bin_name, writer),
        other => return Err(format!("Unsupported shell: {other}")),
    }
    writer.flush().map_err(|err: io::Error| err.to_string())
}
