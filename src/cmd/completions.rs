//! Completions command implementation
//!
//! Handles the `circleci-weigh-in completions` command which generates
//! shell completion scripts for bash, zsh, fish, etc.

use clap::Command;
use clap_complete::{generate, Shell};
use std::io::Write;

/// Generate shell completion scripts
///
/// Writes the completion script for `shell` to stdout. The binary hands in
/// its own command definition so completions stay in sync with the flags.
///
/// # Examples
///
/// ```bash
/// # Bash
/// circleci-weigh-in completions bash > /etc/bash_completion.d/circleci-weigh-in
///
/// # Zsh
/// circleci-weigh-in completions zsh > ~/.zfunc/_circleci-weigh-in
/// ```
pub fn cmd_completions(shell: Shell, cmd: &mut Command) {
    write_completions(shell, cmd, &mut std::io::stdout());
}

/// Generate the completion script of `cmd` into `out`
pub fn write_completions(shell: Shell, cmd: &mut Command, out: &mut dyn Write) {
    let bin_name = cmd.get_name().to_string();
    generate(shell, cmd, bin_name, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Arg;

    fn command() -> Command {
        Command::new("circleci-weigh-in")
            .subcommand(
                Command::new("run").arg(Arg::new("manifest").long("manifest")),
            )
            .subcommand(Command::new("compare"))
    }

    #[test]
    fn test_bash_completions_mention_subcommands() {
        let mut out = Vec::new();
        write_completions(Shell::Bash, &mut command(), &mut out);

        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("circleci-weigh-in"));
        assert!(script.contains("--manifest"));
        assert!(script.contains("compare"));
    }

    #[test]
    fn test_all_major_shells_generate_output() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell] {
            let mut out = Vec::new();
            write_completions(shell, &mut command(), &mut out);
            assert!(!out.is_empty(), "{shell} produced no completions");
        }
    }
}
