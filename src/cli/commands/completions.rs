//! Shell completions.

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::generate;

use crate::cli::{Cli, Shell};
use crate::error::Result;

impl From<&Shell> for clap_complete::Shell {
    fn from(shell: &Shell) -> Self {
        match shell {
            Shell::Bash => Self::Bash,
            Shell::Zsh => Self::Zsh,
            Shell::Fish => Self::Fish,
            Shell::PowerShell => Self::PowerShell,
            Shell::Elvish => Self::Elvish,
        }
    }
}

/// Generate completions for `shell` on stdout.
///
/// # Errors
///
/// Returns an error if stdout cannot be flushed.
pub fn execute(shell: &Shell) -> Result<()> {
    let mut stdout = io::stdout().lock();
    write_completions(shell, &mut stdout);
    stdout.flush()?;
    Ok(())
}

fn write_completions(shell: &Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(clap_complete::Shell::from(shell), &mut cmd, name, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bash_completions_mention_subcommands() {
        let mut out = Vec::new();
        write_completions(&Shell::Bash, &mut out);

        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("dsnap"));
        assert!(script.contains("snapshot"));
    }
}
