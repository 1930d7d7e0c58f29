//! # Completions Command Implementation
//!
//! This module implements the `completions` subcommand, which generates shell
//! completion scripts with `clap_complete`.
//!
//! The bash script also completes the values of `--repo`, `--org`,
//! `--schedule` and `--prefix` by calling `cli-git complete`, so mirror
//! names come from the local caches and the GitHub API.
//!
//! ## Example
//!
//! ```bash
//! cli-git completions bash > ~/.local/share/bash-completion/completions/cli-git
//! cli-git completions zsh > ~/.zfunc/_cli-git
//! ```

use std::io::{self, Write};

use anyhow::Result;
use clap::{Args, CommandFactory, ValueEnum};
use clap_complete::{generate, Shell};

use crate::cli::Cli;

const BIN_NAME: &str = "cli-git";

/// Wraps the generated bash completion with value completion for the
/// options `cli-git complete` knows about.
const BASH_DYNAMIC: &str = r#"
_cli_git_values() {
    local cur prev kind
    cur="${COMP_WORDS[COMP_CWORD]}"
    prev="${COMP_WORDS[COMP_CWORD-1]}"
    case "$prev" in
        --repo) kind=repo ;;
        --org) kind=org ;;
        --schedule) kind=schedule ;;
        --prefix) kind=prefix ;;
        *) _cli-git "$@"; return ;;
    esac
    local IFS=$'\n'
    COMPREPLY=($(cli-git complete "$kind" "$cur" 2>/dev/null | cut -f1))
}
complete -F _cli_git_values -o bashdefault -o default cli-git
"#;

/// Shell types for completion generation
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    /// Bourne Again Shell
    Bash,
    /// Z Shell
    Zsh,
    /// Fish Shell
    Fish,
    /// PowerShell
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish Shell
    Elvish,
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
            CompletionShell::PowerShell => Shell::PowerShell,
            CompletionShell::Elvish => Shell::Elvish,
        }
    }
}

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// The shell to generate completions for
    #[arg(value_enum)]
    pub shell: CompletionShell,
}

/// Execute the `completions` command.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    let script = render(args.shell);
    io::stdout().write_all(&script)?;
    Ok(())
}

fn render(shell: CompletionShell) -> Vec<u8> {
    let mut cmd = Cli::command();
    let mut script = Vec::new();
    generate(Shell::from(shell), &mut cmd, BIN_NAME, &mut script);
    if matches!(shell, CompletionShell::Bash) {
        script.extend_from_slice(BASH_DYNAMIC.as_bytes());
    }
    script
}
