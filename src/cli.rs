//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use cli_git::defaults;
use cli_git::output::OutputConfig;

use crate::commands::{self, Context};

/// cli-git - Create and maintain private mirrors of public GitHub repositories
#[derive(Parser, Debug)]
#[command(name = "cli-git")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,

    /// Directory holding settings.toml and the caches [default: ~/.cli-git]
    #[arg(long, global = true, value_name = "DIR", env = "CLI_GIT_HOME")]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record your GitHub account and default preferences
    Init(commands::init::InitArgs),

    /// Create a private mirror of a public repository
    PrivateMirror(commands::private_mirror::PrivateMirrorArgs),

    /// Refresh the sync workflow and secrets of existing mirrors
    UpdateMirrors(commands::update_mirrors::UpdateMirrorsArgs),

    /// Print completion candidates for shell completion scripts
    #[command(hide = true)]
    Complete(commands::complete::CompleteArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),

    /// Inspect or clear the local caches
    Cache(commands::cache::CacheArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let context = Context {
            config_dir: self
                .config_dir
                .unwrap_or_else(defaults::default_config_dir),
            output: OutputConfig::from_env_and_flag(&self.color),
        };
        log::debug!("using config dir {}", context.config_dir.display());

        match self.command {
            Commands::Init(args) => commands::init::execute(args, &context),
            Commands::PrivateMirror(args) => commands::private_mirror::execute(args, &context),
            Commands::UpdateMirrors(args) => commands::update_mirrors::execute(args, &context),
            Commands::Complete(args) => commands::complete::execute(args, &context),
            Commands::Completions(args) => commands::completions::execute(args),
            Commands::Cache(args) => commands::cache::execute(args, &context),
        }
    }
}

/// `RUST_LOG` wins over `--log-level` when set.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
