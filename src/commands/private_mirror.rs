//! # Private Mirror Command Implementation
//!
//! This module implements the `private-mirror` subcommand, which creates a
//! private copy of a public repository and sets up its scheduled sync.
//!
//! Progress is shown with a spinner on a terminal and as plain lines
//! otherwise. When a step fails after the repository was created, the
//! completed steps are listed and the repository is left in place.

use std::time::Duration;

use anyhow::Result;
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use cli_git::git::SystemGit;
use cli_git::hosting::{GhCli, Visibility};
use cli_git::output::emoji;
use cli_git::provision::{MirrorProvisioner, MirrorRequest, ProvisionStep};
use cli_git::suggestions;

use super::Context;

/// Visibility of the new mirror
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum VisibilityArg {
    #[default]
    Private,
    Internal,
    Public,
}

impl From<VisibilityArg> for Visibility {
    fn from(value: VisibilityArg) -> Self {
        match value {
            VisibilityArg::Private => Visibility::Private,
            VisibilityArg::Internal => Visibility::Internal,
            VisibilityArg::Public => Visibility::Public,
        }
    }
}

/// Create a private mirror of a public repository
#[derive(Args, Debug)]
pub struct PrivateMirrorArgs {
    /// URL of the upstream repository (https://github.com/owner/repo)
    #[arg(value_name = "UPSTREAM_URL")]
    pub upstream: String,

    /// Name of the mirror [default: <prefix><upstream name>]
    #[arg(long, value_name = "NAME")]
    pub repo: Option<String>,

    /// Organization to create the mirror in [default: settings, else your account]
    #[arg(long, value_name = "ORG")]
    pub org: Option<String>,

    /// Prefix for the mirror name [default: settings, else "mirror-"]
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Cron schedule of the sync workflow [default: settings, else "0 0 * * *"]
    #[arg(long, value_name = "CRON")]
    pub schedule: Option<String>,

    /// Visibility of the new repository
    #[arg(long, value_enum, default_value_t = VisibilityArg::Private)]
    pub visibility: VisibilityArg,

    /// Do not add the sync workflow or its secrets
    #[arg(long)]
    pub no_sync: bool,
}

/// Execute the `private-mirror` command.
pub fn execute(args: PrivateMirrorArgs, context: &Context) -> Result<()> {
    let settings = context.load_settings()?;
    let hosting = GhCli::new();
    let git = SystemGit;
    let cache = context.mirror_cache();

    let request = MirrorRequest {
        upstream_url: args.upstream.clone(),
        name: args.repo,
        org: args.org.or_else(|| settings.default_org().map(str::to_string)),
        prefix: args.prefix,
        schedule: args.schedule,
        visibility: args.visibility.into(),
        skip_sync: args.no_sync,
    };

    println!(
        "{} Creating private mirror of {}",
        emoji(&context.output, "🪞", "[MIRROR]"),
        context.output.bold(&args.upstream)
    );

    let spinner = spinner(context);
    let record = MirrorProvisioner::new(&hosting, &git, &cache, &settings)
        .with_progress(|step: ProvisionStep| match &spinner {
            Some(bar) => bar.set_message(format!("{}...", step)),
            None => println!("  - {}", step),
        })
        .create_mirror(&request);
    if let Some(bar) = &spinner {
        bar.finish_and_clear();
    }
    let record = record.map_err(suggestions::explain)?;

    let out = &context.output;
    println!(
        "{} Created {} ({})",
        emoji(out, "✅", "[OK]"),
        out.bold(&record.full_name),
        record.mirror_url
    );
    if record.has_sync {
        println!(
            "{} Sync workflow runs on '{}'",
            emoji(out, "🔄", "[SYNC]"),
            record.schedule
        );
        println!(
            "{} Trigger a first sync with `gh workflow run mirror-sync.yml -R {}`",
            emoji(out, "💡", "[TIP]"),
            record.full_name
        );
    } else {
        println!(
            "{} No sync workflow was added; {} will not follow upstream on its own",
            emoji(out, "💡", "[TIP]"),
            record.full_name
        );
    }
    Ok(())
}

fn spinner(context: &Context) -> Option<ProgressBar> {
    if !context.output.use_color || !console::Term::stdout().is_term() {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.enable_steady_tick(Duration::from_millis(100));
    Some(bar)
}
