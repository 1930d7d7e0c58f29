//! # Update Mirrors Command Implementation
//!
//! This module implements the `update-mirrors` subcommand, which regenerates
//! the sync workflow of existing mirrors and refreshes their secrets.
//!
//! ## Modes
//!
//! - **default**: update every known mirror (scanned, then recent, then a live scan)
//! - **`--repo <owner/name>`**: update a single mirror
//! - **`--scan`**: only list mirrors, one name per line for piping
//!   (`--verbose` for descriptions and upstreams)

use anyhow::Result;
use clap::Args;

use cli_git::hosting::{GhCli, HostingService};
use cli_git::output::emoji;
use cli_git::registry::{RegistryUpdater, UpdateOutcome, UpdateSummary, UpdateTarget};
use cli_git::suggestions;

use super::Context;

/// Refresh the sync workflow and secrets of existing mirrors
#[derive(Args, Debug)]
pub struct UpdateMirrorsArgs {
    /// Update only this mirror (owner/name, or a name under your account)
    #[arg(long, value_name = "REPO", conflicts_with = "scan")]
    pub repo: Option<String>,

    /// List your mirrors instead of updating them
    #[arg(long)]
    pub scan: bool,

    /// With --scan, show upstream and description for each mirror
    #[arg(short, long, requires = "scan")]
    pub verbose: bool,
}

/// Execute the `update-mirrors` command.
pub fn execute(args: UpdateMirrorsArgs, context: &Context) -> Result<()> {
    let hosting = GhCli::new();
    if !hosting.is_authenticated() {
        return Err(suggestions::not_authenticated());
    }
    let settings = context.load_settings()?;
    if settings.username().is_none() {
        return Err(suggestions::not_initialized());
    }
    if settings.github_token().is_none() && !args.scan {
        println!(
            "{} No GitHub token in settings; tag sync may fail without GH_TOKEN",
            emoji(&context.output, "⚠️ ", "[WARN]")
        );
        println!("   Run 'cli-git init --token <token>' to add one");
    }
    let cache = context.mirror_cache();
    let updater = RegistryUpdater::new(&hosting, &cache, &settings);

    if args.scan {
        let mirrors = updater.scan_mirrors()?;
        if args.verbose {
            let out = &context.output;
            println!(
                "{} Found {} mirror(s)",
                emoji(out, "🔍", "[SCAN]"),
                mirrors.len()
            );
            for mirror in &mirrors {
                println!("  {}", out.bold(&mirror.name));
                if !mirror.upstream.is_empty() {
                    println!("    {} {}", out.dim("upstream:"), mirror.upstream);
                }
                if !mirror.description.is_empty() {
                    println!("    {} {}", out.dim("description:"), mirror.description);
                }
            }
        } else {
            for mirror in &mirrors {
                println!("{}", mirror.name);
            }
        }
        return Ok(());
    }

    let target = match args.repo {
        Some(repo) => UpdateTarget::Repo(repo),
        None => UpdateTarget::All,
    };
    let summary = updater.update(&target)?;
    if summary.results.is_empty() {
        return Err(suggestions::no_mirrors_found());
    }

    print_summary(&summary, context);
    if summary.failed() > 0 {
        anyhow::bail!("{} mirror(s) could not be updated", summary.failed());
    }
    Ok(())
}

fn print_summary(summary: &UpdateSummary, context: &Context) {
    let out = &context.output;
    for result in &summary.results {
        let marker = match result.outcome {
            UpdateOutcome::Updated => emoji(out, "✅", "[UPDATED]"),
            UpdateOutcome::Unchanged => emoji(out, "✔️ ", "[OK]"),
            UpdateOutcome::Skipped(_) => emoji(out, "⏭️ ", "[SKIP]"),
            UpdateOutcome::Failed(_) => emoji(out, "❌", "[FAIL]"),
        };
        println!("{} {}: {}", marker, result.full_name, result.outcome);
    }
    println!();
    println!(
        "{} updated, {} unchanged, {} skipped, {} failed",
        summary.updated(),
        summary.unchanged(),
        summary.skipped(),
        summary.failed()
    );
}
