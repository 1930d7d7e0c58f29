//! # Cache Command Implementation
//!
//! This module implements the `cache` subcommand, which inspects and clears
//! the mirror caches under `<config_dir>/cache`.
//!
//! ## Subcommands
//!
//! - **`list`**: Show each cache file with its age and entry count
//! - **`clear`**: Remove all cache files

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::json;

use cli_git::mirror_cache::CacheSummary;
use cli_git::output::emoji;

use super::Context;

/// Inspect or clear the local caches
#[derive(Args, Debug)]
pub struct CacheArgs {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: CacheSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum CacheSubcommand {
    /// List the cache files
    List(ListArgs),
    /// Remove all cache files
    Clear,
}

/// Arguments for the cache list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Execute the `cache` command.
pub fn execute(args: CacheArgs, context: &Context) -> Result<()> {
    let cache = context.mirror_cache();
    match args.command {
        CacheSubcommand::List(list_args) => {
            let summaries = cache.summaries();
            if list_args.json {
                println!("{}", serde_json::to_string_pretty(&to_json(&summaries))?);
            } else {
                print_table(&summaries, context);
            }
        }
        CacheSubcommand::Clear => {
            cache.clear()?;
            println!(
                "{} Cleared mirror caches",
                emoji(&context.output, "🗑️ ", "[CLEAR]")
            );
        }
    }
    Ok(())
}

fn to_json(summaries: &[CacheSummary]) -> serde_json::Value {
    summaries
        .iter()
        .map(|s| {
            json!({
                "name": s.name,
                "location": s.location,
                "present": s.present,
                "entries": s.entries,
                "age_secs": s.age_secs,
                "fresh": s.fresh,
            })
        })
        .collect()
}

fn print_table(summaries: &[CacheSummary], context: &Context) {
    let out = &context.output;
    for summary in summaries {
        if !summary.present {
            println!("{:<16} {}", summary.name, out.dim("(empty)"));
            continue;
        }
        let age = summary
            .age_secs
            .map(format_age)
            .unwrap_or_else(|| "-".to_string());
        let state = if summary.fresh { "fresh" } else { "expired" };
        println!(
            "{:<16} {:>4} entries  {:>8}  {:<7}  {}",
            summary.name,
            summary.entries,
            age,
            state,
            out.dim(&summary.location)
        );
    }
}

/// Compact human-readable age, e.g. `45s`, `12m`, `3h`, `2d`.
fn format_age(secs: u64) -> String {
    match secs {
        s if s < 60 => format!("{}s", s),
        s if s < 3600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h", s / 3600),
        s => format!("{}d", s / 86_400),
    }
}
