//! # Complete Command Implementation
//!
//! Prints completion candidates as `value<TAB>label` lines, one per
//! candidate, for use by shell completion scripts.
//!
//! ```bash
//! cli-git complete repo mirror-
//! cli-git complete schedule "0 0"
//! ```
//!
//! Lookup failures never surface here; they only shorten the list.

use anyhow::Result;
use clap::Args;

use cli_git::completion::{
    complete_organization, complete_prefix, complete_schedule, CompletionResolver, Scope,
    Suggestion,
};
use cli_git::hosting::GhCli;
use cli_git::suggestions;

use super::Context;

const KINDS: [&str; 4] = ["repo", "org", "schedule", "prefix"];

/// Print completion candidates
#[derive(Args, Debug)]
pub struct CompleteArgs {
    /// What to complete: repo, org, schedule or prefix
    pub kind: String,

    /// Text typed so far
    #[arg(default_value = "", allow_hyphen_values = true)]
    pub partial: String,
}

/// Execute the `complete` command.
pub fn execute(args: CompleteArgs, context: &Context) -> Result<()> {
    let candidates = match args.kind.as_str() {
        "repo" => {
            let settings = context.load_settings()?;
            let cache = context.mirror_cache();
            let hosting = GhCli::new();
            let scope = Scope {
                username: settings.username().map(str::to_string),
                default_org: settings.default_org().map(str::to_string),
            };
            let resolver = CompletionResolver::new(&cache, &hosting);
            resolver.suggest(&args.partial, &scope)
        }
        "org" => complete_organization(&GhCli::new(), &args.partial),
        "schedule" => complete_schedule(&args.partial),
        "prefix" => {
            let settings = context.load_settings()?;
            complete_prefix(&settings.preferences.default_prefix, &args.partial)
        }
        other => return Err(suggestions::unknown_completion_kind(other, &KINDS)),
    };

    print!("{}", render(&candidates));
    Ok(())
}

fn render(suggestions: &[Suggestion]) -> String {
    suggestions
        .iter()
        .map(|s| format!("{}\t{}\n", s.value, s.label))
        .collect()
}
