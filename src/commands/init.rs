//! # Init Command Implementation
//!
//! This module implements the `init` subcommand, which records the GitHub
//! account and default preferences in `<config_dir>/settings.toml`.
//!
//! ## Functionality
//!
//! - **Account**: the username is read from the authenticated `gh` session
//! - **Defaults**: organization, schedule and name prefix used by `private-mirror`
//! - **Credentials**: an optional token and Slack webhook, stored as secrets
//!   in every new mirror
//! - **Interactive Mode**: prompts for every value not given as a flag
//!
//! Running `init` again keeps existing values unless new ones are given.

use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Input, Password};

use cli_git::hosting::{GhCli, HostingService};
use cli_git::output::{emoji, mask_token, mask_webhook_url};
use cli_git::settings::Settings;
use cli_git::suggestions;
use cli_git::validators::{
    validate_cron_schedule, validate_organization, validate_prefix, validate_slack_webhook_url,
};

use super::Context;

/// Record your GitHub account and default preferences
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Prompt for every value not given as a flag
    #[arg(short, long)]
    pub interactive: bool,

    /// Default organization for new mirrors
    #[arg(long, value_name = "ORG")]
    pub org: Option<String>,

    /// Slack incoming webhook notified when a sync fails
    #[arg(long, value_name = "URL")]
    pub slack_webhook: Option<String>,

    /// Personal access token stored as the GH_TOKEN secret of new mirrors
    #[arg(long, value_name = "TOKEN", env = "CLI_GIT_GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Default cron schedule for the sync workflow
    #[arg(long, value_name = "CRON")]
    pub schedule: Option<String>,

    /// Default prefix for mirror names
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Option<String>,
}

/// Execute the `init` command.
pub fn execute(args: InitArgs, context: &Context) -> Result<()> {
    let hosting = GhCli::new();
    if !hosting.is_authenticated() {
        return Err(suggestions::not_authenticated());
    }

    println!(
        "{} Initializing cli-git configuration...",
        emoji(&context.output, "🎯", "[INIT]")
    );

    let mut settings = context.load_settings()?;
    settings.github.username = hosting.current_user()?;

    let theme = ColorfulTheme::default();
    let prompt = |label: &str, current: &str| -> Result<String> {
        Ok(Input::<String>::with_theme(&theme)
            .with_prompt(label)
            .with_initial_text(current)
            .allow_empty(true)
            .interact_text()?)
    };

    let org = match args.org {
        Some(org) => org,
        None if args.interactive => prompt(
            "Default organization (empty for your account)",
            &settings.github.default_org,
        )?,
        None => settings.github.default_org.clone(),
    };
    validate_organization(&hosting, org.trim())?;
    settings.github.default_org = org.trim().to_string();

    let schedule = match args.schedule {
        Some(schedule) => schedule,
        None if args.interactive => prompt(
            "Default sync schedule (cron)",
            &settings.preferences.default_schedule,
        )?,
        None => settings.preferences.default_schedule.clone(),
    };
    validate_cron_schedule(schedule.trim())?;
    settings.preferences.default_schedule = schedule.trim().to_string();

    let prefix = match args.prefix {
        Some(prefix) => prefix,
        None if args.interactive => {
            prompt("Default mirror prefix", &settings.preferences.default_prefix)?
        }
        None => settings.preferences.default_prefix.clone(),
    };
    validate_prefix(prefix.trim())?;
    settings.preferences.default_prefix = prefix.trim().to_string();

    let webhook = match args.slack_webhook {
        Some(webhook) => webhook,
        None if args.interactive => prompt(
            "Slack webhook URL (optional)",
            &settings.github.slack_webhook_url,
        )?,
        None => settings.github.slack_webhook_url.clone(),
    };
    validate_slack_webhook_url(webhook.trim())?;
    settings.github.slack_webhook_url = webhook.trim().to_string();

    let token = match args.token {
        Some(token) => Some(token),
        None if args.interactive => {
            let token = Password::with_theme(&theme)
                .with_prompt("GitHub token for mirror sync (optional, Enter to keep current)")
                .allow_empty_password(true)
                .interact()?;
            (!token.is_empty()).then_some(token)
        }
        None => None,
    };
    if let Some(token) = token {
        let token = token.trim().to_string();
        if !token.is_empty() && !hosting.token_is_valid(&token) {
            println!(
                "{} The token could not be verified; it was saved anyway",
                emoji(&context.output, "⚠️ ", "[WARN]")
            );
        }
        settings.github.github_token = token;
    }

    settings.save(&context.config_dir)?;
    print_summary(&settings, context);
    Ok(())
}

fn print_summary(settings: &Settings, context: &Context) {
    let out = &context.output;
    println!(
        "{} Saved {}",
        emoji(out, "✅", "[OK]"),
        Settings::path(&context.config_dir).display()
    );
    println!("   {}  {}", out.dim("username:"), settings.github.username);
    println!(
        "   {}  {}",
        out.dim("organization:"),
        settings.default_org().unwrap_or("(your account)")
    );
    println!(
        "   {}  {}",
        out.dim("schedule:"),
        settings.preferences.default_schedule
    );
    println!(
        "   {}  {}",
        out.dim("prefix:"),
        settings.preferences.default_prefix
    );
    if let Some(webhook) = settings.slack_webhook_url() {
        println!("   {}  {}", out.dim("slack webhook:"), mask_webhook_url(webhook));
    }
    if let Some(token) = settings.github_token() {
        println!("   {}  {}", out.dim("token:"), mask_token(token));
    }
    println!(
        "{} Run `cli-git private-mirror <upstream-url>` to create your first mirror",
        emoji(out, "💡", "[TIP]")
    );
}
