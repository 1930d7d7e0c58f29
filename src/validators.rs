//! Input validation for mirror creation and settings.
//!
//! Every check runs before any remote state is touched and fails with
//! [`Error::Validation`] naming the field and the expected shape.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::error::{Error, Result};
use crate::hosting::HostingService;
use crate::repo_url;

const REPO_NAME_MAX: usize = 100;
const PREFIX_MAX: usize = 50;
const RESERVED_REPO_NAMES: &[&str] = &["..", ".", "con", "prn", "aux", "nul"];
const SLACK_WEBHOOK_PATTERN: &str =
    r"^https://hooks\.slack\.com/services/[A-Z0-9]+/[A-Z0-9]+/[a-zA-Z0-9]+$";

/// Names and inclusive bounds of the five cron fields, in order.
pub const CRON_FIELDS: [(&str, u32, u32); 5] = [
    ("minute", 0, 59),
    ("hour", 0, 23),
    ("day", 1, 31),
    ("month", 1, 12),
    ("weekday", 0, 7),
];

/// Accepts `https://github.com/o/r`, `git@github.com:o/r.git` and
/// `github.com/o/r`.
pub fn validate_github_url(url: &str) -> Result<repo_url::RepoSlug> {
    repo_url::parse(url).ok_or_else(|| {
        Error::validation(
            "repository URL",
            format!(
                "'{}'\n  expected one of:\n  - https://github.com/owner/repo\n  \
                 - git@github.com:owner/repo.git\n  - github.com/owner/repo",
                url
            ),
        )
    })
}

pub fn validate_repository_name(name: &str) -> Result<()> {
    let field = "repository name";
    if name.is_empty() {
        return Err(Error::validation(field, "cannot be empty"));
    }
    if name.chars().count() > REPO_NAME_MAX {
        return Err(Error::validation(
            field,
            format!(
                "too long: {} characters (max {})",
                name.chars().count(),
                REPO_NAME_MAX
            ),
        ));
    }
    if RESERVED_REPO_NAMES.contains(&name.to_lowercase().as_str()) {
        return Err(Error::validation(field, format!("'{}' is reserved", name)));
    }
    if !name.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return Err(Error::validation(
            field,
            format!("must start with a letter or number: '{}'", name),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(Error::validation(
            field,
            format!(
                "'{}' contains invalid characters (allowed: letters, numbers, '-', '_', '.')",
                name
            ),
        ));
    }
    if name.ends_with(".git") {
        return Err(Error::validation(
            field,
            format!("cannot end with '.git': '{}'", name),
        ));
    }
    Ok(())
}

/// An empty prefix is valid.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Ok(());
    }
    if prefix.chars().count() > PREFIX_MAX {
        return Err(Error::validation(
            "prefix",
            format!(
                "too long: {} characters (max {})",
                prefix.chars().count(),
                PREFIX_MAX
            ),
        ));
    }
    if !prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
    {
        return Err(Error::validation(
            "prefix",
            format!(
                "'{}' contains invalid characters (allowed: letters, numbers, '-', '_')",
                prefix
            ),
        ));
    }
    Ok(())
}

/// Checks a standard 5-field cron expression.
///
/// Each field is `*`, a value, a range `a-b`, a step `*/n` or `a-b/n`, or a
/// comma-separated list of values, ranges and steps.
pub fn validate_cron_schedule(schedule: &str) -> Result<()> {
    let fields: Vec<&str> = schedule.split_whitespace().collect();
    if fields.len() != CRON_FIELDS.len() {
        return Err(Error::validation(
            "schedule",
            format!(
                "'{}': expected 5 fields (minute hour day month weekday), \
                 e.g. '0 0 * * *' for daily at midnight",
                schedule
            ),
        ));
    }

    for (value, (name, min, max)) in fields.iter().zip(CRON_FIELDS) {
        if !cron_field_is_valid(value, min, max) {
            return Err(Error::validation(
                "schedule",
                format!("{} field '{}' must be within {}-{}", name, value, min, max),
            ));
        }
    }
    Ok(())
}

fn cron_field_is_valid(field: &str, min: u32, max: u32) -> bool {
    field
        .split(',')
        .all(|element| cron_element_is_valid(element, min, max))
}

fn cron_element_is_valid(element: &str, min: u32, max: u32) -> bool {
    let (base, step) = match element.split_once('/') {
        Some((base, step)) => (base, Some(step)),
        None => (element, None),
    };

    if let Some(step) = step {
        match step.parse::<u32>() {
            Ok(n) if n > 0 => {}
            _ => return false,
        }
        // A step needs a wildcard or range base.
        if base != "*" && !base.contains('-') {
            return false;
        }
    }

    if base == "*" {
        return true;
    }
    match base.split_once('-') {
        Some((start, end)) => match (parse_in(start, min, max), parse_in(end, min, max)) {
            (Some(start), Some(end)) => start <= end,
            _ => false,
        },
        None => parse_in(base, min, max).is_some(),
    }
}

fn parse_in(value: &str, min: u32, max: u32) -> Option<u32> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    value.parse::<u32>().ok().filter(|v| (min..=max).contains(v))
}

fn slack_webhook_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(SLACK_WEBHOOK_PATTERN).expect("valid regex"))
}

/// An empty webhook is valid; notifications are then disabled.
pub fn validate_slack_webhook_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Ok(());
    }
    if slack_webhook_pattern().is_match(url) {
        Ok(())
    } else {
        Err(Error::validation(
            "Slack webhook URL",
            "expected https://hooks.slack.com/services/XXXXXXXXX/XXXXXXXXX/XXXXXXXXXXXXXXXXXXXXXXXX",
        ))
    }
}

/// Checks that the authenticated account belongs to `org`.
///
/// If the membership lookup itself fails the organization is accepted; the
/// hosting service reports a clearer error later if it really is wrong.
pub fn validate_organization(hosting: &dyn HostingService, org: &str) -> Result<()> {
    if org.is_empty() {
        return Ok(());
    }
    let orgs = match hosting.list_organizations() {
        Ok(orgs) => orgs,
        Err(e) => {
            debug!("could not verify organization '{}': {}", org, e);
            return Ok(());
        }
    };
    if orgs.iter().any(|o| o == org) {
        return Ok(());
    }
    let available = if orgs.is_empty() {
        "none".to_string()
    } else {
        orgs.join(", ")
    };
    Err(Error::validation(
        "organization",
        format!(
            "'{}' not found or you don't have access (available: {})",
            org, available
        ),
    ))
}
