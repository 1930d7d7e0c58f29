//! # Error Suggestions
//!
//! Helper constructors for command errors that say what went wrong AND how
//! to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crate::suggestions;
//!
//! if !hosting.is_authenticated() {
//!     return Err(suggestions::not_authenticated());
//! }
//! ```

use crate::error::Error;
use crate::provision::ProvisionStep;

/// The GitHub CLI has no active session.
pub fn not_authenticated() -> anyhow::Error {
    anyhow::anyhow!(
        "GitHub CLI is not authenticated\n\n\
         hint: Run 'gh auth login' to sign in\n\
         hint: Run 'gh auth status' to check the current session"
    )
}

/// The settings file has not been written yet.
pub fn not_initialized() -> anyhow::Error {
    anyhow::anyhow!(
        "cli-git is not configured yet\n\n\
         hint: Run 'cli-git init' to record your GitHub account and preferences"
    )
}

/// No mirror could be found to act on.
pub fn no_mirrors_found() -> anyhow::Error {
    anyhow::anyhow!(
        "No mirrors found\n\n\
         hint: Create one with 'cli-git private-mirror <upstream-url>'\n\
         hint: Use --repo owner/name to target a mirror explicitly"
    )
}

/// Adds guidance to library errors that have an obvious next step.
pub fn explain(error: Error) -> anyhow::Error {
    let hints = match &error {
        Error::PartialMirror {
            repository,
            failed_step,
            ..
        } => Some(partial_mirror_hints(repository, failed_step)),
        Error::Transfer { .. } => Some(
            "hint: Check your network connection and repository access, then run the command again"
                .to_string(),
        ),
        _ => None,
    };

    match hints {
        Some(hints) => anyhow::anyhow!("{error}\n\n{hints}"),
        None => anyhow::Error::new(error),
    }
}

/// Next steps for a mirror left behind by a failed provisioning run,
/// depending on how far it got.
fn partial_mirror_hints(repository: &str, failed_step: &str) -> String {
    let start_over = format!(
        "hint: Or delete it with 'gh repo delete {repository}' and run 'cli-git private-mirror' again"
    );
    if failed_step == ProvisionStep::Push.description() {
        format!(
            "hint: The repository is empty or incomplete, so it has no sync workflow yet\n\
             hint: Inspect it with 'gh repo view {repository}'\n{start_over}"
        )
    } else if failed_step == ProvisionStep::ProvisionSync.description() {
        format!(
            "hint: The code was pushed but the sync workflow or its secrets are missing\n\
             hint: Add them with 'gh secret set <NAME> --repo {repository}' \
             (UPSTREAM_URL, UPSTREAM_DEFAULT_BRANCH)\n{start_over}"
        )
    } else if failed_step == ProvisionStep::Record.description() {
        format!(
            "hint: The mirror {repository} is ready; only the local list of recent mirrors was not updated"
        )
    } else {
        format!("hint: Inspect the repository with 'gh repo view {repository}'\n{start_over}")
    }
}

/// Unknown completion kind, with a "did you mean" when one is close.
pub fn unknown_completion_kind(kind: &str, valid: &[&str]) -> anyhow::Error {
    let did_you_mean = find_similar(kind, valid)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Unknown completion kind: {kind}{did_you_mean}\n\n\
         Valid kinds are: {kinds}",
        kinds = valid.join(", ")
    )
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Levenshtein distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.iter().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        previous = current;
    }

    previous[b.len()]
}
