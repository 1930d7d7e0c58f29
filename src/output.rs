//! # Output Configuration
//!
//! Controls how the CLI prints: emoji or ASCII markers, colored or plain
//! text, and masking of credentials before they reach the terminal.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cli_git::output::{OutputConfig, emoji};
//!
//! let config = OutputConfig::from_env_and_flag("auto");
//! println!("{} Cloning upstream...", emoji(&config, "📥", "[CLONE]"));
//! ```

use std::env;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// `color_flag` is the value of `--color`: "always", "never" or "auto".
    /// In auto mode colors are off when `NO_COLOR` is set, `CLICOLOR=0`,
    /// `TERM=dumb`, or stdout is not a TTY (unless `CLICOLOR_FORCE=1`).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// Create a configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }

    /// Bold text when colors are on.
    pub fn bold(&self, text: &str) -> String {
        if self.use_color {
            console::style(text).bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// Dimmed text when colors are on.
    pub fn dim(&self, text: &str) -> String {
        if self.use_color {
            console::style(text).dim().to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns `emoji_str` when colors are enabled, `plain` otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Shows the first and last four characters of a token.
///
/// Tokens of eight characters or fewer are fully hidden.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Keeps the scheme, host and first path segment of a webhook URL.
pub fn mask_webhook_url(webhook: &str) -> String {
    if webhook.is_empty() {
        return String::new();
    }
    match url::Url::parse(webhook) {
        Ok(parsed) => {
            let first = parsed
                .path_segments()
                .and_then(|mut segments| segments.next())
                .filter(|s| !s.is_empty());
            match (parsed.host_str(), first) {
                (Some(host), Some(first)) => {
                    format!("{}://{}/{}/***", parsed.scheme(), host, first)
                }
                (Some(host), None) => format!("{}://{}/***", parsed.scheme(), host),
                _ => "***".to_string(),
            }
        }
        Err(_) => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_color_always() {
        let config = OutputConfig::from_env_and_flag("always");
        assert!(config.use_color);
    }

    #[test]
    fn test_color_never() {
        let config = OutputConfig::from_env_and_flag("never");
        assert!(!config.use_color);
    }

    #[test]
    #[serial]
    fn test_auto_respects_no_color() {
        let previous = env::var_os("NO_COLOR");
        env::set_var("NO_COLOR", "1");
        let config = OutputConfig::from_env_and_flag("auto");
        match previous {
            Some(value) => env::set_var("NO_COLOR", value),
            None => env::remove_var("NO_COLOR"),
        }
        assert!(!config.use_color);
    }

    #[test]
    #[serial]
    fn test_flag_overrides_no_color() {
        let previous = env::var_os("NO_COLOR");
        env::set_var("NO_COLOR", "1");
        let config = OutputConfig::from_env_and_flag("always");
        match previous {
            Some(value) => env::set_var("NO_COLOR", value),
            None => env::remove_var("NO_COLOR"),
        }
        assert!(config.use_color);
    }

    #[test]
    fn test_emoji_helper() {
        assert_eq!(emoji(&OutputConfig::with_color(), "🔄", "[SYNC]"), "🔄");
        assert_eq!(emoji(&OutputConfig::without_color(), "🔄", "[SYNC]"), "[SYNC]");
    }

    #[test]
    fn test_plain_styles_without_color() {
        let config = OutputConfig::without_color();
        assert_eq!(config.bold("name"), "name");
        assert_eq!(config.dim("name"), "name");
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token(""), "");
        assert_eq!(mask_token("short"), "*****");
        assert_eq!(mask_token("ghp_1234567890abcd"), "ghp_...abcd");
    }

    #[test]
    fn test_mask_webhook_url() {
        assert_eq!(
            mask_webhook_url("https://hooks.slack.com/services/T000/B000/XXXX"),
            "https://hooks.slack.com/services/***"
        );
        assert_eq!(mask_webhook_url("not a url"), "***");
        assert_eq!(mask_webhook_url(""), "");
    }
}
