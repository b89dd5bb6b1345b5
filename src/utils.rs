use anyhow::{bail, Context, Result};
use std::process::{Command, Stdio};

use crate::models::FlagValue;

/// Truncates a string to max_chars characters, appending "..." if truncated.
/// Safe for UTF-8 multi-byte characters (e.g., Japanese text).
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let truncate_at = max_chars.saturating_sub(3);
        let byte_index = s
            .char_indices()
            .nth(truncate_at)
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        format!("{}...", &s[..byte_index])
    }
}

/// `1h 02m 03s`, `4m 05s` or `6s`.
pub fn format_uptime(duration: chrono::Duration) -> String {
    let total = duration.num_seconds().max(0);
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Split a `NAME=VALUE` command-line flag override.
pub fn parse_flag_assignment(input: &str) -> Result<(String, FlagValue)> {
    let Some((name, value)) = input.split_once('=') else {
        bail!("Expected NAME=VALUE, got {:?}", input);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("Flag name is empty in {:?}", input);
    }
    Ok((name.to_string(), FlagValue::parse_loose(value.trim())))
}

/// Hand `url` to the desktop's default handler. Only web links are opened.
pub fn open_in_browser(url: &str) -> Result<()> {
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        bail!("Refusing to open non-web URL: {}", url);
    }

    let mut command = opener_command(url);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    command
        .spawn()
        .with_context(|| format!("Failed to open {}", url))?;
    tracing::info!("Opened {}", url);
    Ok(())
}

#[cfg(target_os = "windows")]
fn opener_command(url: &str) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", "", url]);
    command
}

#[cfg(target_os = "macos")]
fn opener_command(url: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(url);
    command
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn opener_command(url: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(url);
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_str_short_string() {
        assert_eq!(truncate_str("short", 20), "short");
    }

    #[test]
    fn truncate_str_exact_length() {
        assert_eq!(truncate_str("hello", 5), "hello");
    }

    #[test]
    fn truncate_str_specific_truncation() {
        assert_eq!(truncate_str("hello world", 8), "hello...");
    }

    #[test]
    fn truncate_str_utf8_safe() {
        let japanese = "こんにちは世界";
        assert_eq!(truncate_str(japanese, 10), japanese);
        assert_eq!(truncate_str(japanese, 5), "こん...");
    }

    #[test]
    fn format_uptime_seconds_only() {
        assert_eq!(
            format_uptime(chrono::Duration::seconds(6)),
            "6s",
            "format_uptime: under a minute should show seconds only"
        );
    }

    #[test]
    fn format_uptime_minutes() {
        assert_eq!(format_uptime(chrono::Duration::seconds(245)), "4m 05s");
    }

    #[test]
    fn format_uptime_hours() {
        assert_eq!(format_uptime(chrono::Duration::seconds(3723)), "1h 02m 03s");
    }

    #[test]
    fn format_uptime_negative_clamps_to_zero() {
        assert_eq!(format_uptime(chrono::Duration::seconds(-5)), "0s");
    }

    #[test]
    fn parse_flag_assignment_number() {
        let (name, value) = parse_flag_assignment("DFIntQualityLevel=21").unwrap();
        assert_eq!(name, "DFIntQualityLevel");
        assert_eq!(value, FlagValue::Int(21));
    }

    #[test]
    fn parse_flag_assignment_bool() {
        let (_, value) = parse_flag_assignment("FFlagFoo=false").unwrap();
        assert_eq!(
            value,
            FlagValue::Bool(false),
            "parse_flag_assignment: 'false' should parse as a boolean"
        );
    }

    #[test]
    fn parse_flag_assignment_keeps_equals_in_value() {
        let (_, value) = parse_flag_assignment("FStringUrl=a=b").unwrap();
        assert_eq!(value, FlagValue::Str("a=b".to_string()));
    }

    #[test]
    fn parse_flag_assignment_requires_equals() {
        assert!(parse_flag_assignment("FFlagFoo").is_err());
        assert!(parse_flag_assignment("=1").is_err());
    }

    #[test]
    fn open_in_browser_rejects_non_web_urls() {
        assert!(open_in_browser("file:///etc/passwd").is_err());
    }
}
