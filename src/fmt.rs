//! Shared formatting utilities for size display and console output

use console::Emoji;

/// Scale emoji for weigh-in headers
pub const SCALE: Emoji = Emoji("⚖️  ", "");

/// Checkmark emoji for success
pub const CHECKMARK: Emoji = Emoji("✅ ", "[OK] ");

/// Crossmark emoji for failure
pub const CROSSMARK: Emoji = Emoji("❌ ", "[FAIL] ");

/// Info emoji for informational messages
pub const INFO: Emoji = Emoji("ℹ️  ", "i ");

const KB: u64 = 1024;
const MB: u64 = KB * 1024;

/// Format bytes as a compact human-readable size
///
/// # Examples
///
/// ```
/// use circleci_weigh_in::fmt::format_size;
///
/// assert_eq!(format_size(512), "512B");
/// assert_eq!(format_size(1024), "1.00KB");
/// assert_eq!(format_size(1_048_576), "1.00MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    if bytes >= MB {
        format!("{:.2}MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2}KB", bytes as f64 / KB as f64)
    } else {
        format!("{}B", bytes)
    }
}

/// Format a size difference with an explicit sign
///
/// ```
/// use circleci_weigh_in::fmt::format_signed_size;
///
/// assert_eq!(format_signed_size(180), "+180B");
/// assert_eq!(format_signed_size(-734_730), "-717.51KB");
/// assert_eq!(format_signed_size(0), "+0B");
/// ```
pub fn format_signed_size(difference: i64) -> String {
    let sign = if difference < 0 { '-' } else { '+' };
    format!("{}{}", sign, format_size(difference.unsigned_abs()))
}

/// Format a percentage with two decimals and an explicit sign
///
/// An undefined percentage (growth from nothing) renders as `n/a`.
pub fn format_signed_percent(percent: Option<f64>) -> String {
    match percent {
        Some(percent) => format!("{:+.2}%", percent),
        None => "n/a".to_string(),
    }
}

/// Shorten `text` to at most `max_chars` characters, ending with `...`
pub fn truncate(text: &str, max_chars: usize) -> String {
    const SUFFIX: &str = "...";

    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text
        .chars()
        .take(max_chars.saturating_sub(SUFFIX.len()))
        .collect();
    format!("{}{}", kept, SUFFIX)
}

/// Join the non-empty items with `separator`
pub fn compact_and_join<I, S>(separator: &str, items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .filter(|item| !item.as_ref().is_empty())
        .map(|item| item.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(separator)
}
