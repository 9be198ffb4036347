//! Terminal output utilities.
//!
//! Provides formatting helpers for terminal output.

use colored::{ColoredString, Colorize};

/// Format a value as a quoted, right-aligned field.
///
/// # Arguments
/// * `value` - The value to format
/// * `width` - The minimum width of the field
///
/// # Returns
/// A quoted, right-aligned string
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let value_str = value.to_string();
    let quoted = format!("\"{value_str}\"");
    let quoted_len = quoted.len();

    if quoted_len >= width {
        quoted
    } else {
        format!("{quoted:>width$}")
    }
}

/// Tag for a footer note, e.g. `#WARN#`.
pub fn note_tag(tag: &str, problem: bool) -> ColoredString {
    if problem {
        tag.on_red()
    } else {
        tag.on_green()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_field_short() {
        assert_eq!(format_field("10.0.0.0/8", 14), "  \"10.0.0.0/8\"");
    }

    #[test]
    fn test_format_field_exact() {
        assert_eq!(format_field("/24", 5), "\"/24\"");
    }

    #[test]
    fn test_format_field_long() {
        assert_eq!(format_field("2001:db8::/32", 5), "\"2001:db8::/32\"");
    }

    #[test]
    fn test_format_field_number() {
        assert_eq!(format_field(254, 6), " \"254\"");
    }

    #[test]
    fn test_note_tag_keeps_text() {
        colored::control::set_override(false);
        assert_eq!(note_tag("WARN", true).to_string(), "WARN");
        assert_eq!(note_tag("OK", false).to_string(), "OK");
    }
}
