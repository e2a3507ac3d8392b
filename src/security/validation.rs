//! Field validation for lead-capture and content routes.

use regex::Regex;
use std::sync::LazyLock;

/// Longest email address accepted (RFC 5321 path limit).
pub const MAX_EMAIL_LEN: usize = 254;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));
static SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").expect("valid regex"));

/// Shape check only; deliverability is not verified.
pub fn validate_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LEN && EMAIL.is_match(email)
}

/// Accepts 7 to 15 digits once spaces, dashes, dots, parentheses and a
/// leading `+` are removed.
pub fn validate_phone(phone: &str) -> bool {
    let trimmed = phone.trim();
    let rest = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let mut digits = 0usize;
    for c in rest.chars() {
        match c {
            '0'..='9' => digits += 1,
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return false,
        }
    }
    (7..=15).contains(&digits)
}

/// Post slugs: lowercase ASCII letters, digits and dashes.
pub fn is_valid_slug(slug: &str) -> bool {
    SLUG.is_match(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(validate_email("jane@example.com"));
        assert!(validate_email("j.doe+law@firm.co.ke"));
        assert!(!validate_email("jane@example"));
        assert!(!validate_email("jane doe@example.com"));
        assert!(!validate_email("@example.com"));

        let long = format!("{}@example.com", "a".repeat(MAX_EMAIL_LEN));
        assert!(!validate_email(&long));
    }

    #[test]
    fn test_phone() {
        assert!(validate_phone("+254 712 345 678"));
        assert!(validate_phone("(020) 123-4567"));
        assert!(!validate_phone("12345"));
        assert!(!validate_phone("+1 234 567 890 123 456"));
        assert!(!validate_phone("call me maybe"));
        assert!(!validate_phone("0712x345678"));
    }

    #[test]
    fn test_slug() {
        assert!(is_valid_slug("land-disputes-2024"));
        assert!(!is_valid_slug("Land-Disputes"));
        assert!(!is_valid_slug("../etc/passwd"));
        assert!(!is_valid_slug(""));
    }
}
