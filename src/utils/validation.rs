use once_cell::sync::Lazy;
use regex::Regex;

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap());
static USER_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z' -]{2,50}$").unwrap());
static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

pub fn is_valid_hex_color(value: &str) -> bool {
    HEX_COLOR.is_match(value)
}

pub fn is_valid_user_name(value: &str) -> bool {
    USER_NAME.is_match(value)
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_color_accepts_mixed_case() {
        assert!(is_valid_hex_color("#A1b2C3"));
        assert!(is_valid_hex_color("#000000"));
        assert!(is_valid_hex_color("#ffffff"));
    }

    #[test]
    fn hex_color_rejects_bad_input() {
        assert!(!is_valid_hex_color("A1b2C3"));
        assert!(!is_valid_hex_color("#A1b2C"));
        assert!(!is_valid_hex_color("#A1b2C3d"));
        assert!(!is_valid_hex_color("#GGGGGG"));
        assert!(!is_valid_hex_color(""));
    }

    #[test]
    fn user_name_allows_spaces_hyphens_apostrophes() {
        assert!(is_valid_user_name("Anna-Marie O'Neil"));
        assert!(is_valid_user_name("Jo"));
    }

    #[test]
    fn user_name_rejects_bad_input() {
        assert!(!is_valid_user_name("x"));
        assert!(!is_valid_user_name("Anna123"));
        assert!(!is_valid_user_name(&"a".repeat(51)));
    }

    #[test]
    fn email_requires_local_domain_and_tld() {
        assert!(is_valid_email("user@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("userexample.com"));
        assert!(!is_valid_email("a b@example.com"));
    }
}
