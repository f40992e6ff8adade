use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w.-]+@[\w.-]+\.\w+$").unwrap_or_else(|e| panic!("email pattern: {e}"))
});

/// Loose syntactic check of an email address, surrounding whitespace ignored.
pub fn is_valid_email(address: &str) -> bool {
    EMAIL_RE.is_match(address.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_addresses() {
        for address in ["jane@example.com", "j.doe-99@mail.example.org", "  a_b@c.io "] {
            assert!(is_valid_email(address), "{address}");
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        for address in ["", "plain", "@example.com", "a@b", "a b@c.com", "a@b.c@d.com", "a@.com x"] {
            assert!(!is_valid_email(address), "{address}");
        }
    }
}
