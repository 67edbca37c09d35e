//! Address shape validation, applied before any network I/O.

use regex::Regex;
use std::sync::LazyLock;

/// Requires exactly one `@`, a non-empty local part limited to
/// `[A-Za-z0-9_.+-]`, and a dotted host part of `[A-Za-z0-9-]` labels.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$")
        .expect("email syntax pattern failed to compile")
});

/// Check whether the address matches the syntax pattern. Pure; absence of a
/// match yields `false`, never an error.
pub fn check(address: &str) -> bool {
    EMAIL_PATTERN.is_match(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_shapes() {
        assert!(check("cansinacarer@gmail.com"));
        assert!(check("info@cansin.net"));
        assert!(check("first.last+tag@sub.example.co.uk"));
        assert!(check("user_name-1@example-host.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!check(""));
        assert!(!check("plainaddress"));
        assert!(!check("@example.com"));
        assert!(!check("user@"));
        assert!(!check("user@nodot"));
        assert!(!check("user@@example.com"));
        assert!(!check("two@signs@example.com"));
        assert!(!check("spaced user@example.com"));
    }

    #[test]
    fn is_idempotent() {
        for input in ["a@b.co", "not an email"] {
            assert_eq!(check(input), check(input));
        }
    }
}
