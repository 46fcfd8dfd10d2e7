//! Form field rules
//!
//! Every function answers "should this field be flagged?": `true` means the
//! input is in error. Lengths count Unicode scalar values.

use regex::Regex;
use std::sync::LazyLock;

const MIN_PASSWORD_LEN: usize = 6;
const MIN_NAME_LEN: usize = 4;
const MIN_PHONE_LEN: usize = 10;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9+._%\-]{1,256}@[a-zA-Z0-9][a-zA-Z0-9\-]{0,64}(\.[a-zA-Z0-9][a-zA-Z0-9\-]{0,25})+$",
    )
    .expect("email pattern is valid")
});

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Empty, or not a well-formed email address
pub fn invalid_email(email: &str) -> bool {
    email.is_empty() || !EMAIL_PATTERN.is_match(email)
}

/// Shorter than six characters
pub fn invalid_password(password: &str) -> bool {
    char_len(password) < MIN_PASSWORD_LEN
}

/// Empty, or shorter than four characters
pub fn invalid_name(name: &str) -> bool {
    name.is_empty() || char_len(name) < MIN_NAME_LEN
}

/// Empty, or nine characters or fewer.
///
/// Digits are not checked and there is no upper bound.
pub fn invalid_phone_number(phone_number: &str) -> bool {
    phone_number.is_empty() || char_len(phone_number) < MIN_PHONE_LEN
}

/// Both passwords are individually acceptable but differ.
///
/// A short password is reported by [`invalid_password`] instead, so it never
/// counts as a mismatch.
pub fn passwords_mismatch(password: &str, confirm_password: &str) -> bool {
    !invalid_password(password) && !invalid_password(confirm_password) && password != confirm_password
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_length_boundary() {
        for len in 0..12 {
            let s = "x".repeat(len);
            assert_eq!(invalid_password(&s), len < 6, "len {len}");
        }
    }

    #[test]
    fn test_phone_number_length_boundary() {
        for len in 0..14 {
            let s = "1".repeat(len);
            assert_eq!(invalid_phone_number(&s), len <= 9, "len {len}");
        }
    }

    #[test]
    fn test_name() {
        assert!(invalid_name(""));
        assert!(invalid_name("Bob"));
        assert!(!invalid_name("Alice"));
        assert!(!invalid_name("Anne"));
    }

    #[test]
    fn test_lengths_count_characters() {
        assert!(!invalid_name("Zoë!"));
        assert!(invalid_password("ééééé"));
        assert!(!invalid_password("éééééé"));
    }

    #[test]
    fn test_email() {
        assert!(invalid_email(""));
        assert!(invalid_email("alice"));
        assert!(invalid_email("alice@"));
        assert!(invalid_email("alice@example"));
        assert!(invalid_email("@example.com"));
        assert!(invalid_email("alice@example.com "));
        assert!(invalid_email("al ice@example.com"));
        assert!(invalid_email("alice@-example.com"));

        assert!(!invalid_email("a@b.com"));
        assert!(!invalid_email("alice.smith+tag@mail.example.co.uk"));
        assert!(!invalid_email("USER_1%x@Example-Host.org"));
    }

    #[test]
    fn test_passwords_mismatch() {
        assert!(passwords_mismatch("secret1", "secret2"));
        assert!(!passwords_mismatch("secret1", "secret1"));
        // short passwords are flagged elsewhere, never as a mismatch
        assert!(!passwords_mismatch("abc", "secret1"));
        assert!(!passwords_mismatch("secret1", "abc"));
        assert!(!passwords_mismatch("abc", "abd"));
        assert!(!passwords_mismatch("", ""));
    }
}
