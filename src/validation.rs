//! Credential format checks applied before any database lookup.

use std::sync::LazyLock;

use regex::Regex;

pub const PASSWORD_MIN_LENGTH: usize = 6;
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*()";

#[expect(clippy::expect_used)]
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$").expect("email pattern compiles")
});

#[must_use]
pub fn validate_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// True when the password has at least six characters including a digit,
/// an uppercase letter, a lowercase letter and one of `!@#$%^&*()`.
#[must_use]
pub fn validate_password(password: &str) -> bool {
    password.chars().count() >= PASSWORD_MIN_LENGTH
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(char::is_uppercase)
        && password.chars().any(char::is_lowercase)
        && password.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
}
