/// Structural email check: exactly one `@`, non-empty local part, and a
/// domain with at least one dot. Deliverability is the mailer's problem.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && tld.len() >= 2,
        None => false,
    }
}

/// At least 8 characters with an upper-case letter, a lower-case letter, and
/// a digit.
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::{is_strong_password, is_valid_email};

    #[test]
    fn accepts_ordinary_addresses() {
        assert!(is_valid_email("dev@example.com"));
        assert!(is_valid_email("first.last+tag@mail.example.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("dev@localhost"));
        assert!(!is_valid_email("dev@example."));
        assert!(!is_valid_email("dev @example.com"));
        assert!(!is_valid_email("dev@exa@mple.com"));
    }

    #[test]
    fn password_strength_requires_mixed_classes() {
        assert!(is_strong_password("Str0ngEnough"));
        assert!(!is_strong_password("short1A"));
        assert!(!is_strong_password("alllowercase1"));
        assert!(!is_strong_password("ALLUPPERCASE1"));
        assert!(!is_strong_password("NoDigitsHere"));
    }
}
