// Local input checks. Nothing here touches a collaborator.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Upper bound on evidence attachments when no configuration overrides it
pub const DEFAULT_MAX_EVIDENCE_BYTES: usize = 10 * 1024 * 1024;

static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    EmptyField(&'static str),
    #[error("email address is not well formed")]
    InvalidEmail,
    #[error("verification code must be {expected} characters, got {actual}")]
    CodeLength { expected: usize, actual: usize },
    #[error("evidence is {size} bytes, limit is {limit} bytes")]
    EvidenceTooLarge { size: usize, limit: usize },
    #[error("unknown {field}: {value}")]
    UnknownVariant { field: &'static str, value: String },
    #[error("organizational email has not been verified")]
    NotVerified,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email)
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::EmptyField("organization email"));
    }
    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

/// Length is counted in characters so multi-byte input is not miscounted.
pub fn validate_code(code: &str, expected_len: usize) -> Result<(), ValidationError> {
    let actual = code.chars().count();
    if actual != expected_len {
        return Err(ValidationError::CodeLength {
            expected: expected_len,
            actual,
        });
    }
    Ok(())
}

pub fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

pub fn require_present<T>(field: &'static str, value: Option<T>) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::EmptyField(field))
}

pub fn validate_evidence_size(size: usize, limit: usize) -> Result<(), ValidationError> {
    if size > limit {
        return Err(ValidationError::EvidenceTooLarge { size, limit });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_accepts_ordinary_addresses() {
        assert!(is_valid_email("a@acme.com"));
        assert!(is_valid_email("first.last+tag@mail.example.org"));
    }

    #[test]
    fn test_rejects_malformed_addresses() {
        let malformed = [
            "not-an-email",
            "a@acme",
            "@acme.com",
            "a@.com",
            "a b@acme.com",
            "a@@acme.com",
            "",
        ];
        for email in malformed {
            assert!(!is_valid_email(email), "{email} should be rejected");
        }
        assert_eq!(
            validate_email("   "),
            Err(ValidationError::EmptyField("organization email"))
        );
        assert_eq!(validate_email("not-an-email"), Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn test_code_length_counts_characters() {
        assert!(validate_code("123456", 6).is_ok());
        assert!(validate_code("ééééé", 6).is_err());
        assert!(validate_code("éééééé", 6).is_ok());
        assert_eq!(
            validate_code("12345", 6),
            Err(ValidationError::CodeLength { expected: 6, actual: 5 })
        );
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        assert_eq!(
            require_non_empty("report title", "  \n"),
            Err(ValidationError::EmptyField("report title"))
        );
        assert!(require_non_empty("report title", "Title").is_ok());
    }

    #[test]
    fn test_evidence_limit() {
        let limit = DEFAULT_MAX_EVIDENCE_BYTES;
        assert!(validate_evidence_size(limit, limit).is_ok());
        assert!(validate_evidence_size(limit + 1, limit).is_err());
    }

    proptest! {
        #[test]
        fn prop_whitespace_anywhere_is_rejected(
            local in "[a-z]{1,8}",
            domain in "[a-z]{1,8}",
            tld in "[a-z]{2,4}",
            pos in 0usize..3,
        ) {
            let email = match pos {
                0 => format!("{local} x@{domain}.{tld}"),
                1 => format!("{local}@{domain} x.{tld}"),
                _ => format!("{local}@{domain}.{tld} x"),
            };
            prop_assert!(!is_valid_email(&email));
        }

        #[test]
        fn prop_simple_shape_is_accepted(
            local in "[a-z0-9._-]{1,12}",
            domain in "[a-z0-9-]{1,12}",
            tld in "[a-z]{2,6}",
        ) {
            let email = format!("{local}@{domain}.{tld}");
            prop_assert!(is_valid_email(&email));
        }

        #[test]
        fn prop_wrong_length_codes_fail(code in "[0-9]{0,12}") {
            prop_assume!(code.len() != DEFAULT_CODE_LENGTH);
            prop_assert!(validate_code(&code, DEFAULT_CODE_LENGTH).is_err());
        }
    }
}
