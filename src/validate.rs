use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name and category are required!")]
    MissingRequired,
    #[error("Name must only contain alphabetic characters and spaces.")]
    InvalidName,
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    #[error("Phone number must be in the format 123-456-7890.")]
    InvalidPhone,
}

/// Checks the submitted fields in order and reports the first violation.
///
/// `email` and `phone` are optional and only checked when non-empty.
pub fn validate(name: &str, category: &str, email: &str, phone: &str) -> Result<(), ValidationError> {
    static NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^[A-Za-z ]+$"#).unwrap());
    static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^[^@]+@[^@]+\.[^@]+$"#).unwrap());
    static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^[0-9]{3}-[0-9]{3}-[0-9]{4}$"#).unwrap());

    if name.is_empty() || category.trim().is_empty() {
        return Err(ValidationError::MissingRequired);
    }

    if !NAME.is_match(name) {
        return Err(ValidationError::InvalidName);
    }

    if !email.is_empty() && !EMAIL.is_match(email) {
        return Err(ValidationError::InvalidEmail);
    }

    if !phone.is_empty() && !PHONE.is_match(phone) {
        return Err(ValidationError::InvalidPhone);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_complete_contact() {
        assert_eq!(
            validate("Bob Smith", "Friends", "bob@example.com", "555-666-7777"),
            Ok(())
        );
    }

    #[test]
    fn email_and_phone_are_optional() {
        assert_eq!(validate("Bob", "Friends", "", ""), Ok(()));
    }

    #[test]
    fn requires_name_and_category_first() {
        for (name, category) in [("", "Friends"), ("Bob", ""), ("", "")] {
            assert_eq!(
                validate(name, category, "not-an-email", "bad"),
                Err(ValidationError::MissingRequired)
            );
        }
    }

    #[test]
    fn blank_category_is_missing_but_blank_name_is_not() {
        assert_eq!(validate("   ", "Friends", "", ""), Ok(()));
        assert_eq!(
            validate("Bob", " \t ", "", ""),
            Err(ValidationError::MissingRequired)
        );
    }

    #[test]
    fn rejects_digits_and_symbols_in_names() {
        for name in ["Bob123", "Bob!", "O'Neil", "Anne-Marie", "Zoë"] {
            assert_eq!(
                validate(name, "Friends", "", ""),
                Err(ValidationError::InvalidName)
            );
        }

        assert_eq!(
            ValidationError::InvalidName.to_string(),
            "Name must only contain alphabetic characters and spaces."
        );
    }

    #[test]
    fn rejects_malformed_emails() {
        for email in [
            "Bob-at-example.com",
            "bob@example",
            "@example.com",
            "bob@.com",
            "bob@example.",
            "bob@ex@ample.com",
        ] {
            assert_eq!(
                validate("Bob", "Friends", email, ""),
                Err(ValidationError::InvalidEmail),
                "{email}"
            );
        }
    }

    #[test]
    fn rejects_unmasked_phones() {
        assert_eq!(validate("Bob", "Friends", "", "123-456-7890"), Ok(()));

        for phone in ["1234567890", "123-456-789", "123-4567-890", "abc-def-ghij", "123-456-78901"] {
            assert_eq!(
                validate("Bob", "Friends", "", phone),
                Err(ValidationError::InvalidPhone),
                "{phone}"
            );
        }
    }

    #[test]
    fn reports_first_failure_only() {
        assert_eq!(
            validate("Bob1", "Friends", "bad", "bad"),
            Err(ValidationError::InvalidName)
        );
        assert_eq!(
            validate("Bob", "Friends", "bad", "bad"),
            Err(ValidationError::InvalidEmail)
        );
    }
}
