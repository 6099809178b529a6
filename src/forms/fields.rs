//! Input fields and the constraint checks a browser applies before it lets a
//! form submit: `required`, `type=email` and `minlength`.

use regex::Regex;
use serde::Serialize;
use std::fmt;

// WHATWG "valid email address" grammar used by `<input type=email>`.
const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Email,
    Password,
}

impl FieldKind {
    /// HTML `type` attribute.
    #[must_use]
    pub const fn input_type(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Password => "password",
        }
    }

    /// Value sanitization applied when a value is set: line breaks are
    /// stripped, and email values also lose surrounding whitespace.
    #[must_use]
    pub fn sanitize(self, value: &str) -> String {
        let stripped: String = value.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
        match self {
            Self::Email => stripped
                .trim_matches(|c: char| c.is_ascii_whitespace())
                .to_string(),
            Self::Text | Self::Password => stripped,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub placeholder: &'static str,
    pub required: bool,
    pub min_length: Option<usize>,
}

impl FieldSpec {
    #[must_use]
    pub const fn required(name: &'static str, kind: FieldKind, placeholder: &'static str) -> Self {
        Self {
            name,
            kind,
            placeholder,
            required: true,
            min_length: None,
        }
    }

    #[must_use]
    pub const fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    /// First constraint `value` violates, if any.
    #[must_use]
    pub fn check(&self, value: &str) -> Option<Violation> {
        if value.is_empty() {
            return self.required.then_some(Violation::Missing { field: self.name });
        }

        if self.kind == FieldKind::Email && !valid_email(value) {
            return Some(Violation::InvalidEmail { field: self.name });
        }

        // Browsers count UTF-16 code units for `minlength`.
        let length = value.encode_utf16().count();
        match self.min_length {
            Some(min) if length < min => Some(Violation::TooShort {
                field: self.name,
                min,
                actual: length,
            }),
            _ => None,
        }
    }
}

/// A constraint that blocks submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    Missing {
        field: &'static str,
    },
    InvalidEmail {
        field: &'static str,
    },
    TooShort {
        field: &'static str,
        min: usize,
        actual: usize,
    },
}

impl Violation {
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Missing { field } | Self::InvalidEmail { field } | Self::TooShort { field, .. } => {
                *field
            }
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { .. } => write!(f, "Please fill out this field."),
            Self::InvalidEmail { .. } => write!(f, "Please enter an email address."),
            Self::TooShort { min, actual, .. } => write!(
                f,
                "Please lengthen this text to {min} characters or more (you are currently using {actual} characters)."
            ),
        }
    }
}

pub fn valid_email(email: &str) -> bool {
    Regex::new(EMAIL_PATTERN).is_ok_and(|re| re.is_match(email))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_follows_input_type_email() {
        for email in [
            "user@example.com",
            "first.last+tag@sub.example.co",
            "user@localhost",
            "o'brien@example.ie",
        ] {
            assert!(valid_email(email), "{email}");
        }

        for email in [
            "",
            "user",
            "user@",
            "@example.com",
            "user@@example.com",
            "user name@example.com",
            "user@-example.com",
            "user@example..com",
        ] {
            assert!(!valid_email(email), "{email}");
        }
    }

    #[test]
    fn required_field_reports_missing() {
        let spec = FieldSpec::required("name", FieldKind::Text, "Full Name");
        assert_eq!(spec.check(""), Some(Violation::Missing { field: "name" }));
        assert_eq!(spec.check("Ada"), None);
    }

    #[test]
    fn email_field_rejects_malformed_values() {
        let spec = FieldSpec::required("email", FieldKind::Email, "Email");
        assert_eq!(
            spec.check("not-an-email"),
            Some(Violation::InvalidEmail { field: "email" })
        );
        assert_eq!(spec.check("user@example.com"), None);
    }

    #[test]
    fn min_length_counts_utf16_units() {
        let spec =
            FieldSpec::required("password", FieldKind::Password, "Password").with_min_length(8);

        assert_eq!(
            spec.check("short"),
            Some(Violation::TooShort {
                field: "password",
                min: 8,
                actual: 5
            })
        );
        assert_eq!(spec.check("12345678"), None);
        // Four astral-plane characters are eight UTF-16 code units.
        assert_eq!(spec.check("🔑🔑🔑🔑"), None);
    }

    #[test]
    fn empty_optional_field_is_valid() {
        let spec = FieldSpec {
            required: false,
            ..FieldSpec::required("nickname", FieldKind::Text, "").with_min_length(3)
        };
        assert_eq!(spec.check(""), None);
    }

    #[test]
    fn sanitize_strips_line_breaks_and_email_whitespace() {
        assert_eq!(
            FieldKind::Email.sanitize("  user@example.com\n "),
            "user@example.com"
        );
        assert_eq!(FieldKind::Password.sanitize(" pass\r\nword "), " password ");
    }

    #[test]
    fn violation_messages() {
        let violation = Violation::TooShort {
            field: "password",
            min: 8,
            actual: 5,
        };
        assert_eq!(violation.field(), "password");
        assert_eq!(
            violation.to_string(),
            "Please lengthen this text to 8 characters or more (you are currently using 5 characters)."
        );
    }
}
