//! Field validation of registration form input.
//!
//! Pure: no storage access. Duplicate detection happens afterwards in the
//! workflow.

use crate::config::BirthYearRange;
use crate::types::{Applicant, TShirtSize, ValidApplicant};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum length of a participant name, in characters
pub const NAME_MAX_CHARS: usize = 200;
/// Maximum length of a department, in characters
pub const DEPARTMENT_MAX_CHARS: usize = 100;

const REQUIRED: &str = "This field is required.";
const INVALID_EMAIL: &str = "Enter a valid email address.";
const NOT_A_NUMBER: &str = "Enter a whole number.";

/// Validation messages keyed by field name
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Record a message for `field`
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// No messages recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages for one field
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Names of the fields with errors
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Validate raw applicant input.
///
/// Text fields are trimmed before checks. All problems are collected, not
/// only the first.
///
/// # Errors
///
/// Returns the collected [`FieldErrors`] if any field is invalid.
pub fn validate(
    applicant: &Applicant,
    birth_years: BirthYearRange,
) -> Result<ValidApplicant, FieldErrors> {
    let mut errors = FieldErrors::default();

    let name = text_field(&mut errors, "name", applicant.name.as_deref(), NAME_MAX_CHARS);
    let department = text_field(
        &mut errors,
        "department",
        applicant.department.as_deref(),
        DEPARTMENT_MAX_CHARS,
    );

    let year_of_birth = match applicant.year_of_birth.as_ref().map(whole_number) {
        None | Some(Some(Year::Blank)) => {
            errors.add("year_of_birth", REQUIRED);
            None
        },
        Some(None) => {
            errors.add("year_of_birth", NOT_A_NUMBER);
            None
        },
        Some(Some(Year::Given(year))) => match i32::try_from(year) {
            Ok(year) if birth_years.contains(year) => Some(year),
            _ => {
                errors.add(
                    "year_of_birth",
                    format!(
                        "Year of birth must be between {} and {}.",
                        birth_years.min, birth_years.max
                    ),
                );
                None
            },
        },
    };

    let tshirt_size = match applicant.tshirt_size.as_deref().map(str::trim) {
        None | Some("") => {
            errors.add("tshirt_size", REQUIRED);
            None
        },
        Some(code) => match code.parse::<TShirtSize>() {
            Ok(size) => Some(size),
            Err(_) => {
                errors.add(
                    "tshirt_size",
                    format!("Select a valid choice. {code} is not one of the available choices."),
                );
                None
            },
        },
    };

    let email = match applicant.email.as_deref().map(str::trim) {
        None | Some("") => {
            errors.add("email", REQUIRED);
            None
        },
        Some(email) if !is_valid_email(email) => {
            errors.add("email", INVALID_EMAIL);
            None
        },
        Some(email) => Some(email.to_string()),
    };

    match (name, department, year_of_birth, tshirt_size, email) {
        (Some(name), Some(department), Some(year_of_birth), Some(tshirt_size), Some(email))
            if errors.is_empty() =>
        {
            Ok(ValidApplicant {
                name,
                department,
                year_of_birth,
                tshirt_size,
                email,
            })
        },
        _ => Err(errors),
    }
}

enum Year {
    Blank,
    Given(i64),
}

/// Integer from a JSON number or a numeric string; `None` if neither
fn whole_number(value: &serde_json::Value) -> Option<Year> {
    match value {
        serde_json::Value::Null => Some(Year::Blank),
        serde_json::Value::Number(number) => number.as_i64().map(Year::Given),
        serde_json::Value::String(text) => match text.trim() {
            "" => Some(Year::Blank),
            digits => digits.parse().ok().map(Year::Given),
        },
        _ => None,
    }
}

fn text_field(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    max_chars: usize,
) -> Option<String> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        errors.add(field, REQUIRED);
        return None;
    }

    let chars = value.chars().count();
    if chars > max_chars {
        errors.add(
            field,
            format!("Ensure this value has at most {max_chars} characters (it has {chars})."),
        );
        return None;
    }

    Some(value.to_string())
}

/// Syntactic email check: one `@`, a dotted domain, plain local-part characters.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 3 || email.len() > 255 {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }

    let valid_local = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-' | '+' | '_');
    let valid_domain = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-');

    local.chars().all(valid_local)
        && domain.chars().all(valid_domain)
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}
