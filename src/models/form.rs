//! Field-level form errors

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;
use validator::{ValidationError, ValidationErrors};

/// Error messages keyed by form field, rendered next to the offending input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(transparent)]
pub struct FormErrors(pub BTreeMap<String, Vec<String>>);

/// Outcome of a form submission: the saved record, or errors to re-display
pub type Submission<T> = Result<T, FormErrors>;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_DATE: &str = "Enter a valid date.";
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

/// Dates are typed as `YYYY-MM-DD`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Trimmed text of a mandatory field; blank input is recorded as missing
    pub fn required(&mut self, field: &str, raw: &str) -> String {
        let value = raw.trim();
        if value.is_empty() {
            self.add(field, REQUIRED);
        }
        value.to_string()
    }

    /// Date of an optional field; blank input is `None`
    pub fn optional_date(&mut self, field: &str, raw: &str) -> Option<NaiveDate> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }
        match NaiveDate::parse_from_str(value, DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(_) => {
                self.add(field, INVALID_DATE);
                None
            }
        }
    }

    /// Date of a mandatory field
    pub fn required_date(&mut self, field: &str, raw: &str) -> Option<NaiveDate> {
        if raw.trim().is_empty() {
            self.add(field, REQUIRED);
            return None;
        }
        self.optional_date(field, raw)
    }

    /// Optional pick from a list (record id, status code); blank input is `None`
    pub fn optional_choice<T: FromStr>(&mut self, field: &str, raw: &str) -> Option<T> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }
        match value.parse() {
            Ok(choice) => Some(choice),
            Err(_) => {
                self.add(field, INVALID_CHOICE);
                None
            }
        }
    }

    /// Ok when no error was collected
    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = Self::default();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors.iter() {
                out.add(&field.to_string(), message_of(error));
            }
        }
        out
    }
}

/// Build a validation error carrying a human-readable message
pub fn field_error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

fn message_of(error: &ValidationError) -> String {
    error
        .message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| error.code.to_string())
}
