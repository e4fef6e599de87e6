//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use super::form::{field_error, FormErrors, Submission, DATE_FORMAT};

/// Author of one or more books
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    /// Died
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// Canonical page of this author
    pub fn url(&self) -> String {
        format!("/catalog/authors/{}/", self.id)
    }
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

/// Author reference embedded in book listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthorRef {
    pub id: i32,
    pub name: String,
}

impl From<&Author> for AuthorRef {
    fn from(author: &Author) -> Self {
        Self {
            id: author.id,
            name: author.to_string(),
        }
    }
}

/// Create/update author form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct AuthorForm {
    #[validate(length(min = 1, max = 100, message = "Enter a first name of at most 100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Enter a last name of at most 100 characters"))]
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub date_of_death: Option<NaiveDate>,
}

impl AuthorForm {
    /// Field checks plus the lifespan ordering rule
    pub fn check(&self) -> Result<(), FormErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        if let (Some(born), Some(died)) = (self.date_of_birth, self.date_of_death) {
            if died < born {
                errors.add(
                    "date_of_death",
                    field_error("death_before_birth", "Date of death is before date of birth"),
                );
            }
        }
        FormErrors::from(errors).into_result()
    }
}

/// Author form as submitted by the browser, every field kept as typed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct AuthorInput {
    pub first_name: String,
    pub last_name: String,
    /// `YYYY-MM-DD`, blank when unknown
    pub date_of_birth: String,
    pub date_of_death: String,
}

impl AuthorInput {
    /// Read the typed values; unreadable or missing fields become field errors
    pub fn parse(&self) -> Submission<AuthorForm> {
        let mut errors = FormErrors::default();
        let form = AuthorForm {
            first_name: errors.required("first_name", &self.first_name),
            last_name: errors.required("last_name", &self.last_name),
            date_of_birth: errors.optional_date("date_of_birth", &self.date_of_birth),
            date_of_death: errors.optional_date("date_of_death", &self.date_of_death),
        };
        errors.into_result()?;
        Ok(form)
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or_default()
}

impl From<&Author> for AuthorInput {
    fn from(author: &Author) -> Self {
        Self {
            first_name: author.first_name.clone(),
            last_name: author.last_name.clone(),
            date_of_birth: format_date(author.date_of_birth),
            date_of_death: format_date(author.date_of_death),
        }
    }
}
