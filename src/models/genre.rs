//! Genre and language reference records

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::form::{FormErrors, Submission, REQUIRED};

/// Book genre (e.g. "Science Fiction")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

/// Natural language a book is written in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Language {
    pub id: i32,
    pub name: String,
}

/// Form used to create a genre or a language
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct NameForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Enter a name of at most 200 characters"))]
    pub name: String,
}

impl NameForm {
    /// The name with surrounding blanks removed, checked after trimming
    pub fn cleaned(&self) -> Submission<NameForm> {
        let form = NameForm {
            name: self.name.trim().to_string(),
        };
        if form.name.is_empty() {
            return Err(FormErrors::single("name", REQUIRED));
        }
        form.validate()?;
        Ok(form)
    }
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
