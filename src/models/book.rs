//! Book model and related types

use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{
    author::AuthorRef,
    book_instance::CopyEntry,
    form::{FormErrors, Submission},
    genre::{Genre, Language},
};

/// Number of genres shown in a book's genre preview
pub const GENRE_PREVIEW_COUNT: usize = 3;

/// Length of a generated ISBN placeholder
pub const ISBN_LENGTH: usize = 13;

/// Book record as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author_id: Option<i32>,
    pub language_id: Option<i32>,
}

impl Book {
    /// Canonical page of this book
    pub fn url(&self) -> String {
        book_url(self.id)
    }
}

pub fn book_url(id: i32) -> String {
    format!("/catalog/books/{}/", id)
}

impl std::fmt::Display for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Book row in listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub author: Option<AuthorRef>,
    pub language: Option<String>,
    /// Names of the first genres, comma separated
    pub display_genre: String,
}

/// Book page: the record with its relations and copies
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetail {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author: Option<AuthorRef>,
    pub language: Option<Language>,
    pub genres: Vec<Genre>,
    pub display_genre: String,
    pub copies: Vec<CopyEntry>,
}

/// Join the first genre names in assignment order
pub fn display_genre<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .take(GENRE_PREVIEW_COUNT)
        .map(|n| n.as_ref())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Random all-digit ISBN proposed on the add-book form
pub fn generate_isbn() -> String {
    let mut rng = rand::thread_rng();
    (0..ISBN_LENGTH)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Add/update book form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct BookForm {
    #[validate(length(min = 1, max = 200, message = "Enter a title of at most 200 characters"))]
    pub title: String,
    #[serde(default)]
    pub author: Option<i32>,
    #[serde(default)]
    #[validate(length(max = 1000, message = "Summary is limited to 1000 characters"))]
    pub summary: String,
    #[validate(length(min = 1, max = 13, message = "Enter an ISBN of at most 13 characters"))]
    pub isbn: String,
    #[serde(default)]
    pub language: Option<i32>,
    /// Genre ids in the order they were picked
    #[serde(default)]
    pub genre: Vec<i32>,
}

impl BookForm {
    /// Genre ids with repeats removed, first occurrence wins
    pub fn genre_ids(&self) -> Vec<i32> {
        let mut ids = Vec::with_capacity(self.genre.len());
        for id in &self.genre {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }
}

/// Book form as submitted by the browser, every field kept as typed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct BookInput {
    pub title: String,
    /// Author id, blank for none
    pub author: String,
    pub summary: String,
    pub isbn: String,
    /// Language id, blank for none
    pub language: String,
    /// Genre ids, one `genre=` pair per pick
    pub genre: Vec<String>,
}

impl BookInput {
    /// Read the typed values; unreadable or missing fields become field errors
    pub fn parse(&self) -> Submission<BookForm> {
        let mut errors = FormErrors::default();
        let mut genre = Vec::with_capacity(self.genre.len());
        for raw in self.genre.iter().filter(|raw| !raw.trim().is_empty()) {
            match raw.trim().parse() {
                Ok(id) => genre.push(id),
                Err(_) => errors.add("genre", format!("{} is not one of the available genres", raw.trim())),
            }
        }
        let form = BookForm {
            title: errors.required("title", &self.title),
            author: errors.optional_choice("author", &self.author),
            summary: self.summary.trim().to_string(),
            isbn: errors.required("isbn", &self.isbn),
            language: errors.optional_choice("language", &self.language),
            genre,
        };
        errors.into_result()?;
        Ok(form)
    }
}

fn optional_id(id: Option<i32>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}

impl From<&BookForm> for BookInput {
    fn from(form: &BookForm) -> Self {
        Self {
            title: form.title.clone(),
            author: optional_id(form.author),
            summary: form.summary.clone(),
            isbn: form.isbn.clone(),
            language: optional_id(form.language),
            genre: form.genre.iter().map(i32::to_string).collect(),
        }
    }
}
