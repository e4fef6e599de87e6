//! Book copy (instance) model, overdue rule and renewal window

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::form::{FormErrors, Submission, DATE_FORMAT};

/// Furthest a renewal may push the due date, counted from today
pub const MAX_RENEWAL_WEEKS: i64 = 4;

/// Due date proposed on the renewal form
pub const PROPOSED_RENEWAL_WEEKS: i64 = 3;

/// Availability of a copy, stored as a one-letter code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
pub enum LoanStatus {
    #[default]
    #[serde(rename = "m")]
    Maintenance,
    #[serde(rename = "o")]
    OnLoan,
    #[serde(rename = "a")]
    Available,
    #[serde(rename = "r")]
    Reserved,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 4] = [
        LoanStatus::Maintenance,
        LoanStatus::OnLoan,
        LoanStatus::Available,
        LoanStatus::Reserved,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Available => "Available",
            LoanStatus::Reserved => "Reserved",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "m" => Ok(LoanStatus::Maintenance),
            "o" => Ok(LoanStatus::OnLoan),
            "a" => Ok(LoanStatus::Available),
            "r" => Ok(LoanStatus::Reserved),
            _ => Err(format!("Invalid loan status code: {}", s)),
        }
    }
}

// SQLx conversion for LoanStatus
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.code(), buf)
    }
}

/// True when the copy has a due date and that date has passed.
pub fn is_overdue(due_back: Option<NaiveDate>, today: NaiveDate) -> bool {
    matches!(due_back, Some(due) if due < today)
}

/// Why a renewal date was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenewalRejection {
    #[error("Invalid date - renewal in past")]
    InPast,
    #[error("Invalid date - renewal more than 4 weeks ahead")]
    TooFarAhead,
}

/// Accept a new due date between today and four weeks from today, inclusive.
pub fn check_renewal_date(candidate: NaiveDate, today: NaiveDate) -> Result<(), RenewalRejection> {
    if candidate < today {
        return Err(RenewalRejection::InPast);
    }
    if candidate > today + Duration::weeks(MAX_RENEWAL_WEEKS) {
        return Err(RenewalRejection::TooFarAhead);
    }
    Ok(())
}

/// Due date pre-filled on the renewal form
pub fn proposed_renewal_date(today: NaiveDate) -> NaiveDate {
    today + Duration::weeks(PROPOSED_RENEWAL_WEEKS)
}

/// Copy record as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    pub id: Uuid,
    pub book_id: i32,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub borrower_id: Option<i32>,
}

impl BookInstance {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        is_overdue(self.due_back, today)
    }
}

/// Copy joined with its book title and borrower name
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct BookInstanceRow {
    pub id: Uuid,
    pub book_id: i32,
    pub book_title: String,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub borrower_id: Option<i32>,
    pub borrower_username: Option<String>,
}

impl std::fmt::Display for BookInstanceRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.book_title)
    }
}

/// Copy as listed on the borrowed-books pages and the renewal page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LoanEntry {
    pub id: Uuid,
    pub book_id: i32,
    pub book_title: String,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub borrower_id: Option<i32>,
    pub borrower: Option<String>,
    pub is_overdue: bool,
}

impl LoanEntry {
    pub fn new(row: BookInstanceRow, today: NaiveDate) -> Self {
        Self {
            is_overdue: is_overdue(row.due_back, today),
            id: row.id,
            book_id: row.book_id,
            book_title: row.book_title,
            imprint: row.imprint,
            due_back: row.due_back,
            status: row.status,
            borrower_id: row.borrower_id,
            borrower: row.borrower_username,
        }
    }
}

/// Copy as listed on its book's page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CopyEntry {
    pub id: Uuid,
    pub imprint: String,
    pub status: LoanStatus,
    pub status_display: String,
    pub due_back: Option<NaiveDate>,
    pub is_overdue: bool,
}

impl CopyEntry {
    pub fn new(instance: BookInstance, today: NaiveDate) -> Self {
        Self {
            is_overdue: instance.is_overdue(today),
            status_display: instance.status.label().to_string(),
            id: instance.id,
            imprint: instance.imprint,
            status: instance.status,
            due_back: instance.due_back,
        }
    }
}

/// Renewal form. The date arrives as typed and is parsed by the view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RenewForm {
    #[serde(default)]
    pub due_back: String,
}

/// Staff form to add or edit a copy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct CopyForm {
    #[validate(length(min = 1, max = 200, message = "Enter an imprint of at most 200 characters"))]
    pub imprint: String,
    #[serde(default)]
    pub status: LoanStatus,
    #[serde(default)]
    pub due_back: Option<NaiveDate>,
    #[serde(default)]
    pub borrower: Option<i32>,
}

/// Copy form as submitted by the browser, every field kept as typed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CopyInput {
    pub imprint: String,
    /// One-letter status code, blank for maintenance
    pub status: String,
    pub due_back: String,
    /// Borrower user id, blank for none
    pub borrower: String,
}

impl CopyInput {
    /// Read the typed values; unreadable or missing fields become field errors
    pub fn parse(&self) -> Submission<CopyForm> {
        let mut errors = FormErrors::default();
        let form = CopyForm {
            imprint: errors.required("imprint", &self.imprint),
            status: errors.optional_choice("status", &self.status).unwrap_or_default(),
            due_back: errors.optional_date("due_back", &self.due_back),
            borrower: errors.optional_choice("borrower", &self.borrower),
        };
        errors.into_result()?;
        Ok(form)
    }
}

impl From<&BookInstanceRow> for CopyInput {
    fn from(row: &BookInstanceRow) -> Self {
        Self {
            imprint: row.imprint.clone(),
            status: row.status.code().to_string(),
            due_back: row
                .due_back
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            borrower: row.borrower_id.map(|id| id.to_string()).unwrap_or_default(),
        }
    }
}
