//! Page selection for list views

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{author::Author, book::BookSummary, book_instance::LoanEntry};
use crate::error::{AppError, AppResult};

/// Rows per page on every list view
pub const PAGE_SIZE: i64 = 10;

/// `?page=` query parameter: a 1-based number or `last`
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// A resolved, in-range page of a list with `total` rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: i64,
    pub num_pages: i64,
    pub per_page: i64,
    pub total: i64,
}

impl PageRequest {
    /// Resolve the requested page against the row count.
    ///
    /// An empty list still has one (empty) page. Anything that is not a
    /// number or `last`, or falls outside `1..=num_pages`, is a 404.
    pub fn resolve(raw: Option<&str>, total: i64, per_page: i64) -> AppResult<Self> {
        let num_pages = if total <= 0 { 1 } else { (total + per_page - 1) / per_page };

        let number = match raw.map(str::trim) {
            None | Some("") => 1,
            Some("last") => num_pages,
            Some(s) => s
                .parse::<i64>()
                .map_err(|_| AppError::NotFound("Page is not a number".to_string()))?,
        };

        if number < 1 || number > num_pages {
            return Err(AppError::NotFound(format!("Invalid page ({})", number)));
        }

        Ok(Self {
            number,
            num_pages,
            per_page,
            total: total.max(0),
        })
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }
}

/// One page of a list view
#[derive(Debug, Clone, Serialize, ToSchema)]
#[aliases(AuthorPage = Page<Author>, BookPage = Page<BookSummary>, LoanPage = Page<LoanEntry>)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub number: i64,
    pub num_pages: i64,
    pub per_page: i64,
    pub count: i64,
    pub is_paginated: bool,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn new(object_list: Vec<T>, request: &PageRequest) -> Self {
        Self {
            object_list,
            number: request.number,
            num_pages: request.num_pages,
            per_page: request.per_page,
            count: request.total,
            is_paginated: request.num_pages > 1,
            has_next: request.number < request.num_pages,
            has_previous: request.number > 1,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            object_list: self.object_list.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            per_page: self.per_page,
            count: self.count,
            is_paginated: self.is_paginated,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}
