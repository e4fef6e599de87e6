//! Loan management service: borrowed lists, renewals and copy upkeep

use chrono::NaiveDate;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        book_instance::{check_renewal_date, BookInstance, BookInstanceRow, CopyForm, LoanEntry, RenewForm},
        form::{FormErrors, Submission},
        pagination::{Page, PageRequest, PAGE_SIZE},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Copies on loan to one user, soonest due first
    pub async fn my_borrowed(&self, user_id: i32, page: Option<&str>, today: NaiveDate) -> AppResult<Page<LoanEntry>> {
        self.borrowed(Some(user_id), page, today).await
    }

    /// Every copy on loan, soonest due first
    pub async fn all_borrowed(&self, page: Option<&str>, today: NaiveDate) -> AppResult<Page<LoanEntry>> {
        self.borrowed(None, page, today).await
    }

    async fn borrowed(&self, borrower: Option<i32>, page: Option<&str>, today: NaiveDate) -> AppResult<Page<LoanEntry>> {
        let total = self.repository.book_instances.count_on_loan(borrower).await?;
        let request = PageRequest::resolve(page, total, PAGE_SIZE)?;
        let rows = self
            .repository
            .book_instances
            .list_on_loan(borrower, request.limit(), request.offset())
            .await?;
        Ok(Page::new(rows, &request).map(|row| LoanEntry::new(row, today)))
    }

    pub async fn get_loan(&self, id: Uuid, today: NaiveDate) -> AppResult<LoanEntry> {
        let row = self.repository.book_instances.get_by_id(id).await?;
        Ok(LoanEntry::new(row, today))
    }

    /// Move a copy's due date. The copy must exist before the date is looked at.
    pub async fn renew(&self, id: Uuid, form: &RenewForm, today: NaiveDate) -> AppResult<Submission<NaiveDate>> {
        let copy = self.repository.book_instances.get_by_id(id).await?;

        let mut errors = FormErrors::default();
        let Some(due_back) = errors.required_date("due_back", &form.due_back) else {
            return Ok(Err(errors));
        };
        if let Err(rejection) = check_renewal_date(due_back, today) {
            return Ok(Err(FormErrors::single("due_back", rejection.to_string())));
        }

        self.repository.book_instances.set_due_back(id, due_back).await?;
        tracing::info!("Renewed copy {} until {}", copy, due_back);
        Ok(Ok(due_back))
    }

    pub async fn get_copy(&self, id: Uuid) -> AppResult<BookInstanceRow> {
        self.repository.book_instances.get_by_id(id).await
    }

    /// Add a copy of an existing book
    pub async fn create_copy(&self, book_id: i32, form: &CopyForm) -> AppResult<Submission<BookInstance>> {
        self.repository.books.get_by_id(book_id).await?;
        if let Err(errors) = self.check_copy_form(form).await? {
            return Ok(Err(errors));
        }
        let copy = self.repository.book_instances.create(book_id, form).await?;
        tracing::info!("Added copy {} of book {}", copy.id, book_id);
        Ok(Ok(copy))
    }

    pub async fn update_copy(&self, id: Uuid, form: &CopyForm) -> AppResult<Submission<BookInstance>> {
        self.repository.book_instances.get_by_id(id).await?;
        if let Err(errors) = self.check_copy_form(form).await? {
            return Ok(Err(errors));
        }
        let copy = self.repository.book_instances.update(id, form).await?;
        tracing::info!("Updated copy {} ({})", copy.id, copy.status);
        Ok(Ok(copy))
    }

    async fn check_copy_form(&self, form: &CopyForm) -> AppResult<Result<(), FormErrors>> {
        let mut errors = match form.validate() {
            Ok(()) => FormErrors::default(),
            Err(e) => FormErrors::from(e),
        };
        if let Some(borrower) = form.borrower {
            if self.repository.users.find_by_id(borrower).await?.is_none() {
                errors.add("borrower", "Select a valid borrower");
            }
        }
        Ok(errors.into_result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        models::{
            book_instance::LoanStatus,
            form::{INVALID_DATE, REQUIRED},
        },
        repository::{
            authors::MockAuthorStore, book_instances::MockBookInstanceStore, books::MockBookStore,
            genres::{MockGenreStore, MockLanguageStore},
            users::MockUserStore,
        },
    };
    use chrono::Duration;
    use std::sync::Arc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn service(instances: MockBookInstanceStore) -> LoansService {
        LoansService::new(Repository {
            authors: Arc::new(MockAuthorStore::new()),
            books: Arc::new(MockBookStore::new()),
            book_instances: Arc::new(instances),
            genres: Arc::new(MockGenreStore::new()),
            languages: Arc::new(MockLanguageStore::new()),
            users: Arc::new(MockUserStore::new()),
        })
    }

    fn row(id: Uuid, due_back: Option<NaiveDate>) -> BookInstanceRow {
        BookInstanceRow {
            id,
            book_id: 1,
            book_title: "Book Title".into(),
            imprint: "Unlikely Imprint, 2016".into(),
            due_back,
            status: LoanStatus::OnLoan,
            borrower_id: Some(1),
            borrower_username: Some("testuser1".into()),
        }
    }

    fn instances_with(id: Uuid) -> MockBookInstanceStore {
        let mut instances = MockBookInstanceStore::new();
        instances
            .expect_get_by_id()
            .returning(move |_| Ok(row(id, Some(today()))));
        instances
    }

    #[tokio::test]
    async fn renew_within_window_saves() {
        let id = Uuid::new_v4();
        let target = today() + Duration::weeks(2);
        let mut instances = instances_with(id);
        instances
            .expect_set_due_back()
            .withf(move |copy, due| *copy == id && *due == target)
            .times(1)
            .returning(|_, _| Ok(()));

        let form = RenewForm { due_back: target.to_string() };
        let saved = service(instances).renew(id, &form, today()).await.unwrap();
        assert_eq!(saved, Ok(target));
    }

    #[tokio::test]
    async fn renew_in_past_is_rejected_without_saving() {
        let id = Uuid::new_v4();
        let mut instances = instances_with(id);
        instances.expect_set_due_back().never();

        let form = RenewForm { due_back: (today() - Duration::days(1)).to_string() };
        let errors = service(instances).renew(id, &form, today()).await.unwrap().unwrap_err();
        assert_eq!(errors.field("due_back"), ["Invalid date - renewal in past".to_string()]);
    }

    #[tokio::test]
    async fn renew_beyond_four_weeks_is_rejected() {
        let id = Uuid::new_v4();
        let mut instances = instances_with(id);
        instances.expect_set_due_back().never();

        let form = RenewForm { due_back: (today() + Duration::weeks(5)).to_string() };
        let errors = service(instances).renew(id, &form, today()).await.unwrap().unwrap_err();
        assert_eq!(
            errors.field("due_back"),
            ["Invalid date - renewal more than 4 weeks ahead".to_string()]
        );
    }

    #[tokio::test]
    async fn unreadable_date_is_a_field_error() {
        let id = Uuid::new_v4();
        let instances = instances_with(id);

        let form = RenewForm { due_back: "next tuesday".into() };
        let errors = service(instances).renew(id, &form, today()).await.unwrap().unwrap_err();
        assert_eq!(errors.field("due_back"), [INVALID_DATE.to_string()]);
    }

    #[tokio::test]
    async fn blank_date_is_required() {
        let id = Uuid::new_v4();
        let mut instances = instances_with(id);
        instances.expect_set_due_back().never();

        let form = RenewForm { due_back: "  ".into() };
        let errors = service(instances).renew(id, &form, today()).await.unwrap().unwrap_err();
        assert_eq!(errors.field("due_back"), [REQUIRED.to_string()]);
    }

    #[tokio::test]
    async fn unknown_copy_is_not_found_before_validation() {
        let mut instances = MockBookInstanceStore::new();
        instances
            .expect_get_by_id()
            .returning(|id| Err(AppError::NotFound(format!("Book copy {} not found", id))));

        let form = RenewForm { due_back: "garbage".into() };
        let result = service(instances).renew(Uuid::new_v4(), &form, today()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn borrowed_list_flags_overdue_copies() {
        let mut instances = MockBookInstanceStore::new();
        instances
            .expect_count_on_loan()
            .withf(|borrower| *borrower == Some(1))
            .returning(|_| Ok(2));
        instances.expect_list_on_loan().returning(|_, _, _| {
            Ok(vec![
                row(Uuid::new_v4(), Some(today() - Duration::days(3))),
                row(Uuid::new_v4(), Some(today() + Duration::days(3))),
            ])
        });

        let page = service(instances).my_borrowed(1, None, today()).await.unwrap();
        assert_eq!(page.count, 2);
        assert!(!page.is_paginated);
        assert!(page.object_list[0].is_overdue);
        assert!(!page.object_list[1].is_overdue);
    }

    #[tokio::test]
    async fn empty_borrowed_list_is_one_empty_page() {
        let mut instances = MockBookInstanceStore::new();
        instances.expect_count_on_loan().returning(|_| Ok(0));
        instances.expect_list_on_loan().returning(|_, _, _| Ok(Vec::new()));

        let page = service(instances).all_borrowed(None, today()).await.unwrap();
        assert!(page.object_list.is_empty());
        assert_eq!(page.num_pages, 1);
    }
}
