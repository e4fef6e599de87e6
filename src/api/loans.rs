//! Borrowed-book lists, renewals and copy upkeep

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::Form;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{found, AppResult},
    models::{
        book::book_url,
        book_instance::{proposed_renewal_date, CopyInput, LoanEntry, RenewForm},
        form::FormErrors,
        pagination::{LoanPage, Page, PageQuery},
    },
    AppState,
};

use super::{today, CopyFormPage, CurrentUser, FormPage, Librarian, Path};

/// Renewal form context
#[derive(Serialize, ToSchema)]
pub struct RenewPage {
    pub instance: LoanEntry,
    pub form: RenewForm,
    pub errors: FormErrors,
}

/// Copies the current user has on loan
#[utoipa::path(
    get,
    path = "/catalog/mybooks/",
    tag = "loans",
    params(PageQuery),
    responses(
        (status = 200, description = "Copies borrowed by the current user", body = LoanPage),
        (status = 302, description = "Not logged in")
    )
)]
pub async fn my_borrowed(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<LoanEntry>>> {
    let page = state
        .services
        .loans
        .my_borrowed(user.id, query.page.as_deref(), today())
        .await?;
    Ok(Json(page))
}

/// Every copy on loan
#[utoipa::path(
    get,
    path = "/catalog/borrowed/",
    tag = "loans",
    params(PageQuery),
    responses(
        (status = 200, description = "All borrowed copies, soonest due first", body = LoanPage),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn all_borrowed(
    State(state): State<AppState>,
    _librarian: Librarian,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<LoanEntry>>> {
    let page = state
        .services
        .loans
        .all_borrowed(query.page.as_deref(), today())
        .await?;
    Ok(Json(page))
}

/// Renewal form proposing a due date three weeks out
#[utoipa::path(
    get,
    path = "/catalog/book/{id}/renew/",
    tag = "loans",
    params(
        ("id" = Uuid, Path, description = "Copy ID")
    ),
    responses(
        (status = 200, description = "Renewal form", body = RenewPage),
        (status = 302, description = "Not logged in"),
        (status = 403, description = "Missing permission"),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn renew_page(
    State(state): State<AppState>,
    _librarian: Librarian,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RenewPage>> {
    let today = today();
    let instance = state.services.loans.get_loan(id, today).await?;
    Ok(Json(RenewPage {
        instance,
        form: RenewForm {
            due_back: proposed_renewal_date(today).to_string(),
        },
        errors: FormErrors::default(),
    }))
}

/// Set a new due date
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/renew/",
    tag = "loans",
    params(
        ("id" = Uuid, Path, description = "Copy ID")
    ),
    request_body(content = RenewForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Renewed, redirect to all borrowed copies"),
        (status = 200, description = "Form with the rejection", body = RenewPage),
        (status = 403, description = "Missing permission"),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn renew(
    State(state): State<AppState>,
    _librarian: Librarian,
    Path(id): Path<Uuid>,
    Form(form): Form<RenewForm>,
) -> AppResult<Response> {
    let today = today();
    match state.services.loans.renew(id, &form, today).await? {
        Ok(_) => Ok(found("/catalog/borrowed/")),
        Err(errors) => {
            let instance = state.services.loans.get_loan(id, today).await?;
            Ok(Json(RenewPage { instance, form, errors }).into_response())
        }
    }
}

/// Add a copy of a book
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/copies/",
    tag = "loans",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body(content = CopyInput, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Created, redirect to the book page"),
        (status = 200, description = "Form with errors", body = CopyFormPage),
        (status = 404, description = "Book not found")
    )
)]
pub async fn create_copy(
    State(state): State<AppState>,
    _librarian: Librarian,
    Path(book_id): Path<i32>,
    Form(input): Form<CopyInput>,
) -> AppResult<Response> {
    let submitted = match input.parse() {
        Ok(form) => state.services.loans.create_copy(book_id, &form).await?,
        Err(errors) => {
            state.services.catalog.get_book(book_id).await?;
            Err(errors)
        }
    };
    match submitted {
        Ok(_) => Ok(found(&book_url(book_id))),
        Err(errors) => Ok(Json(FormPage::invalid(input, errors)).into_response()),
    }
}

/// Copy form filled with the current values
#[utoipa::path(
    get,
    path = "/catalog/copy/{id}/update/",
    tag = "loans",
    params(
        ("id" = Uuid, Path, description = "Copy ID")
    ),
    responses(
        (status = 200, description = "Copy form", body = CopyFormPage),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn copy_page(
    State(state): State<AppState>,
    _librarian: Librarian,
    Path(id): Path<Uuid>,
) -> AppResult<Json<FormPage<CopyInput>>> {
    let copy = state.services.loans.get_copy(id).await?;
    Ok(Json(FormPage::blank(CopyInput::from(&copy))))
}

/// Update a copy's imprint, status, borrower and due date
#[utoipa::path(
    post,
    path = "/catalog/copy/{id}/update/",
    tag = "loans",
    params(
        ("id" = Uuid, Path, description = "Copy ID")
    ),
    request_body(content = CopyInput, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Updated, redirect to the book page"),
        (status = 200, description = "Form with errors", body = CopyFormPage),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn update_copy(
    State(state): State<AppState>,
    _librarian: Librarian,
    Path(id): Path<Uuid>,
    Form(input): Form<CopyInput>,
) -> AppResult<Response> {
    let submitted = match input.parse() {
        Ok(form) => state.services.loans.update_copy(id, &form).await?,
        Err(errors) => {
            state.services.loans.get_copy(id).await?;
            Err(errors)
        }
    };
    match submitted {
        Ok(copy) => Ok(found(&book_url(copy.book_id))),
        Err(errors) => Ok(Json(FormPage::invalid(input, errors)).into_response()),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::{Duration, NaiveDate};
    use uuid::Uuid;

    use crate::{
        api::{
            testing::{anonymous_get, get, json, location, post_form, send, user, Mocks},
            today,
        },
        error::AppError,
        models::book_instance::{BookInstance, BookInstanceRow, LoanStatus},
    };

    fn on_loan(id: Uuid, due_back: Option<NaiveDate>) -> BookInstanceRow {
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

    fn known_copy(mocks: &mut Mocks, id: Uuid) {
        mocks
            .book_instances
            .expect_get_by_id()
            .returning(move |_| Ok(on_loan(id, Some(today() + Duration::days(5)))));
    }

    #[tokio::test]
    async fn anonymous_renewal_redirects_to_login_with_next() {
        let id = Uuid::new_v4();
        let path = format!("/catalog/book/{}/renew/", id);

        let response = send(Mocks::default().router(), anonymous_get(&path)).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            location(&response),
            format!("/accounts/login/?next={}", urlencoding::encode(&path))
        );
    }

    #[tokio::test]
    async fn renewal_without_permission_is_forbidden() {
        let mut mocks = Mocks::default().logged_in(user(1, &[]));
        mocks.book_instances.expect_get_by_id().never();

        let path = format!("/catalog/book/{}/renew/", Uuid::new_v4());
        let response = send(mocks.router(), get(&path)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn renewal_of_unknown_copy_is_not_found() {
        let mut mocks = Mocks::default().librarian();
        mocks
            .book_instances
            .expect_get_by_id()
            .returning(|id| Err(AppError::NotFound(format!("Book copy {} not found", id))));

        let path = format!("/catalog/book/{}/renew/", Uuid::new_v4());
        let response = send(mocks.router(), get(&path)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn renewal_form_proposes_three_weeks() {
        let id = Uuid::new_v4();
        let mut mocks = Mocks::default().librarian();
        known_copy(&mut mocks, id);

        let response = send(mocks.router(), get(&format!("/catalog/book/{}/renew/", id))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(
            body["form"]["due_back"],
            (today() + Duration::weeks(3)).to_string()
        );
        assert_eq!(body["instance"]["book_title"], "Book Title");
    }

    #[tokio::test]
    async fn valid_renewal_redirects_to_borrowed_list() {
        let id = Uuid::new_v4();
        let target = today() + Duration::weeks(2);
        let mut mocks = Mocks::default().librarian();
        known_copy(&mut mocks, id);
        mocks
            .book_instances
            .expect_set_due_back()
            .withf(move |copy, due| *copy == id && *due == target)
            .times(1)
            .returning(|_, _| Ok(()));

        let response = send(
            mocks.router(),
            post_form(&format!("/catalog/book/{}/renew/", id), &format!("due_back={}", target)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/catalog/borrowed/");
    }

    #[tokio::test]
    async fn past_renewal_re_renders_with_message() {
        let id = Uuid::new_v4();
        let mut mocks = Mocks::default().librarian();
        known_copy(&mut mocks, id);
        mocks.book_instances.expect_set_due_back().never();

        let yesterday = today() - Duration::days(1);
        let response = send(
            mocks.router(),
            post_form(&format!("/catalog/book/{}/renew/", id), &format!("due_back={}", yesterday)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["errors"]["due_back"][0], "Invalid date - renewal in past");
    }

    #[tokio::test]
    async fn far_renewal_re_renders_with_message() {
        let id = Uuid::new_v4();
        let mut mocks = Mocks::default().librarian();
        known_copy(&mut mocks, id);
        mocks.book_instances.expect_set_due_back().never();

        let too_far = today() + Duration::weeks(4) + Duration::days(1);
        let response = send(
            mocks.router(),
            post_form(&format!("/catalog/book/{}/renew/", id), &format!("due_back={}", too_far)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(
            body["errors"]["due_back"][0],
            "Invalid date - renewal more than 4 weeks ahead"
        );
    }

    #[tokio::test]
    async fn my_books_without_loans_is_an_empty_page() {
        let mut mocks = Mocks::default().logged_in(user(2, &[]));
        mocks
            .book_instances
            .expect_count_on_loan()
            .withf(|borrower| *borrower == Some(2))
            .returning(|_| Ok(0));
        mocks
            .book_instances
            .expect_list_on_loan()
            .returning(|_, _, _| Ok(Vec::new()));

        let response = send(mocks.router(), get("/catalog/mybooks/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["object_list"].as_array().map(Vec::len), Some(0));
        assert_eq!(body["is_paginated"], false);
    }

    #[tokio::test]
    async fn anonymous_my_books_redirects_to_login() {
        let response = send(Mocks::default().router(), anonymous_get("/catalog/mybooks/")).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/accounts/login/?next=%2Fcatalog%2Fmybooks%2F");
    }

    #[tokio::test]
    async fn borrowed_list_needs_permission() {
        let mocks = Mocks::default().logged_in(user(2, &[]));
        let response = send(mocks.router(), get("/catalog/borrowed/")).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn copy_update_redirects_to_book() {
        let id = Uuid::new_v4();
        let mut mocks = Mocks::default().librarian();
        known_copy(&mut mocks, id);
        mocks.book_instances.expect_update().times(1).returning(|id, form| {
            Ok(BookInstance {
                id,
                book_id: 1,
                imprint: form.imprint.clone(),
                due_back: form.due_back,
                status: form.status,
                borrower_id: form.borrower,
            })
        });

        let response = send(
            mocks.router(),
            post_form(
                &format!("/catalog/copy/{}/update/", id),
                "imprint=Second+printing&status=a&due_back=&borrower=",
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/catalog/books/1/");
    }

    #[tokio::test]
    async fn copy_update_with_unknown_status_re_renders_form() {
        let id = Uuid::new_v4();
        let mut mocks = Mocks::default().librarian();
        known_copy(&mut mocks, id);
        mocks.book_instances.expect_update().never();

        let response = send(
            mocks.router(),
            post_form(
                &format!("/catalog/copy/{}/update/", id),
                "imprint=Second+printing&status=x&due_back=12%2F10%2F2016&borrower=",
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert!(body["errors"]["status"].is_array());
        assert_eq!(body["errors"]["due_back"][0], "Enter a valid date.");
        assert_eq!(body["form"]["status"], "x");
    }

    #[tokio::test]
    async fn copy_page_prefills_codes_and_dates() {
        let id = Uuid::new_v4();
        let mut mocks = Mocks::default().librarian();
        known_copy(&mut mocks, id);

        let response = send(mocks.router(), get(&format!("/catalog/copy/{}/update/", id))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["form"]["status"], "o");
        assert_eq!(body["form"]["borrower"], "1");
        assert_eq!(body["form"]["due_back"], (today() + Duration::days(5)).to_string());
    }

    #[tokio::test]
    async fn malformed_copy_id_is_not_found() {
        let mut mocks = Mocks::default().librarian();
        mocks.book_instances.expect_get_by_id().never();

        let response = send(mocks.router(), get("/catalog/book/not-a-uuid/renew/")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_copy_id_still_asks_for_login() {
        let response = send(Mocks::default().router(), anonymous_get("/catalog/book/not-a-uuid/renew/")).await;
        assert_eq!(response.status(), StatusCode::FOUND);
    }
}
