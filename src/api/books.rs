//! Book add, update and delete pages (librarians only)

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::Form;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{found, AppResult},
    models::{
        book::{book_url, generate_isbn, Book, BookInput},
        form::FormErrors,
    },
    services::catalog::BookChoices,
    AppState,
};

use super::{Librarian, Path};

/// Book form context, with the authors, languages and genres to pick from
#[derive(Serialize, ToSchema)]
pub struct BookFormPage {
    pub form: BookInput,
    pub choices: BookChoices,
    pub errors: FormErrors,
}

async fn form_page(state: &AppState, form: BookInput, errors: FormErrors) -> AppResult<Json<BookFormPage>> {
    let choices = state.services.catalog.book_choices().await?;
    Ok(Json(BookFormPage { form, choices, errors }))
}

/// Empty book form with a proposed ISBN
#[utoipa::path(
    get,
    path = "/catalog/book/add/",
    tag = "books",
    responses(
        (status = 200, description = "Book form", body = BookFormPage),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn create_page(State(state): State<AppState>, _librarian: Librarian) -> AppResult<Json<BookFormPage>> {
    let form = BookInput {
        isbn: generate_isbn(),
        ..Default::default()
    };
    form_page(&state, form, FormErrors::default()).await
}

/// Add a book
#[utoipa::path(
    post,
    path = "/catalog/book/add/",
    tag = "books",
    request_body(content = BookInput, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Created, redirect to the book page"),
        (status = 200, description = "Form with errors", body = BookFormPage),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    _librarian: Librarian,
    Form(input): Form<BookInput>,
) -> AppResult<Response> {
    let submitted = match input.parse() {
        Ok(form) => state.services.catalog.create_book(&form).await?,
        Err(errors) => Err(errors),
    };
    match submitted {
        Ok(book) => Ok(found(&book.url())),
        Err(errors) => Ok(form_page(&state, input, errors).await?.into_response()),
    }
}

/// Book form filled with the current values
#[utoipa::path(
    get,
    path = "/catalog/book/{id}/update/",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book form", body = BookFormPage),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_page(
    State(state): State<AppState>,
    _librarian: Librarian,
    Path(id): Path<i32>,
) -> AppResult<Json<BookFormPage>> {
    let form = state.services.catalog.book_form(id).await?;
    form_page(&state, BookInput::from(&form), FormErrors::default()).await
}

/// Update a book
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/update/",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body(content = BookInput, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Updated, redirect to the book page"),
        (status = 200, description = "Form with errors", body = BookFormPage),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update(
    State(state): State<AppState>,
    _librarian: Librarian,
    Path(id): Path<i32>,
    Form(input): Form<BookInput>,
) -> AppResult<Response> {
    let submitted = match input.parse() {
        Ok(form) => state.services.catalog.update_book(id, &form).await?,
        Err(errors) => {
            state.services.catalog.get_book(id).await?;
            Err(errors)
        }
    };
    match submitted {
        Ok(_) => Ok(found(&book_url(id))),
        Err(errors) => Ok(form_page(&state, input, errors).await?.into_response()),
    }
}

/// Deletion confirmation
#[utoipa::path(
    get,
    path = "/catalog/book/{id}/delete/",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book about to be deleted", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_page(
    State(state): State<AppState>,
    _librarian: Librarian,
    Path(id): Path<i32>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Delete a book that has no copies left
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/delete/",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 302, description = "Deleted, redirect to the book list"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book still has copies")
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    _librarian: Librarian,
    Path(id): Path<i32>,
) -> AppResult<Response> {
    state.services.catalog.delete_book(id).await?;
    Ok(found("/catalog/books/"))
}
