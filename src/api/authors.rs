//! Author create, update and delete pages (librarians only)

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::Form;

use crate::{
    error::{found, AppResult},
    models::author::{Author, AuthorInput},
    AppState,
};

use super::{AuthorFormPage, FormPage, Librarian, Path};

/// Empty author form
#[utoipa::path(
    get,
    path = "/catalog/author/create/",
    tag = "authors",
    responses(
        (status = 200, description = "Author form", body = AuthorFormPage),
        (status = 302, description = "Not logged in"),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn create_page(_librarian: Librarian) -> Json<FormPage<AuthorInput>> {
    Json(FormPage::blank(AuthorInput::default()))
}

/// Create an author
#[utoipa::path(
    post,
    path = "/catalog/author/create/",
    tag = "authors",
    request_body(content = AuthorInput, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Created, redirect to the author page"),
        (status = 200, description = "Form with errors", body = AuthorFormPage),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    _librarian: Librarian,
    Form(input): Form<AuthorInput>,
) -> AppResult<Response> {
    let submitted = match input.parse() {
        Ok(form) => state.services.catalog.create_author(&form).await?,
        Err(errors) => Err(errors),
    };
    match submitted {
        Ok(author) => Ok(found(&author.url())),
        Err(errors) => Ok(Json(FormPage::invalid(input, errors)).into_response()),
    }
}

/// Author form filled with the current values
#[utoipa::path(
    get,
    path = "/catalog/author/{id}/update/",
    tag = "authors",
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author form", body = AuthorFormPage),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_page(
    State(state): State<AppState>,
    _librarian: Librarian,
    Path(id): Path<i32>,
) -> AppResult<Json<FormPage<AuthorInput>>> {
    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(FormPage::blank(AuthorInput::from(&author))))
}

/// Update an author
#[utoipa::path(
    post,
    path = "/catalog/author/{id}/update/",
    tag = "authors",
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    request_body(content = AuthorInput, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Updated, redirect to the author page"),
        (status = 200, description = "Form with errors", body = AuthorFormPage),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update(
    State(state): State<AppState>,
    _librarian: Librarian,
    Path(id): Path<i32>,
    Form(input): Form<AuthorInput>,
) -> AppResult<Response> {
    let submitted = match input.parse() {
        Ok(form) => state.services.catalog.update_author(id, &form).await?,
        Err(errors) => {
            state.services.catalog.get_author(id).await?;
            Err(errors)
        }
    };
    match submitted {
        Ok(author) => Ok(found(&author.url())),
        Err(errors) => Ok(Json(FormPage::invalid(input, errors)).into_response()),
    }
}

/// Deletion confirmation
#[utoipa::path(
    get,
    path = "/catalog/author/{id}/delete/",
    tag = "authors",
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author about to be deleted", body = Author),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_page(
    State(state): State<AppState>,
    _librarian: Librarian,
    Path(id): Path<i32>,
) -> AppResult<Json<Author>> {
    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(author))
}

/// Delete an author; their books stay, without an author
#[utoipa::path(
    post,
    path = "/catalog/author/{id}/delete/",
    tag = "authors",
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 302, description = "Deleted, redirect to the author list"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    _librarian: Librarian,
    Path(id): Path<i32>,
) -> AppResult<Response> {
    state.services.catalog.delete_author(id).await?;
    Ok(found("/catalog/authors/"))
}
