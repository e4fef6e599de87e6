//! Genre and language reference lists (librarians only)

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::Form;

use crate::{
    error::AppResult,
    models::genre::{Genre, Language, NameForm},
    AppState,
};

use super::{FormPage, Librarian, NameFormPage};

/// List genres
#[utoipa::path(
    get,
    path = "/catalog/genres/",
    tag = "genres",
    responses(
        (status = 200, description = "All genres by name", body = Vec<Genre>),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn list_genres(State(state): State<AppState>, _librarian: Librarian) -> AppResult<Json<Vec<Genre>>> {
    Ok(Json(state.services.catalog.list_genres().await?))
}

/// Create a genre
#[utoipa::path(
    post,
    path = "/catalog/genre/create/",
    tag = "genres",
    request_body(content = NameForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Genre created", body = Genre),
        (status = 200, description = "Form with errors", body = NameFormPage)
    )
)]
pub async fn create_genre(
    State(state): State<AppState>,
    _librarian: Librarian,
    Form(form): Form<NameForm>,
) -> AppResult<Response> {
    match state.services.catalog.create_genre(&form).await? {
        Ok(genre) => Ok((StatusCode::CREATED, Json(genre)).into_response()),
        Err(errors) => Ok(Json(FormPage::invalid(form, errors)).into_response()),
    }
}

/// List languages
#[utoipa::path(
    get,
    path = "/catalog/languages/",
    tag = "genres",
    responses(
        (status = 200, description = "All languages by name", body = Vec<Language>),
        (status = 403, description = "Missing permission")
    )
)]
pub async fn list_languages(State(state): State<AppState>, _librarian: Librarian) -> AppResult<Json<Vec<Language>>> {
    Ok(Json(state.services.catalog.list_languages().await?))
}

/// Create a language
#[utoipa::path(
    post,
    path = "/catalog/language/create/",
    tag = "genres",
    request_body(content = NameForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Language created", body = Language),
        (status = 200, description = "Form with errors", body = NameFormPage)
    )
)]
pub async fn create_language(
    State(state): State<AppState>,
    _librarian: Librarian,
    Form(form): Form<NameForm>,
) -> AppResult<Response> {
    match state.services.catalog.create_language(&form).await? {
        Ok(language) => Ok((StatusCode::CREATED, Json(language)).into_response()),
        Err(errors) => Ok(Json(FormPage::invalid(form, errors)).into_response()),
    }
}
