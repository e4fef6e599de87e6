//! HTTP handlers for the catalog site

pub mod accounts;
pub mod authors;
pub mod books;
pub mod catalog;
pub mod genres;
pub mod health;
pub mod loans;
pub mod openapi;

use axum::{
    async_trait,
    extract::{rejection::PathRejection, FromRequestParts, OriginalUri},
    http::request::Parts,
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Serialize};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{
    config::SessionConfig,
    error::{AppError, AppResult},
    models::{
        author::AuthorInput,
        book_instance::CopyInput,
        form::FormErrors,
        genre::NameForm,
        user::{Capability, User},
    },
    services::sessions::{new_session_token, SessionData},
    AppState,
};

/// Form context: the values to show and the errors attached to them
#[derive(Debug, Serialize, ToSchema)]
#[aliases(AuthorFormPage = FormPage<AuthorInput>, CopyFormPage = FormPage<CopyInput>, NameFormPage = FormPage<NameForm>)]
pub struct FormPage<F> {
    pub form: F,
    pub errors: FormErrors,
}

impl<F> FormPage<F> {
    pub fn blank(form: F) -> Self {
        Self {
            form,
            errors: FormErrors::default(),
        }
    }

    pub fn invalid(form: F, errors: FormErrors) -> Self {
        Self { form, errors }
    }
}

/// Today's date in server local time, used for overdue flags and renewals
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Record id taken from the URL. An id that does not parse names no record.
pub struct Path<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Path(value)),
            Err(PathRejection::FailedToDeserializePathParams(e)) => {
                Err(AppError::NotFound(format!("No such page: {}", e.body_text())))
            }
            Err(e) => Err(AppError::Internal(e.body_text())),
        }
    }
}

/// Session bound to the browser's cookie. Missing or expired sessions start empty.
pub struct BrowserSession {
    pub token: Option<String>,
    pub data: SessionData,
}

impl BrowserSession {
    /// Persist the session, issuing a token when there is none yet
    pub async fn save(self, state: &AppState, jar: CookieJar) -> AppResult<CookieJar> {
        let token = self.token.unwrap_or_else(new_session_token);
        state.services.sessions.save(&token, &self.data).await?;
        Ok(jar.add(session_cookie(&state.config.session, token)))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for BrowserSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = jar
            .get(&state.config.session.cookie_name)
            .map(|cookie| cookie.value().to_string())
        else {
            return Ok(Self {
                token: None,
                data: SessionData::default(),
            });
        };

        match state.services.sessions.load(&token).await? {
            Some(data) => Ok(Self {
                token: Some(token),
                data,
            }),
            None => Ok(Self {
                token: None,
                data: SessionData::default(),
            }),
        }
    }
}

/// Cookie carrying the session token
pub fn session_cookie(config: &SessionConfig, token: String) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookie)
        .build()
}

/// Path and query of the request as the browser sent it
fn requested_path(parts: &Parts) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or(&parts.uri);
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string())
}

/// Logged-in user; anonymous visitors are sent to the login page
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let next = requested_path(parts);
        let session = BrowserSession::from_request_parts(parts, state).await?;

        let user = match session.data.user_id {
            Some(id) => state.services.users.get_active(id).await?,
            None => None,
        };

        user.map(CurrentUser)
            .ok_or(AppError::Unauthenticated { next })
    }
}

/// Logged-in user holding the librarian capability
pub struct Librarian(pub User);

#[async_trait]
impl FromRequestParts<AppState> for Librarian {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !user.has_capability(Capability::CanMarkReturned) {
            return Err(AppError::Forbidden(format!(
                "Permission '{}' required",
                Capability::CanMarkReturned
            )));
        }

        Ok(Librarian(user))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let site = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Accounts
        .route("/accounts/login/", get(accounts::login_page).post(accounts::login))
        .route("/accounts/logout/", post(accounts::logout))
        // Catalog pages
        .route("/", get(catalog::root))
        .route("/catalog/", get(catalog::index))
        .route("/catalog/books/", get(catalog::list_books))
        .route("/catalog/books/:id/", get(catalog::book_detail))
        .route("/catalog/authors/", get(catalog::list_authors))
        .route("/catalog/authors/:id/", get(catalog::author_detail))
        // Loans
        .route("/catalog/mybooks/", get(loans::my_borrowed))
        .route("/catalog/borrowed/", get(loans::all_borrowed))
        .route("/catalog/book/:id/renew/", get(loans::renew_page).post(loans::renew))
        .route("/catalog/book/:id/copies/", post(loans::create_copy))
        .route("/catalog/copy/:id/update/", get(loans::copy_page).post(loans::update_copy))
        // Authors
        .route("/catalog/author/create/", get(authors::create_page).post(authors::create))
        .route("/catalog/author/:id/update/", get(authors::update_page).post(authors::update))
        .route("/catalog/author/:id/delete/", get(authors::delete_page).post(authors::delete))
        // Books
        .route("/catalog/book/add/", get(books::create_page).post(books::create))
        .route("/catalog/book/:id/update/", get(books::update_page).post(books::update))
        .route("/catalog/book/:id/delete/", get(books::delete_page).post(books::delete))
        // Genres & languages
        .route("/catalog/genres/", get(genres::list_genres))
        .route("/catalog/genre/create/", post(genres::create_genre))
        .route("/catalog/languages/", get(genres::list_languages))
        .route("/catalog/language/create/", post(genres::create_language))
        .with_state(state);

    Router::new()
        .merge(site)
        .merge(openapi::create_openapi_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
