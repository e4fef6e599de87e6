//! Login and logout

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::{
    cookie::{Cookie, CookieJar},
    Form,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{found, AppResult},
    models::{form::FormErrors, user::LoginForm},
    services::sessions::SessionData,
    AppState,
};

use super::BrowserSession;

/// Where to land after login when no usable `next` was given
const DEFAULT_LANDING: &str = "/catalog/";

const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoginQuery {
    /// Page to return to after login
    pub next: Option<String>,
}

/// Login form context
#[derive(Serialize, ToSchema)]
pub struct LoginPage {
    pub username: String,
    pub next: Option<String>,
    pub errors: FormErrors,
}

/// Only same-site paths are followed after login
fn landing(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => path,
        _ => DEFAULT_LANDING,
    }
}

/// Login form
#[utoipa::path(
    get,
    path = "/accounts/login/",
    tag = "accounts",
    params(LoginQuery),
    responses(
        (status = 200, description = "Login form", body = LoginPage)
    )
)]
pub async fn login_page(Query(query): Query<LoginQuery>) -> Json<LoginPage> {
    Json(LoginPage {
        username: String::new(),
        next: query.next,
        errors: FormErrors::default(),
    })
}

/// Log in and start a fresh session
#[utoipa::path(
    post,
    path = "/accounts/login/",
    tag = "accounts",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Logged in, redirect to `next`"),
        (status = 200, description = "Bad credentials", body = LoginPage)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    session: BrowserSession,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let Some(user) = state
        .services
        .users
        .authenticate(&form.username, &form.password)
        .await?
    else {
        tracing::warn!("Failed login attempt for '{}'", form.username);
        return Ok(Json(LoginPage {
            username: form.username,
            next: form.next,
            errors: FormErrors::single("__all__", BAD_CREDENTIALS),
        })
        .into_response());
    };

    // New token on login; the visit counter survives
    if let Some(old) = &session.token {
        state.services.sessions.destroy(old).await?;
    }
    let fresh = BrowserSession {
        token: None,
        data: SessionData {
            user_id: Some(user.id),
            num_visits: session.data.num_visits,
        },
    };
    let jar = fresh.save(&state, jar).await?;

    tracing::info!("User '{}' logged in", user.username);
    Ok((jar, found(landing(form.next.as_deref()))).into_response())
}

/// Log out
#[utoipa::path(
    post,
    path = "/accounts/logout/",
    tag = "accounts",
    responses(
        (status = 302, description = "Session ended, redirect to the catalog")
    )
)]
pub async fn logout(State(state): State<AppState>, session: BrowserSession, jar: CookieJar) -> AppResult<Response> {
    if let Some(token) = &session.token {
        state.services.sessions.destroy(token).await?;
    }
    let jar = jar.remove(Cookie::build((state.config.session.cookie_name.clone(), "")).path("/"));
    Ok((jar, found(DEFAULT_LANDING)).into_response())
}
