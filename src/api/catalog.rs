//! Public catalog pages: home page, book and author listings

use axum::{
    extract::{Query, State},
    response::Response,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{found, AppResult},
    models::{
        author::Author,
        book::{BookDetail, BookSummary},
        pagination::{AuthorPage, BookPage, Page, PageQuery},
    },
    services::catalog::{AuthorDetail, CatalogCounts},
    AppState,
};

use super::{today, BrowserSession, Path};

/// Home page context
#[derive(Serialize, ToSchema)]
pub struct IndexPage {
    #[serde(flatten)]
    pub counts: CatalogCounts,
    /// Visits from this browser before the current one
    pub num_visits: u64,
}

/// Site root
pub async fn root() -> Response {
    found("/catalog/")
}

/// Home page with record counts and the session visit counter
#[utoipa::path(
    get,
    path = "/catalog/",
    tag = "catalog",
    responses(
        (status = 200, description = "Catalog summary", body = IndexPage)
    )
)]
pub async fn index(
    State(state): State<AppState>,
    mut session: BrowserSession,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<IndexPage>)> {
    let counts = state.services.catalog.counts().await?;

    let num_visits = session.data.num_visits;
    session.data.num_visits += 1;
    let jar = session.save(&state, jar).await?;

    Ok((jar, Json(IndexPage { counts, num_visits })))
}

/// List books
#[utoipa::path(
    get,
    path = "/catalog/books/",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of books", body = BookPage),
        (status = 404, description = "No such page")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<BookSummary>>> {
    let page = state.services.catalog.list_books(query.page.as_deref()).await?;
    Ok(Json(page))
}

/// Book with its author, language, genres and copies
#[utoipa::path(
    get,
    path = "/catalog/books/{id}/",
    tag = "catalog",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookDetail),
        (status = 404, description = "Book not found")
    )
)]
pub async fn book_detail(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetail>> {
    let book = state.services.catalog.book_detail(id, today()).await?;
    Ok(Json(book))
}

/// List authors
#[utoipa::path(
    get,
    path = "/catalog/authors/",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of authors", body = AuthorPage),
        (status = 404, description = "No such page")
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Author>>> {
    let page = state.services.catalog.list_authors(query.page.as_deref()).await?;
    Ok(Json(page))
}

/// Author with their books
#[utoipa::path(
    get,
    path = "/catalog/authors/{id}/",
    tag = "catalog",
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author details", body = AuthorDetail),
        (status = 404, description = "Author not found")
    )
)]
pub async fn author_detail(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorDetail>> {
    let author = state.services.catalog.author_detail(id).await?;
    Ok(Json(author))
}

#[cfg(test)]
mod tests {
    use axum::http::{header, StatusCode};

    use crate::{
        api::testing::{anonymous_get, get, json, location, send, Mocks},
        services::sessions::SessionData,
    };

    fn counting(mocks: &mut Mocks) {
        mocks.books.expect_count().returning(|| Ok(1));
        mocks.books.expect_count_titles_with_word().returning(|| Ok(1));
        mocks.book_instances.expect_count().returning(|| Ok(3));
        mocks.book_instances.expect_count_with_status().returning(|_| Ok(1));
        mocks.authors.expect_count().returning(|| Ok(1));
        mocks.genres.expect_count().times(1).returning(|| Ok(2));
    }

    #[tokio::test]
    async fn root_redirects_to_catalog() {
        let response = send(Mocks::default().router(), anonymous_get("/")).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/catalog/");
    }

    #[tokio::test]
    async fn index_reports_counts_and_bumps_visits() {
        let mut mocks = Mocks::default();
        counting(&mut mocks);
        mocks.sessions.expect_load().returning(|_| {
            Ok(Some(SessionData {
                user_id: None,
                num_visits: 4,
            }))
        });
        mocks
            .sessions
            .expect_save()
            .withf(|token, data| token == "test-session-token" && data.num_visits == 5)
            .times(1)
            .returning(|_, _| Ok(()));

        let response = send(mocks.router(), get("/catalog/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["num_genres"], 2);
        assert_eq!(body["num_instances"], 3);
        assert_eq!(body["num_instances_available"], 1);
        assert_eq!(body["num_visits"], 4);
    }

    #[tokio::test]
    async fn first_visit_issues_a_session_cookie() {
        let mut mocks = Mocks::default();
        counting(&mut mocks);
        mocks
            .sessions
            .expect_save()
            .withf(|_, data| data.num_visits == 1)
            .returning(|_, _| Ok(()));

        let response = send(mocks.router(), anonymous_get("/catalog/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(cookie.starts_with("sessionid="));
        assert!(cookie.contains("HttpOnly"));
        assert_eq!(json(response).await["num_visits"], 0);
    }

    #[tokio::test]
    async fn author_list_rejects_out_of_range_page() {
        let mut mocks = Mocks::default();
        mocks.authors.expect_count().returning(|| Ok(13));
        mocks.authors.expect_list().never();

        let response = send(mocks.router(), anonymous_get("/catalog/authors/?page=3")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn book_list_serves_last_page() {
        let mut mocks = Mocks::default();
        mocks.books.expect_count().returning(|| Ok(13));
        mocks
            .books
            .expect_list()
            .withf(|limit, offset| *limit == 10 && *offset == 10)
            .returning(|_, _| Ok(Vec::new()));

        let response = send(mocks.router(), anonymous_get("/catalog/books/?page=last")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["number"], 2);
        assert_eq!(body["has_previous"], true);
    }

    #[tokio::test]
    async fn malformed_book_id_is_not_found() {
        let mut mocks = Mocks::default();
        mocks.books.expect_get_by_id().never();

        let response = send(mocks.router(), anonymous_get("/catalog/books/abc/")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json(response).await;
        assert!(body["message"].is_string());
    }
}
