//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{accounts, authors, books, catalog, genres, health, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Local Library Catalog",
        version = "0.3.0",
        description = "Library catalog: books, authors, copies and loans",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Accounts
        accounts::login_page,
        accounts::login,
        accounts::logout,
        // Catalog
        catalog::index,
        catalog::list_books,
        catalog::book_detail,
        catalog::list_authors,
        catalog::author_detail,
        // Loans
        loans::my_borrowed,
        loans::all_borrowed,
        loans::renew_page,
        loans::renew,
        loans::create_copy,
        loans::copy_page,
        loans::update_copy,
        // Authors
        authors::create_page,
        authors::create,
        authors::update_page,
        authors::update,
        authors::delete_page,
        authors::delete,
        // Books
        books::create_page,
        books::create,
        books::update_page,
        books::update,
        books::delete_page,
        books::delete,
        // Genres & languages
        genres::list_genres,
        genres::create_genre,
        genres::list_languages,
        genres::create_language,
    ),
    components(
        schemas(
            // Catalog
            crate::models::author::Author,
            crate::models::author::AuthorRef,
            crate::models::author::AuthorInput,
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::BookDetail,
            crate::models::book::BookInput,
            crate::models::genre::Genre,
            crate::models::genre::Language,
            crate::models::genre::NameForm,
            crate::models::pagination::AuthorPage,
            crate::models::pagination::BookPage,
            crate::services::catalog::CatalogCounts,
            crate::services::catalog::AuthorDetail,
            crate::services::catalog::BookChoices,
            catalog::IndexPage,
            books::BookFormPage,
            // Loans
            crate::models::book_instance::LoanStatus,
            crate::models::book_instance::LoanEntry,
            crate::models::book_instance::CopyEntry,
            crate::models::book_instance::RenewForm,
            crate::models::book_instance::CopyInput,
            crate::models::pagination::LoanPage,
            loans::RenewPage,
            // Forms
            crate::models::form::FormErrors,
            crate::api::AuthorFormPage,
            crate::api::CopyFormPage,
            crate::api::NameFormPage,
            // Accounts
            crate::models::user::LoginForm,
            accounts::LoginPage,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "accounts", description = "Login and logout"),
        (name = "catalog", description = "Public catalog pages"),
        (name = "loans", description = "Borrowed copies, renewals and copy upkeep"),
        (name = "authors", description = "Author management"),
        (name = "books", description = "Book management"),
        (name = "genres", description = "Genres and languages")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_renewal_route() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/catalog/book/{id}/renew/"));
        assert!(doc.paths.paths.contains_key("/catalog/"));
    }
}
