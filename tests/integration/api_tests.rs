//! HTTP tests against a running server
//!
//! Expects a librarian account `admin` / `admin` (see `[bootstrap]` in the config).

use reqwest::{redirect::Policy, Client, StatusCode};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:8080";

/// Client that keeps the session cookie and shows redirects instead of following them
fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to build client")
}

/// Log the client in as the librarian
async fn login(client: &Client) {
    let response = client
        .post(format!("{}/accounts/login/", BASE_URL))
        .form(&[("username", "admin"), ("password", "admin"), ("next", "/catalog/")])
        .send()
        .await
        .expect("Failed to send login request");

    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let response = client()
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_index_counts_visits() {
    let client = client();

    let first: Value = client
        .get(format!("{}/catalog/", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let second: Value = client
        .get(format!("{}/catalog/", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    assert_eq!(first["num_visits"], 0);
    assert_eq!(second["num_visits"], 1);
    assert!(second["num_genres"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_anonymous_renewal_redirects_to_login() {
    let response = client()
        .get(format!(
            "{}/catalog/book/00000000-0000-0000-0000-000000000000/renew/",
            BASE_URL
        ))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers()["location"].to_str().unwrap_or_default();
    assert!(location.starts_with("/accounts/login/?next="));
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let response = client()
        .post(format!("{}/accounts/login/", BASE_URL))
        .form(&[("username", "admin"), ("password", "wrong")])
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["errors"]["__all__"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_librarian_renews_unknown_copy() {
    let client = client();
    login(&client).await;

    let response = client
        .get(format!(
            "{}/catalog/book/00000000-0000-0000-0000-000000000000/renew/",
            BASE_URL
        ))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_author_lifecycle() {
    let client = client();
    login(&client).await;

    let response = client
        .post(format!("{}/catalog/author/create/", BASE_URL))
        .form(&[
            ("first_name", "Christian"),
            ("last_name", "Surname"),
            ("date_of_birth", "1900-01-01"),
            ("date_of_death", ""),
        ])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FOUND);

    let author_url = response.headers()["location"]
        .to_str()
        .expect("Bad location header")
        .to_string();
    assert!(author_url.starts_with("/catalog/authors/"));

    let detail: Value = client
        .get(format!("{}{}", BASE_URL, author_url))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(detail["author"]["last_name"], "Surname");

    let id = detail["author"]["id"].as_i64().expect("No author id");
    let response = client
        .post(format!("{}/catalog/author/{}/delete/", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()["location"], "/catalog/authors/");
}
