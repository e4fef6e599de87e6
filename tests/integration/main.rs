//! Integration tests against a live PostgreSQL database and a running server
//!
//! Run with: cargo test --test integration -- --ignored

mod api_tests;
mod repository_tests;
