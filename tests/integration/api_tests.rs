//! Live server tests
//!
//! Expect a server on localhost:8000 with a librarian account
//! `admin`/`admin`. Run with: cargo test -- --ignored

use reqwest::{redirect::Policy, Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8000";

fn client() -> Client {
    Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("Failed to build client")
}

/// Helper to get a librarian token
async fn get_auth_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/accounts/login/", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
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
async fn test_login_invalid_credentials() {
    let response = client()
        .post(format!("{}/accounts/login/", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_index_counts_visits() {
    let client = Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client");

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

    assert_eq!(
        second["num_visits"].as_i64().unwrap(),
        first["num_visits"].as_i64().unwrap() + 1
    );
    assert!(first["num_books"].is_i64());
}

#[tokio::test]
#[ignore]
async fn test_list_books() {
    let response = client()
        .get(format!("{}/catalog/books/?page=1", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert!(body["total"].is_number());
    assert_eq!(body["per_page"], 10);
}

#[tokio::test]
#[ignore]
async fn test_borrowed_requires_auth() {
    let response = client()
        .get(format!("{}/catalog/borrowed/", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_create_and_delete_author() {
    let client = client();
    let token = get_auth_token(&client).await;

    let created = client
        .post(format!("{}/catalog/author/create/", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "first_name": "Test",
            "last_name": "Author"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(created.status(), StatusCode::SEE_OTHER);

    let location = created
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("No location header")
        .to_string();

    let deleted = client
        .post(format!("{}{}/delete/", BASE_URL, location))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(deleted.status(), StatusCode::SEE_OTHER);
}
