//! Shared fixtures for router tests

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::Value;
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

use locallibrary_server::{
    api,
    config::AppConfig,
    models::{
        AuthorForm, BookForm, BookInstanceForm, CreateNamed, LoanStatus, Permission, User,
    },
    repository::Repository,
    sessions::memory::MemorySessionStore,
    AppState,
};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub librarian: User,
    pub librarian_token: String,
    pub reader: User,
    pub reader_token: String,
}

pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Response {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// Application over fresh in-memory stores with a librarian and a reader
pub async fn spawn() -> TestApp {
    let config = AppConfig::in_memory();
    let sessions = MemorySessionStore::new(config.sessions.ttl_seconds);
    let state = AppState::new(config, Repository::in_memory(), std::sync::Arc::new(sessions));

    let auth = &state.services.auth;
    let librarian = auth
        .create_user(
            "libby",
            "librarian-pw",
            "Libby",
            "Rarian",
            vec![Permission::CanMarkReturned],
        )
        .await
        .expect("Failed to create librarian");
    let reader = auth
        .create_user("rita", "reader-pw", "Rita", "Reader", vec![])
        .await
        .expect("Failed to create reader");
    let librarian_token = auth.issue_token(&librarian).expect("Failed to sign token");
    let reader_token = auth.issue_token(&reader).expect("Failed to sign token");

    TestApp {
        router: api::router(state.clone()),
        state,
        librarian,
        librarian_token,
        reader,
        reader_token,
    }
}

impl TestApp {
    /// Send a request, optionally authenticated and with a JSON body
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        self.send_with_headers(method, uri, token, body, &[]).await
    }

    pub async fn send_with_headers(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
        extra: &[(header::HeaderName, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        for (name, value) in extra {
            builder = builder.header(name.clone(), *value);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        Response {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
        self.send(Method::POST, uri, token, body).await
    }

    pub async fn genre(&self, name: &str) -> i32 {
        self.state
            .services
            .catalog
            .create_genre(CreateNamed { name: name.into() })
            .await
            .expect("Failed to create genre")
            .id
    }

    pub async fn author(&self, first_name: &str, last_name: &str) -> i32 {
        self.state
            .services
            .catalog
            .create_author(AuthorForm {
                first_name: first_name.into(),
                last_name: last_name.into(),
                date_of_birth: None,
                date_of_death: None,
            })
            .await
            .expect("Failed to create author")
            .id
    }

    pub async fn book(&self, title: &str, isbn: &str, author_id: Option<i32>) -> i32 {
        let genre_id = self.genre("General").await;
        self.state
            .services
            .catalog
            .create_book(BookForm {
                title: title.into(),
                author_id,
                summary: format!("About {}", title),
                isbn: isbn.into(),
                genre_ids: vec![genre_id],
                language_id: None,
            })
            .await
            .expect("Failed to create book")
            .id
    }

    pub async fn copy(
        &self,
        book_id: i32,
        status: LoanStatus,
        borrower_id: Option<i32>,
        due_back: Option<NaiveDate>,
    ) -> Uuid {
        self.state
            .services
            .catalog
            .create_instance(BookInstanceForm {
                book_id,
                imprint: "First edition".into(),
                status,
                due_back,
                borrower_id,
            })
            .await
            .expect("Failed to create copy")
            .id
    }
}
