//! Router tests against the in-memory backends

use axum::http::{header, Method, StatusCode};
use chrono::{Duration, NaiveDate, Utc};
use serde_json::json;

use locallibrary_server::models::LoanStatus;

use crate::common::spawn;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[tokio::test]
async fn root_redirects_to_catalog() {
    let app = spawn().await;
    let response = app.get("/", None).await;
    assert_eq!(response.status, StatusCode::PERMANENT_REDIRECT);
    assert_eq!(response.location(), Some("/catalog/"));
}

#[tokio::test]
async fn renewal_is_gated_before_validation() {
    let app = spawn().await;
    let book = app.book("Dune", "9780441013593", None).await;
    let copy = app
        .copy(book, LoanStatus::OnLoan, Some(app.reader.id), Some(today()))
        .await;
    let uri = format!("/catalog/book/{}/renew/", copy);
    let far = json!({ "renewal_date": (today() + Duration::days(400)).to_string() });

    let anonymous = app.get(&uri, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        anonymous.headers.get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );

    let anonymous_post = app.post(&uri, None, Some(far.clone())).await;
    assert_eq!(anonymous_post.status, StatusCode::UNAUTHORIZED);

    let reader = app.post(&uri, Some(&app.reader_token), Some(far)).await;
    assert_eq!(reader.status, StatusCode::FORBIDDEN);
    assert_eq!(reader.body["error"], "NotAuthorized");
}

#[tokio::test]
async fn renewal_form_proposes_three_weeks() {
    let app = spawn().await;
    let book = app.book("Dune", "9780441013593", None).await;
    let copy = app.copy(book, LoanStatus::OnLoan, None, None).await;

    let response = app
        .get(
            &format!("/catalog/book/{}/renew/", copy),
            Some(&app.librarian_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["form"]["renewal_date"],
        (today() + Duration::days(21)).to_string()
    );
    assert_eq!(response.body["form"]["errors"], json!({}));
    assert_eq!(response.body["book_instance"]["id"], copy.to_string());
    assert_eq!(response.body["book_instance"]["status"], "on_loan");
}

#[tokio::test]
async fn renewal_window_boundaries() {
    let app = spawn().await;
    let book = app.book("Dune", "9780441013593", None).await;
    let original_due = today() + Duration::days(2);
    let copy = app
        .copy(book, LoanStatus::OnLoan, Some(app.reader.id), Some(original_due))
        .await;
    let uri = format!("/catalog/book/{}/renew/", copy);
    let token = Some(app.librarian_token.as_str());

    for (offset, message) in [
        (29, "Invalid date - renewal more than 4 weeks ahead"),
        (-1, "Invalid date - renewal in past"),
    ] {
        let proposed = today() + Duration::days(offset);
        let response = app
            .post(&uri, token, Some(json!({ "renewal_date": proposed.to_string() })))
            .await;
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.body["form"]["errors"]["renewal_date"][0], message);
        assert_eq!(response.body["form"]["renewal_date"], proposed.to_string());
        assert_eq!(response.body["book_instance"]["due_back"], original_due.to_string());
    }

    let unchanged = app.state.services.catalog.get_instance(copy).await.unwrap();
    assert_eq!(unchanged.due_back, Some(original_due));

    for offset in [0, 28] {
        let proposed = today() + Duration::days(offset);
        let response = app
            .post(&uri, token, Some(json!({ "renewal_date": proposed.to_string() })))
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(response.location(), Some("/catalog/borrowed/"));

        let renewed = app.state.services.catalog.get_instance(copy).await.unwrap();
        assert_eq!(renewed.due_back, Some(proposed));
        assert_eq!(renewed.status, LoanStatus::OnLoan);
        assert_eq!(renewed.borrower_id, Some(app.reader.id));
    }
}

#[tokio::test]
async fn renewing_unknown_copy_is_not_found() {
    let app = spawn().await;
    let response = app
        .get(
            &format!("/catalog/book/{}/renew/", uuid::Uuid::new_v4()),
            Some(&app.librarian_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn my_books_lists_only_own_loans() {
    let app = spawn().await;
    let book = app.book("Dune", "9780441013593", None).await;
    let later = app
        .copy(book, LoanStatus::OnLoan, Some(app.reader.id), Some(today() + Duration::days(9)))
        .await;
    let overdue = app
        .copy(book, LoanStatus::OnLoan, Some(app.reader.id), Some(today() - Duration::days(3)))
        .await;
    app.copy(book, LoanStatus::Reserved, Some(app.reader.id), Some(today()))
        .await;
    app.copy(book, LoanStatus::OnLoan, Some(app.librarian.id), Some(today()))
        .await;

    assert_eq!(app.get("/catalog/mybooks/", None).await.status, StatusCode::UNAUTHORIZED);

    let mine = app.get("/catalog/mybooks/", Some(&app.reader_token)).await;
    assert_eq!(mine.status, StatusCode::OK);
    assert_eq!(mine.body["total"], 2);
    let items = mine.body["items"].as_array().unwrap();
    assert_eq!(items[0]["id"], overdue.to_string());
    assert_eq!(items[0]["is_overdue"], true);
    assert_eq!(items[1]["id"], later.to_string());
    assert_eq!(items[1]["is_overdue"], false);
    assert_eq!(items[0]["book_title"], "Dune");
}

#[tokio::test]
async fn all_borrowed_requires_librarian() {
    let app = spawn().await;
    let book = app.book("Dune", "9780441013593", None).await;
    app.copy(book, LoanStatus::OnLoan, Some(app.reader.id), Some(today()))
        .await;
    app.copy(book, LoanStatus::Available, None, None).await;

    let reader = app.get("/catalog/borrowed/", Some(&app.reader_token)).await;
    assert_eq!(reader.status, StatusCode::FORBIDDEN);

    let librarian = app.get("/catalog/borrowed/", Some(&app.librarian_token)).await;
    assert_eq!(librarian.status, StatusCode::OK);
    assert_eq!(librarian.body["total"], 1);
    assert_eq!(librarian.body["items"][0]["borrower"]["username"], "rita");
}

#[tokio::test]
async fn invalid_token_is_rejected() {
    let app = spawn().await;
    let response = app.get("/catalog/mybooks/", Some("not-a-token")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let malformed = app
        .send_with_headers(
            Method::GET,
            "/catalog/mybooks/",
            None,
            None,
            &[(header::AUTHORIZATION, "Basic Zm9vOmJhcg==")],
        )
        .await;
    assert_eq!(malformed.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn visit_counter_follows_session_cookie() {
    let app = spawn().await;
    let author = app.author("Frank", "Herbert").await;
    let book = app.book("Dune", "9780441013593", Some(author)).await;
    app.copy(book, LoanStatus::Available, None, None).await;
    app.copy(book, LoanStatus::OnLoan, Some(app.reader.id), Some(today()))
        .await;

    let first = app.get("/catalog/", None).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["num_visits"], 1);
    assert_eq!(first.body["num_books"], 1);
    assert_eq!(first.body["num_instances"], 2);
    assert_eq!(first.body["num_instances_available"], 1);
    assert_eq!(first.body["num_authors"], 1);

    let set_cookie = first
        .headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("session cookie issued");
    let cookie = set_cookie.split(';').next().unwrap().to_string();
    assert!(cookie.starts_with("sessionid="));

    for expected in [2, 3] {
        let again = app
            .send_with_headers(
                Method::GET,
                "/catalog/",
                None,
                None,
                &[(header::COOKIE, cookie.as_str())],
            )
            .await;
        assert_eq!(again.body["num_visits"], expected);
        assert!(again.headers.get(header::SET_COOKIE).is_none());
    }

    // Another browser starts over
    let other = app.get("/catalog/", None).await;
    assert_eq!(other.body["num_visits"], 1);
}

#[tokio::test]
async fn listings_paginate_by_ten() {
    let app = spawn().await;
    for i in 0..12 {
        app.author(&format!("First{:02}", i), &format!("Last{:02}", 11 - i))
            .await;
    }

    let first = app.get("/catalog/authors/", None).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["total"], 12);
    assert_eq!(first.body["per_page"], 10);
    assert_eq!(first.body["items"].as_array().unwrap().len(), 10);
    assert_eq!(first.body["items"][0]["last_name"], "Last00");

    let second = app.get("/catalog/authors/?page=2", None).await;
    assert_eq!(second.body["page"], 2);
    let items = second.body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1]["last_name"], "Last11");
}

#[tokio::test]
async fn out_of_range_pages_do_not_fail() {
    let app = spawn().await;
    let author = app.author("Ursula", "Le Guin").await;
    app.book("The Dispossessed", "9780060125639", Some(author)).await;

    let zero = app.get("/catalog/books/?page=0", None).await;
    assert_eq!(zero.status, StatusCode::OK);
    assert_eq!(zero.body["page"], 1);
    assert_eq!(zero.body["items"].as_array().unwrap().len(), 1);

    let huge = app
        .get(&format!("/catalog/books/?page={}", i64::MAX), None)
        .await;
    assert_eq!(huge.status, StatusCode::OK);
    assert_eq!(huge.body["total"], 1);
    assert!(huge.body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn book_detail_and_missing_book() {
    let app = spawn().await;
    let author = app.author("Frank", "Herbert").await;
    let book = app.book("Dune", "9780441013593", Some(author)).await;
    let copy = app.copy(book, LoanStatus::Available, None, None).await;

    let detail = app.get(&format!("/catalog/book/{}", book), None).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["author"]["last_name"], "Herbert");
    assert_eq!(detail.body["display_genre"], "General");
    assert_eq!(detail.body["copies"][0]["id"], copy.to_string());
    assert_eq!(detail.body["copies"][0]["status"], "available");

    let missing = app.get("/catalog/book/4242", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["error"], "NoSuchRecord");
}

#[tokio::test]
async fn book_create_checks_isbn() {
    let app = spawn().await;
    let genre = app.genre("Science Fiction").await;
    app.book("Dune", "9780441013593", None).await;
    let token = Some(app.librarian_token.as_str());
    let form = |isbn: &str| {
        json!({
            "title": "Children of Dune",
            "summary": "Leto and Ghanima",
            "isbn": isbn,
            "genre_ids": [genre],
        })
    };

    let anonymous = app.post("/catalog/book/create/", None, Some(form("9780441104024"))).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let duplicate = app.post("/catalog/book/create/", token, Some(form("9780441013593"))).await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let short = app.post("/catalog/book/create/", token, Some(form("978044"))).await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);

    let created = app.post("/catalog/book/create/", token, Some(form("9780441104024"))).await;
    assert_eq!(created.status, StatusCode::SEE_OTHER);
    let location = created.location().unwrap().to_string();
    assert!(location.starts_with("/catalog/book/"));
    assert_eq!(app.get(&location, None).await.body["title"], "Children of Dune");
}

#[tokio::test]
async fn book_with_copies_cannot_be_deleted() {
    let app = spawn().await;
    let b1 = app.book("B1", "9780000000001", None).await;
    app.copy(b1, LoanStatus::Available, None, None).await;
    app.copy(b1, LoanStatus::Maintenance, None, None).await;
    let token = Some(app.librarian_token.as_str());

    let refused = app.post(&format!("/catalog/book/{}/delete/", b1), token, None).await;
    assert_eq!(refused.status, StatusCode::CONFLICT);
    assert_eq!(refused.body["error"], "RecordInUse");
    let still_there = app.get(&format!("/catalog/book/{}", b1), None).await;
    assert_eq!(still_there.status, StatusCode::OK);
    assert_eq!(still_there.body["copies"].as_array().unwrap().len(), 2);

    let b2 = app.book("B2", "9780000000002", None).await;
    let deleted = app.post(&format!("/catalog/book/{}/delete/", b2), token, None).await;
    assert_eq!(deleted.status, StatusCode::SEE_OTHER);
    assert_eq!(deleted.location(), Some("/catalog/books/"));
    assert_eq!(
        app.get(&format!("/catalog/book/{}", b2), None).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn deleting_author_orphans_books() {
    let app = spawn().await;
    let author = app.author("Frank", "Herbert").await;
    let book = app.book("Dune", "9780441013593", Some(author)).await;

    let reader = app
        .post(&format!("/catalog/author/{}/delete/", author), Some(&app.reader_token), None)
        .await;
    assert_eq!(reader.status, StatusCode::FORBIDDEN);

    let deleted = app
        .post(
            &format!("/catalog/author/{}/delete/", author),
            Some(&app.librarian_token),
            None,
        )
        .await;
    assert_eq!(deleted.status, StatusCode::SEE_OTHER);
    assert_eq!(deleted.location(), Some("/catalog/authors/"));

    let detail = app.get(&format!("/catalog/book/{}", book), None).await;
    assert_eq!(detail.body["author"], serde_json::Value::Null);
    assert_eq!(detail.body["title"], "Dune");
}

#[tokio::test]
async fn author_create_and_update_redirect_to_author() {
    let app = spawn().await;
    let token = Some(app.librarian_token.as_str());
    let created = app
        .post(
            "/catalog/author/create/",
            token,
            Some(json!({ "first_name": "Octavia", "last_name": "Butler", "date_of_birth": "1947-06-22" })),
        )
        .await;
    assert_eq!(created.status, StatusCode::SEE_OTHER);
    let location = created.location().unwrap().to_string();

    let id = location.trim_start_matches("/catalog/author/");
    let updated = app
        .post(
            &format!("/catalog/author/{}/update/", id),
            token,
            Some(json!({
                "first_name": "Octavia E.",
                "last_name": "Butler",
                "date_of_birth": "1947-06-22",
                "date_of_death": "2006-02-24"
            })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::SEE_OTHER);
    assert_eq!(updated.location(), Some(location.as_str()));

    let detail = app.get(&location, None).await;
    assert_eq!(detail.body["first_name"], "Octavia E.");
    assert_eq!(detail.body["date_of_death"], "2006-02-24");
    assert_eq!(detail.body["books"], json!([]));
}

#[tokio::test]
async fn copies_can_change_to_any_status() {
    let app = spawn().await;
    let book = app.book("Dune", "9780441013593", None).await;
    let token = Some(app.librarian_token.as_str());

    let created = app
        .post(
            "/catalog/bookinstance/create/",
            token,
            Some(json!({ "book_id": book, "imprint": "Chilton, 1965" })),
        )
        .await;
    assert_eq!(created.status, StatusCode::SEE_OTHER);
    let detail = app.get(&format!("/catalog/book/{}", book), None).await;
    assert_eq!(detail.body["copies"][0]["status"], "maintenance");
    let copy = detail.body["copies"][0]["id"].as_str().unwrap().to_string();

    for status in ["reserved", "on_loan", "available", "maintenance"] {
        let updated = app
            .post(
                &format!("/catalog/bookinstance/{}/update/", copy),
                token,
                Some(json!({ "book_id": book, "imprint": "Chilton, 1965", "status": status })),
            )
            .await;
        assert_eq!(updated.status, StatusCode::SEE_OTHER);
    }

    let deleted = app
        .post(&format!("/catalog/bookinstance/{}/delete/", copy), token, None)
        .await;
    assert_eq!(deleted.status, StatusCode::SEE_OTHER);
    assert_eq!(deleted.location(), Some(format!("/catalog/book/{}", book).as_str()));
}

#[tokio::test]
async fn login_then_me() {
    let app = spawn().await;
    let bad = app
        .post(
            "/accounts/login/",
            None,
            Some(json!({ "username": "rita", "password": "wrong" })),
        )
        .await;
    assert_eq!(bad.status, StatusCode::UNAUTHORIZED);

    let login = app
        .post(
            "/accounts/login/",
            None,
            Some(json!({ "username": "libby", "password": "librarian-pw" })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["token_type"], "Bearer");
    let token = login.body["token"].as_str().unwrap().to_string();

    let me = app.get("/accounts/me/", Some(&token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["username"], "libby");
    assert_eq!(me.body["permissions"], json!(["can_mark_returned"]));
}

#[tokio::test]
async fn genres_list_and_create() {
    let app = spawn().await;
    let token = Some(app.librarian_token.as_str());

    let created = app
        .post("/catalog/genres/", token, Some(json!({ "name": "Poetry" })))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    app.post("/catalog/genres/", token, Some(json!({ "name": "Drama" })))
        .await;

    let listed = app.get("/catalog/genres/", None).await;
    let names: Vec<&str> = listed
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Drama", "Poetry"]);

    let forbidden = app
        .post("/catalog/languages/", Some(&app.reader_token), Some(json!({ "name": "French" })))
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn health_endpoints() {
    let app = spawn().await;
    assert_eq!(app.get("/health", None).await.body["status"], "healthy");
    assert_eq!(app.get("/ready", None).await.body["status"], "ready");
}
