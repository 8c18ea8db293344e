//! API integration tests

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::TestApp;

async fn create_author(app: &TestApp, first: &str, last: &str) -> String {
    let (status, body) = app
        .post("/authors", json!({ "first_name": first, "last_name": last }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

async fn create_book(app: &TestApp, title: &str, author_id: &str) -> String {
    let (status, body) = app
        .post("/books", json!({ "title": title, "author_ids": [author_id] }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

async fn create_reader(app: &TestApp, first: &str, last: &str, email: &str) -> (StatusCode, Value) {
    app.post(
        "/readers",
        json!({ "first_name": first, "last_name": last, "email": email }),
    )
    .await
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.get("/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_author_crud() {
    let app = TestApp::new().await;
    let id = create_author(&app, "Leo", "Tolstoy").await;

    let (status, body) = app.get(&format!("/authors/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["last_name"], "Tolstoy");

    let (status, body) = app
        .put(
            &format!("/authors/{}", id),
            json!({ "first_name": "Lev", "last_name": "Tolstoy", "middle_name": "Nikolayevich" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["first_name"], "Lev");

    let (status, _) = app.delete(&format!("/authors/{}", id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.get(&format!("/authors/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}

#[tokio::test]
async fn test_lists_are_sorted() {
    let app = TestApp::new().await;
    let tolstoy = create_author(&app, "Leo", "Tolstoy").await;
    create_author(&app, "Fyodor", "Dostoevsky").await;
    create_author(&app, "Anton", "Chekhov").await;

    let (_, body) = app.get("/authors").await;
    let last_names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["last_name"].as_str().unwrap())
        .collect();
    assert_eq!(last_names, vec!["Chekhov", "Dostoevsky", "Tolstoy"]);

    let (status, body) = app.get("/authors/options").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["full_name"], "Chekhov Anton");
    assert_eq!(body[2]["id"], tolstoy.as_str());

    create_book(&app, "War and Peace", &tolstoy).await;
    create_book(&app, "Anna Karenina", &tolstoy).await;
    let (_, body) = app.get("/books").await;
    assert_eq!(body[0]["title"], "Anna Karenina");
    assert_eq!(body[0]["authors"], json!(["Tolstoy Leo"]));
    assert_eq!(body[1]["title"], "War and Peace");
}

#[tokio::test]
async fn test_validation_errors_are_bad_requests() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post("/authors", json!({ "first_name": "  ", "last_name": "Tolstoy" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
    assert_eq!(body["fields"][0]["field"], "first_name");

    let (status, body) = app.post("/books", json!({ "title": "Orphan" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "author_ids");

    let (status, body) = create_reader(&app, "Anna", "Karenina", "not-an-email").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "email");
}

#[tokio::test]
async fn test_missing_keys_are_bad_requests() {
    let app = TestApp::new().await;

    let (status, body) = app.post("/authors", json!({ "last_name": "Tolstoy" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
    assert_eq!(body["fields"][0]["field"], "first_name");

    let author_id = create_author(&app, "Leo", "Tolstoy").await;
    let (status, body) = app.post("/books", json!({ "author_ids": [author_id] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "title");

    let (status, body) = app
        .post("/readers", json!({ "first_name": "Anna", "last_name": "Karenina" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "email");

    let (status, body) = create_reader(&app, "Anna", "Karenina", "anna@example.com").await;
    assert_eq!(status, StatusCode::CREATED);
    let reader_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .post(&format!("/readers/{}/borrow", reader_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
    assert_eq!(body["fields"][0]["field"], "book_id");

    let (status, body) = app
        .post(&format!("/readers/{}/return", reader_id), json!("not an object"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "body");
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let app = TestApp::new().await;

    let (status, _) = create_reader(&app, "Anna", "Karenina", "a@b.com").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = create_reader(&app, "Alexei", "Vronsky", "A@B.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "email");

    let (_, body) = app.get("/readers").await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_lending_over_http() {
    let app = TestApp::new().await;
    let author = create_author(&app, "Leo", "Tolstoy").await;
    let book = create_book(&app, "War and Peace", &author).await;
    let (_, reader) = create_reader(&app, "Anna", "Karenina", "a@b.com").await;
    let reader = reader["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .post(&format!("/readers/{}/borrow", reader), json!({ "book_id": book }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "borrowed");
    assert_eq!(body["book"]["current_reader_id"], reader.as_str());

    let (status, body) = app
        .post(&format!("/readers/{}/borrow", reader), json!({ "book_id": book }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "BookAlreadyBorrowed");

    let (_, body) = app.get(&format!("/readers/{}", reader)).await;
    assert_eq!(body["full_name"], "Karenina Anna");
    assert_eq!(body["borrowed_books"][0]["title"], "War and Peace");

    let (_, body) = app.get(&format!("/readers/{}/books", reader)).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = app.get("/books/available").await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, body) = app.delete(&format!("/books/{}", book)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "BookCheckedOut");

    let (status, body) = app.delete(&format!("/readers/{}", reader)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ReaderHasLoans");

    let (status, body) = app.delete(&format!("/authors/{}", author)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "AuthorHasBooks");

    let (status, body) = app
        .post(&format!("/readers/{}/return", reader), json!({ "book_id": book }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"]["current_reader_id"], Value::Null);

    let (status, _) = app.delete(&format!("/readers/{}", reader)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_missing_entities_are_not_found() {
    let app = TestApp::new().await;
    let missing = uuid::Uuid::new_v4();

    let (status, _) = app.get(&format!("/books/{}", missing)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&format!("/readers/{}", missing)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post(&format!("/readers/{}/return", missing), json!({ "book_id": missing }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_data_files_use_pascal_case() {
    let app = TestApp::new().await;
    create_author(&app, "Leo", "Tolstoy").await;

    let content = std::fs::read_to_string(app.dir.path().join("authors.json")).unwrap();
    assert!(content.contains("\"FirstName\": \"Leo\""), "{content}");
    assert!(content.contains("\"LastName\": \"Tolstoy\""), "{content}");
}
