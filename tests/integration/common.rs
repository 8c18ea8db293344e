//! Shared test fixtures

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use booklibrary_server::{
    api::create_router,
    models::{AuthorInput, BookInput, ReaderInput},
    repository::{observer::TracingObserver, Repository},
    services::Services,
    AppConfig, AppState,
};

/// Services and router over JSON files in a fresh directory
pub struct TestApp {
    pub services: Services,
    pub router: Router,
    pub dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let repository = Repository::json(dir.path())
            .await
            .expect("Failed to open repository")
            .observed(Arc::new(TracingObserver));
        let services = Services::new(repository);
        let state = AppState {
            config: Arc::new(AppConfig::default()),
            services: Arc::new(services.clone()),
        };

        Self {
            services,
            router: create_router(state),
            dir,
        }
    }

    /// Send one request through the router; an empty body reads as `Null`
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(format!("/api/v1{}", uri));
        let request = match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
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
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response is not JSON")
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }
}

pub fn author_input(first: &str, last: &str) -> AuthorInput {
    AuthorInput {
        first_name: first.to_string(),
        last_name: last.to_string(),
        middle_name: None,
        date_of_birth: None,
    }
}

pub fn book_input(title: &str, author_ids: Vec<uuid::Uuid>) -> BookInput {
    BookInput {
        title: title.to_string(),
        description: None,
        author_ids,
        publication_year: None,
        isbn: None,
    }
}

pub fn reader_input(first: &str, last: &str, email: &str) -> ReaderInput {
    ReaderInput {
        first_name: first.to_string(),
        last_name: last.to_string(),
        middle_name: None,
        email: email.to_string(),
        phone_number: None,
    }
}
