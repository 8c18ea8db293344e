//! API handlers for BookLibrary REST endpoints

pub mod authors;
pub mod books;
pub mod health;
pub mod loans;
pub mod openapi;
pub mod readers;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, AppState};

/// JSON request body. A body that does not deserialize is answered with a
/// field-level validation error instead of axum's plain-text rejection.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ValidJson(value))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authors
        .route("/authors", get(authors::list_authors).post(authors::create_author))
        .route("/authors/options", get(authors::author_options))
        .route(
            "/authors/:id",
            get(authors::get_author)
                .put(authors::update_author)
                .delete(authors::delete_author),
        )
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route("/books/available", get(books::available_books))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        // Readers
        .route("/readers", get(readers::list_readers).post(readers::create_reader))
        .route(
            "/readers/:id",
            get(readers::get_reader)
                .put(readers::update_reader)
                .delete(readers::delete_reader),
        )
        .route("/readers/:id/books", get(readers::reader_books))
        // Loans
        .route("/readers/:id/borrow", post(loans::borrow_book))
        .route("/readers/:id/return", post(loans::return_book))
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
