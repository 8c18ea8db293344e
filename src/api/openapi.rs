//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{authors, books, health, loans, readers};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BookLibrary API",
        version = "1.0.0",
        description = "Authors, books, readers and lending REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Authors
        authors::list_authors,
        authors::author_options,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        // Books
        books::list_books,
        books::available_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Readers
        readers::list_readers,
        readers::get_reader,
        readers::reader_books,
        readers::create_reader,
        readers::update_reader,
        readers::delete_reader,
        // Loans
        loans::borrow_book,
        loans::return_book,
    ),
    components(
        schemas(
            // Authors
            crate::models::Author,
            crate::models::AuthorInput,
            crate::services::authors::AuthorOption,
            // Books
            crate::models::Book,
            crate::models::BookInput,
            crate::services::books::BookDetails,
            // Readers
            crate::models::Reader,
            crate::models::ReaderInput,
            crate::services::readers::ReaderDetails,
            crate::services::readers::BorrowedBook,
            // Loans
            loans::LoanRequest,
            loans::LoanResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
            crate::error::FieldError,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "authors", description = "Author management"),
        (name = "books", description = "Book catalog management"),
        (name = "readers", description = "Reader registry"),
        (name = "loans", description = "Borrowing and returning books")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
