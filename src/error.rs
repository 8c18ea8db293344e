//! Error types for the BookLibrary server

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

static MISSING_FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"missing field `([^`]+)`").expect("missing-field pattern is valid"));

/// Stable error codes returned in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Failure,
    StorageFailure,
    NotFound,
    BadValue,
    Duplicate,
    AuthorHasBooks,
    BookCheckedOut,
    ReaderHasLoans,
    BookAlreadyBorrowed,
    BookNotBorrowed,
    BorrowedBySomeoneElse,
}

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Named refusal to perform a requested mutation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("At least one author must be selected")]
    NoAuthorsSelected,

    #[error("Unknown author(s): {}", join_ids(.0))]
    UnknownAuthors(Vec<Uuid>),

    #[error("A reader with this email is already registered")]
    DuplicateEmail,

    #[error("Author has books and cannot be deleted")]
    AuthorHasBooks,

    #[error("Book is checked out and cannot be deleted")]
    BookCheckedOut,

    #[error("Reader has outstanding loans and cannot be deleted")]
    ReaderHasLoans,

    #[error("Book is already borrowed")]
    BookAlreadyBorrowed,

    #[error("Book is not borrowed")]
    BookNotBorrowed,

    #[error("Book is borrowed by another reader")]
    BorrowedBySomeoneElse,
}

fn join_ids(ids: &[Uuid]) -> String {
    ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(", ")
}

impl Rejection {
    /// Input field the rejection is reported against, for rejections that
    /// surface as validation errors
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Rejection::NoAuthorsSelected | Rejection::UnknownAuthors(_) => Some("author_ids"),
            Rejection::DuplicateEmail => Some("email"),
            _ => None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Rejection::NoAuthorsSelected | Rejection::UnknownAuthors(_) => ErrorCode::BadValue,
            Rejection::DuplicateEmail => ErrorCode::Duplicate,
            Rejection::AuthorHasBooks => ErrorCode::AuthorHasBooks,
            Rejection::BookCheckedOut => ErrorCode::BookCheckedOut,
            Rejection::ReaderHasLoans => ErrorCode::ReaderHasLoans,
            Rejection::BookAlreadyBorrowed => ErrorCode::BookAlreadyBorrowed,
            Rejection::BookNotBorrowed => ErrorCode::BookNotBorrowed,
            Rejection::BorrowedBySomeoneElse => ErrorCode::BorrowedBySomeoneElse,
        }
    }

    pub(crate) fn into_field_error(self) -> FieldError {
        let field = self.field().unwrap_or("_");
        FieldError::new(field, self.to_string())
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {}", format_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("Business rule violation: {0}")]
    BusinessRule(Rejection),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

fn format_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl AppError {
    /// Shorthand for a single-field validation error
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError::new(field, message)])
    }
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        match rejection.field() {
            Some(field) => AppError::invalid(field, rejection.to_string()),
            None => AppError::BusinessRule(rejection),
        }
    }
}

/// A body that cannot be read as the expected payload is a validation
/// failure. A missing key is reported against that key, anything else
/// against `body`.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let detail = rejection.body_text();
        let field = MISSING_FIELD_RE
            .captures(&detail)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| "body".to_string());
        AppError::invalid(field, detail)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(field_errors(&errors))
    }
}

/// Flatten declarative validation failures into field errors, ordered by field
pub fn field_errors(errors: &validator::ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                FieldError::new(field.clone(), message)
            })
        })
        .collect();
    // field_errors() is backed by a HashMap
    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

/// Error response body
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, fields) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NotFound, msg, Vec::new()),
            AppError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                ErrorCode::BadValue,
                "Validation failed".to_string(),
                fields,
            ),
            AppError::BusinessRule(rejection) => (
                StatusCode::CONFLICT,
                rejection.code(),
                rejection.to_string(),
                Vec::new(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorCode::Duplicate, msg, Vec::new()),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::StorageFailure,
                    "Storage error".to_string(),
                    Vec::new(),
                )
            }
            AppError::Io(e) => {
                tracing::error!("Storage I/O error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::StorageFailure,
                    "Storage error".to_string(),
                    Vec::new(),
                )
            }
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::StorageFailure,
                    "Storage error".to_string(),
                    Vec::new(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                    Vec::new(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: format!("{:?}", code),
            message,
            fields,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
