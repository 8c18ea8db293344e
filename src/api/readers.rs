//! Reader endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Reader, ReaderInput},
    services::readers::{BorrowedBook, ReaderDetails},
    AppState,
};

use super::ValidJson;

/// List readers by last name, then first name
#[utoipa::path(
    get,
    path = "/readers",
    tag = "readers",
    responses(
        (status = 200, description = "List of readers", body = Vec<Reader>)
    )
)]
pub async fn list_readers(State(state): State<AppState>) -> AppResult<Json<Vec<Reader>>> {
    let readers = state.services.readers.list().await?;
    Ok(Json(readers))
}

/// Get reader with borrowed books
#[utoipa::path(
    get,
    path = "/readers/{id}",
    tag = "readers",
    params(
        ("id" = Uuid, Path, description = "Reader ID")
    ),
    responses(
        (status = 200, description = "Reader details", body = ReaderDetails),
        (status = 404, description = "Reader not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_reader(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ReaderDetails>> {
    let reader = state.services.readers.details(id).await?;
    Ok(Json(reader))
}

/// Books currently held by a reader
#[utoipa::path(
    get,
    path = "/readers/{id}/books",
    tag = "readers",
    params(
        ("id" = Uuid, Path, description = "Reader ID")
    ),
    responses(
        (status = 200, description = "Borrowed books", body = Vec<BorrowedBook>),
        (status = 404, description = "Reader not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn reader_books(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<BorrowedBook>>> {
    let books = state.services.readers.borrowed_books(id).await?;
    Ok(Json(books))
}

/// Register a new reader
#[utoipa::path(
    post,
    path = "/readers",
    tag = "readers",
    request_body = ReaderInput,
    responses(
        (status = 201, description = "Reader registered", body = Reader),
        (status = 400, description = "Invalid input or email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_reader(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<ReaderInput>,
) -> AppResult<(StatusCode, Json<Reader>)> {
    let reader = state.services.readers.create(input).await?;
    Ok((StatusCode::CREATED, Json(reader)))
}

/// Update a reader
#[utoipa::path(
    put,
    path = "/readers/{id}",
    tag = "readers",
    params(
        ("id" = Uuid, Path, description = "Reader ID")
    ),
    request_body = ReaderInput,
    responses(
        (status = 200, description = "Reader updated", body = Reader),
        (status = 400, description = "Invalid input or email already registered", body = crate::error::ErrorResponse),
        (status = 404, description = "Reader not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_reader(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidJson(input): ValidJson<ReaderInput>,
) -> AppResult<Json<Reader>> {
    let reader = state.services.readers.update(id, input).await?;
    Ok(Json(reader))
}

/// Delete a reader
#[utoipa::path(
    delete,
    path = "/readers/{id}",
    tag = "readers",
    params(
        ("id" = Uuid, Path, description = "Reader ID")
    ),
    responses(
        (status = 204, description = "Reader deleted"),
        (status = 404, description = "Reader not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Reader has outstanding loans", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_reader(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.readers.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
