//! Loan management endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::Book,
    AppState,
};

use super::ValidJson;

/// Borrow / return request
#[derive(Deserialize, ToSchema)]
pub struct LoanRequest {
    /// Book ID
    pub book_id: Uuid,
}

/// Loan operation result
#[derive(Serialize, ToSchema)]
pub struct LoanResponse {
    /// Status message
    pub status: String,
    /// Book after the operation
    pub book: Book,
}

/// Check a book out to a reader
#[utoipa::path(
    post,
    path = "/readers/{id}/borrow",
    tag = "loans",
    params(
        ("id" = Uuid, Path, description = "Reader ID")
    ),
    request_body = LoanRequest,
    responses(
        (status = 200, description = "Book borrowed", body = LoanResponse),
        (status = 404, description = "Reader or book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book already borrowed", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    Path(reader_id): Path<Uuid>,
    ValidJson(request): ValidJson<LoanRequest>,
) -> AppResult<Json<LoanResponse>> {
    let book = state.services.loans.borrow(reader_id, request.book_id).await?;

    Ok(Json(LoanResponse {
        status: "borrowed".to_string(),
        book,
    }))
}

/// Return a book held by a reader
#[utoipa::path(
    post,
    path = "/readers/{id}/return",
    tag = "loans",
    params(
        ("id" = Uuid, Path, description = "Reader ID")
    ),
    request_body = LoanRequest,
    responses(
        (status = 200, description = "Book returned", body = LoanResponse),
        (status = 404, description = "Reader or book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book not borrowed, or borrowed by another reader", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    Path(reader_id): Path<Uuid>,
    ValidJson(request): ValidJson<LoanRequest>,
) -> AppResult<Json<LoanResponse>> {
    let book = state
        .services
        .loans
        .return_book(reader_id, request.book_id)
        .await?;

    Ok(Json(LoanResponse {
        status: "returned".to_string(),
        book,
    }))
}
