//! Loan management service

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Book, Reader},
    repository::Repository,
};

use super::{not_found, refuse, rules, WriteGate};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    gate: WriteGate,
}

impl LoansService {
    pub(crate) fn new(repository: Repository, gate: WriteGate) -> Self {
        Self { repository, gate }
    }

    async fn reader(&self, id: Uuid) -> AppResult<Reader> {
        self.repository
            .readers
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found("Reader", id))
    }

    async fn book(&self, id: Uuid) -> AppResult<Book> {
        self.repository
            .books
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found("Book", id))
    }

    /// Check a book out to a reader
    pub async fn borrow(&self, reader_id: Uuid, book_id: Uuid) -> AppResult<Book> {
        let _gate = self.gate.lock().await;
        self.reader(reader_id).await?;
        let mut book = self.book(book_id).await?;

        rules::can_borrow(&book).map_err(|r| refuse("borrow", book_id, r))?;

        book.current_reader_id = Some(reader_id);
        self.repository.books.update(&book).await?;

        tracing::info!(%reader_id, %book_id, "Book borrowed: {}", book.title);
        Ok(book)
    }

    /// Bring a book back from the reader holding it
    pub async fn return_book(&self, reader_id: Uuid, book_id: Uuid) -> AppResult<Book> {
        let _gate = self.gate.lock().await;
        self.reader(reader_id).await?;
        let mut book = self.book(book_id).await?;

        rules::can_return(&book, reader_id).map_err(|r| refuse("return", book_id, r))?;

        book.current_reader_id = None;
        self.repository.books.update(&book).await?;

        tracing::info!(%reader_id, %book_id, "Book returned: {}", book.title);
        Ok(book)
    }
}
