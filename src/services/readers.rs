//! Reader registry service

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Reader, ReaderInput},
    repository::Repository,
};

use super::{books::NameIndex, not_found, refuse, rules, rules::Rejection, WriteGate};

/// Book currently held by a reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BorrowedBook {
    pub id: Uuid,
    pub title: String,
    pub authors: Vec<String>,
}

/// Reader with the books they currently hold
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReaderDetails {
    #[serde(flatten)]
    pub reader: Reader,
    pub full_name: String,
    pub borrowed_books: Vec<BorrowedBook>,
}

/// Storage reports an email clash as a conflict; present it as the
/// validation failure the pre-check would have produced
fn email_conflict(error: AppError) -> AppError {
    match error {
        AppError::Conflict(_) => Rejection::DuplicateEmail.into(),
        other => other,
    }
}

#[derive(Clone)]
pub struct ReadersService {
    repository: Repository,
    gate: WriteGate,
}

impl ReadersService {
    pub(crate) fn new(repository: Repository, gate: WriteGate) -> Self {
        Self { repository, gate }
    }

    /// All readers by last name, then first name
    pub async fn list(&self) -> AppResult<Vec<Reader>> {
        let mut readers = self.repository.readers.list_all().await?;
        readers.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then_with(|| a.first_name.cmp(&b.first_name))
        });
        Ok(readers)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Reader> {
        self.repository
            .readers
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found("Reader", id))
    }

    /// Books the reader currently holds, by title
    pub async fn borrowed_books(&self, id: Uuid) -> AppResult<Vec<BorrowedBook>> {
        self.get(id).await?;

        let mut books = self.repository.books.list_by_reader_id(id).await?;
        books.sort_by(|a, b| a.title.cmp(&b.title));

        let authors = self.repository.authors.list_all().await?;
        let names = NameIndex::new(&authors, &[]);
        Ok(books
            .into_iter()
            .map(|b| BorrowedBook {
                authors: names.author_names(&b),
                id: b.id,
                title: b.title,
            })
            .collect())
    }

    pub async fn details(&self, id: Uuid) -> AppResult<ReaderDetails> {
        let reader = self.get(id).await?;
        let borrowed_books = self.borrowed_books(id).await?;
        Ok(ReaderDetails {
            full_name: reader.full_name(),
            reader,
            borrowed_books,
        })
    }

    pub async fn create(&self, input: ReaderInput) -> AppResult<Reader> {
        let _gate = self.gate.lock().await;
        let readers = self.repository.readers.list_all().await?;
        rules::check_reader_input(&input, &readers, None)?;

        let reader = Reader::new(input);
        self.repository
            .readers
            .add(&reader)
            .await
            .map_err(email_conflict)?;

        tracing::info!(reader_id = %reader.id, "Reader registered: {}", reader.full_name());
        Ok(reader)
    }

    /// Update the contact fields; the registration date is left as stored
    pub async fn update(&self, id: Uuid, input: ReaderInput) -> AppResult<Reader> {
        let _gate = self.gate.lock().await;
        let mut reader = self.get(id).await?;
        let readers = self.repository.readers.list_all().await?;
        rules::check_reader_input(&input, &readers, Some(id))?;

        reader.apply(input);
        self.repository
            .readers
            .update(&reader)
            .await
            .map_err(email_conflict)?;

        tracing::info!(reader_id = %id, "Reader updated");
        Ok(reader)
    }

    /// Delete a reader holding no books
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let _gate = self.gate.lock().await;
        self.get(id).await?;

        let held = self.repository.books.list_by_reader_id(id).await?;
        rules::can_delete_reader(id, &held).map_err(|r| refuse("delete reader", id, r))?;

        self.repository.readers.delete(id).await?;
        tracing::info!(reader_id = %id, "Reader deleted");
        Ok(())
    }
}
