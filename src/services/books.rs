//! Book catalog service

use std::collections::HashMap;

use chrono::{Datelike, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Author, Book, BookInput, Reader},
    repository::Repository,
};

use super::{not_found, refuse, rules, WriteGate};

pub const UNKNOWN_AUTHOR: &str = "Unknown author";

/// Book with its authors' and current reader's names resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BookDetails {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub author_ids: Vec<Uuid>,
    /// Full names, in `author_ids` order
    pub authors: Vec<String>,
    pub publication_year: Option<i32>,
    pub isbn: Option<String>,
    pub current_reader_id: Option<Uuid>,
    pub current_reader_name: Option<String>,
}

/// Resolves ids to display names for a batch of books
pub(crate) struct NameIndex {
    authors: HashMap<Uuid, String>,
    readers: HashMap<Uuid, String>,
}

impl NameIndex {
    pub(crate) fn new(authors: &[Author], readers: &[Reader]) -> Self {
        Self {
            authors: authors.iter().map(|a| (a.id, a.full_name())).collect(),
            readers: readers.iter().map(|r| (r.id, r.full_name())).collect(),
        }
    }

    pub(crate) fn author_names(&self, book: &Book) -> Vec<String> {
        book.author_ids
            .iter()
            .map(|id| {
                self.authors
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string())
            })
            .collect()
    }

    pub(crate) fn details(&self, book: Book) -> BookDetails {
        let authors = self.author_names(&book);
        let current_reader_name = book
            .current_reader_id
            .and_then(|id| self.readers.get(&id).cloned());
        BookDetails {
            id: book.id,
            title: book.title,
            description: book.description,
            author_ids: book.author_ids,
            authors,
            publication_year: book.publication_year,
            isbn: book.isbn,
            current_reader_id: book.current_reader_id,
            current_reader_name,
        }
    }
}

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
    gate: WriteGate,
}

impl BooksService {
    pub(crate) fn new(repository: Repository, gate: WriteGate) -> Self {
        Self { repository, gate }
    }

    async fn names(&self) -> AppResult<NameIndex> {
        let authors = self.repository.authors.list_all().await?;
        let readers = self.repository.readers.list_all().await?;
        Ok(NameIndex::new(&authors, &readers))
    }

    async fn describe(&self, mut books: Vec<Book>) -> AppResult<Vec<BookDetails>> {
        books.sort_by(|a, b| a.title.cmp(&b.title));
        let names = self.names().await?;
        Ok(books.into_iter().map(|b| names.details(b)).collect())
    }

    /// All books by title
    pub async fn list(&self) -> AppResult<Vec<BookDetails>> {
        let books = self.repository.books.list_all().await?;
        self.describe(books).await
    }

    /// Books on the shelf, by title
    pub async fn available(&self) -> AppResult<Vec<BookDetails>> {
        let books = self
            .repository
            .books
            .list_all()
            .await?
            .into_iter()
            .filter(Book::is_available)
            .collect();
        self.describe(books).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Book> {
        self.repository
            .books
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found("Book", id))
    }

    pub async fn details(&self, id: Uuid) -> AppResult<BookDetails> {
        let book = self.get(id).await?;
        Ok(self.names().await?.details(book))
    }

    pub async fn create(&self, input: BookInput) -> AppResult<Book> {
        let _gate = self.gate.lock().await;
        let authors = self.repository.authors.list_all().await?;
        rules::check_book_input(&input, &authors, Utc::now().year())?;

        let book = Book::new(input);
        self.repository.books.add(&book).await?;

        tracing::info!(book_id = %book.id, "Book created: {}", book.title);
        Ok(book)
    }

    /// Update the catalog fields; the loan is left as stored
    pub async fn update(&self, id: Uuid, input: BookInput) -> AppResult<Book> {
        let _gate = self.gate.lock().await;
        let mut book = self.get(id).await?;
        let authors = self.repository.authors.list_all().await?;
        rules::check_book_input(&input, &authors, Utc::now().year())?;

        book.apply(input);
        self.repository.books.update(&book).await?;

        tracing::info!(book_id = %id, "Book updated");
        Ok(book)
    }

    /// Delete a book that is on the shelf
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let _gate = self.gate.lock().await;
        let book = self.get(id).await?;
        rules::can_delete_book(&book).map_err(|r| refuse("delete book", id, r))?;

        self.repository.books.delete(id).await?;
        tracing::info!(book_id = %id, "Book deleted");
        Ok(())
    }
}
