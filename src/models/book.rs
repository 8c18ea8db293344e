//! Book model, loan status and related types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Full book model.
///
/// Authorship and the current loan are stored only here; an author's books
/// and a reader's borrowed books are derived from these fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub author_ids: Vec<Uuid>,
    pub publication_year: Option<i32>,
    pub isbn: Option<String>,
    /// Reader currently holding the book, `None` while on the shelf
    pub current_reader_id: Option<Uuid>,
}

/// Loan state of a single book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanStatus {
    Available,
    Borrowed(Uuid),
}

impl Book {
    /// Build a new, available book with a freshly assigned identity
    pub fn new(input: BookInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            author_ids: dedup(input.author_ids),
            publication_year: input.publication_year,
            isbn: input.isbn,
            current_reader_id: None,
        }
    }

    /// Overwrite the catalog fields. The loan state is left untouched.
    pub fn apply(&mut self, input: BookInput) {
        self.title = input.title;
        self.description = input.description;
        self.author_ids = dedup(input.author_ids);
        self.publication_year = input.publication_year;
        self.isbn = input.isbn;
    }

    pub fn loan_status(&self) -> LoanStatus {
        match self.current_reader_id {
            Some(reader_id) => LoanStatus::Borrowed(reader_id),
            None => LoanStatus::Available,
        }
    }

    pub fn is_available(&self) -> bool {
        self.current_reader_id.is_none()
    }

    pub fn has_author(&self, author_id: Uuid) -> bool {
        self.author_ids.contains(&author_id)
    }
}

/// Author ids form a set; keep first occurrence order
fn dedup(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

/// Create / update book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookInput {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub author_ids: Vec<Uuid>,
    #[validate(range(min = 1, message = "Publication year must be a valid year"))]
    pub publication_year: Option<i32>,
    pub isbn: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(author_ids: Vec<Uuid>) -> BookInput {
        BookInput {
            title: "War and Peace".to_string(),
            description: None,
            author_ids,
            publication_year: Some(1869),
            isbn: None,
        }
    }

    #[test]
    fn test_new_book_is_available() {
        let book = Book::new(input(vec![Uuid::new_v4()]));
        assert!(book.is_available());
        assert_eq!(book.loan_status(), LoanStatus::Available);
    }

    #[test]
    fn test_loan_status_borrowed() {
        let reader = Uuid::new_v4();
        let mut book = Book::new(input(vec![Uuid::new_v4()]));
        book.current_reader_id = Some(reader);
        assert_eq!(book.loan_status(), LoanStatus::Borrowed(reader));
    }

    #[test]
    fn test_apply_preserves_loan() {
        let reader = Uuid::new_v4();
        let mut book = Book::new(input(vec![Uuid::new_v4()]));
        book.current_reader_id = Some(reader);
        book.apply(input(vec![Uuid::new_v4()]));
        assert_eq!(book.current_reader_id, Some(reader));
    }

    #[test]
    fn test_author_ids_are_a_set() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let book = Book::new(input(vec![a, b, a]));
        assert_eq!(book.author_ids, vec![a, b]);
        assert!(book.has_author(b));
    }

    #[test]
    fn test_publication_year_range() {
        let mut bad = input(vec![Uuid::new_v4()]);
        bad.publication_year = Some(0);
        assert!(bad.validate().is_err());
        assert!(input(vec![]).validate().is_ok());
    }
}
