//! Guard predicates for catalog, reader and lending operations.
//!
//! Every function here is pure: it looks at a snapshot of repository data and
//! answers whether a mutation is allowed. Call sites in the sibling services
//! perform the mutation only after the guard passes.

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{field_errors, AppError, AppResult, FieldError},
    models::{Author, AuthorInput, Book, BookInput, LoanStatus, Reader, ReaderInput},
};

pub use crate::error::Rejection;

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 ()\-.]{4,24}$").expect("phone pattern is valid"));

/// Accumulates field errors for one input
struct Checks(Vec<FieldError>);

impl Checks {
    fn declared(input: &impl Validate) -> Self {
        match input.validate() {
            Ok(()) => Checks(Vec::new()),
            Err(errors) => Checks(field_errors(&errors)),
        }
    }

    fn has(&self, field: &str) -> bool {
        self.0.iter().any(|f| f.field == field)
    }

    /// Blank strings pass a `length(min = 1)` check; catch them here
    fn require_text(&mut self, field: &str, value: &str, message: &str) {
        if value.trim().is_empty() && !self.has(field) {
            self.0.push(FieldError::new(field, message));
        }
    }

    fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    fn finish(self) -> AppResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.0))
        }
    }
}

/// Validate an author payload
pub fn check_author_input(input: &AuthorInput) -> AppResult<()> {
    let mut checks = Checks::declared(input);
    checks.require_text("first_name", &input.first_name, "First name is required");
    checks.require_text("last_name", &input.last_name, "Last name is required");
    checks.finish()
}

/// Validate a book payload against the existing authors.
///
/// `current_year` bounds the publication year.
pub fn check_book_input(input: &BookInput, authors: &[Author], current_year: i32) -> AppResult<()> {
    let mut checks = Checks::declared(input);
    checks.require_text("title", &input.title, "Title is required");

    if let Some(year) = input.publication_year {
        if year > current_year && !checks.has("publication_year") {
            checks.push(FieldError::new(
                "publication_year",
                "Publication year must be a valid year",
            ));
        }
    }

    if let Err(rejection) = ensure_authors_exist(&input.author_ids, authors) {
        checks.push(rejection.into_field_error());
    }

    checks.finish()
}

/// Validate a reader payload. `reader_id` is the reader being updated, if any,
/// so that it does not collide with its own email.
pub fn check_reader_input(
    input: &ReaderInput,
    readers: &[Reader],
    reader_id: Option<Uuid>,
) -> AppResult<()> {
    let mut checks = Checks::declared(input);
    checks.require_text("first_name", &input.first_name, "First name is required");
    checks.require_text("last_name", &input.last_name, "Last name is required");
    checks.require_text("email", &input.email, "Email is required");

    if let Some(ref phone) = input.phone_number {
        if !phone.trim().is_empty() && !PHONE_RE.is_match(phone.trim()) {
            checks.push(FieldError::new("phone_number", "Invalid phone number format"));
        }
    }

    if !checks.has("email") {
        if let Err(rejection) = ensure_unique_email(&input.email, readers, reader_id) {
            checks.push(rejection.into_field_error());
        }
    }

    checks.finish()
}

/// At least one author, and every referenced author exists
pub fn ensure_authors_exist(author_ids: &[Uuid], authors: &[Author]) -> Result<(), Rejection> {
    if author_ids.is_empty() {
        return Err(Rejection::NoAuthorsSelected);
    }
    let unknown: Vec<Uuid> = author_ids
        .iter()
        .filter(|id| !authors.iter().any(|a| a.id == **id))
        .copied()
        .collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(Rejection::UnknownAuthors(unknown))
    }
}

/// Case-insensitive email uniqueness among all readers other than `reader_id`
pub fn ensure_unique_email(
    email: &str,
    readers: &[Reader],
    reader_id: Option<Uuid>,
) -> Result<(), Rejection> {
    let taken = readers
        .iter()
        .filter(|r| Some(r.id) != reader_id)
        .any(|r| r.has_email(email));
    if taken {
        Err(Rejection::DuplicateEmail)
    } else {
        Ok(())
    }
}

pub fn can_delete_author(author_id: Uuid, books: &[Book]) -> Result<(), Rejection> {
    if books.iter().any(|b| b.has_author(author_id)) {
        Err(Rejection::AuthorHasBooks)
    } else {
        Ok(())
    }
}

pub fn can_delete_book(book: &Book) -> Result<(), Rejection> {
    match book.loan_status() {
        LoanStatus::Available => Ok(()),
        LoanStatus::Borrowed(_) => Err(Rejection::BookCheckedOut),
    }
}

/// `held` are the books whose current reader is this reader
pub fn can_delete_reader(reader_id: Uuid, held: &[Book]) -> Result<(), Rejection> {
    if held.iter().any(|b| b.current_reader_id == Some(reader_id)) {
        Err(Rejection::ReaderHasLoans)
    } else {
        Ok(())
    }
}

/// Available → Borrowed(reader)
pub fn can_borrow(book: &Book) -> Result<(), Rejection> {
    match book.loan_status() {
        LoanStatus::Available => Ok(()),
        LoanStatus::Borrowed(_) => Err(Rejection::BookAlreadyBorrowed),
    }
}

/// Borrowed(reader) → Available
pub fn can_return(book: &Book, reader_id: Uuid) -> Result<(), Rejection> {
    match book.loan_status() {
        LoanStatus::Available => Err(Rejection::BookNotBorrowed),
        LoanStatus::Borrowed(holder) if holder == reader_id => Ok(()),
        LoanStatus::Borrowed(_) => Err(Rejection::BorrowedBySomeoneElse),
    }
}
