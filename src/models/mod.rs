//! Data models for BookLibrary

pub mod author;
pub mod book;
pub mod reader;

// Re-export commonly used types
pub use author::{Author, AuthorInput};
pub use book::{Book, BookInput, LoanStatus};
pub use reader::{Reader, ReaderInput};

/// `"{last} {first} {middle}"` with surrounding whitespace removed
pub(crate) fn full_name(last: &str, first: &str, middle: Option<&str>) -> String {
    format!("{} {} {}", last, first, middle.unwrap_or_default())
        .trim()
        .to_string()
}
