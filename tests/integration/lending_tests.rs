//! Catalog and lending rules exercised through the services

use booklibrary_server::{error::AppError, services::rules::Rejection};
use uuid::Uuid;

use crate::common::{author_input, book_input, reader_input, TestApp};

fn assert_rejected<T: std::fmt::Debug>(result: Result<T, AppError>, expected: Rejection) {
    match result {
        Err(AppError::BusinessRule(rejection)) => assert_eq!(rejection, expected),
        other => panic!("expected {:?}, got {:?}", expected, other),
    }
}

fn assert_invalid<T: std::fmt::Debug>(result: Result<T, AppError>, field: &str) {
    match result {
        Err(AppError::Validation(fields)) => {
            assert!(
                fields.iter().any(|f| f.field == field),
                "no error on {field}: {fields:?}"
            );
        }
        other => panic!("expected a validation error on {field}, got {:?}", other),
    }
}

#[tokio::test]
async fn test_book_requires_existing_authors() {
    let app = TestApp::new().await;
    let books = &app.services.books;

    assert_invalid(books.create(book_input("Orphan", vec![])).await, "author_ids");
    assert_invalid(
        books.create(book_input("Ghost", vec![Uuid::new_v4()])).await,
        "author_ids",
    );
    assert!(books.list().await.unwrap().is_empty());

    let tolstoy = app.services.authors.create(author_input("Leo", "Tolstoy")).await.unwrap();
    let book = books.create(book_input("War and Peace", vec![tolstoy.id])).await.unwrap();
    assert_eq!(book.author_ids, vec![tolstoy.id]);

    assert_invalid(books.update(book.id, book_input("War and Peace", vec![])).await, "author_ids");
    assert_eq!(books.get(book.id).await.unwrap().author_ids, vec![tolstoy.id]);
}

#[tokio::test]
async fn test_reader_email_is_unique_ignoring_case() {
    let app = TestApp::new().await;
    let readers = &app.services.readers;

    let anna = readers.create(reader_input("Anna", "Karenina", "a@b.com")).await.unwrap();
    assert_invalid(
        readers.create(reader_input("Alexei", "Vronsky", "A@B.com")).await,
        "email",
    );

    let vronsky = readers
        .create(reader_input("Alexei", "Vronsky", "v@b.com"))
        .await
        .unwrap();
    assert_invalid(
        readers
            .update(vronsky.id, reader_input("Alexei", "Vronsky", "a@B.COM"))
            .await,
        "email",
    );

    // Keeping one's own email is not a clash
    let renamed = readers
        .update(anna.id, reader_input("Anya", "Karenina", "A@b.com"))
        .await
        .unwrap();
    assert_eq!(renamed.first_name, "Anya");
    assert_eq!(renamed.registration_date, anna.registration_date);
    assert_eq!(readers.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_borrow_and_return_cycle() {
    let app = TestApp::new().await;
    let tolstoy = app.services.authors.create(author_input("Leo", "Tolstoy")).await.unwrap();
    let book = app
        .services
        .books
        .create(book_input("Anna Karenina", vec![tolstoy.id]))
        .await
        .unwrap();
    let anna = app
        .services
        .readers
        .create(reader_input("Anna", "Karenina", "a@b.com"))
        .await
        .unwrap();
    let loans = &app.services.loans;

    let borrowed = loans.borrow(anna.id, book.id).await.unwrap();
    assert_eq!(borrowed.current_reader_id, Some(anna.id));

    let held = app.services.readers.borrowed_books(anna.id).await.unwrap();
    assert_eq!(held.len(), 1);
    assert_eq!(held[0].authors, vec!["Tolstoy Leo"]);
    assert!(app.services.books.available().await.unwrap().is_empty());

    // Same reader, again
    assert_rejected(loans.borrow(anna.id, book.id).await, Rejection::BookAlreadyBorrowed);

    let returned = loans.return_book(anna.id, book.id).await.unwrap();
    assert_eq!(returned.current_reader_id, None);
    assert!(app.services.readers.borrowed_books(anna.id).await.unwrap().is_empty());
    assert_eq!(app.services.books.available().await.unwrap().len(), 1);

    assert_rejected(loans.return_book(anna.id, book.id).await, Rejection::BookNotBorrowed);
}

#[tokio::test]
async fn test_only_the_holder_can_return() {
    let app = TestApp::new().await;
    let tolstoy = app.services.authors.create(author_input("Leo", "Tolstoy")).await.unwrap();
    let book = app
        .services
        .books
        .create(book_input("Resurrection", vec![tolstoy.id]))
        .await
        .unwrap();
    let anna = app
        .services
        .readers
        .create(reader_input("Anna", "Karenina", "a@b.com"))
        .await
        .unwrap();
    let kitty = app
        .services
        .readers
        .create(reader_input("Kitty", "Shcherbatskaya", "k@b.com"))
        .await
        .unwrap();
    let loans = &app.services.loans;

    loans.borrow(anna.id, book.id).await.unwrap();
    assert_rejected(loans.borrow(kitty.id, book.id).await, Rejection::BookAlreadyBorrowed);
    assert_rejected(
        loans.return_book(kitty.id, book.id).await,
        Rejection::BorrowedBySomeoneElse,
    );

    let stored = app.services.books.get(book.id).await.unwrap();
    assert_eq!(stored.current_reader_id, Some(anna.id));
    assert!(app.services.readers.borrowed_books(kitty.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_loans_require_existing_reader_and_book() {
    let app = TestApp::new().await;
    let anna = app
        .services
        .readers
        .create(reader_input("Anna", "Karenina", "a@b.com"))
        .await
        .unwrap();

    assert!(matches!(
        app.services.loans.borrow(anna.id, Uuid::new_v4()).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        app.services.loans.borrow(Uuid::new_v4(), Uuid::new_v4()).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_update_keeps_current_loan() {
    let app = TestApp::new().await;
    let tolstoy = app.services.authors.create(author_input("Leo", "Tolstoy")).await.unwrap();
    let book = app
        .services
        .books
        .create(book_input("War and Peace", vec![tolstoy.id]))
        .await
        .unwrap();
    let anna = app
        .services
        .readers
        .create(reader_input("Anna", "Karenina", "a@b.com"))
        .await
        .unwrap();
    app.services.loans.borrow(anna.id, book.id).await.unwrap();

    let updated = app
        .services
        .books
        .update(book.id, book_input("War & Peace", vec![tolstoy.id]))
        .await
        .unwrap();
    assert_eq!(updated.title, "War & Peace");
    assert_eq!(updated.current_reader_id, Some(anna.id));
    assert_eq!(
        app.services.books.get(book.id).await.unwrap().current_reader_id,
        Some(anna.id)
    );
}

#[tokio::test]
async fn test_delete_guards() {
    let app = TestApp::new().await;
    let s = &app.services;
    let tolstoy = s.authors.create(author_input("Leo", "Tolstoy")).await.unwrap();
    let gogol = s.authors.create(author_input("Nikolai", "Gogol")).await.unwrap();
    let book = s
        .books
        .create(book_input("War and Peace", vec![tolstoy.id]))
        .await
        .unwrap();
    let anna = s.readers.create(reader_input("Anna", "Karenina", "a@b.com")).await.unwrap();

    // Author referenced by a book
    assert_rejected(s.authors.delete(tolstoy.id).await, Rejection::AuthorHasBooks);
    s.authors.delete(gogol.id).await.unwrap();

    s.loans.borrow(anna.id, book.id).await.unwrap();
    assert_rejected(s.books.delete(book.id).await, Rejection::BookCheckedOut);
    assert_rejected(s.readers.delete(anna.id).await, Rejection::ReaderHasLoans);

    s.loans.return_book(anna.id, book.id).await.unwrap();
    s.readers.delete(anna.id).await.unwrap();
    s.books.delete(book.id).await.unwrap();
    s.authors.delete(tolstoy.id).await.unwrap();

    assert!(s.authors.list().await.unwrap().is_empty());
    assert!(matches!(s.books.delete(book.id).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_library_walkthrough() {
    let app = TestApp::new().await;
    let s = &app.services;

    let tolstoy = s.authors.create(author_input("Leo", "Tolstoy")).await.unwrap();
    let book = s
        .books
        .create(book_input("War and Peace", vec![tolstoy.id]))
        .await
        .unwrap();
    let reader = s.readers.create(reader_input("Pierre", "Bezukhov", "a@b.com")).await.unwrap();

    s.loans.borrow(reader.id, book.id).await.unwrap();
    let details = s.books.details(book.id).await.unwrap();
    assert_eq!(details.authors, vec!["Tolstoy Leo"]);
    assert_eq!(details.current_reader_name.as_deref(), Some("Bezukhov Pierre"));

    assert_rejected(s.readers.delete(reader.id).await, Rejection::ReaderHasLoans);
    s.loans.return_book(reader.id, book.id).await.unwrap();
    s.readers.delete(reader.id).await.unwrap();

    // The address is free again once its reader is gone
    s.readers
        .create(reader_input("Natasha", "Rostova", "A@B.com"))
        .await
        .unwrap();
    assert_eq!(s.books.available().await.unwrap().len(), 1);
}
