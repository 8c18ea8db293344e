//! PostgreSQL repositories

use async_trait::async_trait;
use sqlx::{FromRow, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, Rejection},
    models::{Author, Book, Reader},
};

use super::{AuthorRepository, BookRepository, ReaderRepository};

const BOOK_SELECT: &str = r#"
    SELECT b.id, b.title, b.description, b.publication_year, b.isbn, b.current_reader_id,
           COALESCE(
               array_agg(ba.author_id) FILTER (WHERE ba.author_id IS NOT NULL),
               '{}'::uuid[]
           ) AS author_ids
    FROM books b
    LEFT JOIN book_authors ba ON ba.book_id = b.id
"#;

/// Translate constraint violations into application errors
fn map_write_error(e: sqlx::Error, entity: &str) -> AppError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() {
            return AppError::Conflict(format!("{} violates a uniqueness constraint", entity));
        }
        if db.is_foreign_key_violation() {
            return AppError::Conflict(format!("{} references a missing record", entity));
        }
    }
    AppError::Database(e)
}

#[derive(Clone)]
pub struct PgAuthorRepository {
    pool: Pool<Postgres>,
}

impl PgAuthorRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorRepository for PgAuthorRepository {
    async fn list_all(&self) -> AppResult<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>(
            "SELECT id, first_name, last_name, middle_name, date_of_birth FROM authors",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(authors)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(
            "SELECT id, first_name, last_name, middle_name, date_of_birth FROM authors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(author)
    }

    async fn add(&self, author: &Author) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO authors (id, first_name, last_name, middle_name, date_of_birth)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(author.id)
        .bind(&author.first_name)
        .bind(&author.last_name)
        .bind(&author.middle_name)
        .bind(author.date_of_birth)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Author"))?;
        Ok(())
    }

    async fn update(&self, author: &Author) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE authors
            SET first_name = $2, last_name = $3, middle_name = $4, date_of_birth = $5
            WHERE id = $1
            "#,
        )
        .bind(author.id)
        .bind(&author.first_name)
        .bind(&author.last_name)
        .bind(&author.middle_name)
        .bind(author.date_of_birth)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Author with id {} not found", author.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                // book_authors restricts deleting an author that still has books
                sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                    AppError::BusinessRule(Rejection::AuthorHasBooks)
                }
                other => AppError::Database(other),
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Author with id {} not found", id)));
        }
        Ok(())
    }
}

/// Internal row structure for book queries
#[derive(Debug, Clone, FromRow)]
struct BookRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    publication_year: Option<i32>,
    isbn: Option<String>,
    current_reader_id: Option<Uuid>,
    author_ids: Vec<Uuid>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            id: row.id,
            title: row.title,
            description: row.description,
            author_ids: row.author_ids,
            publication_year: row.publication_year,
            isbn: row.isbn,
            current_reader_id: row.current_reader_id,
        }
    }
}

#[derive(Clone)]
pub struct PgBookRepository {
    pool: Pool<Postgres>,
}

impl PgBookRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn link_authors(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        book: &Book,
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM book_authors WHERE book_id = $1")
            .bind(book.id)
            .execute(&mut **tx)
            .await?;

        sqlx::query(
            "INSERT INTO book_authors (book_id, author_id) SELECT $1, UNNEST($2::uuid[])",
        )
        .bind(book.id)
        .bind(book.author_ids.as_slice())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_write_error(e, "Book"))?;

        Ok(())
    }
}

#[async_trait]
impl BookRepository for PgBookRepository {
    async fn list_all(&self) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, BookRow>(&format!("{} GROUP BY b.id", BOOK_SELECT))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            "{} WHERE b.id = $1 GROUP BY b.id",
            BOOK_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Book::from))
    }

    async fn add(&self, book: &Book) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO books (id, title, description, publication_year, isbn, current_reader_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.description)
        .bind(book.publication_year)
        .bind(&book.isbn)
        .bind(book.current_reader_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "Book"))?;

        Self::link_authors(&mut tx, book).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, book: &Book) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = $2, description = $3, publication_year = $4, isbn = $5,
                current_reader_id = $6
            WHERE id = $1
            "#,
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.description)
        .bind(book.publication_year)
        .bind(&book.isbn)
        .bind(book.current_reader_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "Book"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", book.id)));
        }

        Self::link_authors(&mut tx, book).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        // book_authors rows go with the book (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    async fn list_by_reader_id(&self, reader_id: Uuid) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            "{} WHERE b.current_reader_id = $1 GROUP BY b.id",
            BOOK_SELECT
        ))
        .bind(reader_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Book::from).collect())
    }
}

#[derive(Clone)]
pub struct PgReaderRepository {
    pool: Pool<Postgres>,
}

impl PgReaderRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReaderRepository for PgReaderRepository {
    async fn list_all(&self) -> AppResult<Vec<Reader>> {
        let readers = sqlx::query_as::<_, Reader>(
            r#"
            SELECT id, first_name, last_name, middle_name, email, phone_number, registration_date
            FROM readers
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(readers)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Reader>> {
        let reader = sqlx::query_as::<_, Reader>(
            r#"
            SELECT id, first_name, last_name, middle_name, email, phone_number, registration_date
            FROM readers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(reader)
    }

    async fn add(&self, reader: &Reader) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO readers (id, first_name, last_name, middle_name, email, phone_number, registration_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(reader.id)
        .bind(&reader.first_name)
        .bind(&reader.last_name)
        .bind(&reader.middle_name)
        .bind(&reader.email)
        .bind(&reader.phone_number)
        .bind(reader.registration_date)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Reader"))?;
        Ok(())
    }

    async fn update(&self, reader: &Reader) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE readers
            SET first_name = $2, last_name = $3, middle_name = $4, email = $5, phone_number = $6
            WHERE id = $1
            "#,
        )
        .bind(reader.id)
        .bind(&reader.first_name)
        .bind(&reader.last_name)
        .bind(&reader.middle_name)
        .bind(&reader.email)
        .bind(&reader.phone_number)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Reader"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Reader with id {} not found", reader.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        // current_reader_id is ON DELETE SET NULL; the loan guard lives in the service
        let result = sqlx::query("DELETE FROM readers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Reader with id {} not found", id)));
        }
        Ok(())
    }
}
