//! Repository layer: storage contracts and their backends

pub mod json;
pub mod observer;
pub mod postgres;

use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Author, Book, Reader},
};

use self::observer::{Observed, RepositoryObserver};

/// Author storage.
///
/// `add` rejects an identity that already exists with `AppError::Conflict`;
/// `update` and `delete` report a missing identity with `AppError::NotFound`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    async fn list_all(&self) -> AppResult<Vec<Author>>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Author>>;
    async fn add(&self, author: &Author) -> AppResult<()>;
    async fn update(&self, author: &Author) -> AppResult<()>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

/// Book storage, including author links and the current loan
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn list_all(&self) -> AppResult<Vec<Book>>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Book>>;
    async fn add(&self, book: &Book) -> AppResult<()>;
    async fn update(&self, book: &Book) -> AppResult<()>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
    /// Books currently checked out to the reader
    async fn list_by_reader_id(&self, reader_id: Uuid) -> AppResult<Vec<Book>>;
}

/// Reader storage. Email is unique case-insensitively; a clash on `add` or
/// `update` is reported as `AppError::Conflict`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReaderRepository: Send + Sync {
    async fn list_all(&self) -> AppResult<Vec<Reader>>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Reader>>;
    async fn add(&self, reader: &Reader) -> AppResult<()>;
    /// Registration date is never changed by an update
    async fn update(&self, reader: &Reader) -> AppResult<()>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

/// Main repository struct holding one store per entity
#[derive(Clone)]
pub struct Repository {
    pub authors: Arc<dyn AuthorRepository>,
    pub books: Arc<dyn BookRepository>,
    pub readers: Arc<dyn ReaderRepository>,
}

impl Repository {
    pub fn new(
        authors: Arc<dyn AuthorRepository>,
        books: Arc<dyn BookRepository>,
        readers: Arc<dyn ReaderRepository>,
    ) -> Self {
        Self {
            authors,
            books,
            readers,
        }
    }

    /// Repository backed by `authors.json`, `books.json` and `readers.json`
    /// in `data_dir`
    pub async fn json(data_dir: impl AsRef<Path>) -> AppResult<Self> {
        let dir = data_dir.as_ref();
        Ok(Self::new(
            Arc::new(json::JsonAuthorRepository::open(dir).await?),
            Arc::new(json::JsonBookRepository::open(dir).await?),
            Arc::new(json::JsonReaderRepository::open(dir).await?),
        ))
    }

    /// Repository backed by a PostgreSQL pool
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self::new(
            Arc::new(postgres::PgAuthorRepository::new(pool.clone())),
            Arc::new(postgres::PgBookRepository::new(pool.clone())),
            Arc::new(postgres::PgReaderRepository::new(pool)),
        )
    }

    /// Wrap every store so `observer` sees each operation
    pub fn observed(self, observer: Arc<dyn RepositoryObserver>) -> Self {
        Self {
            authors: Arc::new(Observed::new(self.authors, observer.clone())),
            books: Arc::new(Observed::new(self.books, observer.clone())),
            readers: Arc::new(Observed::new(self.readers, observer)),
        }
    }

    /// Round-trip to every store
    pub async fn check_ready(&self) -> AppResult<()> {
        self.authors.list_all().await?;
        self.books.list_all().await?;
        self.readers.list_all().await?;
        Ok(())
    }
}
