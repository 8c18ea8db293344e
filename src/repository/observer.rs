//! Repository observation.
//!
//! `Observed<R>` wraps any store and reports every call to a
//! [`RepositoryObserver`] before it starts and after it finishes. The store
//! itself never knows it is being watched.

use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Author, Book, Reader},
};

use super::{AuthorRepository, BookRepository, ReaderRepository};

/// Repository call being observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListAll,
    GetById(Uuid),
    Add(Uuid),
    Update(Uuid),
    Delete(Uuid),
    ListByReader(Uuid),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ListAll => "list_all",
            Operation::GetById(_) => "get_by_id",
            Operation::Add(_) => "add",
            Operation::Update(_) => "update",
            Operation::Delete(_) => "delete",
            Operation::ListByReader(_) => "list_by_reader_id",
        }
    }

    pub fn id(&self) -> Option<Uuid> {
        match *self {
            Operation::ListAll => None,
            Operation::GetById(id)
            | Operation::Add(id)
            | Operation::Update(id)
            | Operation::Delete(id)
            | Operation::ListByReader(id) => Some(id),
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, Operation::Add(_) | Operation::Update(_) | Operation::Delete(_))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "{}({})", self.name(), id),
            None => f.write_str(self.name()),
        }
    }
}

/// Hook invoked around every repository call
pub trait RepositoryObserver: Send + Sync {
    fn before(&self, entity: &'static str, op: Operation);

    /// `error` is the display form of the failure, if the call failed
    fn after(&self, entity: &'static str, op: Operation, elapsed: Duration, error: Option<&str>);
}

/// Emits one `tracing` event per finished call
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RepositoryObserver for TracingObserver {
    fn before(&self, entity: &'static str, op: Operation) {
        tracing::trace!(entity, operation = op.name(), id = ?op.id(), "repository call");
    }

    fn after(&self, entity: &'static str, op: Operation, elapsed: Duration, error: Option<&str>) {
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        match error {
            Some(error) => tracing::warn!(
                entity,
                operation = op.name(),
                id = ?op.id(),
                elapsed_ms,
                error,
                "repository call failed"
            ),
            None if op.is_write() => tracing::debug!(
                entity,
                operation = op.name(),
                id = ?op.id(),
                elapsed_ms,
                "repository write"
            ),
            None => tracing::trace!(
                entity,
                operation = op.name(),
                id = ?op.id(),
                elapsed_ms,
                "repository read"
            ),
        }
    }
}

/// Decorator reporting each call on the wrapped store
pub struct Observed<R> {
    inner: R,
    observer: Arc<dyn RepositoryObserver>,
}

impl<R> Observed<R> {
    pub fn new(inner: R, observer: Arc<dyn RepositoryObserver>) -> Self {
        Self { inner, observer }
    }

    async fn observe<T, F>(&self, entity: &'static str, op: Operation, call: F) -> AppResult<T>
    where
        F: std::future::Future<Output = AppResult<T>>,
    {
        self.observer.before(entity, op);
        let started = Instant::now();
        let result = call.await;
        let error = result.as_ref().err().map(|e| e.to_string());
        self.observer
            .after(entity, op, started.elapsed(), error.as_deref());
        result
    }
}

#[async_trait]
impl AuthorRepository for Observed<Arc<dyn AuthorRepository>> {
    async fn list_all(&self) -> AppResult<Vec<Author>> {
        self.observe("author", Operation::ListAll, self.inner.list_all())
            .await
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Author>> {
        self.observe("author", Operation::GetById(id), self.inner.get_by_id(id))
            .await
    }

    async fn add(&self, author: &Author) -> AppResult<()> {
        self.observe("author", Operation::Add(author.id), self.inner.add(author))
            .await
    }

    async fn update(&self, author: &Author) -> AppResult<()> {
        self.observe("author", Operation::Update(author.id), self.inner.update(author))
            .await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.observe("author", Operation::Delete(id), self.inner.delete(id))
            .await
    }
}

#[async_trait]
impl BookRepository for Observed<Arc<dyn BookRepository>> {
    async fn list_all(&self) -> AppResult<Vec<Book>> {
        self.observe("book", Operation::ListAll, self.inner.list_all())
            .await
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        self.observe("book", Operation::GetById(id), self.inner.get_by_id(id))
            .await
    }

    async fn add(&self, book: &Book) -> AppResult<()> {
        self.observe("book", Operation::Add(book.id), self.inner.add(book))
            .await
    }

    async fn update(&self, book: &Book) -> AppResult<()> {
        self.observe("book", Operation::Update(book.id), self.inner.update(book))
            .await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.observe("book", Operation::Delete(id), self.inner.delete(id))
            .await
    }

    async fn list_by_reader_id(&self, reader_id: Uuid) -> AppResult<Vec<Book>> {
        self.observe(
            "book",
            Operation::ListByReader(reader_id),
            self.inner.list_by_reader_id(reader_id),
        )
        .await
    }
}

#[async_trait]
impl ReaderRepository for Observed<Arc<dyn ReaderRepository>> {
    async fn list_all(&self) -> AppResult<Vec<Reader>> {
        self.observe("reader", Operation::ListAll, self.inner.list_all())
            .await
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Reader>> {
        self.observe("reader", Operation::GetById(id), self.inner.get_by_id(id))
            .await
    }

    async fn add(&self, reader: &Reader) -> AppResult<()> {
        self.observe("reader", Operation::Add(reader.id), self.inner.add(reader))
            .await
    }

    async fn update(&self, reader: &Reader) -> AppResult<()> {
        self.observe("reader", Operation::Update(reader.id), self.inner.update(reader))
            .await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.observe("reader", Operation::Delete(id), self.inner.delete(id))
            .await
    }
}
