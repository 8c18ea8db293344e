//! Business logic services

pub mod authors;
pub mod books;
pub mod loans;
pub mod readers;
pub mod rules;

use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    error::{AppError, Rejection},
    repository::Repository,
};

/// Serializes every guarded mutation so that the guard and the write it
/// protects see the same state
pub(crate) type WriteGate = Arc<Mutex<()>>;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub authors: authors::AuthorsService,
    pub books: books::BooksService,
    pub readers: readers::ReadersService,
    pub loans: loans::LoansService,
    repository: Repository,
}

impl Services {
    /// Create all services over one repository, sharing a single write gate
    pub fn new(repository: Repository) -> Self {
        let gate: WriteGate = Arc::new(Mutex::new(()));
        Self {
            authors: authors::AuthorsService::new(repository.clone(), gate.clone()),
            books: books::BooksService::new(repository.clone(), gate.clone()),
            readers: readers::ReadersService::new(repository.clone(), gate.clone()),
            loans: loans::LoansService::new(repository.clone(), gate),
            repository,
        }
    }

    /// Storage readiness
    pub async fn check_ready(&self) -> crate::error::AppResult<()> {
        self.repository.check_ready().await
    }
}

/// Log a refused mutation and turn it into an error
pub(crate) fn refuse(action: &'static str, id: Uuid, rejection: Rejection) -> AppError {
    tracing::warn!(action, %id, reason = %rejection, "Operation rejected");
    rejection.into()
}

pub(crate) fn not_found(entity: &str, id: Uuid) -> AppError {
    AppError::NotFound(format!("{} with id {} not found", entity, id))
}
