//! Author catalog service

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Author, AuthorInput},
    repository::Repository,
};

use super::{not_found, refuse, rules, WriteGate};

/// Entry of the author picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthorOption {
    pub id: Uuid,
    pub full_name: String,
}

#[derive(Clone)]
pub struct AuthorsService {
    repository: Repository,
    gate: WriteGate,
}

impl AuthorsService {
    pub(crate) fn new(repository: Repository, gate: WriteGate) -> Self {
        Self { repository, gate }
    }

    /// All authors by last name, then first name
    pub async fn list(&self) -> AppResult<Vec<Author>> {
        let mut authors = self.repository.authors.list_all().await?;
        authors.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then_with(|| a.first_name.cmp(&b.first_name))
        });
        Ok(authors)
    }

    /// `(id, full name)` pairs ordered by full name
    pub async fn options(&self) -> AppResult<Vec<AuthorOption>> {
        let mut options: Vec<AuthorOption> = self
            .repository
            .authors
            .list_all()
            .await?
            .into_iter()
            .map(|a| AuthorOption {
                full_name: a.full_name(),
                id: a.id,
            })
            .collect();
        options.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(options)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Author> {
        self.repository
            .authors
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found("Author", id))
    }

    pub async fn create(&self, input: AuthorInput) -> AppResult<Author> {
        rules::check_author_input(&input)?;

        let author = Author::new(input);
        let _gate = self.gate.lock().await;
        self.repository.authors.add(&author).await?;

        tracing::info!(author_id = %author.id, "Author created: {}", author.full_name());
        Ok(author)
    }

    pub async fn update(&self, id: Uuid, input: AuthorInput) -> AppResult<Author> {
        rules::check_author_input(&input)?;

        let _gate = self.gate.lock().await;
        let mut author = self.get(id).await?;
        author.apply(input);
        self.repository.authors.update(&author).await?;

        tracing::info!(author_id = %id, "Author updated");
        Ok(author)
    }

    /// Delete an author no book refers to
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let _gate = self.gate.lock().await;
        self.get(id).await?;

        let books = self.repository.books.list_all().await?;
        rules::can_delete_author(id, &books).map_err(|r| refuse("delete author", id, r))?;

        self.repository.authors.delete(id).await?;
        tracing::info!(author_id = %id, "Author deleted");
        Ok(())
    }
}
