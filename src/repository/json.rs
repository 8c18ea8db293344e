//! Flat-file repositories: one pretty-printed JSON array per entity.
//!
//! Every mutation re-reads the whole file, changes the in-memory copy and
//! rewrites the file before returning. A per-file mutex serializes the
//! read-modify-write cycle inside the process; the rewrite goes through a
//! temporary file and a rename so a crash never leaves a truncated array.

use std::{
    io::ErrorKind,
    marker::PhantomData,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Author, Book, Reader},
};

use super::{AuthorRepository, BookRepository, ReaderRepository};

pub const AUTHORS_FILE: &str = "authors.json";
pub const BOOKS_FILE: &str = "books.json";
pub const READERS_FILE: &str = "readers.json";

/// On-disk shape of one entity
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    type Entity: Send + Sync;

    /// Human-readable entity name used in error messages
    const NAME: &'static str;

    fn id(&self) -> Uuid;
    fn from_entity(entity: &Self::Entity) -> Self;
    fn into_entity(self) -> Self::Entity;

    /// Replace the stored fields with the entity's mutable fields
    fn merge(&mut self, entity: &Self::Entity) {
        *self = Self::from_entity(entity);
    }

    /// Whether two distinct records violate a uniqueness constraint
    fn conflicts_with(&self, _other: &Self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthorRecord {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    #[serde(default, deserialize_with = "dates::optional_date")]
    pub date_of_birth: Option<NaiveDate>,
}

impl Record for AuthorRecord {
    type Entity = Author;
    const NAME: &'static str = "Author";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_entity(a: &Author) -> Self {
        Self {
            id: a.id,
            first_name: a.first_name.clone(),
            last_name: a.last_name.clone(),
            middle_name: a.middle_name.clone(),
            date_of_birth: a.date_of_birth,
        }
    }

    fn into_entity(self) -> Author {
        Author {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            middle_name: self.middle_name,
            date_of_birth: self.date_of_birth,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BookRecord {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub author_ids: Vec<Uuid>,
    pub publication_year: Option<i32>,
    #[serde(rename = "ISBN")]
    pub isbn: Option<String>,
    pub current_reader_id: Option<Uuid>,
}

impl Record for BookRecord {
    type Entity = Book;
    const NAME: &'static str = "Book";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_entity(b: &Book) -> Self {
        Self {
            id: b.id,
            title: b.title.clone(),
            description: b.description.clone(),
            author_ids: b.author_ids.clone(),
            publication_year: b.publication_year,
            isbn: b.isbn.clone(),
            current_reader_id: b.current_reader_id,
        }
    }

    fn into_entity(self) -> Book {
        Book {
            id: self.id,
            title: self.title,
            description: self.description,
            author_ids: self.author_ids,
            publication_year: self.publication_year,
            isbn: self.isbn,
            current_reader_id: self.current_reader_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReaderRecord {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub email: String,
    pub phone_number: Option<String>,
    #[serde(deserialize_with = "dates::timestamp")]
    pub registration_date: DateTime<Utc>,
}

impl Record for ReaderRecord {
    type Entity = Reader;
    const NAME: &'static str = "Reader";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_entity(r: &Reader) -> Self {
        Self {
            id: r.id,
            first_name: r.first_name.clone(),
            last_name: r.last_name.clone(),
            middle_name: r.middle_name.clone(),
            email: r.email.clone(),
            phone_number: r.phone_number.clone(),
            registration_date: r.registration_date,
        }
    }

    fn into_entity(self) -> Reader {
        Reader {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            middle_name: self.middle_name,
            email: self.email,
            phone_number: self.phone_number,
            registration_date: self.registration_date,
        }
    }

    fn merge(&mut self, r: &Reader) {
        let registration_date = self.registration_date;
        *self = Self::from_entity(r);
        self.registration_date = registration_date;
    }

    fn conflicts_with(&self, other: &Self) -> bool {
        self.email.trim().to_lowercase() == other.email.trim().to_lowercase()
    }
}

/// Readers for dates in files written by earlier versions, which stored
/// birth dates as midnight timestamps and registration dates without an offset.
/// Writes always use the current formats.
mod dates {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer};

    const NAIVE_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn optional_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let Some(text) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        parse_date(&text)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid date `{}`", text)))
    }

    pub fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_timestamp(&text).ok_or_else(|| D::Error::custom(format!("invalid timestamp `{}`", text)))
    }

    pub(super) fn parse_date(text: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .or_else(|| NaiveDateTime::parse_from_str(text, NAIVE_TIMESTAMP).ok().map(|dt| dt.date()))
            .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
    }

    pub(super) fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
            // no offset: read as UTC
            .or_else(|| NaiveDateTime::parse_from_str(text, NAIVE_TIMESTAMP).ok().map(|dt| dt.and_utc()))
    }
}

/// A JSON array file holding every record of one kind
pub struct JsonTable<R> {
    path: PathBuf,
    lock: Mutex<()>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> JsonTable<R> {
    /// Open `dir/file_name`, creating the directory and an empty array if needed
    pub async fn open(dir: &Path, file_name: &str) -> AppResult<Self> {
        fs::create_dir_all(dir).await?;
        let path = dir.join(file_name);
        if fs::metadata(&path).await.is_err() {
            fs::write(&path, "[]").await?;
            tracing::debug!("Created empty data file {}", path.display());
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
            _record: PhantomData,
        })
    }

    async fn load(&self) -> AppResult<Vec<R>> {
        let json = match fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&json)?)
    }

    async fn store(&self, records: &[R]) -> AppResult<()> {
        let json = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    pub async fn list_all(&self) -> AppResult<Vec<R::Entity>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_iter().map(R::into_entity).collect())
    }

    pub async fn find(&self, predicate: impl Fn(&R) -> bool) -> AppResult<Vec<R::Entity>> {
        let _guard = self.lock.lock().await;
        Ok(self
            .load()
            .await?
            .into_iter()
            .filter(|r| predicate(r))
            .map(R::into_entity)
            .collect())
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Option<R::Entity>> {
        let _guard = self.lock.lock().await;
        Ok(self
            .load()
            .await?
            .into_iter()
            .find(|r| r.id() == id)
            .map(R::into_entity))
    }

    pub async fn add(&self, entity: &R::Entity) -> AppResult<()> {
        let record = R::from_entity(entity);
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;

        if records.iter().any(|r| r.id() == record.id()) {
            return Err(AppError::Conflict(format!(
                "{} with id {} already exists",
                R::NAME,
                record.id()
            )));
        }
        Self::ensure_unique(&records, &record)?;

        records.push(record);
        self.store(&records).await
    }

    pub async fn update(&self, entity: &R::Entity) -> AppResult<()> {
        let incoming = R::from_entity(entity);
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;

        Self::ensure_unique(&records, &incoming)?;

        let existing = records
            .iter_mut()
            .find(|r| r.id() == incoming.id())
            .ok_or_else(|| not_found::<R>(incoming.id()))?;
        existing.merge(entity);
        self.store(&records).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return Err(not_found::<R>(id));
        }
        self.store(&records).await
    }

    fn ensure_unique(records: &[R], candidate: &R) -> AppResult<()> {
        if records
            .iter()
            .any(|r| r.id() != candidate.id() && r.conflicts_with(candidate))
        {
            return Err(AppError::Conflict(format!(
                "{} violates a uniqueness constraint",
                R::NAME
            )));
        }
        Ok(())
    }
}

fn not_found<R: Record>(id: Uuid) -> AppError {
    AppError::NotFound(format!("{} with id {} not found", R::NAME, id))
}

pub struct JsonAuthorRepository {
    table: JsonTable<AuthorRecord>,
}

impl JsonAuthorRepository {
    pub async fn open(dir: &Path) -> AppResult<Self> {
        Ok(Self {
            table: JsonTable::open(dir, AUTHORS_FILE).await?,
        })
    }
}

#[async_trait]
impl AuthorRepository for JsonAuthorRepository {
    async fn list_all(&self) -> AppResult<Vec<Author>> {
        self.table.list_all().await
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Author>> {
        self.table.get_by_id(id).await
    }

    async fn add(&self, author: &Author) -> AppResult<()> {
        self.table.add(author).await
    }

    async fn update(&self, author: &Author) -> AppResult<()> {
        self.table.update(author).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.table.delete(id).await
    }
}

pub struct JsonBookRepository {
    table: JsonTable<BookRecord>,
}

impl JsonBookRepository {
    pub async fn open(dir: &Path) -> AppResult<Self> {
        Ok(Self {
            table: JsonTable::open(dir, BOOKS_FILE).await?,
        })
    }
}

#[async_trait]
impl BookRepository for JsonBookRepository {
    async fn list_all(&self) -> AppResult<Vec<Book>> {
        self.table.list_all().await
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        self.table.get_by_id(id).await
    }

    async fn add(&self, book: &Book) -> AppResult<()> {
        self.table.add(book).await
    }

    async fn update(&self, book: &Book) -> AppResult<()> {
        self.table.update(book).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.table.delete(id).await
    }

    async fn list_by_reader_id(&self, reader_id: Uuid) -> AppResult<Vec<Book>> {
        self.table
            .find(|b| b.current_reader_id == Some(reader_id))
            .await
    }
}

pub struct JsonReaderRepository {
    table: JsonTable<ReaderRecord>,
}

impl JsonReaderRepository {
    pub async fn open(dir: &Path) -> AppResult<Self> {
        Ok(Self {
            table: JsonTable::open(dir, READERS_FILE).await?,
        })
    }
}

#[async_trait]
impl ReaderRepository for JsonReaderRepository {
    async fn list_all(&self) -> AppResult<Vec<Reader>> {
        self.table.list_all().await
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Reader>> {
        self.table.get_by_id(id).await
    }

    async fn add(&self, reader: &Reader) -> AppResult<()> {
        self.table.add(reader).await
    }

    async fn update(&self, reader: &Reader) -> AppResult<()> {
        self.table.update(reader).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.table.delete(id).await
    }
}
