// Durable listing storage. The UNIQUE constraint on `url` is the only
// record of "already seen"; callers never pre-check with a query.

use crate::listing::{Listing, NewListing};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// A listing with this URL is already recorded.
    #[error("listing '{url}' is already recorded")]
    UniqueViolation { url: String },

    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("repository task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// The storage contract used by the novelty gate, the invitation scanner
/// and the relay. Every call is its own short transaction.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Insert a new listing with both flags false.
    ///
    /// Fails with `RepositoryError::UniqueViolation` when the URL exists;
    /// nothing is written in that case.
    async fn insert(&self, listing: &NewListing) -> Result<Listing, RepositoryError>;

    /// Set `invited = true`. Returns whether a listing with that URL exists.
    async fn mark_invited(&self, url: &str) -> Result<bool, RepositoryError>;

    /// Set `applied_notified = true`. Returns whether a listing with that URL exists.
    async fn mark_notified(&self, url: &str) -> Result<bool, RepositoryError>;

    /// Listings with `invited = true` and `applied_notified = false`, oldest first.
    async fn pending_notifications(&self) -> Result<Vec<Listing>, RepositoryError>;

    async fn find_by_url(&self, url: &str) -> Result<Option<Listing>, RepositoryError>;

    async fn count(&self) -> Result<u64, RepositoryError>;
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS listings (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    title            TEXT    NOT NULL,
    url              TEXT    NOT NULL UNIQUE,
    description      TEXT    NOT NULL,
    contact          TEXT    NOT NULL,
    invited          INTEGER NOT NULL DEFAULT 0,
    applied_notified INTEGER NOT NULL DEFAULT 0,
    discovered_at    TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_listings_pending ON listings(invited, applied_notified);
";

const SELECT_COLUMNS: &str =
    "id, title, url, description, contact, invited, applied_notified, discovered_at";

/// SQLite-backed repository. The connection is shared behind a mutex and
/// only touched from blocking tasks.
#[derive(Clone)]
pub struct SqliteListingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteListingRepository {
    /// Open (or create) the database file and install the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, RepositoryError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, RepositoryError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, RepositoryError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, RepositoryError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut guard)
        })
        .await?
    }
}

#[async_trait]
impl ListingRepository for SqliteListingRepository {
    async fn insert(&self, listing: &NewListing) -> Result<Listing, RepositoryError> {
        let listing = listing.clone();
        self.with_conn(move |conn| {
            let discovered_at = Utc::now();
            let tx = conn.transaction()?;

            let inserted = tx.execute(
                "INSERT INTO listings (title, url, description, contact, invited, applied_notified, discovered_at) \
                 VALUES (?1, ?2, ?3, ?4, 0, 0, ?5)",
                params![
                    listing.title,
                    listing.url,
                    listing.description,
                    listing.contact,
                    discovered_at,
                ],
            );

            if let Err(err) = inserted {
                // Dropping `tx` rolls back.
                return Err(map_insert_error(err, &listing.url));
            }

            let id = tx.last_insert_rowid();
            tx.commit()?;

            Ok(Listing {
                id,
                title: listing.title,
                url: listing.url,
                description: listing.description,
                contact: listing.contact,
                invited: false,
                applied_notified: false,
                discovered_at,
            })
        })
        .await
    }

    async fn mark_invited(&self, url: &str) -> Result<bool, RepositoryError> {
        let url = url.to_string();
        self.with_conn(move |conn| {
            let changed = conn.execute("UPDATE listings SET invited = 1 WHERE url = ?1", params![url])?;
            Ok(changed > 0)
        })
        .await
    }

    async fn mark_notified(&self, url: &str) -> Result<bool, RepositoryError> {
        let url = url.to_string();
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE listings SET applied_notified = 1 WHERE url = ?1",
                params![url],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn pending_notifications(&self) -> Result<Vec<Listing>, RepositoryError> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM listings WHERE invited = 1 AND applied_notified = 0 ORDER BY id",
                SELECT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], row_to_listing)?;
            let listings = rows.collect::<Result<Vec<_>, _>>()?;
            Ok(listings)
        })
        .await
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Listing>, RepositoryError> {
        let url = url.to_string();
        self.with_conn(move |conn| {
            let sql = format!("SELECT {} FROM listings WHERE url = ?1", SELECT_COLUMNS);
            let listing = conn
                .query_row(&sql, params![url], row_to_listing)
                .optional()?;
            Ok(listing)
        })
        .await
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))?;
            Ok(count.max(0) as u64)
        })
        .await
    }
}

fn row_to_listing(row: &Row<'_>) -> rusqlite::Result<Listing> {
    let discovered_at: DateTime<Utc> = row.get(7)?;
    Ok(Listing {
        id: row.get(0)?,
        title: row.get(1)?,
        url: row.get(2)?,
        description: row.get(3)?,
        contact: row.get(4)?,
        invited: row.get(5)?,
        applied_notified: row.get(6)?,
        discovered_at,
    })
}

fn map_insert_error(err: rusqlite::Error, url: &str) -> RepositoryError {
    if is_unique_violation(&err) {
        return RepositoryError::UniqueViolation {
            url: url.to_string(),
        };
    }
    RepositoryError::Sql(err)
}

/// Only UNIQUE violations count as duplicates; NOT NULL and other
/// constraint failures are real errors.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::ConstraintViolation
                && (code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || message
                        .as_deref()
                        .is_some_and(|value| value.contains("UNIQUE constraint failed")))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(url: &str) -> NewListing {
        NewListing {
            title: "нужен сантехник".into(),
            url: url.into(),
            description: "поменять смеситель".into(),
            contact: "анна".into(),
        }
    }

    #[tokio::test]
    async fn insert_creates_row_with_flags_cleared() {
        let repo = SqliteListingRepository::open_in_memory().unwrap();
        let recorded = repo.insert(&listing("https://uslugi.yandex.ru/order/1")).await.unwrap();

        assert!(recorded.id > 0);
        assert!(!recorded.invited);
        assert!(!recorded.applied_notified);

        let stored = repo
            .find_by_url("https://uslugi.yandex.ru/order/1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, recorded);
    }

    #[tokio::test]
    async fn duplicate_url_is_rejected_not_upserted() {
        let repo = SqliteListingRepository::open_in_memory().unwrap();
        repo.insert(&listing("https://uslugi.yandex.ru/order/1")).await.unwrap();

        let mut second = listing("https://uslugi.yandex.ru/order/1");
        second.title = "другой заголовок".into();
        let err = repo.insert(&second).await.unwrap_err();

        assert!(matches!(err, RepositoryError::UniqueViolation { ref url } if url == "https://uslugi.yandex.ru/order/1"));
        assert_eq!(repo.count().await.unwrap(), 1);
        let stored = repo
            .find_by_url("https://uslugi.yandex.ru/order/1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.title, "нужен сантехник");
    }

    #[tokio::test]
    async fn concurrent_inserts_of_same_url_record_once() {
        let repo = SqliteListingRepository::open_in_memory().unwrap();
        let a = repo.clone();
        let b = repo.clone();
        let item = listing("https://uslugi.yandex.ru/order/7");
        let (ra, rb) = tokio::join!(a.insert(&item), b.insert(&item));

        assert_eq!(ra.is_ok() as u8 + rb.is_ok() as u8, 1);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn pending_notifications_follow_flags() {
        let repo = SqliteListingRepository::open_in_memory().unwrap();
        repo.insert(&listing("https://x/1")).await.unwrap();
        repo.insert(&listing("https://x/2")).await.unwrap();
        repo.insert(&listing("https://x/3")).await.unwrap();

        assert!(repo.pending_notifications().await.unwrap().is_empty());

        assert!(repo.mark_invited("https://x/1").await.unwrap());
        assert!(repo.mark_invited("https://x/3").await.unwrap());
        let pending: Vec<String> = repo
            .pending_notifications()
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.url)
            .collect();
        assert_eq!(pending, vec!["https://x/1".to_string(), "https://x/3".to_string()]);

        assert!(repo.mark_notified("https://x/1").await.unwrap());
        let pending = repo.pending_notifications().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].url, "https://x/3");
    }

    #[tokio::test]
    async fn flags_are_monotone_and_idempotent() {
        let repo = SqliteListingRepository::open_in_memory().unwrap();
        repo.insert(&listing("https://x/1")).await.unwrap();

        assert!(repo.mark_invited("https://x/1").await.unwrap());
        assert!(repo.mark_notified("https://x/1").await.unwrap());
        // Repeating either update changes nothing and clears nothing.
        assert!(repo.mark_invited("https://x/1").await.unwrap());

        let stored = repo.find_by_url("https://x/1").await.unwrap().unwrap();
        assert!(stored.invited);
        assert!(stored.applied_notified);
    }

    #[tokio::test]
    async fn updates_for_unknown_url_report_false() {
        let repo = SqliteListingRepository::open_in_memory().unwrap();
        assert!(!repo.mark_invited("https://x/unknown").await.unwrap());
        assert!(!repo.mark_notified("https://x/unknown").await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("gigscout.db");
        {
            let repo = SqliteListingRepository::open(&path).unwrap();
            repo.insert(&listing("https://x/1")).await.unwrap();
        }
        let repo = SqliteListingRepository::open(&path).unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);
        assert!(matches!(
            repo.insert(&listing("https://x/1")).await,
            Err(RepositoryError::UniqueViolation { .. })
        ));
    }

    #[test]
    fn not_null_violation_is_not_a_duplicate() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        let err = conn
            .execute(
                "INSERT INTO listings (title, url, description, contact, discovered_at) VALUES (NULL, 'u', '', '', '')",
                [],
            )
            .unwrap_err();
        assert!(!is_unique_violation(&err));
        assert!(matches!(map_insert_error(err, "u"), RepositoryError::Sql(_)));
    }
}
