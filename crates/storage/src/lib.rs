use std::{str::FromStr, time::Duration};

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    Row, SqlitePool,
};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use contact_relay_core::{ContactDraft, Submission};

/// Top-level database handle that owns the SQLite connection pool.
///
/// Cloning is cheap; every clone shares the same pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Establishes a new SQLite connection pool for the provided connection string.
    ///
    /// File databases are created when missing so that the setup tool can run
    /// against a fresh deployment.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(StorageError::Connect)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(StorageError::Connect)?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    ///
    /// Already-applied migrations are skipped, so running this on every boot is safe.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        Ok(())
    }

    /// Returns a handle to the contact submissions table.
    pub fn submissions(&self) -> SubmissionRepository {
        SubmissionRepository {
            pool: self.pool.clone(),
        }
    }

    /// Issues a cheap query to confirm the store is reachable and the schema exists.
    pub async fn probe(&self) -> Result<u64, SubmissionError> {
        self.submissions().count().await
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to database: {0}")]
    Connect(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
}

/// Repository responsible for the `contact_submissions` table.
#[derive(Clone)]
pub struct SubmissionRepository {
    pool: SqlitePool,
}

impl SubmissionRepository {
    /// Persists a validated draft and returns the stored record.
    ///
    /// The identifier is generated here; `created_at` is the caller's notion of
    /// "now" so that request handling and storage agree on a single clock.
    pub async fn insert(
        &self,
        draft: &ContactDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Submission, SubmissionError> {
        let id = Uuid::new_v4().to_string();
        let row = sqlx::query(
            "INSERT INTO contact_submissions (id, name, email, message, created_at) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING id, name, email, message, created_at",
        )
        .bind(&id)
        .bind(&draft.name)
        .bind(&draft.email)
        .bind(&draft.message)
        .bind(to_rfc3339(created_at))
        .fetch_one(&self.pool)
        .await?;

        let submission = SubmissionRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            message: row.try_get("message")?,
            created_at: row.try_get("created_at")?,
        }
        .into_domain()?;

        debug!(stage = "storage", id = %submission.id, "contact submission stored");
        Ok(submission)
    }

    /// Returns the total number of stored submissions.
    pub async fn count(&self) -> Result<u64, SubmissionError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM contact_submissions")
            .fetch_one(&self.pool)
            .await?;
        let total: i64 = row.try_get("total")?;
        Ok(u64::try_from(total).unwrap_or_default())
    }
}

/// Row shape returned by the submissions table.
struct SubmissionRow {
    id: String,
    name: String,
    email: String,
    message: String,
    created_at: String,
}

impl SubmissionRow {
    fn into_domain(self) -> Result<Submission, SubmissionError> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|source| SubmissionError::InvalidTimestamp {
                id: self.id.clone(),
                source,
            })?
            .with_timezone(&Utc);

        Ok(Submission {
            id: self.id,
            name: self.name,
            email: self.email,
            message: self.message,
            created_at,
        })
    }
}

/// Errors raised while reading or writing submissions.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored timestamp for submission {id} is not RFC 3339: {source}")]
    InvalidTimestamp {
        id: String,
        source: chrono::ParseError,
    },
}

/// Formats timestamps without losing sub-second precision.
fn to_rfc3339(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn setup_db() -> Database {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("connect");
        db.run_migrations().await.expect("migrations");
        db
    }

    fn draft() -> ContactDraft {
        ContactDraft {
            name: "Jo".to_string(),
            email: "jo@x.co".to_string(),
            message: "Hello, this is a test message.".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_returns_stored_record() {
        let db = setup_db().await;
        let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();

        let stored = db
            .submissions()
            .insert(&draft(), created_at)
            .await
            .expect("insert succeeds");

        assert!(!stored.id.is_empty());
        assert_eq!(stored.name, "Jo");
        assert_eq!(stored.email, "jo@x.co");
        assert_eq!(stored.message, "Hello, this is a test message.");
        assert_eq!(stored.created_at, created_at);
    }

    #[tokio::test]
    async fn created_at_keeps_sub_second_precision() {
        let db = setup_db().await;
        let created_at = Utc::now();

        let stored = db
            .submissions()
            .insert(&draft(), created_at)
            .await
            .expect("insert succeeds");

        assert_eq!(stored.created_at, created_at);
    }

    #[tokio::test]
    async fn duplicate_drafts_get_distinct_ids() {
        let db = setup_db().await;
        let repo = db.submissions();
        let now = Utc::now();

        let first = repo.insert(&draft(), now).await.expect("first insert");
        let second = repo.insert(&draft(), now).await.expect("second insert");

        assert_ne!(first.id, second.id);
        assert_eq!(repo.count().await.expect("count"), 2);
    }

    #[tokio::test]
    async fn count_is_zero_on_empty_table() {
        let db = setup_db().await;
        assert_eq!(db.submissions().count().await.expect("count"), 0);
        assert_eq!(db.probe().await.expect("probe"), 0);
    }

    #[tokio::test]
    async fn rejected_write_surfaces_error_and_stores_nothing() {
        let db = setup_db().await;
        sqlx::query(
            "CREATE TRIGGER reject_submissions BEFORE INSERT ON contact_submissions \
             BEGIN SELECT RAISE(ABORT, 'writes disabled'); END;",
        )
        .execute(db.pool())
        .await
        .expect("create trigger");

        let err = db
            .submissions()
            .insert(&draft(), Utc::now())
            .await
            .expect_err("insert is rejected");
        assert!(matches!(err, SubmissionError::Database(_)));
        assert_eq!(db.submissions().count().await.expect("count"), 0);
    }

    #[tokio::test]
    async fn count_fails_without_schema() {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("connect");
        let err = db.probe().await.expect_err("table is missing");
        assert!(matches!(err, SubmissionError::Database(_)));
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let db = setup_db().await;
        db.run_migrations().await.expect("second run is a no-op");

        let tables: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'contact_submissions'",
        )
        .fetch_one(db.pool())
        .await
        .expect("fetch tables");
        assert_eq!(tables.0, 1);
    }

    #[tokio::test]
    async fn connect_creates_missing_database_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("contact.db");
        let url = format!("sqlite://{}", path.display());

        let db = Database::connect(&url).await.expect("connect creates file");
        db.run_migrations().await.expect("migrations");
        db.submissions()
            .insert(&draft(), Utc::now())
            .await
            .expect("insert");

        assert!(path.exists());
        assert_eq!(db.probe().await.expect("probe"), 1);
    }
}
