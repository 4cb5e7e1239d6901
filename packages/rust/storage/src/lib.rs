//! libSQL storage layer for cached page records.
//!
//! The [`Storage`] struct wraps a libSQL database (local file, in-memory, or
//! remote) holding one immutable row per `page_id`.
//!
//! **Access rules:**
//! - Lookup by `page_id` via [`Storage::get_page`]
//! - Insert-once via [`Storage::insert_page`]; a second insert for the same
//!   `page_id` fails with [`PageInsightsError::StoreConflict`]
//! - Unordered bounded scan via [`Storage::list_pages`]
//!
//! Rows never get updated or deleted here.

mod migrations;

use std::path::Path;

use chrono::Utc;
use libsql::{Connection, Database, Row, params};
use pageinsights_shared::{Page, PageInsightsError, Post, Result};
use uuid::Uuid;

/// Connection string for a private in-memory database.
pub const MEMORY: &str = ":memory:";

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl Storage {
    /// Open from a connection string: a `libsql://` / `http(s)://` URL is
    /// remote, anything else is a local path (or [`MEMORY`]).
    pub async fn connect(url: &str, auth_token: Option<&str>) -> Result<Self> {
        if is_remote(url) {
            Self::open_remote(url, auth_token.unwrap_or_default()).await
        } else {
            Self::open(Path::new(url)).await
        }
    }

    /// Open or create a local database at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if path != Path::new(MEMORY) {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| PageInsightsError::io(parent, e))?;
            }
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;

        Self::from_database(db).await
    }

    /// Open a remote database.
    pub async fn open_remote(url: &str, auth_token: &str) -> Result<Self> {
        let db = libsql::Builder::new_remote(url.to_string(), auth_token.to_string())
            .build()
            .await
            .map_err(storage_err)?;

        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self> {
        let conn = db.connect().map_err(storage_err)?;
        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations (this also creates the unique `page_id` index).
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        PageInsightsError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Page operations
    // -----------------------------------------------------------------------

    /// Look up a stored page by its identifier.
    pub async fn get_page(&self, page_id: &str) -> Result<Option<Page>> {
        let mut rows = self
            .conn
            .query(
                "SELECT page_id, name, url, description, followers, industry, profile_pic, posts_json, ai_summary
                 FROM pages WHERE page_id = ?1",
                params![page_id],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_page(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    /// Insert a page. Fails with [`PageInsightsError::StoreConflict`] if the
    /// `page_id` is already stored; the existing row is left untouched.
    pub async fn insert_page(&self, page: &Page) -> Result<()> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        let posts_json = serde_json::to_string(&page.posts)
            .map_err(|e| PageInsightsError::Storage(format!("failed to encode posts: {e}")))?;

        let inserted = self
            .conn
            .execute(
                "INSERT INTO pages (id, page_id, name, url, description, followers, industry, profile_pic, posts_json, ai_summary, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(page_id) DO NOTHING",
                params![
                    id.as_str(),
                    page.page_id.as_str(),
                    page.name.as_str(),
                    page.url.as_str(),
                    page.description.as_str(),
                    page.followers.as_str(),
                    page.industry.as_str(),
                    page.profile_pic.as_str(),
                    posts_json.as_str(),
                    page.ai_summary.as_deref(),
                    now.as_str(),
                ],
            )
            .await
            .map_err(storage_err)?;

        if inserted == 0 {
            return Err(PageInsightsError::StoreConflict {
                page_id: page.page_id.clone(),
            });
        }

        tracing::debug!(page_id = %page.page_id, row_id = %id, "stored page");
        Ok(())
    }

    /// Up to `limit` stored pages in storage order (no defined sort).
    pub async fn list_pages(&self, limit: u32) -> Result<Vec<Page>> {
        let mut rows = self
            .conn
            .query(
                "SELECT page_id, name, url, description, followers, industry, profile_pic, posts_json, ai_summary
                 FROM pages LIMIT ?1",
                params![i64::from(limit)],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(row_to_page(&row)?);
        }
        Ok(results)
    }
}

/// Whether a connection string points at a remote database.
fn is_remote(url: &str) -> bool {
    ["libsql://", "http://", "https://"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
}

fn storage_err(e: libsql::Error) -> PageInsightsError {
    PageInsightsError::Storage(e.to_string())
}

/// Convert a database row into a [`Page`]. The row id and timestamp stay behind.
fn row_to_page(row: &Row) -> Result<Page> {
    let posts_json: String = row.get(7).map_err(storage_err)?;
    let posts: Vec<Post> = serde_json::from_str(&posts_json).map_err(|e| {
        PageInsightsError::validation(format!("malformed posts_json in stored page: {e}"))
    })?;

    Ok(Page {
        page_id: row.get(0).map_err(storage_err)?,
        name: row.get(1).map_err(storage_err)?,
        url: row.get(2).map_err(storage_err)?,
        description: row.get(3).map_err(storage_err)?,
        followers: row.get(4).map_err(storage_err)?,
        industry: row.get(5).map_err(storage_err)?,
        profile_pic: row.get(6).map_err(storage_err)?,
        posts,
        ai_summary: row.get::<String>(8).ok(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("pi_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    fn sample_page(page_id: &str) -> Page {
        Page {
            page_id: page_id.into(),
            name: "Acme Inc".into(),
            url: format!("https://www.linkedin.com/company/{page_id}"),
            description: "We make anvils.".into(),
            followers: "5,000 followers".into(),
            industry: "Manufacturing".into(),
            profile_pic: "https://cdn.example.com/acme.png".into(),
            posts: vec![Post {
                content: "Spring catalogue is out now, with forty new anvils...".into(),
                likes: "N/A (Login Required)".into(),
                comments_count: "N/A".into(),
            }],
            ai_summary: Some("Acme makes anvils.".into()),
        }
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        let version = storage.get_schema_version().await;
        assert_eq!(version, 1);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("pi_test_{}.db", Uuid::now_v7()));
        let s1 = Storage::open(&tmp).await.expect("first open");
        s1.insert_page(&sample_page("acme")).await.unwrap();
        drop(s1);
        let s2 = Storage::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, 1);
        assert!(s2.get_page("acme").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn connect_in_memory() {
        let storage = Storage::connect(MEMORY, None).await.expect("open memory db");
        assert!(storage.get_page("acme").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_and_get_roundtrip() {
        let storage = test_storage().await;
        assert!(storage.get_page("acme").await.expect("get miss").is_none());

        let page = sample_page("acme");
        storage.insert_page(&page).await.expect("insert");

        let found = storage.get_page("acme").await.expect("get hit");
        assert_eq!(found, Some(page));
    }

    #[tokio::test]
    async fn missing_summary_roundtrips_as_none() {
        let storage = test_storage().await;
        let page = Page {
            ai_summary: None,
            posts: Vec::new(),
            ..sample_page("initech")
        };
        storage.insert_page(&page).await.unwrap();

        let found = storage.get_page("initech").await.unwrap().unwrap();
        assert!(found.ai_summary.is_none());
        assert!(found.posts.is_empty());
    }

    #[tokio::test]
    async fn second_insert_conflicts_and_keeps_first() {
        let storage = test_storage().await;
        let first = sample_page("acme");
        storage.insert_page(&first).await.expect("first insert");

        let second = Page {
            name: "Imposter".into(),
            ..sample_page("acme")
        };
        let err = storage.insert_page(&second).await.unwrap_err();
        assert!(err.is_conflict());

        let found = storage.get_page("acme").await.unwrap().unwrap();
        assert_eq!(found.name, "Acme Inc");
    }

    #[tokio::test]
    async fn list_is_bounded() {
        let storage = test_storage().await;
        for id in ["a", "b", "c", "d"] {
            storage.insert_page(&sample_page(id)).await.unwrap();
        }

        assert_eq!(storage.list_pages(2).await.unwrap().len(), 2);
        assert_eq!(storage.list_pages(10).await.unwrap().len(), 4);
        assert!(storage.list_pages(0).await.unwrap().is_empty());
    }

    #[test]
    fn remote_detection() {
        assert!(is_remote("libsql://pages-acme.turso.io"));
        assert!(is_remote("https://db.example.com"));
        assert!(!is_remote("/var/lib/pageinsights/pages.db"));
        assert!(!is_remote(MEMORY));
    }
}
