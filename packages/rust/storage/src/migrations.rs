//! SQL migration definitions for the PageInsights database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: pages with unique page_id",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Cached page records, written once per page_id
CREATE TABLE IF NOT EXISTS pages (
    id          TEXT PRIMARY KEY,
    page_id     TEXT NOT NULL,
    name        TEXT NOT NULL,
    url         TEXT NOT NULL,
    description TEXT NOT NULL,
    followers   TEXT NOT NULL,
    industry    TEXT NOT NULL,
    profile_pic TEXT NOT NULL,
    posts_json  TEXT NOT NULL DEFAULT '[]',
    ai_summary  TEXT,
    created_at  TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_pages_page_id ON pages(page_id);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
