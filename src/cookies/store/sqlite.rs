//! SQLite-backed cookie store.
//!
//! `SqliteCookieStore` keeps cookie records in a single `cookies` table, one
//! row per cookie, keyed by `(domain, path, name)`.
//!
//! ## Design
//! - Database access is via an `r2d2` pool for safe multi-threaded use.
//! - `save` **rewrites** the table (DELETE + INSERT) inside one transaction, so
//!   a failed save leaves the previous contents in place.
//! - `ports` are stored as a comma separated list, flags as integers.
//!
//! ## Example
//! ```ignore
//! let store = SqliteCookieStore::new("cookies.sqlite".into())?; // -> Arc<SqliteCookieStore>
//! let jar = PersistentCookieJar::open(store, CookieJarConfig::default())?;
//! ```
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::rusqlite::params;
use r2d2_sqlite::SqliteConnectionManager;

use crate::cookies::store::CookieStore;
use crate::cookies::Cookie;
use crate::errors::CookieError;

/// A SQLite-based cookie store that persists cookies across sessions.
pub struct SqliteCookieStore {
    /// Connection pool for SQLite database (so it can run multithreaded)
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteCookieStore {
    /// Opens (or creates) a SQLite database at `path` and ensures the schema exists.
    ///
    /// Returns an `Arc<Self>` ready to be used as a `CookieStoreHandle`.
    pub fn new(path: PathBuf) -> Result<Arc<Self>, CookieError> {
        let manager = SqliteConnectionManager::file(&path);
        let pool = Pool::new(manager)
            .with_context(|| format!("Failed to create SQLite pool for {}", path.display()))?;

        let store = Self { pool };
        store
            .conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS cookies (
                    seq INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    value TEXT,
                    domain TEXT NOT NULL,
                    path TEXT NOT NULL,
                    expires INTEGER,
                    max_age INTEGER,
                    secure INTEGER NOT NULL,
                    discard INTEGER NOT NULL,
                    http_only INTEGER NOT NULL,
                    comment TEXT,
                    comment_url TEXT,
                    ports TEXT NOT NULL,
                    version TEXT,
                    PRIMARY KEY (domain, path, name)
                );",
            )
            .context("Failed to create cookies table")?;

        Ok(Arc::new(store))
    }

    /// Borrows a pooled SQLite connection.
    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, CookieError> {
        Ok(self.pool.get().context("Failed to get DB connection")?)
    }
}

fn ports_to_column(ports: &[u16]) -> String {
    ports.iter().map(u16::to_string).collect::<Vec<_>>().join(",")
}

fn ports_from_column(column: &str) -> Vec<u16> {
    column.split(',').filter_map(|p| p.trim().parse().ok()).collect()
}

impl CookieStore for SqliteCookieStore {
    fn load(&self) -> Result<Vec<Cookie>, CookieError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT name, value, domain, path, expires, max_age, secure, discard, http_only,
                        comment, comment_url, ports, version
                 FROM cookies ORDER BY seq",
            )
            .context("Failed to prepare cookie query")?;

        let rows = stmt
            .query_map([], |row| {
                let ports: String = row.get(11)?;
                Ok(Cookie {
                    name: row.get(0)?,
                    value: row.get(1)?,
                    domain: row.get(2)?,
                    path: row.get(3)?,
                    expires: row.get(4)?,
                    max_age: row.get(5)?,
                    secure: row.get::<_, i64>(6)? != 0,
                    discard: row.get::<_, i64>(7)? != 0,
                    http_only: row.get::<_, i64>(8)? != 0,
                    comment: row.get(9)?,
                    comment_url: row.get(10)?,
                    ports: ports_from_column(&ports),
                    version: row.get(12)?,
                    ..Cookie::default()
                })
            })
            .context("Failed to query cookies")?;

        let mut cookies = Vec::new();
        for row in rows {
            cookies.push(row.context("Failed to read cookie row")?);
        }
        Ok(cookies)
    }

    fn save(&self, cookies: &[Cookie]) -> Result<(), CookieError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().context("Failed to start transaction")?;

        tx.execute("DELETE FROM cookies", [])
            .context("Failed to delete cookies")?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO cookies (seq, name, value, domain, path, expires, max_age, secure,
                        discard, http_only, comment, comment_url, ports, version)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                )
                .context("Failed to prepare cookie insert")?;

            for (seq, cookie) in cookies.iter().enumerate() {
                stmt.execute(params![
                    seq as i64,
                    cookie.name,
                    cookie.value,
                    cookie.domain,
                    cookie.path,
                    cookie.expires,
                    cookie.max_age,
                    cookie.secure as i64,
                    cookie.discard as i64,
                    cookie.http_only as i64,
                    cookie.comment,
                    cookie.comment_url,
                    ports_to_column(&cookie.ports),
                    cookie.version,
                ])
                .with_context(|| format!("Failed to insert cookie {:?}", cookie.name))?;
            }
        }

        tx.commit().context("Failed to commit cookies")?;
        log::debug!("Saved {} cookie(s) to SQLite", cookies.len());
        Ok(())
    }

    fn clear(&self) -> Result<(), CookieError> {
        self.conn()?
            .execute("DELETE FROM cookies", [])
            .context("Failed to delete cookies")?;
        Ok(())
    }
}
