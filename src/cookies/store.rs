//! Cookie store infrastructure.
//!
//! A **cookie store** is the persistence layer behind a [`PersistentCookieJar`].
//! It knows how to read and write a flat list of cookie records; all conflict
//! resolution stays in the jar.
//!
//! This module exports three implementations:
//! - [`JsonCookieStore`]: file-backed JSON array (the interchange format).
//! - [`InMemoryCookieStore`]: keeps records in memory (tests, private sessions).
//! - [`SqliteCookieStore`]: SQLite-backed store, behind the `sqlite_cookie_store` feature.
//!
//! ## Design notes
//! - Stores never filter. Which cookies get saved (e.g. dropping session
//!   cookies) is decided by the jar.
//! - Implementations are `Send + Sync` and internally synchronized, so they can
//!   be shared as a [`CookieStoreHandle`](crate::cookies::CookieStoreHandle).
//!
//! ## Example
//! ```rust,no_run
//! use gosub_cookies::config::CookieJarConfig;
//! use gosub_cookies::cookies::{CookieJar, JsonCookieStore, PersistentCookieJar};
//!
//! let store = JsonCookieStore::new("cookies.json".into());
//! let mut jar = PersistentCookieJar::open(store, CookieJarConfig::default()).unwrap();
//! jar.clear(Some("example.com"), None, None);
//! jar.close().unwrap();
//! ```
//!
//! [`PersistentCookieJar`]: crate::cookies::PersistentCookieJar
mod in_memory;
mod json;
#[cfg(feature = "sqlite_cookie_store")]
mod sqlite;

use crate::cookies::Cookie;
use crate::errors::CookieError;

/// In-memory cookie store.
pub use in_memory::InMemoryCookieStore;
/// File-backed JSON cookie store.
pub use json::JsonCookieStore;
/// SQLite-backed cookie store.
#[cfg(feature = "sqlite_cookie_store")]
pub use sqlite::SqliteCookieStore;

/// Durable storage for cookie records.
///
/// Implementations must be `Send + Sync` and safe for concurrent use.
pub trait CookieStore: Send + Sync {
    /// Reads all stored records, in the order they were saved.
    ///
    /// A store that was never written returns an empty list.
    fn load(&self) -> Result<Vec<Cookie>, CookieError>;

    /// Replaces the stored records with `cookies`.
    fn save(&self, cookies: &[Cookie]) -> Result<(), CookieError>;

    /// Removes all stored records.
    fn clear(&self) -> Result<(), CookieError> {
        self.save(&[])
    }
}
