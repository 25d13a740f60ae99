//! JSON-backed cookie store.
//!
//! `JsonCookieStore` persists cookie records as a single JSON array in a file:
//!
//! ```json
//! [
//!   { "Name": "sid", "Value": "abc", "Domain": "example.com", "Path": "/", "Expires": 1767225599, ... }
//! ]
//! ```
//!
//! ### I/O characteristics
//! - Every save **rewrites** the whole file. For large datasets, use the SQLite store.
//! - Writes go to a temporary file in the same directory which then replaces the
//!   target, so readers never observe a half-written file.
//! - A missing or empty file reads as "no cookies". Anything else that is not a
//!   JSON array of cookie records is an error.
//!
//! ### Example
//! ```ignore
//! let store = JsonCookieStore::new("cookies.json".into());
//! let jar = PersistentCookieJar::open(store, CookieJarConfig::default())?;
//! ```
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;

use crate::cookies::store::CookieStore;
use crate::cookies::Cookie;
use crate::errors::CookieError;

/// A JSON file based cookie store that persists cookies across sessions.
#[derive(Debug)]
pub struct JsonCookieStore {
    /// Path to the JSON file where cookies are stored.
    path: PathBuf,

    /// Serializes writers within this process.
    write_lock: Mutex<()>,
}

impl JsonCookieStore {
    /// Creates a store for the JSON file at `path`. The file is not touched until the first load or save.
    pub fn new(path: PathBuf) -> Arc<Self> {
        Arc::new(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Result<Option<String>, CookieError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes `contents` through a temporary file that is renamed over the target.
    fn write_file(&self, contents: &[u8]) -> Result<(), CookieError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(contents)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| CookieError::Io(e.error))?;
        Ok(())
    }
}

impl CookieStore for JsonCookieStore {
    fn load(&self) -> Result<Vec<Cookie>, CookieError> {
        let Some(contents) = self.read_file()? else {
            return Ok(Vec::new());
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        let value: serde_json::Value = serde_json::from_str(&contents)?;
        if !value.is_array() {
            return Err(CookieError::InvalidStoreFile(format!(
                "{}: expected a JSON array of cookies",
                self.path.display()
            )));
        }

        Ok(serde_json::from_value(value)?)
    }

    fn save(&self, cookies: &[Cookie]) -> Result<(), CookieError> {
        let contents = serde_json::to_vec_pretty(cookies)?;

        let _guard = self.write_lock.lock().map_err(|_| CookieError::Poisoned)?;
        self.write_file(&contents)?;

        log::debug!("Saved {} cookie(s) to {}", cookies.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> Arc<JsonCookieStore> {
        JsonCookieStore::new(dir.path().join("cookies.json"))
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.load().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn empty_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "  \n").unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn saves_and_loads_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut secure = Cookie::new("b", "2", ".example.com");
        secure.secure = true;
        secure.expires = Some(1_900_000_000);
        secure.ports = vec![443];
        let cookies = vec![Cookie::new("a", "1", "example.com"), secure];

        store.save(&cookies).unwrap();
        assert_eq!(store.load().unwrap(), cookies);

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw[1]["Name"], serde_json::json!("b"));
        assert_eq!(raw[1]["Secure"], serde_json::json!(true));
        assert_eq!(raw[1]["Expires"], serde_json::json!(1_900_000_000));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "[{").unwrap();
        assert!(matches!(store.load(), Err(CookieError::Json(_))));
    }

    #[test]
    fn non_array_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{\"cookies\": []}").unwrap();
        assert!(matches!(store.load(), Err(CookieError::InvalidStoreFile(_))));
    }

    #[test]
    fn clear_writes_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&[Cookie::new("a", "1", "example.com")]).unwrap();

        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
        assert_eq!(fs::read_to_string(store.path()).unwrap().trim(), "[]");
    }

    #[test]
    fn unwritable_location_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonCookieStore::new(dir.path().join("missing").join("cookies.json"));
        assert!(matches!(
            store.save(&[Cookie::new("a", "1", "example.com")]),
            Err(CookieError::Io(_))
        ));
    }
}
