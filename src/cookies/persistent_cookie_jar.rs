use std::path::PathBuf;

use crate::config::CookieJarConfig;
use crate::cookies::cookie_jar::DefaultCookieJar;
use crate::cookies::{Cookie, CookieJar, CookieStoreHandle, JsonCookieStore};
use crate::errors::CookieError;

/// A `CookieJar` backed by a [`CookieStore`](crate::cookies::CookieStore).
///
/// All jar semantics are those of the wrapped [`DefaultCookieJar`]. The jar is
/// loaded from the store when opened and written back on [`save`](Self::save)
/// and [`close`](Self::close). With `persist_on_change` set, every mutation is
/// also persisted right away; failures there are logged, not returned.
///
/// Session cookies are left out when saving unless `store_session_cookies` is set.
pub struct PersistentCookieJar {
    /// Inner cookie jar that holds the actual cookie state.
    inner: DefaultCookieJar,
    /// Handle to the cookie store responsible for persistence.
    store: CookieStoreHandle,
}

impl PersistentCookieJar {
    /// Opens a jar on top of `store` and loads its records.
    ///
    /// Fails if the store cannot be read, or (in strict mode) if it holds an invalid record.
    pub fn open(store: CookieStoreHandle, config: CookieJarConfig) -> Result<Self, CookieError> {
        let mut jar = Self {
            inner: DefaultCookieJar::with_config(config),
            store,
        };
        jar.load()?;
        Ok(jar)
    }

    /// Opens a jar persisted as a JSON file at `path`. A missing file starts an empty jar.
    pub fn open_file(path: impl Into<PathBuf>, config: CookieJarConfig) -> Result<Self, CookieError> {
        Self::open(JsonCookieStore::new(path.into()), config)
    }

    /// Merges the store's records into the jar and returns how many were accepted.
    ///
    /// Records go through the usual [`CookieJar::set_cookie`] rules.
    pub fn load(&mut self) -> Result<usize, CookieError> {
        let mut loaded = 0;
        for cookie in self.store.load()? {
            if self.inner.set_cookie(cookie)? {
                loaded += 1;
            }
        }
        log::debug!("Loaded {} cookie(s) from store", loaded);
        Ok(loaded)
    }

    /// Writes the current jar contents to the store, replacing what was there.
    pub fn save(&self) -> Result<(), CookieError> {
        let store_session = self.inner.config().store_session_cookies;
        let cookies = self
            .inner
            .iter()
            .filter(|cookie| store_session || !cookie.is_session())
            .cloned()
            .collect::<Vec<_>>();

        self.store.save(&cookies)
    }

    /// Saves the jar and releases it.
    pub fn close(self) -> Result<(), CookieError> {
        self.save()
    }

    pub fn config(&self) -> &CookieJarConfig {
        self.inner.config()
    }

    /// The in-memory jar holding the current state.
    pub fn inner(&self) -> &DefaultCookieJar {
        &self.inner
    }

    pub fn store(&self) -> &CookieStoreHandle {
        &self.store
    }

    /// Best-effort save after a mutation, when configured.
    fn persist(&self) {
        if !self.inner.config().persist_on_change {
            return;
        }

        if let Err(e) = self.save() {
            log::error!("Failed to persist cookie jar: {}", e);
        }
    }
}

impl CookieJar for PersistentCookieJar {
    /// Stores the cookie in the inner jar, then persists if anything changed.
    fn set_cookie(&mut self, cookie: Cookie) -> Result<bool, CookieError> {
        let before = self.inner.len();
        let changed = self.inner.set_cookie(cookie)?;
        // Deletions through empty values report `false` but still shrink the jar
        if changed || self.inner.len() != before {
            self.persist();
        }
        Ok(changed)
    }

    fn clear(&mut self, domain: Option<&str>, path: Option<&str>, name: Option<&str>) -> usize {
        let removed = self.inner.clear(domain, path, name);
        if removed > 0 {
            self.persist();
        }
        removed
    }

    fn clear_session_cookies(&mut self) -> usize {
        let removed = self.inner.clear_session_cookies();
        if removed > 0 {
            self.persist();
        }
        removed
    }

    fn remove_expired(&mut self) -> usize {
        let removed = self.inner.remove_expired();
        if removed > 0 {
            self.persist();
        }
        removed
    }

    fn cookies(&self) -> &[Cookie] {
        self.inner.cookies()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use super::*;
    use crate::cookies::cookies::now;
    use crate::cookies::{CookieStore, InMemoryCookieStore};
    use crate::net::{Request, Response};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn persistent(name: &str, value: &str) -> Cookie {
        Cookie {
            expires: Some(now() + 1000),
            ..Cookie::new(name, value, "foo.com")
        }
    }

    #[test]
    fn loads_from_file_and_saves_on_close() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");

        let mut jar = PersistentCookieJar::open_file(&path, CookieJarConfig::default()).unwrap();
        assert!(jar.is_empty());
        assert!(!path.exists());

        jar.set_cookie(persistent("foo", "bar")).unwrap();
        jar.set_cookie(persistent("baz", "bar")).unwrap();
        assert_eq!(jar.len(), 2);
        jar.close().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(!contents.trim().is_empty());

        let jar = PersistentCookieJar::open_file(&path, CookieJarConfig::default()).unwrap();
        assert_eq!(jar.len(), 2);
        assert_eq!(jar.cookies()[0].name, "foo");
        assert_eq!(jar.cookies()[1].name, "baz");
    }

    #[test]
    fn reload_keeps_persistent_records_and_drops_session_ones() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");

        let mut jar = PersistentCookieJar::open_file(&path, CookieJarConfig::default()).unwrap();
        jar.set_cookie(persistent("foo", "bar")).unwrap();
        jar.set_cookie(Cookie {
            path: "/app".to_string(),
            max_age: Some(600),
            ..Cookie::new("max", "1", ".example.com")
        })
        .unwrap();
        jar.set_cookie(Cookie::new("session", "1", "foo.com")).unwrap();
        jar.set_cookie(Cookie {
            discard: true,
            ..persistent("discarded", "1")
        })
        .unwrap();

        let identity = |c: &Cookie| {
            (
                c.domain.clone(),
                c.path.clone(),
                c.name.clone(),
                c.value.clone(),
                c.expires,
            )
        };
        let expected: Vec<_> = jar
            .cookies()
            .iter()
            .filter(|c| !c.is_session())
            .map(identity)
            .collect();
        assert_eq!(expected.len(), 2);
        jar.close().unwrap();

        let reloaded = PersistentCookieJar::open_file(&path, CookieJarConfig::default()).unwrap();
        let actual: Vec<_> = reloaded.cookies().iter().map(identity).collect();
        assert_eq!(actual, expected);
        assert!(reloaded.cookies().iter().all(|c| !c.is_session()));
        assert!(reloaded.cookies().iter().all(|c| c.name != "session" && c.name != "discarded"));
    }

    #[test]
    fn saves_session_cookies_only_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");

        let fill = |config: CookieJarConfig| {
            let mut jar = PersistentCookieJar::open_file(&path, config).unwrap();
            jar.set_cookie(persistent("foo", "bar")).unwrap();
            jar.set_cookie(persistent("baz", "bar")).unwrap();
            jar.set_cookie(Cookie::new("boo", "bar", "foo.com")).unwrap();
            assert_eq!(jar.len(), 3);
            jar.close().unwrap();
        };

        fill(CookieJarConfig {
            store_session_cookies: true,
            ..CookieJarConfig::default()
        });
        let jar = PersistentCookieJar::open_file(&path, CookieJarConfig::default()).unwrap();
        assert_eq!(jar.len(), 3);
        drop(jar);

        fs::remove_file(&path).unwrap();

        fill(CookieJarConfig::default());
        let jar = PersistentCookieJar::open_file(&path, CookieJarConfig::default()).unwrap();
        assert_eq!(jar.len(), 2);
    }

    #[test]
    fn discardable_cookies_are_not_saved_by_default() {
        let store = InMemoryCookieStore::new();
        let mut jar = PersistentCookieJar::open(store.clone(), CookieJarConfig::default()).unwrap();

        jar.set_cookie(Cookie {
            discard: true,
            ..persistent("gone", "1")
        })
        .unwrap();
        jar.set_cookie(persistent("kept", "1")).unwrap();
        jar.save().unwrap();

        let saved = store.load().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].name, "kept");
    }

    #[test]
    fn invalid_json_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        fs::write(&path, "true").unwrap();

        assert!(matches!(
            PersistentCookieJar::open_file(&path, CookieJarConfig::default()),
            Err(CookieError::InvalidStoreFile(_))
        ));

        fs::write(&path, "[not json").unwrap();
        assert!(matches!(
            PersistentCookieJar::open_file(&path, CookieJarConfig::default()),
            Err(CookieError::Json(_))
        ));
    }

    #[test]
    fn empty_file_opens_empty_jar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        fs::write(&path, "").unwrap();

        let jar = PersistentCookieJar::open_file(&path, CookieJarConfig::default()).unwrap();
        assert!(jar.is_empty());
    }

    #[test]
    fn strict_mode_rejects_invalid_records() {
        let store = InMemoryCookieStore::with_cookies(vec![Cookie::new("bad name", "1", "foo.com")]);

        assert!(PersistentCookieJar::open(store.clone(), CookieJarConfig::strict()).is_err());

        let jar = PersistentCookieJar::open(store, CookieJarConfig::default()).unwrap();
        assert!(jar.is_empty());
    }

    #[test]
    fn clear_then_save_empties_store() {
        let store = InMemoryCookieStore::with_cookies(vec![persistent("a", "1"), persistent("b", "2")]);
        let mut jar = PersistentCookieJar::open(store.clone(), CookieJarConfig::default()).unwrap();
        assert_eq!(jar.len(), 2);

        assert_eq!(jar.clear(None, None, None), 2);
        jar.close().unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn persists_every_mutation_when_configured() {
        let store = InMemoryCookieStore::new();
        let config = CookieJarConfig {
            persist_on_change: true,
            ..CookieJarConfig::default()
        };
        let mut jar = PersistentCookieJar::open(store.clone(), config).unwrap();

        jar.set_cookie(persistent("a", "1")).unwrap();
        assert_eq!(store.load().unwrap().len(), 1);

        // Deleting through an empty value persists as well
        jar.set_cookie(Cookie::new("a", "", "foo.com")).unwrap();
        assert!(store.load().unwrap().is_empty());

        jar.set_cookie(persistent("b", "1")).unwrap();
        jar.clear(Some("foo.com"), None, Some("b"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn does_not_persist_without_explicit_save() {
        let store = InMemoryCookieStore::new();
        let mut jar = PersistentCookieJar::open(store.clone(), CookieJarConfig::default()).unwrap();

        jar.set_cookie(persistent("a", "1")).unwrap();
        assert!(store.load().unwrap().is_empty());

        jar.save().unwrap();
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn load_merges_into_current_state() {
        let store = InMemoryCookieStore::with_cookies(vec![persistent("a", "1")]);
        let mut jar = PersistentCookieJar::open(store.clone(), CookieJarConfig::default()).unwrap();

        // Same record again is not counted
        assert_eq!(jar.load().unwrap(), 0);

        store.save(&[persistent("a", "1"), persistent("b", "2")]).unwrap();
        assert_eq!(jar.load().unwrap(), 1);
        assert_eq!(jar.len(), 2);
    }

    #[test]
    fn works_with_requests_and_responses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");

        let req = Request::get("https://example.com/app/login").unwrap();
        let resp = Response::new(req.url.clone())
            .with_set_cookie("sid=abc; Max-Age=3600; Secure; HttpOnly")
            .with_set_cookie("tmp=1");

        let mut jar = PersistentCookieJar::open_file(&path, CookieJarConfig::default()).unwrap();
        jar.extract_cookies(&req, &resp).unwrap();
        jar.close().unwrap();

        let jar = PersistentCookieJar::open_file(&path, CookieJarConfig::default()).unwrap();
        let next = Request::get("https://example.com/app/home").unwrap();
        assert_eq!(jar.cookie_header(&next).as_deref(), Some("sid=abc"));
    }

    #[test]
    fn shares_store_between_jars() {
        let store: CookieStoreHandle = InMemoryCookieStore::new();
        let mut a = PersistentCookieJar::open(Arc::clone(&store), CookieJarConfig::default()).unwrap();
        a.set_cookie(persistent("a", "1")).unwrap();
        a.close().unwrap();

        let b = PersistentCookieJar::open(store, CookieJarConfig::default()).unwrap();
        assert_eq!(b.len(), 1);
    }

    #[cfg(feature = "sqlite_cookie_store")]
    #[test]
    fn round_trips_through_sqlite() {
        use crate::cookies::SqliteCookieStore;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.sqlite");

        let store = SqliteCookieStore::new(path.clone()).unwrap();
        let mut jar = PersistentCookieJar::open(store, CookieJarConfig::default()).unwrap();
        jar.set_cookie(persistent("a", "1")).unwrap();
        jar.set_cookie(Cookie::new("session", "1", "foo.com")).unwrap();
        jar.close().unwrap();

        let store = SqliteCookieStore::new(path).unwrap();
        let jar = PersistentCookieJar::open(store, CookieJarConfig::default()).unwrap();
        assert_eq!(jar.len(), 1);
        assert_eq!(jar.cookies()[0].name, "a");
    }
}
