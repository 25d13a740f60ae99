/// Cookie jar configuration.
///
/// Shared by the in-memory [`DefaultCookieJar`](crate::cookies::DefaultCookieJar) and the
/// store-backed [`PersistentCookieJar`](crate::cookies::PersistentCookieJar).
#[derive(Debug, Clone, Default)]
pub struct CookieJarConfig {
    /// Return an error for invalid cookies instead of silently dropping them
    pub strict_mode: bool,
    /// Write session cookies (discardable or without an expiry) to the store as well
    pub store_session_cookies: bool,
    /// Persist the jar to its store after every mutation (best-effort, errors are logged)
    pub persist_on_change: bool,
}

impl CookieJarConfig {
    pub fn strict() -> Self {
        Self {
            strict_mode: true,
            ..Self::default()
        }
    }
}
