//! Cookie jar abstraction and the in-memory implementation.
//!
//! A **cookie jar** stores cookie records, resolves conflicts when a cookie is
//! set again, and selects the cookies to send with a request. Callers hand it
//! the request/response seams from [`crate::net`]; the jar itself performs no I/O.
//!
//! This module defines the [`CookieJar`] trait and [`DefaultCookieJar`], an
//! ordered in-memory collection with no duplicate `(domain, path, name)` triples.
//!
//! ## Conflict resolution
//! When a valid cookie shares its identity with a stored one, the stored one is
//! replaced (in place) if any of these hold, otherwise the call is a no-op:
//! - the stored cookie is discardable and the new one is not,
//! - the new cookie expires strictly later,
//! - the value differs,
//! - any other non-temporal attribute differs (`Secure`, `HttpOnly`, `Port`,
//!   `Comment`, `Comment-Url`, `Version`).
//!
//! ## Notes & limitations
//! - Expiration is checked lazily when building a `Cookie` header and on explicit
//!   [`CookieJar::remove_expired`] calls. Nothing is evicted in the background.
//! - This module is **not** internally synchronized. Share it via a
//!   `CookieJarHandle = Arc<RwLock<dyn CookieJar + Send + Sync>>`.
//!
use std::sync::{Arc, RwLock};

use crate::config::CookieJarConfig;
use crate::cookies::cookies::now;
use crate::cookies::{parser, Cookie, CookieJarHandle};
use crate::errors::CookieError;
use crate::net::{CookieRequest, CookieResponse};

/// A cookie jar keeps the cookies for one client.
///
/// Only [`set_cookie`](CookieJar::set_cookie), the removal methods and
/// [`cookies`](CookieJar::cookies) need implementing; header handling is
/// shared through the provided methods.
pub trait CookieJar: Send + Sync {
    /// Inserts, replaces or rejects `cookie`.
    ///
    /// Returns `Ok(true)` when the cookie was added or replaced a stored one,
    /// `Ok(false)` when it was rejected or already present unchanged.
    ///
    /// An invalid cookie is an error in strict mode. Otherwise it is dropped,
    /// and if its value is missing or empty it deletes the stored cookies
    /// matching its domain, path and name.
    fn set_cookie(&mut self, cookie: Cookie) -> Result<bool, CookieError>;

    /// Removes cookies by increasingly specific filters and returns how many were removed.
    ///
    /// `domain` is matched with [`Cookie::matches_domain`], `path` with
    /// [`Cookie::matches_path`] and `name` exactly. A `None` (or empty) filter
    /// matches everything, so `clear(None, None, None)` empties the jar.
    fn clear(&mut self, domain: Option<&str>, path: Option<&str>, name: Option<&str>) -> usize;

    /// Removes all session cookies (see [`Cookie::is_session`]).
    fn clear_session_cookies(&mut self) -> usize;

    /// Removes all cookies whose expiry has passed.
    fn remove_expired(&mut self) -> usize;

    /// All stored cookies, in insertion order.
    fn cookies(&self) -> &[Cookie];

    fn len(&self) -> usize {
        self.cookies().len()
    }

    fn is_empty(&self) -> bool {
        self.cookies().is_empty()
    }

    /// Copies of all stored records, suitable for serialization or for seeding another jar.
    fn to_array(&self) -> Vec<Cookie> {
        self.cookies().to_vec()
    }

    /// Stores every `Set-Cookie` value of `response`.
    ///
    /// Cookies without a `Domain` default to the request host and cookies
    /// without a `Path` to the request's default path. One bad cookie never
    /// stops the others from being processed; in strict mode the first
    /// validation error is returned after all headers were handled.
    fn extract_cookies(
        &mut self,
        request: &dyn CookieRequest,
        response: &dyn CookieResponse,
    ) -> Result<(), CookieError> {
        let host = request.host();
        let path = parser::default_path(request.path());
        let mut first_error = None;

        for header in response.set_cookie_headers() {
            let cookie = Cookie::parse_with_defaults(&header, Some(host), Some(&path));
            if let Err(e) = self.set_cookie(cookie) {
                log::debug!("Rejected cookie from {}: {}", host, e);
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Queries stored cookies.
    ///
    /// `domain`, `path` and `name` filter like in [`clear`](CookieJar::clear),
    /// with `None` (or empty) matching everything. `skip_discardable` leaves out
    /// session cookies, `skip_expired` leaves out expired ones.
    fn all(
        &self,
        domain: Option<&str>,
        path: Option<&str>,
        name: Option<&str>,
        skip_discardable: bool,
        skip_expired: bool,
    ) -> Vec<&Cookie> {
        let domain = domain.filter(|d| !d.is_empty());
        let path = path.filter(|p| !p.is_empty());
        let name = name.filter(|n| !n.is_empty());
        let now = now();

        self.cookies()
            .iter()
            .filter(|cookie| name.map_or(true, |n| cookie.name == n))
            .filter(|cookie| !(skip_expired && cookie.is_expired_at(now)))
            .filter(|cookie| !(skip_discardable && cookie.is_session()))
            .filter(|cookie| path.map_or(true, |p| cookie.matches_path(p)))
            .filter(|cookie| domain.map_or(true, |d| cookie.matches_domain(d)))
            .collect()
    }

    /// Cookies to send with `request`, in insertion order.
    ///
    /// Selects unexpired cookies matching the request host, path and port, and
    /// leaves out `Secure` cookies unless the request is HTTPS.
    fn matching_cookies(&self, request: &dyn CookieRequest) -> Vec<&Cookie> {
        let host = request.host();
        if host.is_empty() {
            return Vec::new();
        }
        let path = match request.path() {
            "" => "/",
            path => path,
        };
        let is_https = request.scheme().eq_ignore_ascii_case("https");
        let port = request.port();

        let mut cookies = self.all(Some(host), Some(path), None, false, true);
        cookies.retain(|cookie| !cookie.secure || is_https);
        cookies.retain(|cookie| port.map_or(true, |p| cookie.matches_port(p)));
        cookies
    }

    /// Returns the `Cookie` request header value to send with `request`, if any.
    fn cookie_header(&self, request: &dyn CookieRequest) -> Option<String> {
        let header = self
            .matching_cookies(request)
            .into_iter()
            .map(Cookie::header_pair)
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            None
        } else {
            Some(header)
        }
    }

    /// Sets the `Cookie` header on `request` when any cookie matches.
    fn add_cookie_header(&self, request: &mut dyn CookieRequest) {
        if let Some(header) = self.cookie_header(&*request) {
            request.set_cookie_header(&header);
        }
    }
}

/// Default cookie jar, holding its cookies in memory only.
#[derive(Debug, Clone, Default)]
pub struct DefaultCookieJar {
    config: CookieJarConfig,
    entries: Vec<Cookie>,
}

impl DefaultCookieJar {
    /// Creates an empty, lenient jar.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CookieJarConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
        }
    }

    /// Creates a jar holding one discardable cookie per `(name, value)` pair, all for `domain`.
    pub fn from_array<I, K, V>(cookies: I, domain: &str) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut jar = Self::new();
        for (name, value) in cookies {
            let cookie = Cookie {
                discard: true,
                ..Cookie::new(name, value, domain)
            };
            if let Err(e) = jar.set_cookie(cookie) {
                log::debug!("Skipping cookie for {}: {}", domain, e);
            }
        }
        jar
    }

    /// Creates a jar seeded with `records`, e.g. the output of [`CookieJar::to_array`].
    pub fn from_records<I>(config: CookieJarConfig, records: I) -> Result<Self, CookieError>
    where
        I: IntoIterator<Item = Cookie>,
    {
        let mut jar = Self::with_config(config);
        for cookie in records {
            jar.set_cookie(cookie)?;
        }
        Ok(jar)
    }

    pub fn config(&self) -> &CookieJarConfig {
        &self.config
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cookie> {
        self.entries.iter()
    }

    /// Handles an invalid cookie with an empty value as a request to delete the stored one.
    fn remove_if_empty(&mut self, cookie: &Cookie) {
        let is_empty = cookie.value.as_deref().map_or(true, str::is_empty);
        if !is_empty || cookie.name.is_empty() || cookie.domain.is_empty() {
            return;
        }

        let removed = self.clear(
            Some(cookie.domain.as_str()),
            Some(cookie.path.as_str()),
            Some(cookie.name.as_str()),
        );
        if removed > 0 {
            log::debug!(
                "Deleted {} cookie(s) named {:?} for {}{}",
                removed,
                cookie.name,
                cookie.domain,
                cookie.path
            );
        }
    }

    fn prune(&mut self, remove: impl Fn(&Cookie) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|cookie| !remove(cookie));
        before - self.entries.len()
    }
}

fn should_replace(stored: &Cookie, new: &Cookie) -> bool {
    (stored.discard && !new.discard)
        || new.expires > stored.expires
        || new.value != stored.value
        || new.attributes_differ(stored)
}

impl CookieJar for DefaultCookieJar {
    fn set_cookie(&mut self, mut cookie: Cookie) -> Result<bool, CookieError> {
        cookie.normalize();

        if let Err(reason) = cookie.validate() {
            if self.config.strict_mode {
                return Err(reason.into());
            }
            log::debug!("Dropping invalid cookie {:?}: {}", cookie.name, reason);
            self.remove_if_empty(&cookie);
            return Ok(false);
        }

        match self.entries.iter().position(|c| c.same_identity(&cookie)) {
            Some(idx) => {
                if !should_replace(&self.entries[idx], &cookie) {
                    return Ok(false);
                }
                log::debug!("Replacing cookie {:?} for {}{}", cookie.name, cookie.domain, cookie.path);
                self.entries[idx] = cookie;
            }
            None => self.entries.push(cookie),
        }

        Ok(true)
    }

    fn clear(&mut self, domain: Option<&str>, path: Option<&str>, name: Option<&str>) -> usize {
        let domain = domain.filter(|d| !d.is_empty());
        let path = path.filter(|p| !p.is_empty());
        let name = name.filter(|n| !n.is_empty());

        self.prune(|cookie| {
            domain.map_or(true, |d| cookie.matches_domain(d))
                && path.map_or(true, |p| cookie.matches_path(p))
                && name.map_or(true, |n| cookie.name == n)
        })
    }

    fn clear_session_cookies(&mut self) -> usize {
        self.prune(Cookie::is_session)
    }

    fn remove_expired(&mut self) -> usize {
        let now = now();
        self.prune(|cookie| cookie.is_expired_at(now))
    }

    fn cookies(&self) -> &[Cookie] {
        &self.entries
    }
}

impl<'a> IntoIterator for &'a DefaultCookieJar {
    type Item = &'a Cookie;
    type IntoIter = std::slice::Iter<'a, Cookie>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl From<DefaultCookieJar> for CookieJarHandle {
    fn from(jar: DefaultCookieJar) -> Self {
        Arc::new(RwLock::new(jar))
    }
}
