//! Cookie core types.
//!
//! This module defines the **type-erased handles** used by callers that share
//! a jar, and the serializable [`Cookie`] record itself.
//!
//! # Concurrency model
//! - [`CookieJarHandle`] is `Arc<RwLock<dyn CookieJar + Send + Sync>>`.
//!   - Jars are plain single-threaded data structures. Callers that dispatch
//!     requests in parallel take a **read lock** to build `Cookie` headers and a
//!     **write lock** to store response cookies.
//! - [`CookieStoreHandle`] is `Arc<dyn CookieStore + Send + Sync>`.
//!   - Stores manage their **own internal synchronization**. The trait methods take `&self`.
//!
//! # Typical usage
//! ```ignore
//! let jar: CookieJarHandle = DefaultCookieJar::new().into();
//!
//! // Attach cookies to a request
//! jar.read().unwrap().add_cookie_header(&mut request);
//!
//! // Store cookies from a response
//! jar.write().unwrap().extract_cookies(&request, &response)?;
//! ```
//!
//! The [`Cookie`] struct (de)serializes via `serde` to a flat record:
//!
//! ```json
//! {
//!   "Name": "session", "Value": "abc123", "Domain": ".example.com", "Path": "/",
//!   "Expires": 1767225599, "Max-Age": null, "Secure": true, "Discard": false,
//!   "HttpOnly": true, "Comment": null, "Comment-Url": null, "Port": [], "Version": null
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::cookies::parser;
use crate::cookies::store::CookieStore;
use crate::cookies::CookieJar;
use crate::errors::CookieValidationError;

/// A handle to a cookie jar trait.
///
/// This is a reference-counted, read/write-locked pointer to a type-erased
/// [`CookieJar`]. Obtain a **read lock** for queries and a **write lock** for
/// mutations.
///
/// ### Example
/// ```ignore
/// let jar: CookieJarHandle = DefaultCookieJar::new().into();
/// {
///     let header = jar.read().unwrap().cookie_header(&request);
/// }
/// {
///     let mut guard = jar.write().unwrap();
///     guard.clear(None, None, None);
/// }
/// ```
pub type CookieJarHandle = Arc<RwLock<dyn CookieJar + Send + Sync>>;

/// A handle to a cookie store trait.
///
/// Store implementations must be **`Send + Sync` and internally synchronized**,
/// since callers hold only `&self` when invoking trait methods.
pub type CookieStoreHandle = Arc<dyn CookieStore + Send + Sync>;

/// Characters that may not appear in a cookie name, besides ASCII controls and space.
const INVALID_NAME_CHARS: &str = "()<>@,;:\\\"/[]?={}";

/// Current time as a Unix timestamp (seconds).
pub(crate) fn now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

/// Absolute expiry for a `Max-Age` received now. Non-positive values expire immediately.
pub(crate) fn expires_from_max_age(max_age: i64) -> i64 {
    if max_age <= 0 {
        0
    } else {
        now().saturating_add(max_age)
    }
}

/// A single cookie as stored in a jar and persisted by a store.
///
/// `value == None` marks an incomplete cookie. Such a cookie never validates
/// and is only useful as a deletion request (see [`CookieJar::set_cookie`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cookie {
    /// Cookie name (case-sensitive).
    #[serde(rename = "Name")]
    pub name: String,

    /// Raw cookie value (not URL-decoded, surrounding quotes removed).
    #[serde(rename = "Value")]
    pub value: Option<String>,

    /// Domain scoping, lower case. A leading `.` means "this domain and all subdomains".
    #[serde(rename = "Domain")]
    pub domain: String,

    /// Path scoping. Never empty once stored in a jar.
    #[serde(rename = "Path")]
    pub path: String,

    /// Absolute expiry as a Unix timestamp. Session cookies have `None`.
    #[serde(rename = "Expires")]
    pub expires: Option<i64>,

    /// Lifetime in seconds as received. Used to derive `expires` when that is missing.
    #[serde(rename = "Max-Age")]
    pub max_age: Option<i64>,

    /// If `true`, cookie is sent only over HTTPS.
    #[serde(rename = "Secure")]
    pub secure: bool,

    /// If `true`, the cookie must not outlive the session, whatever its expiry.
    #[serde(rename = "Discard")]
    pub discard: bool,

    /// If `true`, cookie is not exposed to client-side scripts.
    #[serde(rename = "HttpOnly")]
    pub http_only: bool,

    #[serde(rename = "Comment")]
    pub comment: Option<String>,

    #[serde(rename = "Comment-Url")]
    pub comment_url: Option<String>,

    /// Ports the cookie may be sent to. Empty means any port.
    #[serde(rename = "Port")]
    pub ports: Vec<u16>,

    #[serde(rename = "Version")]
    pub version: Option<String>,

    /// Unknown `Set-Cookie` attributes, kept for inspection only.
    #[serde(skip)]
    pub extensions: BTreeMap<String, String>,
}

impl Default for Cookie {
    fn default() -> Self {
        Self {
            name: String::new(),
            value: None,
            domain: String::new(),
            path: "/".to_string(),
            expires: None,
            max_age: None,
            secure: false,
            discard: false,
            http_only: false,
            comment: None,
            comment_url: None,
            ports: Vec::new(),
            version: None,
            extensions: BTreeMap::new(),
        }
    }
}

impl Cookie {
    /// Creates a session cookie for `domain` with path `/`.
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            domain: domain.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    /// Parses a raw `Set-Cookie` header value.
    ///
    /// Parsing never fails: a header without a `name=value` pair yields an
    /// incomplete cookie that will not validate, and unparsable attributes are
    /// ignored (an invalid `Expires` leaves a session cookie).
    pub fn parse(header: &str) -> Self {
        parser::parse_set_cookie(header, None, None)
    }

    /// Parses a raw `Set-Cookie` header value, using `host` and `path` when the
    /// header carries no `Domain` or no (valid) `Path` attribute.
    pub fn parse_with_defaults(header: &str, host: Option<&str>, path: Option<&str>) -> Self {
        parser::parse_set_cookie(header, host, path)
    }

    /// Checks that the cookie can be stored.
    ///
    /// Fails on an empty name, a name with invalid characters, a missing or
    /// empty value, or an empty domain, in that order.
    pub fn validate(&self) -> Result<(), CookieValidationError> {
        if self.name.is_empty() {
            return Err(CookieValidationError::EmptyName);
        }

        if self.name.chars().any(is_invalid_name_char) {
            return Err(CookieValidationError::InvalidName(self.name.clone()));
        }

        if self.value.as_deref().map_or(true, str::is_empty) {
            return Err(CookieValidationError::EmptyValue);
        }

        if self.domain.is_empty() {
            return Err(CookieValidationError::EmptyDomain);
        }

        Ok(())
    }

    /// Checks whether the cookie may be sent to `host` (RFC 6265 §5.1.3).
    ///
    /// A leading `.` on the stored domain is ignored. Besides an exact
    /// (case-insensitive) match, any subdomain of the stored domain matches,
    /// unless `host` is an IP address.
    pub fn matches_domain(&self, host: &str) -> bool {
        let cookie_domain = self.domain.trim_start_matches('.');

        if cookie_domain.is_empty() || host.eq_ignore_ascii_case(cookie_domain) {
            return true;
        }

        if is_ip_address(host) {
            return false;
        }

        let host = host.to_ascii_lowercase();
        let suffix = format!(".{}", cookie_domain.to_ascii_lowercase());
        host.ends_with(&suffix)
    }

    /// Checks whether the cookie may be sent for `request_path` (RFC 6265 §5.1.4).
    pub fn matches_path(&self, request_path: &str) -> bool {
        let cookie_path = if self.path.is_empty() { "/" } else { self.path.as_str() };
        let request_path = if request_path.is_empty() { "/" } else { request_path };

        if request_path == cookie_path {
            return true;
        }

        if !request_path.starts_with(cookie_path) {
            return false;
        }

        cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/')
    }

    pub fn matches_port(&self, port: u16) -> bool {
        self.ports.is_empty() || self.ports.contains(&port)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now())
    }

    /// Expired when an expiry is set and `now` is past it.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires.is_some_and(|expires| now > expires)
    }

    /// A session cookie is discardable or has no expiry. Session cookies are
    /// dropped by [`CookieJar::clear_session_cookies`] and not persisted unless
    /// configured otherwise.
    pub fn is_session(&self) -> bool {
        self.discard || self.expires.is_none()
    }

    /// `name=value` as sent in a `Cookie` request header, quoting the value when needed.
    pub fn header_pair(&self) -> String {
        let value = self.value.as_deref().unwrap_or_default();
        format!("{}={}", self.name, parser::quote_cookie_value(value))
    }

    /// Two cookies share an identity when domain, path and name are equal.
    pub(crate) fn same_identity(&self, other: &Cookie) -> bool {
        self.domain == other.domain && self.path == other.path && self.name == other.name
    }

    /// Compares the attributes that are neither the value nor temporal.
    pub(crate) fn attributes_differ(&self, other: &Cookie) -> bool {
        self.secure != other.secure
            || self.http_only != other.http_only
            || self.ports != other.ports
            || self.comment != other.comment
            || self.comment_url != other.comment_url
            || self.version != other.version
    }

    /// Brings a cookie into its stored shape: lower-case domain, non-empty path,
    /// and an absolute expiry derived from `max_age` when none is set.
    pub(crate) fn normalize(&mut self) {
        if self.domain.bytes().any(|b| b.is_ascii_uppercase()) {
            self.domain = self.domain.to_ascii_lowercase();
        }

        if self.path.is_empty() {
            self.path = "/".to_string();
        }

        if self.expires.is_none() {
            if let Some(max_age) = self.max_age {
                self.expires = Some(expires_from_max_age(max_age));
            }
        }
    }
}

/// Renders the cookie as a `Set-Cookie` header value.
impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value.as_deref().unwrap_or_default())?;

        if !self.domain.is_empty() {
            write!(f, "; Domain={}", self.domain)?;
        }
        write!(f, "; Path={}", self.path)?;
        if let Some(expires) = self.expires.and_then(parser::format_http_date) {
            write!(f, "; Expires={}", expires)?;
        }
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={}", max_age)?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        if self.discard {
            f.write_str("; Discard")?;
        }
        if let Some(comment) = &self.comment {
            write!(f, "; Comment={}", comment)?;
        }
        if let Some(comment_url) = &self.comment_url {
            write!(f, "; Comment-Url={}", comment_url)?;
        }
        if !self.ports.is_empty() {
            let ports = self
                .ports
                .iter()
                .map(u16::to_string)
                .collect::<Vec<_>>()
                .join(",");
            write!(f, "; Port=\"{}\"", ports)?;
        }
        if let Some(version) = &self.version {
            write!(f, "; Version={}", version)?;
        }

        Ok(())
    }
}

fn is_invalid_name_char(c: char) -> bool {
    c.is_ascii_control() || c == ' ' || INVALID_NAME_CHARS.contains(c)
}

fn is_ip_address(host: &str) -> bool {
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    host.parse::<IpAddr>().is_ok()
}
