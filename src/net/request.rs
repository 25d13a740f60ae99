//! Minimal outgoing request model.
//!
//! Holds the target URL and the request headers. This is all the cookie jar
//! needs to select cookies and attach the `Cookie` header; transports are free
//! to build their own request from it.
use http::{HeaderMap, HeaderValue};
use url::Url;

use crate::net::CookieRequest;

/// Simple structure for outgoing HTTP requests.
#[derive(Debug, Clone)]
pub struct Request {
    /// Target URL of the request.
    pub url: Url,

    /// Request headers as a case-insensitive map.
    pub headers: HeaderMap,
}

impl Request {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            headers: HeaderMap::new(),
        }
    }

    /// Parses `url` and creates a request without headers.
    pub fn get(url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(url)?))
    }

    /// Returns the `Cookie` header, if one is set and is valid UTF-8.
    pub fn cookie_header(&self) -> Option<&str> {
        self.headers
            .get(http::header::COOKIE)
            .and_then(|value| value.to_str().ok())
    }
}

impl CookieRequest for Request {
    fn scheme(&self) -> &str {
        self.url.scheme()
    }

    fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    fn path(&self) -> &str {
        self.url.path()
    }

    fn port(&self) -> Option<u16> {
        self.url.port_or_known_default()
    }

    fn set_cookie_header(&mut self, value: &str) {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(http::header::COOKIE, value);
            }
            Err(e) => log::warn!("Cannot set Cookie header on {}: {}", self.url, e),
        }
    }
}
