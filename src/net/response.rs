//! Minimal HTTP response model.
//!
//! This struct represents a **fully buffered** HTTP response handed to the
//! cookie jar by whatever transport performed the request. It contains the
//! final URL and the response headers.
//!
//! ## Notes
//! - `headers` is an `http::HeaderMap`, which is **case-insensitive** for
//!   header names. Multiple `Set-Cookie` headers are kept as separate values.
//! - There is no body: the jar has no use for it.
//!
use http::HeaderMap;

use crate::net::{set_cookie_values, CookieResponse};

/// Simple structure for HTTP responses.
///
/// All fields reflect the **received** response as-is; no additional parsing
/// or transformation is performed by this type.
#[derive(Debug, Clone)]
pub struct Response {
    /// Final URL of the response (after redirects, if any).
    pub url: url::Url,

    /// Response headers as a case-insensitive map.
    pub headers: HeaderMap,
}

impl Response {
    pub fn new(url: url::Url) -> Self {
        Self {
            url,
            headers: HeaderMap::new(),
        }
    }

    /// Appends a raw `Set-Cookie` header. Values that are not valid header values are ignored.
    pub fn with_set_cookie(mut self, value: &str) -> Self {
        match http::HeaderValue::from_str(value) {
            Ok(v) => {
                self.headers.append(http::header::SET_COOKIE, v);
            }
            Err(e) => log::warn!("Ignoring invalid Set-Cookie header value: {}", e),
        }
        self
    }
}

impl CookieResponse for Response {
    fn set_cookie_headers(&self) -> Vec<String> {
        set_cookie_values(&self.headers)
    }
}
