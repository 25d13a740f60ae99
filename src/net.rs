//! Request/response seams consumed by the cookie jar.
//!
//! The jar never performs network I/O. It only needs to know *where* an outgoing
//! request goes (scheme, host, path, port) and which raw `Set-Cookie` values an
//! incoming response carried. Anything implementing [`CookieRequest`] and
//! [`CookieResponse`] can be used, including `http::Request<B>` and
//! `http::Response<B>`.

mod request;
mod response;

pub use request::Request;
pub use response::Response;

/// An outgoing request as seen by the cookie jar.
pub trait CookieRequest {
    /// Scheme in lower case (e.g. `"https"`).
    fn scheme(&self) -> &str;

    /// Request host without port. Empty if the request has no host.
    fn host(&self) -> &str;

    /// Request path (no query). Empty paths are treated as `/` by the jar.
    fn path(&self) -> &str;

    /// Effective port, including the scheme default when none is explicit.
    fn port(&self) -> Option<u16>;

    /// Sets (replaces) the `Cookie` request header.
    fn set_cookie_header(&mut self, value: &str);
}

/// An incoming response as seen by the cookie jar.
pub trait CookieResponse {
    /// All raw `Set-Cookie` header values, in the order they were received.
    fn set_cookie_headers(&self) -> Vec<String>;
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" | "ws" => Some(80),
        "https" | "wss" => Some(443),
        _ => None,
    }
}

impl<B> CookieRequest for http::Request<B> {
    fn scheme(&self) -> &str {
        self.uri().scheme_str().unwrap_or("http")
    }

    fn host(&self) -> &str {
        self.uri().host().unwrap_or_default()
    }

    fn path(&self) -> &str {
        self.uri().path()
    }

    fn port(&self) -> Option<u16> {
        self.uri()
            .port_u16()
            .or_else(|| default_port(CookieRequest::scheme(self)))
    }

    fn set_cookie_header(&mut self, value: &str) {
        match http::HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers_mut().insert(http::header::COOKIE, value);
            }
            Err(e) => log::warn!("Cannot set Cookie header: {}", e),
        }
    }
}

impl<B> CookieResponse for http::Response<B> {
    fn set_cookie_headers(&self) -> Vec<String> {
        set_cookie_values(self.headers())
    }
}

/// Collects the `Set-Cookie` values of a header map, skipping values that are not valid UTF-8.
pub(crate) fn set_cookie_values(headers: &http::HeaderMap) -> Vec<String> {
    headers
        .get_all(http::header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_request_exposes_cookie_context() {
        let mut req = http::Request::builder()
            .uri("https://www.example.com:8443/foo/bar?x=1")
            .body(())
            .unwrap();

        assert_eq!(CookieRequest::scheme(&req), "https");
        assert_eq!(CookieRequest::host(&req), "www.example.com");
        assert_eq!(CookieRequest::path(&req), "/foo/bar");
        assert_eq!(CookieRequest::port(&req), Some(8443));

        req.set_cookie_header("a=1; b=2");
        assert_eq!(req.headers().get("cookie").unwrap(), "a=1; b=2");
    }

    #[test]
    fn http_request_uses_scheme_default_port() {
        let req = http::Request::builder()
            .uri("http://example.com/")
            .body(())
            .unwrap();
        assert_eq!(CookieRequest::port(&req), Some(80));
    }

    #[test]
    fn http_response_returns_all_set_cookie_values() {
        let resp = http::Response::builder()
            .header("set-cookie", "a=1")
            .header("content-type", "text/plain")
            .header("Set-Cookie", "b=2; Path=/")
            .body(())
            .unwrap();

        assert_eq!(resp.set_cookie_headers(), vec!["a=1", "b=2; Path=/"]);
    }
}
