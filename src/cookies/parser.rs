//! `Set-Cookie` parsing and the small string helpers around it.
//!
//! A header is `name=value` followed by `;`-separated attributes. Attribute
//! names are looked up case-insensitively in a fixed table; anything else is
//! kept as an extension attribute and otherwise ignored. Parsing is lenient:
//! malformed attributes are skipped and never abort the cookie.

use std::borrow::Cow;

use time::macros::format_description;
use time::parsing::Parsed;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::cookies::cookies::{expires_from_max_age, Cookie};

/// Attributes understood by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attribute {
    Expires,
    MaxAge,
    Domain,
    Path,
    Secure,
    HttpOnly,
    Discard,
    Comment,
    CommentUrl,
    Version,
    Port,
}

impl Attribute {
    fn lookup(key: &str) -> Option<Self> {
        let attr = match key.to_ascii_lowercase().as_str() {
            "expires" => Attribute::Expires,
            "max-age" => Attribute::MaxAge,
            "domain" => Attribute::Domain,
            "path" => Attribute::Path,
            "secure" => Attribute::Secure,
            "httponly" => Attribute::HttpOnly,
            "discard" => Attribute::Discard,
            "comment" => Attribute::Comment,
            "commenturl" | "comment-url" => Attribute::CommentUrl,
            "version" => Attribute::Version,
            "port" => Attribute::Port,
            _ => return None,
        };
        Some(attr)
    }
}

pub(crate) fn parse_set_cookie(header: &str, default_host: Option<&str>, default_path: Option<&str>) -> Cookie {
    let mut cookie = Cookie::default();
    if let Some(host) = default_host {
        cookie.domain = host.to_ascii_lowercase();
    }
    if let Some(path) = default_path.filter(|p| p.starts_with('/')) {
        cookie.path = path.to_string();
    }

    let mut pieces = header.split(';').map(str::trim).filter(|p| !p.is_empty());

    // The first pair is the cookie itself and must have a name
    match pieces.next().and_then(|first| first.split_once('=')) {
        Some((name, value)) if !name.trim().is_empty() => {
            cookie.name = name.trim().to_string();
            cookie.value = Some(unquote(value.trim()).to_string());
        }
        _ => {
            log::debug!("Set-Cookie header without a name=value pair: {:?}", header);
            return cookie;
        }
    }

    let mut expires = None;
    let mut max_age = None;

    for piece in pieces {
        let (key, value) = match piece.split_once('=') {
            Some((k, v)) => (k.trim(), Some(unquote(v.trim()))),
            None => (piece, None),
        };

        match Attribute::lookup(key) {
            // Last occurrence wins, an unparsable date leaves a session cookie
            Some(Attribute::Expires) => expires = value.and_then(parse_http_date),
            Some(Attribute::MaxAge) => {
                if let Some(secs) = value.and_then(|v| v.parse::<i64>().ok()) {
                    max_age = Some(secs);
                }
            }
            Some(Attribute::Domain) => {
                if let Some(domain) = value.filter(|v| !v.is_empty()) {
                    cookie.domain = domain.to_ascii_lowercase();
                }
            }
            Some(Attribute::Path) => {
                if let Some(path) = value.filter(|v| v.starts_with('/')) {
                    cookie.path = path.to_string();
                }
            }
            Some(Attribute::Secure) => cookie.secure = true,
            Some(Attribute::HttpOnly) => cookie.http_only = true,
            Some(Attribute::Discard) => cookie.discard = true,
            Some(Attribute::Comment) => cookie.comment = value.map(str::to_string),
            Some(Attribute::CommentUrl) => cookie.comment_url = value.map(str::to_string),
            Some(Attribute::Version) => cookie.version = value.map(str::to_string),
            Some(Attribute::Port) => {
                cookie.ports = value
                    .map(|v| v.split(',').filter_map(|p| p.trim().parse().ok()).collect())
                    .unwrap_or_default();
            }
            None => {
                cookie
                    .extensions
                    .insert(key.to_string(), value.unwrap_or_default().to_string());
            }
        }
    }

    // Max-Age takes precedence over Expires
    cookie.max_age = max_age;
    cookie.expires = match max_age {
        Some(secs) => Some(expires_from_max_age(secs)),
        None => expires,
    };

    cookie
}

/// Strips one pair of surrounding double quotes.
fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Quotes a cookie value for a `Cookie` header when it contains `;` or `,`
/// and is not already quoted.
pub fn quote_cookie_value(value: &str) -> Cow<'_, str> {
    if !value.starts_with('"') && !value.ends_with('"') && value.contains([';', ',']) {
        Cow::Owned(format!("\"{}\"", value))
    } else {
        Cow::Borrowed(value)
    }
}

/// Default cookie path for a request path (RFC 6265 §5.1.4): everything up to,
/// but not including, the right-most `/`, or `/` when that would be empty.
pub fn default_path(request_path: &str) -> String {
    if !request_path.starts_with('/') {
        return "/".to_string();
    }

    match request_path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => request_path[..idx].to_string(),
    }
}

/// Parses an HTTP date into a Unix timestamp.
///
/// Accepts IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`), RFC 850
/// (`Sunday, 06-Nov-94 08:49:37 GMT`), the Netscape form
/// (`Sun, 06-Nov-1994 08:49:37 GMT`) and asctime (`Sun Nov  6 08:49:37 1994`).
/// Returns `None` for anything else.
pub fn parse_http_date(value: &str) -> Option<i64> {
    let value = value.trim();

    let formats = [
        format_description!(
            "[weekday repr:short case_sensitive:false], [day] [month repr:short case_sensitive:false] [year padding:none] [hour]:[minute]:[second] GMT"
        ),
        format_description!(
            "[weekday case_sensitive:false], [day]-[month repr:short case_sensitive:false]-[year repr:last_two] [hour]:[minute]:[second] GMT"
        ),
        format_description!(
            "[weekday repr:short case_sensitive:false], [day]-[month repr:short case_sensitive:false]-[year padding:none] [hour]:[minute]:[second] GMT"
        ),
        format_description!(
            "[weekday repr:short case_sensitive:false] [month repr:short case_sensitive:false] [day padding:space] [hour]:[minute]:[second] [year padding:none]"
        ),
    ];

    formats.iter().find_map(|format| {
        let mut parsed = Parsed::new();
        let rest = parsed.parse_items(value.as_bytes(), format).ok()?;
        if !rest.is_empty() {
            return None;
        }

        // Two-digit years: 69-99 are 19xx, 00-68 are 20xx
        if parsed.year().is_none() {
            let short = i32::from(parsed.year_last_two()?);
            let century = if short >= 69 { 1900 } else { 2000 };
            parsed.set_year(century + short)?;
        }

        let datetime = PrimitiveDateTime::try_from(parsed).ok()?;
        Some(datetime.assume_utc().unix_timestamp())
    })
}

/// Formats a Unix timestamp as an IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn format_http_date(timestamp: i64) -> Option<String> {
    let format = format_description!(
        "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
    );
    OffsetDateTime::from_unix_timestamp(timestamp)
        .ok()?
        .format(format)
        .ok()
}
