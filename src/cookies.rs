//! Cookies: [`Cookie`], [`CookieJar`], [`CookieStore`] and backends.

mod cookies;
mod cookie_jar;
mod parser;
mod persistent_cookie_jar;
mod store;

pub use cookies::Cookie;
pub use cookies::CookieJarHandle;
pub use cookies::CookieStoreHandle;

pub use cookie_jar::CookieJar;
pub use cookie_jar::DefaultCookieJar;
pub use persistent_cookie_jar::PersistentCookieJar;

pub use parser::{default_path, format_http_date, parse_http_date, quote_cookie_value};

pub use store::CookieStore;
pub use store::InMemoryCookieStore;
pub use store::JsonCookieStore;
#[cfg(feature = "sqlite_cookie_store")]
pub use store::SqliteCookieStore;
