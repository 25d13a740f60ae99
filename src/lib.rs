//! HTTP cookie management: parse `Set-Cookie` headers, keep cookies in a jar,
//! build `Cookie` request headers and persist jars to JSON or SQLite.
pub mod config;
pub mod cookies;
pub mod errors;
pub mod net;

pub use cookies::*;
