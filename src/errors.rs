/// Reasons a cookie record fails validation.
///
/// Validation failures are not fatal by themselves: a lenient jar drops the
/// cookie (or treats it as a deletion), a strict jar wraps it in
/// [`CookieError::InvalidCookie`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CookieValidationError {
    #[error("The cookie name must not be empty")]
    EmptyName,

    #[error("Cookie name must not contain invalid characters: ASCII Control characters (0-31;127), space, tab and the following characters: ()<>@,;:\\\"/[]?={{}}")]
    InvalidName(String),

    #[error("The cookie value must not be empty")]
    EmptyValue,

    #[error("The cookie domain must not be empty")]
    EmptyDomain,
}

#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    #[error("Invalid cookie: {0}")]
    InvalidCookie(#[from] CookieValidationError),

    #[error("Cookie store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cookie store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid cookie store file: {0}")]
    InvalidStoreFile(String),

    #[error("Cookie storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("Cookie jar lock is poisoned")]
    Poisoned,
}
