use std::sync::{Arc, RwLock};

use crate::cookies::store::CookieStore;
use crate::cookies::Cookie;
use crate::errors::CookieError;

#[derive(Debug, Default)]
pub struct InMemoryCookieStore {
    /// Records as of the last save
    cookies: RwLock<Vec<Cookie>>,
}

impl InMemoryCookieStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates a store that already holds `cookies`.
    pub fn with_cookies(cookies: Vec<Cookie>) -> Arc<Self> {
        Arc::new(Self {
            cookies: RwLock::new(cookies),
        })
    }
}

impl CookieStore for InMemoryCookieStore {
    fn load(&self) -> Result<Vec<Cookie>, CookieError> {
        let cookies = self.cookies.read().map_err(|_| CookieError::Poisoned)?;
        Ok(cookies.clone())
    }

    fn save(&self, cookies: &[Cookie]) -> Result<(), CookieError> {
        let mut stored = self.cookies.write().map_err(|_| CookieError::Poisoned)?;
        *stored = cookies.to_vec();
        Ok(())
    }

    fn clear(&self) -> Result<(), CookieError> {
        self.cookies.write().map_err(|_| CookieError::Poisoned)?.clear();
        Ok(())
    }
}
