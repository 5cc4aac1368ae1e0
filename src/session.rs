use std::{collections::HashMap, sync::Mutex};

use log::debug;

use crate::utils::http::{HttpClient, RequestOptions};

/// Cookie jar for the provider origin, shared by every extraction call of a
/// single extractor instance. Cookies never expire on their own; newer
/// values for a name simply replace older ones.
pub struct SessionStore {
    origin: String,
    cookies: Mutex<HashMap<String, String>>,
}

impl SessionStore {
    pub fn new(origin: &str) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_owned(),
            cookies: Mutex::new(HashMap::new()),
        }
    }

    /// Bootstraps the browsing session unless cookies are already present.
    /// The presence check is a cheap idempotent shortcut, not a freshness
    /// guarantee. Transport failures are reported as `false`, never thrown.
    pub async fn ensure_session(&self, client: &impl HttpClient) -> bool {
        if !self.cookies.lock().unwrap().is_empty() {
            return true;
        }

        let url = format!("{}/", self.origin);
        match client.get(&url, RequestOptions::default()).await {
            Ok(res) => {
                self.merge(res.cookies);
                true
            }
            Err(err) => {
                debug!("[session] bootstrap of {url} failed: {err:#}");
                false
            }
        }
    }

    /// Later values win per name; names absent from `new_cookies` are kept.
    pub fn merge(&self, new_cookies: HashMap<String, String>) {
        self.cookies.lock().unwrap().extend(new_cookies);
    }

    pub fn snapshot(&self) -> HashMap<String, String> {
        self.cookies.lock().unwrap().clone()
    }
}
