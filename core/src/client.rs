//! Request composition, response interpretation and credential persistence.
//!
//! # Design
//! `ApiClient` never touches the network. It builds `HttpRequest` values with
//! the session headers attached and turns `HttpResponse` values into either a
//! payload or a `Failure`. `ApiHandle` drives it around a `Transport`.
//!
//! The only state it reaches is the shared `CredentialStore`: read on every
//! build, written when a successful payload carries an `access_token`.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::classify::Failure;
use crate::clock::{Clock, SystemClock};
use crate::cookies::{CookieOptions, CredentialStore, REFRESH_TOKEN_COOKIE, TOKEN_COOKIE};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::session::Credential;

/// Query parameter carrying the cache-busting timestamp on GET requests.
pub const CACHE_BUST_PARAM: &str = "_";

#[derive(Clone)]
pub struct ApiClient {
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn CredentialStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Headers sent with every request. `Authorization` is added only when a
    /// token is stored; without one the request goes out unauthenticated.
    pub fn headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Cache-Control".to_string(), "no-cache, no-store, must-revalidate".to_string()),
            ("Pragma".to_string(), "no-cache".to_string()),
            ("Expires".to_string(), "0".to_string()),
        ];
        if let Some(token) = self.store.read(TOKEN_COOKIE).filter(|t| !t.is_empty()) {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        headers
    }

    pub fn build_get(&self, url: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: with_cache_buster(url, self.clock.now_millis()),
            headers: self.headers(),
            body: None,
        }
    }

    pub fn build_post<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: url.to_string(),
            headers: self.headers(),
            body: Some(body),
        })
    }

    /// Split a response into its payload or a server-response failure.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, Failure> {
        let body = decode_body(&response.body);
        if response.is_success() {
            Ok(body)
        } else {
            Err(Failure::ServerResponse {
                status: response.status,
                body,
            })
        }
    }

    /// Persist `token`/`refresh_token` from a payload that carries an
    /// `access_token`. Returns whether anything was written.
    pub fn persist_credentials(&self, payload: &Value) -> bool {
        let Some(credential) = Credential::from_payload(payload) else {
            return false;
        };
        let options = match credential.expiry {
            Some(seconds) => CookieOptions::new().max_age(seconds),
            None => CookieOptions::new(),
        };
        self.store.write(TOKEN_COOKIE, &credential.access_token, &options);
        match &credential.refresh_token {
            Some(refresh) => self.store.write(REFRESH_TOKEN_COOKIE, refresh, &options),
            None => tracing::warn!("access_token granted without refresh_token"),
        }
        tracing::info!(expiry = ?credential.expiry, "session credentials stored");
        true
    }

    /// Forget both session credentials.
    pub fn logout(&self) {
        self.store.remove(TOKEN_COOKIE);
        self.store.remove(REFRESH_TOKEN_COOKIE);
        tracing::info!("session credentials cleared");
    }
}

/// Append `_=<millis>` to the query, keeping any fragment last.
fn with_cache_buster(url: &str, millis: i64) -> String {
    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };
    let separator = match base.find('?') {
        None => "?",
        Some(_) if base.ends_with('?') || base.ends_with('&') => "",
        Some(_) => "&",
    };
    let mut out = format!("{base}{separator}{CACHE_BUST_PARAM}={millis}");
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

/// JSON when it parses, otherwise the raw text as a JSON string.
fn decode_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}
