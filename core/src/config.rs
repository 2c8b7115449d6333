//! Client configuration parsed from environment variables.

use std::time::Duration;

use crate::classify::ErrorPolicy;
use crate::error::ApiError;

pub const DEFAULT_USER_API_URL: &str = "http://localhost:3000/users";
pub const DEFAULT_LOGOUT_PATH: &str = "/logout";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub logout_path: String,
    pub error_policy: ErrorPolicy,
    /// Origin used to resolve root-relative request URLs.
    pub origin: Option<String>,
    /// `None` leaves the transport's own default in place.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_USER_API_URL.to_string(),
            logout_path: DEFAULT_LOGOUT_PATH.to_string(),
            error_policy: ErrorPolicy::default(),
            origin: None,
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `USER_API_URL`: worker service base URL, default `http://localhost:3000/users`
    /// - `LOGOUT_PATH`: navigation target on session expiry, default `/logout`
    /// - `SESSION_ERROR_POLICY`: `collapse` (default) or `status_aware`
    /// - `API_ORIGIN`: origin for root-relative URLs
    /// - `API_REQUEST_TIMEOUT_SECS`: request timeout, unset by default
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let api_base_url = lookup("USER_API_URL")
            .unwrap_or_else(|| DEFAULT_USER_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let logout_path = lookup("LOGOUT_PATH").unwrap_or_else(|| DEFAULT_LOGOUT_PATH.to_string());
        let error_policy = match lookup("SESSION_ERROR_POLICY") {
            Some(raw) => raw.parse()?,
            None => ErrorPolicy::default(),
        };
        let origin = lookup("API_ORIGIN").map(|o| o.trim_end_matches('/').to_string());
        let request_timeout = lookup("API_REQUEST_TIMEOUT_SECS")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|_| ApiError::Config(format!("invalid API_REQUEST_TIMEOUT_SECS '{raw}'")))
            })
            .transpose()?;

        Ok(Self {
            api_base_url,
            logout_path,
            error_policy,
            origin,
            request_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let cfg = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, ClientConfig::default());
        assert_eq!(cfg.logout_path, "/logout");
        assert_eq!(cfg.error_policy, ErrorPolicy::CollapseToSessionExpiry);
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = ClientConfig::from_lookup(lookup(&[
            ("USER_API_URL", "https://api.example.test/users/"),
            ("LOGOUT_PATH", "/auth/logout"),
            ("SESSION_ERROR_POLICY", "status_aware"),
            ("API_ORIGIN", "https://dash.example.test/"),
            ("API_REQUEST_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();
        assert_eq!(cfg.api_base_url, "https://api.example.test/users");
        assert_eq!(cfg.logout_path, "/auth/logout");
        assert_eq!(cfg.error_policy, ErrorPolicy::StatusAware);
        assert_eq!(cfg.origin.as_deref(), Some("https://dash.example.test"));
        assert_eq!(cfg.request_timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn unknown_policy_errors() {
        let err = ClientConfig::from_lookup(lookup(&[("SESSION_ERROR_POLICY", "bad")]))
            .unwrap_err()
            .to_string();
        assert!(err.contains("unknown SESSION_ERROR_POLICY"));
    }

    #[test]
    fn bad_timeout_errors() {
        let err = ClientConfig::from_lookup(lookup(&[("API_REQUEST_TIMEOUT_SECS", "soon")]))
            .unwrap_err()
            .to_string();
        assert!(err.contains("invalid API_REQUEST_TIMEOUT_SECS"));
    }
}
