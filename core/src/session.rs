//! Session credentials and the hooks fired when a session ends.
//!
//! # Design
//! The client never navigates or renders anything itself. When the
//! classifier decides a session has expired, it hands a `Notice` and the
//! logout path to a `SessionListener` supplied by the host application.

use serde_json::Value;

/// Access/refresh token pair granted by a login-like response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Lifetime in whole seconds as reported by the server.
    pub expiry: Option<i64>,
}

impl Credential {
    /// Extract a credential from a successful response payload.
    ///
    /// A non-empty string `access_token` is all it takes. The siblings are
    /// read leniently: a scalar `refresh_token` is stringified, and `expiry`
    /// may be an integer, a float (truncated) or a numeric string. An expiry
    /// that still does not parse is dropped, leaving a session cookie.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let access_token = payload
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())?
            .to_string();
        let refresh_token = payload.get("refresh_token").and_then(scalar_to_string);
        let raw_expiry = payload.get("expiry").filter(|v| !v.is_null());
        let expiry = raw_expiry.and_then(lenient_seconds);
        if raw_expiry.is_some() && expiry.is_none() {
            tracing::warn!("unparseable expiry in credential grant, storing session cookies");
        }
        Some(Self {
            access_token,
            refresh_token,
            expiry,
        })
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_seconds(value: &Value) -> Option<i64> {
    let truncate = |f: f64| f.is_finite().then(|| f.trunc() as i64);
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().and_then(truncate))
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeVariant {
    Default,
    Destructive,
}

/// A fire-and-forget, toast-style message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub variant: NoticeVariant,
}

impl Notice {
    pub fn session_expired() -> Self {
        Self {
            title: "Session Expired".to_string(),
            description: "Please login again".to_string(),
            variant: NoticeVariant::Destructive,
        }
    }
}

/// Host-side reactions to an expired session.
pub trait SessionListener: Send + Sync {
    fn notify(&self, notice: &Notice);

    /// Perform a full navigation to `path`.
    fn navigate(&self, path: &str);
}

/// Listener that only records the events in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl SessionListener for TracingListener {
    fn notify(&self, notice: &Notice) {
        tracing::warn!(title = %notice.title, description = %notice.description, "session notice");
    }

    fn navigate(&self, path: &str) {
        tracing::info!(%path, "navigation requested");
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn credential_from_login_payload() {
        let payload = json!({"access_token": "abc", "refresh_token": "def", "expiry": 3600});
        let credential = Credential::from_payload(&payload).unwrap();
        assert_eq!(credential.access_token, "abc");
        assert_eq!(credential.refresh_token.as_deref(), Some("def"));
        assert_eq!(credential.expiry, Some(3600));
    }

    #[test]
    fn no_access_token_means_no_credential() {
        assert_eq!(Credential::from_payload(&json!({"id": "w1"})), None);
        assert_eq!(Credential::from_payload(&json!({"access_token": ""})), None);
        assert_eq!(Credential::from_payload(&json!({"access_token": null})), None);
        assert_eq!(Credential::from_payload(&json!("access_token")), None);
        assert_eq!(Credential::from_payload(&json!([{"access_token": "x"}])), None);
    }

    #[test]
    fn missing_siblings_are_optional() {
        let credential = Credential::from_payload(&json!({"access_token": "abc"})).unwrap();
        assert_eq!(credential.refresh_token, None);
        assert_eq!(credential.expiry, None);
    }

    #[test]
    fn float_and_string_expiry_are_whole_seconds() {
        for expiry in [json!(3600.0), json!(3600.9), json!("3600"), json!(" 3600.5 ")] {
            let credential =
                Credential::from_payload(&json!({"access_token": "abc", "refresh_token": "def", "expiry": expiry}))
                    .unwrap();
            assert_eq!(credential.expiry, Some(3600), "{expiry}");
            assert_eq!(credential.refresh_token.as_deref(), Some("def"));
        }
    }

    #[test]
    fn unparseable_expiry_still_grants_token() {
        for expiry in [json!("soon"), json!({"seconds": 60}), json!(true)] {
            let credential = Credential::from_payload(&json!({"access_token": "abc", "expiry": expiry})).unwrap();
            assert_eq!(credential.access_token, "abc");
            assert_eq!(credential.expiry, None);
        }
    }

    #[test]
    fn scalar_refresh_token_is_stringified() {
        let credential = Credential::from_payload(&json!({"access_token": "abc", "refresh_token": 42})).unwrap();
        assert_eq!(credential.refresh_token.as_deref(), Some("42"));
        let credential =
            Credential::from_payload(&json!({"access_token": "abc", "refresh_token": {"v": 1}})).unwrap();
        assert_eq!(credential.refresh_token, None);
    }

    #[test]
    fn session_expired_notice_text() {
        let notice = Notice::session_expired();
        assert_eq!(notice.title, "Session Expired");
        assert_eq!(notice.description, "Please login again");
        assert_eq!(notice.variant, NoticeVariant::Destructive);
    }
}
