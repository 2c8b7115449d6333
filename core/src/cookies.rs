//! Credential storage behind a narrow, cookie-shaped interface.
//!
//! # Design
//! The client only ever needs `read`, `write` and `remove` by name, so the
//! storage medium sits behind `CredentialStore`. `CookieJar` is the default
//! implementation and behaves like a browser cookie store: every write is a
//! single rendered cookie string (`name=value; max-age=3600; secure`) applied
//! in one mutation, `max-age` is honored on read, and a non-positive
//! `max-age` deletes the entry.
//!
//! The jar is meant to be shared process-wide behind an `Arc`; writes are
//! last-writer-wins.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::clock::{Clock, SystemClock};

/// Cookie holding the bearer access token.
pub const TOKEN_COOKIE: &str = "token";
/// Cookie holding the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Value of a single cookie directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveValue {
    Bool(bool),
    Text(String),
}

/// Ordered cookie directives, rendered after the `name=value` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieOptions {
    directives: Vec<(String, DirectiveValue)>,
}

impl CookieOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_age(self, seconds: i64) -> Self {
        self.directive("max-age", DirectiveValue::Text(seconds.to_string()))
    }

    pub fn flag(self, key: &str) -> Self {
        self.directive(key, DirectiveValue::Bool(true))
    }

    pub fn directive(mut self, key: &str, value: DirectiveValue) -> Self {
        self.directives.push((key.to_string(), value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

/// Render a cookie string the way a `document.cookie` assignment expects it.
///
/// A directive renders as its bare key only when its value is `Bool(true)`;
/// anything else, `Bool(false)` included, renders as `key=value`.
pub fn render_cookie(name: &str, value: &str, options: &CookieOptions) -> String {
    let mut cookie = format!("{name}={value}");
    for (key, directive) in &options.directives {
        cookie.push_str("; ");
        cookie.push_str(key);
        match directive {
            DirectiveValue::Bool(true) => {}
            DirectiveValue::Bool(false) => cookie.push_str("=false"),
            DirectiveValue::Text(text) => {
                cookie.push('=');
                cookie.push_str(text);
            }
        }
    }
    cookie
}

/// Process-wide storage for named credentials.
pub trait CredentialStore: Send + Sync {
    /// Look up a live entry. Absence is not an error.
    fn read(&self, name: &str) -> Option<String>;

    /// Store `value` under `name` in a single mutation.
    fn write(&self, name: &str, value: &str, options: &CookieOptions);

    /// Drop an entry if present.
    fn remove(&self, name: &str);
}

/// A stored cookie as seen by `CookieJar::entries`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub max_age: Option<i64>,
    expires_at: Option<i64>,
}

/// In-memory, browser-like cookie store.
pub struct CookieJar {
    entries: Mutex<Vec<StoredCookie>>,
    clock: Arc<dyn Clock>,
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Values are credentials; only names are printed.
        let names: Vec<String> = self.entries.lock().iter().map(|c| c.name.clone()).collect();
        f.debug_struct("CookieJar").field("names", &names).finish()
    }
}

impl CookieJar {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            clock,
        }
    }

    /// Apply one rendered cookie string, e.g. `token=abc; max-age=3600`.
    ///
    /// Directives other than `max-age` are accepted and ignored. A malformed
    /// `max-age` is ignored too, leaving a session cookie. Strings without a
    /// `name=value` pair are dropped.
    pub fn set_cookie(&self, cookie: &str) {
        let mut parts = cookie.split(';');
        let Some((name, value)) = parts.next().and_then(|pair| pair.split_once('=')) else {
            tracing::debug!("ignoring cookie string without a name=value pair");
            return;
        };
        let name = name.trim();
        if name.is_empty() {
            return;
        }

        let max_age = parts
            .filter_map(|directive| directive.split_once('='))
            .filter(|(key, _)| key.trim().eq_ignore_ascii_case("max-age"))
            .filter_map(|(_, value)| value.trim().parse::<i64>().ok())
            .last();

        let mut entries = self.entries.lock();
        if matches!(max_age, Some(age) if age <= 0) {
            entries.retain(|c| c.name != name);
            return;
        }

        let stored = StoredCookie {
            name: name.to_string(),
            value: value.trim().to_string(),
            max_age,
            expires_at: max_age.map(|age| self.clock.now_millis().saturating_add(age.saturating_mul(1_000))),
        };
        match entries.iter_mut().find(|c| c.name == name) {
            Some(existing) => *existing = stored,
            None => entries.push(stored),
        }
    }

    /// Live entries rendered as a request `Cookie` header (`a=1; b=2`).
    pub fn header(&self) -> String {
        self.entries()
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Snapshot of live entries in insertion order.
    pub fn entries(&self) -> Vec<StoredCookie> {
        let mut entries = self.entries.lock();
        self.purge_expired(&mut entries);
        entries.clone()
    }

    fn purge_expired(&self, entries: &mut Vec<StoredCookie>) {
        let now = self.clock.now_millis();
        entries.retain(|c| c.expires_at.map_or(true, |at| at > now));
    }
}

impl CredentialStore for CookieJar {
    fn read(&self, name: &str) -> Option<String> {
        let mut entries = self.entries.lock();
        self.purge_expired(&mut entries);
        entries.iter().find(|c| c.name == name).map(|c| c.value.clone())
    }

    fn write(&self, name: &str, value: &str, options: &CookieOptions) {
        self.set_cookie(&render_cookie(name, value, options));
    }

    fn remove(&self, name: &str) {
        self.entries.lock().retain(|c| c.name != name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn jar_at(millis: i64) -> (Arc<ManualClock>, CookieJar) {
        let clock = Arc::new(ManualClock::new(millis));
        let jar = CookieJar::with_clock(clock.clone());
        (clock, jar)
    }

    #[test]
    fn render_plain_pair() {
        assert_eq!(render_cookie("token", "abc", &CookieOptions::new()), "token=abc");
    }

    #[test]
    fn render_max_age_and_flags() {
        let options = CookieOptions::new()
            .max_age(3600)
            .flag("secure")
            .directive("httponly", DirectiveValue::Bool(false))
            .directive("path", DirectiveValue::Text("/".to_string()));
        assert_eq!(
            render_cookie("token", "abc", &options),
            "token=abc; max-age=3600; secure; httponly=false; path=/"
        );
    }

    #[test]
    fn read_missing_is_none() {
        let (_, jar) = jar_at(0);
        assert_eq!(jar.read("token"), None);
    }

    #[test]
    fn read_requires_exact_name() {
        let (_, jar) = jar_at(0);
        jar.set_cookie("token_type=bearer");
        assert_eq!(jar.read("token"), None);
        jar.set_cookie("token=abc");
        assert_eq!(jar.read("token").as_deref(), Some("abc"));
    }

    #[test]
    fn value_may_contain_equals() {
        let (_, jar) = jar_at(0);
        jar.set_cookie("token=a=b==");
        assert_eq!(jar.read("token").as_deref(), Some("a=b=="));
    }

    #[test]
    fn write_overwrites_in_place() {
        let (_, jar) = jar_at(0);
        jar.write("a", "1", &CookieOptions::new());
        jar.write("b", "2", &CookieOptions::new());
        jar.write("a", "3", &CookieOptions::new());
        assert_eq!(jar.header(), "a=3; b=2");
    }

    #[test]
    fn max_age_expires_entry() {
        let (clock, jar) = jar_at(10_000);
        jar.write("token", "abc", &CookieOptions::new().max_age(60));
        clock.advance(59_999);
        assert_eq!(jar.read("token").as_deref(), Some("abc"));
        clock.advance(1);
        assert_eq!(jar.read("token"), None);
        assert!(jar.entries().is_empty());
    }

    #[test]
    fn non_positive_max_age_deletes() {
        let (_, jar) = jar_at(0);
        jar.write("token", "abc", &CookieOptions::new());
        jar.write("token", "", &CookieOptions::new().max_age(0));
        assert_eq!(jar.read("token"), None);
    }

    #[test]
    fn malformed_max_age_leaves_session_cookie() {
        let (clock, jar) = jar_at(0);
        jar.set_cookie("token=abc; max-age=undefined");
        clock.advance(i64::from(u32::MAX));
        let entry = &jar.entries()[0];
        assert_eq!(entry.value, "abc");
        assert_eq!(entry.max_age, None);
    }

    #[test]
    fn garbage_string_is_ignored() {
        let (_, jar) = jar_at(0);
        jar.set_cookie("no pair here");
        jar.set_cookie("=value");
        assert!(jar.entries().is_empty());
    }

    #[test]
    fn remove_drops_entry() {
        let (_, jar) = jar_at(0);
        jar.write("refresh_token", "def", &CookieOptions::new());
        jar.remove("refresh_token");
        jar.remove("never-set");
        assert!(jar.entries().is_empty());
    }

    #[test]
    fn debug_hides_values() {
        let (_, jar) = jar_at(0);
        jar.write("token", "super-secret", &CookieOptions::new());
        let printed = format!("{jar:?}");
        assert!(printed.contains("token"));
        assert!(!printed.contains("super-secret"));
    }
}
