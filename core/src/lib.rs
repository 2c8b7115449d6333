//! Authenticated API client core for the worker dashboard.
//!
//! # Overview
//! Callers hold an `ApiHandle` and issue `get`/`post` against the worker
//! service. Every call publishes `{data, error, loading}` through the
//! handle's state instead of returning a `Result`.
//!
//! # Design
//! - `ApiClient` composes requests and interprets responses as plain data
//!   (`HttpRequest` / `HttpResponse`); a `Transport` performs the I/O.
//! - Session credentials live in a shared `CredentialStore`, by default a
//!   browser-like `CookieJar`; they are read on every request and written
//!   only from successful payloads carrying `access_token`.
//! - Failed calls go through `classify`; session expiry is reported to an
//!   injected `SessionListener` rather than acted on directly.
//! - DTOs for the worker endpoints are defined independently from the
//!   mock-server crate; integration tests catch schema drift.

pub mod classify;
pub mod client;
pub mod clock;
pub mod config;
pub mod cookies;
pub mod error;
pub mod handle;
pub mod http;
pub mod session;
pub mod state;
pub mod transport;
pub mod types;

pub use classify::{classify, Classification, ErrorPolicy, Failure};
pub use client::ApiClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ClientConfig;
pub use cookies::{render_cookie, CookieJar, CookieOptions, CredentialStore, DirectiveValue};
pub use error::{ApiError, TransportError};
pub use handle::ApiHandle;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use session::{Credential, Notice, NoticeVariant, SessionListener, TracingListener};
pub use state::{CallError, CallState, NO_RESPONSE_MESSAGE};
pub use transport::{ReqwestTransport, Transport};
pub use types::{BankDetails, DeleteWorker, LoginRequest, Worker, WorkerEndpoints, WorkerRegistration};
