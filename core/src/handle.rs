//! The data-fetching handle callers hold: `get`, `post` and observable state.
//!
//! # Design
//! One `ApiHandle` owns one `CallState`, published through a `watch`
//! channel so form and table components can react to transitions. Calls
//! never return errors; every outcome is committed to that state.
//!
//! Each call takes a generation number when it starts. Only the latest
//! generation may commit, so a slow early response cannot overwrite a newer
//! one. Starting a call and committing one both happen under the channel's
//! write lock, which keeps `loading` consistent with the generation that set
//! it.
//!
//! Side effects that outlive the view still run for stale responses:
//! credentials from a late login response are stored, and a late
//! session-expiry still reaches the `SessionListener`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;

use crate::classify::{classify, Classification, ErrorPolicy, Failure};
use crate::client::ApiClient;
use crate::config::{ClientConfig, DEFAULT_LOGOUT_PATH};
use crate::error::TransportError;
use crate::http::HttpRequest;
use crate::session::{Notice, SessionListener, TracingListener};
use crate::state::CallState;
use crate::transport::Transport;

#[derive(Clone)]
pub struct ApiHandle {
    client: ApiClient,
    transport: Arc<dyn Transport>,
    listener: Arc<dyn SessionListener>,
    policy: ErrorPolicy,
    logout_path: String,
    state: Arc<watch::Sender<CallState>>,
    generation: Arc<AtomicU64>,
}

impl std::fmt::Debug for ApiHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiHandle")
            .field("policy", &self.policy)
            .field("logout_path", &self.logout_path)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl ApiHandle {
    pub fn new(client: ApiClient, transport: Arc<dyn Transport>) -> Self {
        let (state, _) = watch::channel(CallState::default());
        Self {
            client,
            transport,
            listener: Arc::new(TracingListener),
            policy: ErrorPolicy::default(),
            logout_path: DEFAULT_LOGOUT_PATH.to_string(),
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn from_config(config: &ClientConfig, client: ApiClient, transport: Arc<dyn Transport>) -> Self {
        Self::new(client, transport)
            .with_policy(config.error_policy)
            .with_logout_path(&config.logout_path)
    }

    pub fn with_listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_logout_path(mut self, path: &str) -> Self {
        self.logout_path = path.to_string();
        self
    }

    /// A handle for another logical operation: same client, transport and
    /// listener, fresh state.
    pub fn fork(&self) -> Self {
        let (state, _) = watch::channel(CallState::default());
        Self {
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            ..self.clone()
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> CallState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CallState> {
        self.state.subscribe()
    }

    pub async fn get(&self, url: &str) {
        let call = self.begin();
        let request = self.client.build_get(url);
        let outcome = self.dispatch(request).await;
        self.complete(call, outcome);
    }

    pub async fn post<B: Serialize + ?Sized>(&self, url: &str, body: &B) {
        let call = self.begin();
        let outcome = match self.client.build_post(url, body) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => Err(Failure::Request(e.to_string())),
        };
        if let Ok(payload) = &outcome {
            self.client.persist_credentials(payload);
        }
        self.complete(call, outcome);
    }

    /// Clear stored credentials. Call state is left as it is.
    pub fn logout(&self) {
        self.client.logout();
    }

    fn begin(&self) -> InFlight<'_> {
        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.begin();
        });
        InFlight {
            state: &self.state,
            latest: &self.generation,
            generation,
            done: false,
        }
    }

    async fn dispatch(&self, request: HttpRequest) -> Result<Value, Failure> {
        tracing::debug!(method = %request.method, url = %request.url, "dispatching request");
        match self.transport.execute(request).await {
            Ok(response) => self.client.parse_response(response),
            Err(TransportError::NoResponse(reason)) => {
                tracing::debug!(%reason, "no response received");
                Err(Failure::NoResponse)
            }
            Err(TransportError::Request(message)) => Err(Failure::Request(message)),
        }
    }

    fn complete(&self, call: InFlight<'_>, outcome: Result<Value, Failure>) {
        match outcome {
            Ok(data) => call.commit(|state| state.succeed(data)),
            Err(failure) => {
                let Classification { error, session_expired } = classify(failure, self.policy);
                if session_expired {
                    tracing::warn!(status = ?error.status(), path = %self.logout_path, "session expired, forcing logout");
                    self.listener.notify(&Notice::session_expired());
                    self.listener.navigate(&self.logout_path);
                }
                call.commit(|state| state.fail(error));
            }
        }
    }
}

/// Releases `loading` on every exit path, including a dropped future.
struct InFlight<'a> {
    state: &'a watch::Sender<CallState>,
    latest: &'a AtomicU64,
    generation: u64,
    done: bool,
}

impl InFlight<'_> {
    fn commit(mut self, apply: impl FnOnce(&mut CallState)) {
        self.done = true;
        let (latest, generation) = (self.latest, self.generation);
        let committed = self.state.send_if_modified(|state| {
            if latest.load(Ordering::SeqCst) != generation {
                return false;
            }
            apply(state);
            true
        });
        if !committed {
            tracing::debug!(generation, "discarding stale response");
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let (latest, generation) = (self.latest, self.generation);
        self.state.send_if_modified(|state| {
            if latest.load(Ordering::SeqCst) != generation || !state.loading {
                return false;
            }
            state.loading = false;
            true
        });
    }
}
