//! Observable result holder for one logical request/response cycle.

use std::fmt;

use serde_json::Value;

/// Committed for a request that went out but never got a response.
pub const NO_RESPONSE_MESSAGE: &str = "No response received";

/// A failure as committed to `CallState::error`.
#[derive(Debug, Clone, PartialEq)]
pub enum CallError {
    /// The server answered with a non-2xx status; `body` is its payload.
    Response { status: u16, body: Value },
    /// The request was sent but nothing came back.
    NoResponse,
    /// The request could not be built or dispatched.
    Request(String),
}

impl CallError {
    /// The committed error as the dashboard sees it: the response body, or a
    /// message string for the two transport-level kinds.
    pub fn payload(&self) -> Value {
        match self {
            CallError::Response { body, .. } => body.clone(),
            CallError::NoResponse => Value::String(NO_RESPONSE_MESSAGE.to_string()),
            CallError::Request(message) => Value::String(message.clone()),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            CallError::Response { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::Response { body: Value::String(text), .. } => f.write_str(text),
            CallError::Response { body, .. } => write!(f, "{body}"),
            CallError::NoResponse => f.write_str(NO_RESPONSE_MESSAGE),
            CallError::Request(message) => f.write_str(message),
        }
    }
}

/// `{data, error, loading}` for one client handle.
///
/// `data` and `error` are never both set. Both are unset only before the
/// first call completes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallState {
    pub data: Option<Value>,
    pub error: Option<CallError>,
    pub loading: bool,
}

impl CallState {
    pub(crate) fn begin(&mut self) {
        self.loading = true;
    }

    pub(crate) fn succeed(&mut self, data: Value) {
        self.data = Some(data);
        self.error = None;
        self.loading = false;
    }

    pub(crate) fn fail(&mut self, error: CallError) {
        self.data = None;
        self.error = Some(error);
        self.loading = false;
    }

    pub fn is_idle(&self) -> bool {
        !self.loading && self.data.is_none() && self.error.is_none()
    }
}
