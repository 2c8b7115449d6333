//! Failure classification policy.
//!
//! Every failed call ends up here exactly once. The result says what to
//! commit to `CallState::error` and whether the session is considered over.

use std::str::FromStr;

use serde_json::Value;

use crate::error::ApiError;
use crate::state::CallError;

/// How response-carrying failures map onto session expiry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Every non-2xx response ends the session, whatever its status.
    #[default]
    CollapseToSessionExpiry,
    /// Only 401 and 403 end the session; other statuses are committed as-is.
    StatusAware,
}

impl FromStr for ErrorPolicy {
    type Err = ApiError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "collapse" => Ok(Self::CollapseToSessionExpiry),
            "status_aware" => Ok(Self::StatusAware),
            other => Err(ApiError::Config(format!(
                "unknown SESSION_ERROR_POLICY '{other}' (expected 'collapse' or 'status_aware')"
            ))),
        }
    }
}

/// A call that did not produce a 2xx response.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    ServerResponse { status: u16, body: Value },
    NoResponse,
    Request(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub error: CallError,
    pub session_expired: bool,
}

pub fn classify(failure: Failure, policy: ErrorPolicy) -> Classification {
    match failure {
        Failure::ServerResponse { status, body } => {
            let session_expired = match policy {
                ErrorPolicy::CollapseToSessionExpiry => true,
                ErrorPolicy::StatusAware => matches!(status, 401 | 403),
            };
            Classification {
                error: CallError::Response { status, body },
                session_expired,
            }
        }
        Failure::NoResponse => Classification {
            error: CallError::NoResponse,
            session_expired: false,
        },
        Failure::Request(message) => Classification {
            error: CallError::Request(message),
            session_expired: false,
        },
    }
}
