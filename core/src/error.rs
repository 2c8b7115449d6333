//! Error types for the worker API client.
//!
//! # Design
//! `get`/`post` never return errors: failures are committed to `CallState`.
//! `ApiError` covers everything around the calls that can still fail
//! (configuration, transport construction, decoding committed payloads).
//! `TransportError` is what a `Transport` reports when no HTTP response is
//! available to interpret.

/// Errors returned by configuration, transport setup and payload decoding.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Config(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// A committed payload did not have the expected shape.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// A request body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Failures a transport reports instead of a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request went out but no complete response came back
    /// (connect failure, timeout, broken body).
    #[error("no response: {0}")]
    NoResponse(String),

    /// The request could not be constructed or dispatched at all.
    #[error("{0}")]
    Request(String),
}
