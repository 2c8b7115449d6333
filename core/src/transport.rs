//! Executes plain-data requests over the network.
//!
//! # Design
//! A `Transport` returns every HTTP response as data, whatever its status.
//! It only errs when there is no response to hand back, and then it says
//! which side of dispatch the failure happened on.

use async_trait::async_trait;

use crate::config::ClientConfig;
use crate::error::{ApiError, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Production transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    origin: Option<String>,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, ApiError> {
        Self::from_config(&ClientConfig::default())
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            origin: config.origin.clone(),
        })
    }

    /// Resolve root-relative URLs such as `/users` against `origin`.
    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = Some(origin.trim_end_matches('/').to_string());
        self
    }

    fn resolve(&self, url: &str) -> String {
        match &self.origin {
            Some(origin) if url.starts_with('/') && !url.starts_with("//") => format!("{origin}{url}"),
            _ => url.to_string(),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };
        let mut builder = self.http.request(method, self.resolve(&request.url));
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(key, value)| value.to_str().ok().map(|v| (key.to_string(), v.to_string())))
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::NoResponse(e.to_string()))?;

        Ok(HttpResponse { status, headers, body })
    }
}

/// Builder errors (bad URL, bad header) never left the process.
fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_builder() {
        TransportError::Request(e.to_string())
    } else {
        TransportError::NoResponse(e.to_string())
    }
}
