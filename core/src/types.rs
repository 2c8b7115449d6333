//! Worker DTOs and the endpoints the dashboard calls.
//!
//! # Design
//! These mirror the worker service's wire format (camelCase, `_id`) but are
//! defined independently from the mock-server crate; the integration tests
//! catch schema drift. The client itself stays untyped (`serde_json::Value`),
//! so these are what callers use to build bodies and read committed data.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankDetails {
    pub bank_name: String,
    pub account_number: String,
    pub ifsc_code: String,
    pub account_holder_name: String,
    pub cancel_cheque_url: String,
    pub pan_card: String,
}

/// Body of a worker registration, as submitted by the onboarding form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRegistration {
    pub full_name: String,
    pub phone: String,
    pub pin: u16,
    pub role: String,
    pub address: String,
    pub state: String,
    pub city: String,
    pub pincode: String,
    pub aadhar_card: String,
    pub bank_details: BankDetails,
    pub per_sq_ft_price: String,
    pub total_sq_ft: String,
}

impl WorkerRegistration {
    /// Replace `pin` with a fresh four-digit number, as done at submit time.
    pub fn with_random_pin(mut self) -> Self {
        self.pin = random_pin();
        self
    }
}

/// A four-digit pin in `1000..=9999`.
pub fn random_pin() -> u16 {
    rand::rng().random_range(1000..=9999)
}

/// A worker as returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    #[serde(rename = "_id")]
    pub id: String,
    pub full_name: String,
    pub phone: String,
    pub role: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_sq_ft_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_sq_ft: Option<f64>,
    #[serde(default)]
    pub bank_details: Vec<BankDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body of a delete request; the id is repeated in the path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteWorker {
    pub id: String,
}

/// URLs of the worker service, rooted at the configured base URL.
#[derive(Debug, Clone)]
pub struct WorkerEndpoints {
    base_url: String,
}

impl WorkerEndpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn list(&self) -> String {
        self.base_url.clone()
    }

    pub fn login(&self) -> String {
        format!("{}/login", self.base_url)
    }

    pub fn register(&self) -> String {
        format!("{}/register", self.base_url)
    }

    pub fn delete(&self, id: &str) -> String {
        format!("{}/{id}/delete", self.base_url)
    }
}

/// Decode the `{data: [...]}` payload of the list endpoint.
pub fn workers_from_payload(payload: &Value) -> Result<Vec<Worker>, ApiError> {
    let data = payload
        .get("data")
        .ok_or_else(|| ApiError::Deserialization("missing field `data`".to_string()))?;
    Vec::<Worker>::deserialize(data).map_err(|e| ApiError::Deserialization(e.to_string()))
}
