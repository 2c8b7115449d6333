use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEMO_USERNAME: &str = "admin";
pub const DEMO_PASSWORD: &str = "changeme";
pub const TOKEN_EXPIRY_SECS: u64 = 3600;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BankDetails {
    pub bank_name: String,
    pub account_number: String,
    pub ifsc_code: String,
    pub account_holder_name: String,
    pub cancel_cheque_url: String,
    pub pan_card: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
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
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_sq_ft_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_sq_ft: Option<f64>,
    pub bank_details: Vec<BankDetails>,
}

/// Registration body. Every field is optional on the wire so that missing
/// values surface as a 400 with a message rather than a rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterWorker {
    pub full_name: String,
    pub phone: String,
    pub pin: Option<u16>,
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

#[derive(Deserialize)]
pub struct Login {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub expiry: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Registered {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkerList {
    pub data: Vec<Worker>,
}

#[derive(Default)]
pub struct Store {
    tokens: HashSet<String>,
    workers: Vec<Worker>,
}

pub type Db = Arc<RwLock<Store>>;

type Failure = (StatusCode, Json<Message>);

fn failure(status: StatusCode, message: &str) -> Failure {
    (
        status,
        Json(Message {
            message: message.to_string(),
        }),
    )
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/users", get(list_workers))
        .route("/users/login", post(login))
        .route("/users/register", post(register_worker))
        .route("/users/{id}/delete", post(delete_worker))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn authorize(db: &Db, headers: &HeaderMap) -> Result<(), Failure> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    let known = match token {
        Some(token) => db.read().await.tokens.contains(token),
        None => false,
    };
    if !known {
        tracing::warn!("rejecting request without a valid bearer token");
        return Err(failure(StatusCode::UNAUTHORIZED, "unauthorized"));
    }
    Ok(())
}

async fn login(State(db): State<Db>, Json(input): Json<Login>) -> Result<Json<TokenGrant>, Failure> {
    if input.username != DEMO_USERNAME || input.password != DEMO_PASSWORD {
        return Err(failure(StatusCode::UNAUTHORIZED, "invalid credentials"));
    }
    let grant = TokenGrant {
        access_token: Uuid::new_v4().simple().to_string(),
        refresh_token: Uuid::new_v4().simple().to_string(),
        expiry: TOKEN_EXPIRY_SECS,
    };
    db.write().await.tokens.insert(grant.access_token.clone());
    tracing::info!(username = %input.username, "issued session token");
    Ok(Json(grant))
}

async fn list_workers(State(db): State<Db>, headers: HeaderMap) -> Result<Json<WorkerList>, Failure> {
    authorize(&db, &headers).await?;
    let store = db.read().await;
    Ok(Json(WorkerList {
        data: store.workers.clone(),
    }))
}

async fn register_worker(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<RegisterWorker>,
) -> Result<Json<Registered>, Failure> {
    authorize(&db, &headers).await?;
    if input.full_name.trim().is_empty() {
        return Err(failure(StatusCode::BAD_REQUEST, "fullName is required"));
    }
    if input.phone.len() != 10 || !input.phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(failure(StatusCode::BAD_REQUEST, "phone must be 10 digits"));
    }

    let worker = Worker {
        id: Uuid::new_v4().simple().to_string(),
        full_name: input.full_name,
        phone: input.phone,
        role: input.role,
        address: input.address,
        city: input.city,
        state: input.state,
        pincode: input.pincode,
        status: "active".to_string(),
        per_sq_ft_price: input.per_sq_ft_price.parse().ok(),
        total_sq_ft: input.total_sq_ft.parse().ok(),
        bank_details: vec![input.bank_details],
    };
    let id = worker.id.clone();
    db.write().await.workers.push(worker);
    tracing::info!(%id, "registered worker");
    Ok(Json(Registered { id }))
}

async fn delete_worker(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Message>, Failure> {
    authorize(&db, &headers).await?;
    let mut store = db.write().await;
    let before = store.workers.len();
    store.workers.retain(|w| w.id != id);
    if store.workers.len() == before {
        return Err(failure(StatusCode::NOT_FOUND, "worker not found"));
    }
    tracing::info!(%id, "deleted worker");
    Ok(Json(Message {
        message: "worker deleted".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_serializes_with_wire_names() {
        let worker = Worker {
            id: "w1".to_string(),
            full_name: "Asha Rao".to_string(),
            phone: "9876543210".to_string(),
            role: "painter".to_string(),
            address: String::new(),
            city: "Pune".to_string(),
            state: "Maharashtra".to_string(),
            pincode: "411001".to_string(),
            status: "active".to_string(),
            per_sq_ft_price: Some(12.5),
            total_sq_ft: None,
            bank_details: vec![BankDetails::default()],
        };
        let json = serde_json::to_value(&worker).unwrap();
        assert_eq!(json["_id"], "w1");
        assert_eq!(json["fullName"], "Asha Rao");
        assert_eq!(json["perSqFtPrice"], 12.5);
        assert!(json.get("totalSqFt").is_none());
        assert_eq!(json["bankDetails"][0]["ifscCode"], "");
    }

    #[test]
    fn register_body_tolerates_missing_fields() {
        let input: RegisterWorker = serde_json::from_str(r#"{"fullName":"Asha"}"#).unwrap();
        assert_eq!(input.full_name, "Asha");
        assert!(input.phone.is_empty());
        assert!(input.pin.is_none());
    }

    #[test]
    fn register_body_reads_nested_bank_details() {
        let input: RegisterWorker =
            serde_json::from_str(r#"{"bankDetails":{"bankName":"SBI","panCard":"ABCDE1234F"}}"#).unwrap();
        assert_eq!(input.bank_details.bank_name, "SBI");
        assert_eq!(input.bank_details.pan_card, "ABCDE1234F");
        assert!(input.bank_details.ifsc_code.is_empty());
    }

    #[test]
    fn login_requires_both_fields() {
        let result: Result<Login, _> = serde_json::from_str(r#"{"username":"admin"}"#);
        assert!(result.is_err());
    }
}
