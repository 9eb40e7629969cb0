use crate::blockchain::Blockchain;
use crate::error::ApiError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Mutex;

/// Shared application state: the one in-memory blockchain of this process.
/// Every read and every append goes through the same lock.
pub struct AppState {
    pub blockchain: Mutex<Blockchain>,
}

impl AppState {
    pub fn new(difficulty: u32) -> Self {
        Self {
            blockchain: Mutex::new(Blockchain::new(difficulty)),
        }
    }
}

/* ---------- Chain API Models ---------- */

/// Body of `POST /blockchain/add`, checked field by field so the client
/// learns which field was wrong.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    pub amount: f64,
}

impl TransferRequest {
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        // `null` reads as an object with no fields
        let fields: Map<String, Value> = serde_json::from_slice::<Option<_>>(body)
            .map_err(|e| ApiError::MalformedBody(e.to_string()))?
            .unwrap_or_default();

        let from = string_field(&fields, "from")?;
        let to = string_field(&fields, "to")?;
        let amount = fields
            .get("amount")
            .and_then(Value::as_f64)
            .ok_or(ApiError::InvalidField("amount"))?;

        Ok(Self { from, to, amount })
    }
}

fn string_field(fields: &Map<String, Value>, name: &'static str) -> Result<String, ApiError> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or(ApiError::InvalidField(name))
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty: u32,
}
