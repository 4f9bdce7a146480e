//! GraphQL-over-HTTP Envelope
//!
//! Requests name one root field in `operationName`; responses carry that
//! field under `data` and any failure in `errors` with a code extension.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::DomainError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest {
    pub operation_name: String,
    #[serde(default)]
    pub variables: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorExtensions {
    pub code: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphqlError {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
    pub extensions: ErrorExtensions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphqlResponse {
    pub data: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphqlError>,
}

/// Failure while running one operation
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unknown operation {0}")]
    UnknownOperation(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::UnknownOperation(_) => "BAD_REQUEST",
            ApiError::Domain(e) => e.code(),
        }
    }
}

impl GraphqlResponse {
    pub fn ok(field: &str, value: Value) -> Self {
        let mut data = Map::new();
        data.insert(field.to_string(), value);
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// Field resolves to null with one error on its path
    pub fn field_error(field: &str, error: &ApiError) -> Self {
        let mut data = Map::new();
        data.insert(field.to_string(), Value::Null);
        Self {
            data: Some(data),
            errors: vec![GraphqlError {
                message: error.to_string(),
                path: vec![field.to_string()],
                extensions: ErrorExtensions { code: error.code() },
            }],
        }
    }

    /// Error outside any field, e.g. an unreadable body or a rejected token
    pub fn request_error(error: &DomainError) -> Self {
        Self {
            data: None,
            errors: vec![GraphqlError {
                message: error.to_string(),
                path: Vec::new(),
                extensions: ErrorExtensions { code: error.code() },
            }],
        }
    }
}
