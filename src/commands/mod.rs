//! Server Command Wrappers
//!
//! Typed bindings to the server's `/graphql` operations, organized by domain.

mod client;
mod item;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{ClientError, ClientResult};

/// HTTP connection to one server endpoint with one bearer token
#[derive(Clone)]
pub struct Transport {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl Transport {
    /// `endpoint` is the full `/graphql` url
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }

    /// Run one operation and decode its root field
    pub async fn invoke<A, T>(&self, operation: &str, args: &A) -> ClientResult<T>
    where
        A: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = json!({
            "operationName": operation,
            "variables": serde_json::to_value(args)?,
        });
        log::debug!("invoking {}", operation);
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        // 401 still carries an error envelope
        let envelope: Value = response.json().await?;
        unpack(operation, envelope)
    }
}

/// Pull `data.<operation>` out of a response envelope
pub fn unpack<T: DeserializeOwned>(operation: &str, mut envelope: Value) -> ClientResult<T> {
    if let Some(error) = envelope
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
    {
        return Err(ClientError::Graphql {
            message: error["message"].as_str().unwrap_or("Unknown error").to_string(),
            code: error["extensions"]["code"].as_str().unwrap_or("INTERNAL").to_string(),
        });
    }
    let field = envelope
        .get_mut("data")
        .and_then(|data| data.get_mut(operation))
        .map(Value::take)
        .ok_or_else(|| ClientError::Decode(format!("missing data.{}", operation)))?;
    Ok(serde_json::from_value(field)?)
}

#[derive(Serialize)]
struct NoArgs {}

// Re-export all public items
pub use client::*;
pub use item::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GenericResult;

    #[test]
    fn test_unpack_reads_root_field() {
        let envelope = json!({"data": {"deleteItemSummary": {"success": true, "message": "Summary deleted"}}});
        let result: GenericResult = unpack("deleteItemSummary", envelope).unwrap();
        assert!(result.success);
    }

    #[test]
    fn test_unpack_surfaces_first_error() {
        let envelope = json!({
            "data": {"nestItem": null},
            "errors": [{"message": "Cannot nest item under itself", "path": ["nestItem"],
                        "extensions": {"code": "INVALID_INPUT"}}]
        });
        let err = unpack::<GenericResult>("nestItem", envelope).unwrap_err();
        assert_eq!(err.code(), Some("INVALID_INPUT"));
        assert_eq!(err.to_string(), "Cannot nest item under itself (INVALID_INPUT)");
    }

    #[test]
    fn test_unpack_unauthenticated_envelope() {
        let envelope = json!({
            "data": null,
            "errors": [{"message": "Unauthenticated", "extensions": {"code": "UNAUTHENTICATED"}}]
        });
        let err = unpack::<Value>("myProfile", envelope).unwrap_err();
        assert!(err.is_unauthenticated());
    }

    #[test]
    fn test_unpack_missing_field_is_decode_error() {
        let err = unpack::<Value>("items", json!({"data": {}})).unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }
}
