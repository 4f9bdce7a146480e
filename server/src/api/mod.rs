//! API Layer
//!
//! axum router exposing `POST /graphql` and `GET /health`. Each request is
//! authenticated, then dispatched by `operationName` to one handler in the
//! `*_cmd` modules.

mod client_cmd;
mod envelope;
mod item_cmd;
mod query_cmd;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{bearer_token, IdentityVerifier};
use crate::domain::{DomainError, DomainResult, User};
use crate::services::{resolve_user, Services};

pub use envelope::{ApiError, GraphqlError, GraphqlRequest, GraphqlResponse};

/// Operation names accepted by `/graphql`
pub const OPERATIONS: &[&str] = &[
    "myProfile",
    "publicUsers",
    "items",
    "getSearchResults",
    "createFile",
    "createMessage",
    "createTask",
    "createQuestion",
    "createInfo",
    "createGoal",
    "amendMessage",
    "amendTask",
    "amendQuestion",
    "amendInfo",
    "amendGoal",
    "acceptAnswer",
    "nestItem",
    "convertItem",
    "summarizeItem",
    "deleteItemSummary",
    "updateGoalConstituents",
    "updateItemGoals",
    "updateItemsBlocked",
    "inviteToClient",
    "acceptClientInvite",
    "declineClientInvite",
    "updateFeedActivity",
];

#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub verifier: Arc<dyn IdentityVerifier>,
}

pub fn router(state: AppState, allowed_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);
    let cors = match allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            tracing::warn!("Invalid CORS origin '{}': {}", allowed_origin, e);
            cors
        }
    };

    Router::new()
        .route("/graphql", post(graphql))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn graphql(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let user = match authenticate(&state, &headers).await {
        Ok(user) => user,
        Err(e) => {
            let body = GraphqlResponse::request_error(&DomainError::Unauthenticated);
            if let DomainError::Internal(msg) = &e {
                tracing::error!("authentication failed: {}", msg);
            }
            return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
        }
    };

    let request: GraphqlRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            let error = DomainError::invalid(format!("Malformed request: {}", e));
            return Json(GraphqlResponse::request_error(&error)).into_response();
        }
    };

    let field = request.operation_name.clone();
    tracing::debug!(operation = %field, user_id = user.id, "dispatching operation");
    let response = match dispatch(&state.services, &user, &field, request.variables).await {
        Ok(value) => GraphqlResponse::ok(&field, value),
        Err(error) => {
            if let ApiError::Domain(DomainError::Internal(msg)) = &error {
                tracing::error!(operation = %field, "operation failed: {}", msg);
            }
            GraphqlResponse::field_error(&field, &error)
        }
    };
    Json(response).into_response()
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> DomainResult<User> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .ok_or(DomainError::Unauthenticated)?;
    let identity = state.verifier.verify(token).await?;
    resolve_user(state.services.db(), &identity).await
}

/// Run one root field
pub async fn dispatch(s: &Services, user: &User, operation: &str, vars: Value) -> Result<Value, ApiError> {
    let vars = if vars.is_null() { json!({}) } else { vars };

    if let Some(item_type) = item_cmd::create_variant(operation) {
        return Ok(item_cmd::create_item(s, user, item_type, vars).await?);
    }
    if let Some(item_type) = item_cmd::amend_variant(operation) {
        return Ok(item_cmd::amend_item(s, user, item_type, vars).await?);
    }

    let result = match operation {
        "myProfile" => client_cmd::my_profile(s, user).await,
        "publicUsers" => query_cmd::public_users(s, vars).await,
        "items" => query_cmd::items(s, user, vars).await,
        "getSearchResults" => query_cmd::get_search_results(s, user, vars).await,
        "updateFeedActivity" => query_cmd::update_feed_activity(s, user, vars).await,
        "createFile" => client_cmd::create_file(s, user, vars).await,
        "acceptAnswer" => item_cmd::accept_answer(s, user, vars).await,
        "nestItem" => item_cmd::nest_item(s, user, vars).await,
        "convertItem" => item_cmd::convert_item(s, user, vars).await,
        "summarizeItem" => item_cmd::summarize_item(s, user, vars).await,
        "deleteItemSummary" => item_cmd::delete_item_summary(s, user, vars).await,
        "updateGoalConstituents" => item_cmd::update_goal_constituents(s, user, vars).await,
        "updateItemGoals" => item_cmd::update_item_goals(s, user, vars).await,
        "updateItemsBlocked" => item_cmd::update_items_blocked(s, user, vars).await,
        "inviteToClient" => client_cmd::invite_to_client(s, user, vars).await,
        "acceptClientInvite" => client_cmd::accept_client_invite(s, user, vars).await,
        "declineClientInvite" => client_cmd::decline_client_invite(s, user, vars).await,
        other => return Err(ApiError::UnknownOperation(other.to_string())),
    };
    Ok(result?)
}

/// Deserialize operation variables; a mismatch is `InvalidInput`
fn input<T: DeserializeOwned>(vars: Value) -> DomainResult<T> {
    serde_json::from_value(vars).map_err(|e| DomainError::invalid(format!("Invalid variables: {}", e)))
}

fn output<T: Serialize>(value: T) -> DomainResult<Value> {
    Ok(serde_json::to_value(value)?)
}
