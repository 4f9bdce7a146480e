//! Domain Layer - Entities and Errors
//!
//! Every stored record is an `Entity` with an integer key and a tagged
//! global id, and every rule violation is a `DomainError`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::{GlobalId, IdTag};

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// Tag used when the entity's id leaves the server as a global id
    const TAG: IdTag;

    /// Returns the entity's primary key
    fn id(&self) -> i64;

    /// Opaque `Tag:number` id exposed to clients
    fn global_id(&self) -> GlobalId {
        GlobalId::new(Self::TAG, self.id())
    }
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
///
/// `Display` is the bare message so it can be handed to clients verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum DomainError {
    #[error("Unauthenticated")]
    Unauthenticated,
    /// Absent, or present but unreadable by the caller
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        DomainError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        DomainError::Conflict(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        DomainError::InvalidInput(msg.into())
    }

    /// Machine readable code carried in `extensions.code`
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Unauthenticated => "UNAUTHENTICATED",
            DomainError::NotFound(_) => "NOT_FOUND",
            DomainError::Conflict(_) => "CONFLICT",
            DomainError::InvalidInput(_) => "INVALID_INPUT",
            DomainError::Unauthorized(_) => "UNAUTHORIZED",
            DomainError::Internal(_) => "INTERNAL",
        }
    }
}

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}
