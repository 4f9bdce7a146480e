//! Bearer Token Verification
//!
//! The identity provider is an external collaborator. The server only
//! needs a verified `{email, name, picture}` per request.

mod firebase;

use async_trait::async_trait;

use crate::domain::{DomainError, DomainResult, Identity};

pub use firebase::FirebaseIdentityVerifier;

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify a bearer token; any failure is `Unauthenticated`
    async fn verify(&self, token: &str) -> DomainResult<Identity>;
}

/// Accepts `dev:<email>` tokens without contacting a provider
pub struct DevIdentityVerifier;

#[async_trait]
impl IdentityVerifier for DevIdentityVerifier {
    async fn verify(&self, token: &str) -> DomainResult<Identity> {
        let email = token
            .strip_prefix("dev:")
            .map(str::trim)
            .filter(|e| e.contains('@'))
            .ok_or(DomainError::Unauthenticated)?;
        Ok(Identity {
            email: email.to_string(),
            name: String::new(),
            picture: None,
        })
    }
}

/// Token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
