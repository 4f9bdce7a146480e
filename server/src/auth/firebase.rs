//! Firebase ID token lookup over the Identity Toolkit REST API

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult, Identity};
use super::IdentityVerifier;

pub struct FirebaseIdentityVerifier {
    client: reqwest::Client,
    lookup_url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<ProviderUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderUser {
    email: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
}

impl FirebaseIdentityVerifier {
    pub fn new(lookup_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            lookup_url: lookup_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseIdentityVerifier {
    async fn verify(&self, token: &str) -> DomainResult<Identity> {
        let mut request = self.client.post(&self.lookup_url);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }
        let response = request
            .json(&LookupRequest { id_token: token })
            .send()
            .await
            .map_err(|e| DomainError::Internal(format!("Identity provider unreachable: {}", e)))?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "identity provider rejected token");
            return Err(DomainError::Unauthenticated);
        }

        let body: LookupResponse = response
            .json()
            .await
            .map_err(|_| DomainError::Unauthenticated)?;
        let user = body
            .users
            .into_iter()
            .next()
            .ok_or(DomainError::Unauthenticated)?;
        let email = user
            .email
            .filter(|e| !e.is_empty())
            .ok_or(DomainError::Unauthenticated)?;

        Ok(Identity {
            email,
            name: user.display_name.unwrap_or_default(),
            picture: user.photo_url,
        })
    }
}
