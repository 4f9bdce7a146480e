//! Identity Resolver
//!
//! Maps a verified identity onto a persisted user, provisioning the user
//! and their individual client the first time an email is seen.

use tracing::info;

use crate::domain::{Client, DomainError, DomainResult, Identity, Role, User};
use crate::repository::{Db, UserRepository};

pub async fn resolve_user(db: &Db, identity: &Identity) -> DomainResult<User> {
    let email = identity.email.trim();
    if email.is_empty() {
        return Err(DomainError::Unauthenticated);
    }

    db.with_transaction(|conn| {
        let users = UserRepository::new(conn);
        if let Some(user) = users.find_by_email(email)? {
            return Ok(user);
        }

        let name = display_name(identity, email);
        let user = users.create(email, &name, identity.picture.as_deref())?;
        let client = users.create_client(&Client::individual_name(&name))?;
        users.add_membership(user.id, &client, Role::Owner)?;

        info!(user_id = user.id, client_id = client.id, "provisioned new user");
        Ok(user)
    })
    .await
}

/// Provider name, or the local part of the email when the name is blank
fn display_name(identity: &Identity, email: &str) -> String {
    let name = identity.name.trim();
    if name.is_empty() {
        email.split('@').next().unwrap_or(email).to_string()
    } else {
        name.to_string()
    }
}
