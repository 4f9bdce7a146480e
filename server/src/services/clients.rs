//! Client Invites and Profile

use serde::Deserialize;
use tracing::info;

use crate::domain::{DomainError, DomainResult, GlobalId, IdTag, Role, User};
use crate::repository::{InviteRepository, Repository, UserRepository};
use super::access::can_manage_client;
use super::views::{GenericResult, InviteView, MembershipView, ProfileView, PublicUserView};
use super::Services;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteToClientInput {
    pub email: String,
    pub client_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptClientInviteInput {
    pub invite_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclineClientInviteInput {
    pub invite_id: String,
}

impl Services {
    /// Idempotent per (email, client)
    pub async fn invite_to_client(&self, user: &User, input: InviteToClientInput) -> DomainResult<InviteView> {
        self.db
            .with_transaction(|conn| {
                let email = input.email.trim();
                if email.is_empty() {
                    return Err(DomainError::invalid("Email is required"));
                }
                let client_id = parse_ref(&input.client_id, IdTag::Client, "Client")?;

                let users = UserRepository::new(conn);
                let client = users
                    .find_client(client_id)?
                    .ok_or_else(|| DomainError::not_found("Client not found"))?;
                if !can_manage_client(conn, user, &client)? {
                    return Err(DomainError::Unauthorized("Not allowed to manage client".to_string()));
                }
                if users.is_email_member(email, client.id)? {
                    return Err(DomainError::conflict("User is already in the client"));
                }

                let invite = InviteRepository::new(conn).upsert(email, &client, user.id)?;
                Ok(InviteView::from(&invite))
            })
            .await
    }

    pub async fn accept_client_invite(
        &self,
        user: &User,
        input: AcceptClientInviteInput,
    ) -> DomainResult<MembershipView> {
        self.db
            .with_transaction(|conn| {
                let invites = InviteRepository::new(conn);
                let invite_id = parse_ref(&input.invite_id, IdTag::InviteToClient, "Invite")?;
                let invite = invites
                    .find_by_id(invite_id)?
                    .filter(|i| i.email.eq_ignore_ascii_case(&user.email))
                    .ok_or_else(|| DomainError::not_found("Invite not found"))?;

                let users = UserRepository::new(conn);
                let membership = match users.membership(user.id, invite.client.id)? {
                    Some(existing) => existing,
                    None => users.add_membership(user.id, &invite.client, Role::Member)?,
                };
                invites.delete(invite.id)?;

                info!(user_id = user.id, client_id = invite.client.id, "client invite accepted");
                Ok(MembershipView::from(&membership))
            })
            .await
    }

    pub async fn decline_client_invite(
        &self,
        user: &User,
        input: DeclineClientInviteInput,
    ) -> DomainResult<GenericResult> {
        self.db
            .with_transaction(|conn| {
                let invites = InviteRepository::new(conn);
                let invite_id = parse_ref(&input.invite_id, IdTag::InviteToClient, "Invite")?;
                let invite = invites
                    .find_by_id(invite_id)?
                    .filter(|i| i.email.eq_ignore_ascii_case(&user.email))
                    .ok_or_else(|| DomainError::not_found("Invite not found"))?;
                invites.delete(invite.id)?;
                Ok(GenericResult::ok("Invite declined"))
            })
            .await
    }

    pub async fn my_profile(&self, user: &User) -> DomainResult<ProfileView> {
        self.db
            .read(|conn| {
                let memberships = UserRepository::new(conn).memberships(user.id)?;
                let invites = InviteRepository::new(conn).list_for_email(&user.email)?;
                Ok(ProfileView {
                    user: PublicUserView::from(user),
                    clients: memberships.iter().map(MembershipView::from).collect(),
                    invites: invites.iter().map(InviteView::from).collect(),
                })
            })
            .await
    }
}

fn parse_ref(raw: &str, tag: IdTag, what: &str) -> DomainResult<i64> {
    raw.parse::<GlobalId>()
        .map_err(|_| DomainError::not_found(format!("{} not found", what)))?
        .expect_tag(tag, what)
}
