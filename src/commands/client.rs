//! Client Commands
//!
//! Bindings for profile, membership, user directory and file operations.

use serde::Serialize;

use super::item::SearchFilter;
use super::{NoArgs, Transport};
use crate::error::ClientResult;
use crate::models::{File, GenericResult, Invite, Membership, Profile, PublicUser};

// ========================
// Argument Structs
// ========================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InviteArgs<'a> {
    email: &'a str,
    client_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InviteIdArgs<'a> {
    invite_id: &'a str,
}

#[derive(Serialize)]
struct PublicUsersArgs<'a> {
    filters: SearchFilter<'a>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileArgs {
    pub original_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub size: i64,
}

// ========================
// Commands
// ========================

pub async fn my_profile(t: &Transport) -> ClientResult<Profile> {
    t.invoke("myProfile", &NoArgs {}).await
}

pub async fn public_users(t: &Transport, search: Option<&str>) -> ClientResult<Vec<PublicUser>> {
    let args = PublicUsersArgs {
        filters: SearchFilter { search },
    };
    t.invoke("publicUsers", &args).await
}

pub async fn invite_to_client(t: &Transport, email: &str, client_id: &str) -> ClientResult<Invite> {
    t.invoke("inviteToClient", &InviteArgs { email, client_id }).await
}

pub async fn accept_client_invite(t: &Transport, invite_id: &str) -> ClientResult<Membership> {
    t.invoke("acceptClientInvite", &InviteIdArgs { invite_id }).await
}

pub async fn decline_client_invite(t: &Transport, invite_id: &str) -> ClientResult<GenericResult> {
    t.invoke("declineClientInvite", &InviteIdArgs { invite_id }).await
}

pub async fn create_file(t: &Transport, args: &CreateFileArgs) -> ClientResult<File> {
    t.invoke("createFile", args).await
}
