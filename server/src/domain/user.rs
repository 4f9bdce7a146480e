//! Users, Clients and Memberships
//!
//! A Client is an organization/workspace. Every user owns an "individual"
//! client created on first sight.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::ids::IdTag;

/// Verified identity handed over by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub photo_url: Option<String>,
}

impl Entity for User {
    const TAG: IdTag = IdTag::User;

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: i64,
    pub name: String,
}

impl Client {
    pub fn individual_name(user_name: &str) -> String {
        format!("{} individual", user_name)
    }
}

impl Entity for Client {
    const TAG: IdTag = IdTag::Client;

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Owner,
    Admin,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "Owner",
            Role::Admin => "Admin",
            Role::Member => "Member",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "Owner" => Role::Owner,
            "Admin" => Role::Admin,
            _ => Role::Member,
        }
    }

    /// Owners and admins may invite; members are read-only for invites
    pub fn can_manage(&self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }
}

/// Membership of a user in a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserClient {
    pub id: i64,
    pub user_id: i64,
    pub client: Client,
    pub role: Role,
}

impl Entity for UserClient {
    const TAG: IdTag = IdTag::UserClient;

    fn id(&self) -> i64 {
        self.id
    }
}

/// Pending invitation, unique per (email, client)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInvite {
    pub id: i64,
    pub email: String,
    pub client: Client,
    pub invited_by: i64,
    pub created_at: DateTime<Utc>,
}

impl Entity for ClientInvite {
    const TAG: IdTag = IdTag::InviteToClient;

    fn id(&self) -> i64 {
        self.id
    }
}

/// Last time a user looked at a feed (top-level when `parent_id` is None)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedActivity {
    pub user_id: i64,
    pub parent_id: Option<i64>,
    pub last_viewed_at: DateTime<Utc>,
}
