//! Global Identifiers
//!
//! Every entity leaves the server as `Tag:number`, e.g. `Item:42`.
//! Clients treat these as opaque; the structure is a compatibility surface.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::entity::DomainError;

/// Entity kinds that can appear in a global id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdTag {
    User,
    Client,
    UserClient,
    Item,
    InviteToClient,
    File,
}

impl IdTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdTag::User => "User",
            IdTag::Client => "Client",
            IdTag::UserClient => "UserClient",
            IdTag::Item => "Item",
            IdTag::InviteToClient => "InviteToClient",
            IdTag::File => "File",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "User" => Some(IdTag::User),
            "Client" => Some(IdTag::Client),
            "UserClient" => Some(IdTag::UserClient),
            "Item" => Some(IdTag::Item),
            "InviteToClient" => Some(IdTag::InviteToClient),
            "File" => Some(IdTag::File),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalId {
    pub tag: IdTag,
    pub id: i64,
}

impl GlobalId {
    pub fn new(tag: IdTag, id: i64) -> Self {
        Self { tag, id }
    }

    /// Primary key if the id carries the expected tag
    pub fn expect_tag(&self, tag: IdTag, what: &str) -> Result<i64, DomainError> {
        if self.tag == tag {
            Ok(self.id)
        } else {
            Err(DomainError::not_found(format!("{} not found", what)))
        }
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tag.as_str(), self.id)
    }
}

impl FromStr for GlobalId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::invalid(format!("Invalid id: {}", s));
        let (tag, num) = s.split_once(':').ok_or_else(invalid)?;
        let tag = IdTag::from_str(tag).ok_or_else(invalid)?;
        let id: i64 = num.parse().map_err(|_| invalid())?;
        if id <= 0 {
            return Err(invalid());
        }
        Ok(GlobalId { tag, id })
    }
}

impl Serialize for GlobalId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GlobalId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a list of ids that must all carry `tag`
///
/// Any foreign or malformed id is reported as `<what> not found`.
pub fn parse_tagged(raw: &[String], tag: IdTag, what: &str) -> Result<Vec<i64>, DomainError> {
    raw.iter()
        .map(|s| {
            s.parse::<GlobalId>()
                .map_err(|_| DomainError::not_found(format!("{} not found", what)))?
                .expect_tag(tag, what)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_display() {
        let id: GlobalId = "InviteToClient:7".parse().unwrap();
        assert_eq!(id.tag, IdTag::InviteToClient);
        assert_eq!(id.id, 7);
        assert_eq!(id.to_string(), "InviteToClient:7");
    }

    #[test]
    fn test_rejects_malformed() {
        assert!("Item".parse::<GlobalId>().is_err());
        assert!("Item:abc".parse::<GlobalId>().is_err());
        assert!("Item:0".parse::<GlobalId>().is_err());
        assert!("Widget:3".parse::<GlobalId>().is_err());
    }

    #[test]
    fn test_parse_tagged_rejects_foreign_tags() {
        let raw = vec!["User:1".to_string(), "Item:2".to_string()];
        let err = parse_tagged(&raw, IdTag::User, "User(s)").unwrap_err();
        assert_eq!(err.to_string(), "User(s) not found");
    }
}
