//! Identifier tokens for library records.
//!
//! Every record is named by a random 128-bit value rendered in the canonical
//! hyphenated lowercase form (`xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::{Uuid, Variant};

use super::error::LibraryError;

const CANONICAL_LEN: usize = 36;

fn is_rfc4122_v1_to_v5(uuid: &Uuid) -> bool {
    uuid.get_variant() == Variant::RFC4122 && matches!(uuid.get_version_num(), 1..=5)
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(Uuid);

impl EntityId {
    pub fn generate() -> Self {
        EntityId(Uuid::new_v4())
    }

    /// Parses a boundary string, accepting only the canonical hyphenated form
    /// of a nil or RFC 4122 version 1-5 uuid.
    pub fn parse(s: &str) -> Result<Self, LibraryError> {
        let invalid = || LibraryError::InvalidIdentifier(s.to_string());
        if s.len() != CANONICAL_LEN {
            return Err(invalid());
        }
        let uuid = Uuid::try_parse(s).map_err(|_| invalid())?;
        if uuid.is_nil() || is_rfc4122_v1_to_v5(&uuid) {
            Ok(EntityId(uuid))
        } else {
            Err(invalid())
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_hyphenated())
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self)
    }
}

impl FromStr for EntityId {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityId::parse(s)
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        EntityId::parse(&s).map_err(serde::de::Error::custom)
    }
}
