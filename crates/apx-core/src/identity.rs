//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the identifiers that cross the backend boundary.
//! You cannot pass a `GatewayId` where a `PublishRecordId` is expected.
//!
//! The backend generates every identifier and the client never interprets
//! them, so they are opaque strings. Some backend deployments emit numeric
//! ids; deserialization accepts JSON integers and stores their decimal form.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Construct from a raw value, rejecting blank input.
            pub fn new(raw: impl Into<String>) -> Result<Self, CoreError> {
                let raw = raw.into();
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(CoreError::InvalidIdentifier {
                        kind: $kind,
                        reason: "must not be blank".to_string(),
                    });
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Borrow the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = RawId::deserialize(deserializer)?.into_string();
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Wire form of an identifier: string or integer.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Unsigned(u64),
    Signed(i64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Unsigned(n) => n.to_string(),
            Self::Signed(n) => n.to_string(),
        }
    }
}

opaque_id!(
    /// Identifier of an API Definition (REST API, MCP server, Agent API, Model API).
    ApiDefinitionId,
    "api definition"
);

opaque_id!(
    /// Identifier of a gateway instance in the gateway directory.
    GatewayId,
    "gateway"
);

opaque_id!(
    /// Server-generated identifier of a publish record.
    PublishRecordId,
    "publish record"
);

opaque_id!(
    /// Identifier of a single publish history log line. Not guaranteed to
    /// share a namespace with [`PublishRecordId`].
    HistoryEntryId,
    "history entry"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_identifier_rejected() {
        assert!(GatewayId::new("").is_err());
        assert!(GatewayId::new("   ").is_err());
    }

    #[test]
    fn identifier_is_trimmed() {
        let id = ApiDefinitionId::new("  api-1 ").unwrap();
        assert_eq!(id.as_str(), "api-1");
        assert_eq!(id.to_string(), "api-1");
    }

    #[test]
    fn deserializes_from_string_and_integer() {
        let from_text: PublishRecordId = serde_json::from_str(r#""rec-9""#).unwrap();
        assert_eq!(from_text.as_str(), "rec-9");

        let from_number: PublishRecordId = serde_json::from_str("42").unwrap();
        assert_eq!(from_number.as_str(), "42");
    }

    #[test]
    fn deserialize_rejects_blank() {
        let result: Result<GatewayId, _> = serde_json::from_str(r#""""#);
        assert!(result.is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = HistoryEntryId::new("h-1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""h-1""#);
    }

    #[test]
    fn parses_via_from_str() {
        let id: GatewayId = "gw-1".parse().unwrap();
        assert_eq!(id, GatewayId::new("gw-1").unwrap());
    }
}
