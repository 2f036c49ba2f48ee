//! Gateway directory types.
//!
//! A gateway is the external traffic-management target an API Definition
//! is published onto. The client only ever reads the directory; it is used
//! to validate a submission's `gatewayId` and to denormalise display names.

use std::collections::BTreeMap;
use std::fmt;

use apx_core::GatewayId;
use serde::{Deserialize, Serialize};

/// Gateway product family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayType {
    Higress,
    ApigApi,
    ApigAi,
    AdpAiGateway,
    ApsaraGateway,
    /// Forward-compatible catch-all for gateway families added after this
    /// client was built.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for GatewayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Higress => "HIGRESS",
            Self::ApigApi => "APIG_API",
            Self::ApigAi => "APIG_AI",
            Self::AdpAiGateway => "ADP_AI_GATEWAY",
            Self::ApsaraGateway => "APSARA_GATEWAY",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// One entry of the gateway directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gateway {
    pub gateway_id: GatewayId,
    #[serde(default)]
    pub gateway_name: String,
    #[serde(default = "unknown_gateway_type")]
    pub gateway_type: GatewayType,
}

fn unknown_gateway_type() -> GatewayType {
    GatewayType::Unknown
}

/// Gateways retrievable at submission time, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct GatewayDirectory {
    gateways: BTreeMap<GatewayId, Gateway>,
}

impl GatewayDirectory {
    /// Build a directory from a fetched list. Later duplicates replace
    /// earlier ones.
    pub fn new(gateways: impl IntoIterator<Item = Gateway>) -> Self {
        Self {
            gateways: gateways
                .into_iter()
                .map(|gw| (gw.gateway_id.clone(), gw))
                .collect(),
        }
    }

    pub fn get(&self, id: &GatewayId) -> Option<&Gateway> {
        self.gateways.get(id)
    }

    pub fn contains(&self, id: &GatewayId) -> bool {
        self.gateways.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.gateways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }

    /// Gateways ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &Gateway> {
        self.gateways.values()
    }
}
