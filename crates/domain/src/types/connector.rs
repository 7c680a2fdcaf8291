//! Connector configuration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Direction of a sync run or of what a connector permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    Inbound,
    Outbound,
    Bidirectional,
}

impl_domain_status_conversions!(SyncDirection {
    Inbound => "inbound",
    Outbound => "outbound",
    Bidirectional => "bidirectional",
});

impl SyncDirection {
    pub fn includes_inbound(self) -> bool {
        matches!(self, Self::Inbound | Self::Bidirectional)
    }

    pub fn includes_outbound(self) -> bool {
        matches!(self, Self::Outbound | Self::Bidirectional)
    }

    /// Whether a connector configured with `self` may run `requested`.
    pub fn permits(self, requested: SyncDirection) -> bool {
        match self {
            Self::Bidirectional => true,
            configured => configured == requested,
        }
    }
}

/// Lifecycle status of a connector, managed outside the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorStatus {
    Active,
    Inactive,
    Error,
}

impl_domain_status_conversions!(ConnectorStatus {
    Active => "active",
    Inactive => "inactive",
    Error => "error",
});

/// Kind of system a connector integrates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorKind {
    Erp,
    Plm,
    Crm,
}

impl_domain_status_conversions!(ConnectorKind {
    Erp => "erp",
    Plm => "plm",
    Crm => "crm",
});

/// Text transformation applied by a mapping rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transformation {
    #[default]
    Identity,
    Trim,
    Uppercase,
    Lowercase,
}

impl Transformation {
    pub fn apply(self, value: &str) -> String {
        match self {
            Self::Identity => value.to_string(),
            Self::Trim => value.trim().to_string(),
            Self::Uppercase => value.to_uppercase(),
            Self::Lowercase => value.to_lowercase(),
        }
    }
}

/// Declarative field mapping.
///
/// `source_field` is an ERP field code and `target_field` a canonical field
/// name. Outbound mapping applies the rule inverted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMappingRule {
    pub source_field: String,
    pub target_field: String,
    #[serde(default)]
    pub transformation: Transformation,
}

impl FieldMappingRule {
    pub fn new(
        source_field: impl Into<String>,
        target_field: impl Into<String>,
        transformation: Transformation,
    ) -> Self {
        Self {
            source_field: source_field.into(),
            target_field: target_field.into(),
            transformation,
        }
    }
}

/// A configured integration with one external system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: ConnectorKind,
    pub direction: SyncDirection,
    #[serde(default)]
    pub mapping_rules: Vec<FieldMappingRule>,
    #[serde(default = "default_status")]
    pub status: ConnectorStatus,
    /// Overrides the ERP base URL for this connector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_kind() -> ConnectorKind {
    ConnectorKind::Erp
}

fn default_status() -> ConnectorStatus {
    ConnectorStatus::Active
}
