//! ERP material-master records
//!
//! Materials are addressed by short field codes, the way the ERP exposes
//! them. Only the field mapper interprets the codes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Raw ERP fields keyed by short code (`MAKTX`, `ZZCARBON`, ...).
pub type FieldMap = BTreeMap<String, String>;

/// Well-known ERP field codes.
pub mod codes {
    pub const MATERIAL_NUMBER: &str = "MATNR";
    pub const BUSINESS_KEY: &str = "BISMT";
    pub const LAST_CHANGED: &str = "LAEDA";
    pub const DESCRIPTION: &str = "MAKTX";
    pub const MATERIAL_GROUP: &str = "MATKL";
    pub const MANUFACTURER: &str = "MFRNR";
    pub const MATERIALS: &str = "ZZMATERIALS";
    pub const CARBON_FOOTPRINT: &str = "ZZCARBON";
    pub const RECYCLABILITY: &str = "ZZRECYCL";
    pub const REPAIRABILITY: &str = "ZZREPAIR";
    pub const WARRANTY: &str = "ZZWARRANTY";
    pub const ORIGIN: &str = "ZZORIGIN";
    pub const CERTIFICATIONS: &str = "ZZCERTS";
    pub const MANUFACTURE_DATE: &str = "ZZMFGDATE";
}

/// A material as returned by the ERP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRecord {
    /// ERP-side identifier.
    #[serde(rename = "MATNR")]
    pub material_number: String,
    /// Business key (SKU-equivalent).
    #[serde(rename = "BISMT")]
    pub business_key: String,
    /// Last changed date in ERP encoding, `YYYYMMDD`.
    #[serde(rename = "LAEDA")]
    pub last_changed: String,
    #[serde(flatten)]
    pub fields: FieldMap,
}

impl ExternalRecord {
    /// Look up a raw field. Identity codes resolve to the dedicated members.
    pub fn field(&self, code: &str) -> Option<&str> {
        match code {
            codes::MATERIAL_NUMBER => Some(self.material_number.as_str()),
            codes::BUSINESS_KEY => Some(self.business_key.as_str()),
            codes::LAST_CHANGED => Some(self.last_changed.as_str()),
            other => self.fields.get(other).map(String::as_str),
        }
    }
}

/// Payload sent to the ERP to create or update a material.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MaterialDraft {
    #[serde(rename = "BISMT")]
    pub business_key: String,
    #[serde(flatten)]
    pub fields: FieldMap,
}

/// Query for a page of materials (`getRecords`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MaterialQuery {
    pub skip: usize,
    pub top: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// One page of materials with the total number of matches.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialPage {
    pub results: Vec<ExternalRecord>,
    pub total_count: usize,
}

/// Result of the ERP connectivity probe (`testConnection`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionProbe {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ConnectionProbe {
    pub fn ok(system_info: impl Into<String>) -> Self {
        Self { success: true, system_info: Some(system_info.into()), message: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, system_info: None, message: Some(message.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_flat_erp_json() {
        let json = r#"{
            "MATNR": "000000000000001234",
            "BISMT": "SKU-1",
            "LAEDA": "20240102",
            "MAKTX": "Oak chair",
            "ZZCARBON": "12.5"
        }"#;

        let record: ExternalRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.business_key, "SKU-1");
        assert_eq!(record.field(codes::DESCRIPTION), Some("Oak chair"));
        assert_eq!(record.field(codes::LAST_CHANGED), Some("20240102"));
        assert_eq!(record.field("ZZMISSING"), None);
        assert!(!record.fields.contains_key(codes::BUSINESS_KEY));
    }
}
