//! Canonical product records
//!
//! The internal store owns these records. The synchronization engine reads
//! the business key, the mapped fields and `last_modified`; everything else is
//! opaque to it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::LIST_DELIMITER;
use crate::errors::MatSyncError;

/// Canonical field addressed by mapping rules (`targetField`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalField {
    Name,
    Category,
    Manufacturer,
    Materials,
    CarbonFootprint,
    Recyclability,
    RepairabilityScore,
    Warranty,
    CountryOfOrigin,
    Certifications,
    ManufactureDate,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 11] = [
        Self::Name,
        Self::Category,
        Self::Manufacturer,
        Self::Materials,
        Self::CarbonFootprint,
        Self::Recyclability,
        Self::RepairabilityScore,
        Self::Warranty,
        Self::CountryOfOrigin,
        Self::Certifications,
        Self::ManufactureDate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Category => "category",
            Self::Manufacturer => "manufacturer",
            Self::Materials => "materials",
            Self::CarbonFootprint => "carbonFootprint",
            Self::Recyclability => "recyclability",
            Self::RepairabilityScore => "repairabilityScore",
            Self::Warranty => "warranty",
            Self::CountryOfOrigin => "countryOfOrigin",
            Self::Certifications => "certifications",
            Self::ManufactureDate => "manufactureDate",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalField {
    type Err = MatSyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| MatSyncError::InvalidInput(format!("unknown canonical field: {s}")))
    }
}

/// Why a textual value could not be stored in a typed canonical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValueError {
    pub field: CanonicalField,
    pub value: String,
    pub reason: String,
}

impl fmt::Display for FieldValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value '{}' for {}: {}", self.value, self.field, self.reason)
    }
}

/// Mapped domain fields of a product.
///
/// `None` means "no value"; it never overwrites an existing value when the
/// fields are merged onto a stored record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFields {
    pub name: Option<String>,
    pub category: Option<String>,
    pub manufacturer: Option<String>,
    pub materials: Option<String>,
    /// kg CO2e per unit
    pub carbon_footprint: Option<f64>,
    /// Percentage, 0..=100
    pub recyclability: Option<f64>,
    /// Score, 0..=10
    pub repairability_score: Option<f64>,
    pub warranty: Option<String>,
    pub country_of_origin: Option<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    pub manufacture_date: Option<NaiveDate>,
}

impl ProductFields {
    /// Read a field as text. Missing values return `None`.
    ///
    /// Numbers use their shortest round-trip representation, dates are ISO
    /// `YYYY-MM-DD` and certifications are joined with `;`.
    pub fn read(&self, field: CanonicalField) -> Option<String> {
        match field {
            CanonicalField::Name => self.name.clone(),
            CanonicalField::Category => self.category.clone(),
            CanonicalField::Manufacturer => self.manufacturer.clone(),
            CanonicalField::Materials => self.materials.clone(),
            CanonicalField::CarbonFootprint => self.carbon_footprint.map(|v| v.to_string()),
            CanonicalField::Recyclability => self.recyclability.map(|v| v.to_string()),
            CanonicalField::RepairabilityScore => self.repairability_score.map(|v| v.to_string()),
            CanonicalField::Warranty => self.warranty.clone(),
            CanonicalField::CountryOfOrigin => self.country_of_origin.clone(),
            CanonicalField::Certifications => {
                if self.certifications.is_empty() {
                    None
                } else {
                    Some(self.certifications.join(&LIST_DELIMITER.to_string()))
                }
            }
            CanonicalField::ManufactureDate => {
                self.manufacture_date.map(|d| d.format("%Y-%m-%d").to_string())
            }
        }
    }

    /// Store a textual value into a typed field, parsing and range-checking
    /// it where the field is not plain text.
    pub fn write(&mut self, field: CanonicalField, value: &str) -> Result<(), FieldValueError> {
        let invalid = |reason: &str| FieldValueError {
            field,
            value: value.to_string(),
            reason: reason.to_string(),
        };

        match field {
            CanonicalField::Name => self.name = Some(value.to_string()),
            CanonicalField::Category => self.category = Some(value.to_string()),
            CanonicalField::Manufacturer => self.manufacturer = Some(value.to_string()),
            CanonicalField::Materials => self.materials = Some(value.to_string()),
            CanonicalField::Warranty => self.warranty = Some(value.to_string()),
            CanonicalField::CountryOfOrigin => self.country_of_origin = Some(value.to_string()),
            CanonicalField::CarbonFootprint => {
                let parsed = parse_number(value).ok_or_else(|| invalid("not a number"))?;
                if parsed < 0.0 {
                    return Err(invalid("must not be negative"));
                }
                self.carbon_footprint = Some(parsed);
            }
            CanonicalField::Recyclability => {
                let parsed = parse_number(value).ok_or_else(|| invalid("not a number"))?;
                if !(0.0..=100.0).contains(&parsed) {
                    return Err(invalid("must be between 0 and 100"));
                }
                self.recyclability = Some(parsed);
            }
            CanonicalField::RepairabilityScore => {
                let parsed = parse_number(value).ok_or_else(|| invalid("not a number"))?;
                if !(0.0..=10.0).contains(&parsed) {
                    return Err(invalid("must be between 0 and 10"));
                }
                self.repairability_score = Some(parsed);
            }
            CanonicalField::Certifications => {
                self.certifications = value
                    .split(LIST_DELIMITER)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            CanonicalField::ManufactureDate => {
                let parsed = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
                    .or_else(|_| NaiveDate::parse_from_str(value.trim(), "%Y%m%d"))
                    .map_err(|_| invalid("expected YYYY-MM-DD or YYYYMMDD"))?;
                self.manufacture_date = Some(parsed);
            }
        }
        Ok(())
    }

    /// Fields whose incoming value is present and differs from `self`.
    pub fn differing_fields(&self, incoming: &ProductFields) -> Vec<CanonicalField> {
        CanonicalField::ALL
            .into_iter()
            .filter(|field| match incoming.read(*field) {
                Some(value) => self.read(*field).as_deref() != Some(value.as_str()),
                None => false,
            })
            .collect()
    }

    /// Overlay every present value of `incoming` onto `self`.
    pub fn merge_from(&mut self, incoming: &ProductFields) {
        macro_rules! overlay {
            ($($field:ident),+) => {
                $(if incoming.$field.is_some() {
                    self.$field.clone_from(&incoming.$field);
                })+
            };
        }
        overlay!(
            name,
            category,
            manufacturer,
            materials,
            carbon_footprint,
            recyclability,
            repairability_score,
            warranty,
            country_of_origin,
            manufacture_date
        );
        if !incoming.certifications.is_empty() {
            self.certifications.clone_from(&incoming.certifications);
        }
    }
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Canonical product record as owned by the internal store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    pub id: Uuid,
    /// Business key (SKU). Matches `ExternalRecord::business_key` exactly.
    pub sku: String,
    #[serde(flatten)]
    pub fields: ProductFields,
    pub last_modified: DateTime<Utc>,
}

/// Payload for creating a canonical record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub sku: String,
    #[serde(flatten)]
    pub fields: ProductFields,
}

/// Paging for canonical store listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    pub offset: usize,
    pub limit: usize,
}
