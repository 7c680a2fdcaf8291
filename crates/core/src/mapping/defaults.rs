//! Built-in ERP code table
//!
//! These mappings always apply. Connector rules are evaluated afterwards and
//! override them field by field.

use matsync_domain::{codes, CanonicalField};

/// How a value is encoded on the ERP side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueEncoding {
    /// Stored as-is.
    Text,
    /// `YYYYMMDD`; ISO on the canonical side.
    ErpDate,
}

/// One row of the built-in ERP code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultMapping {
    pub code: &'static str,
    pub field: CanonicalField,
    pub encoding: ValueEncoding,
}

const fn text(code: &'static str, field: CanonicalField) -> DefaultMapping {
    DefaultMapping { code, field, encoding: ValueEncoding::Text }
}

pub const DEFAULT_MAPPINGS: [DefaultMapping; 11] = [
    text(codes::DESCRIPTION, CanonicalField::Name),
    text(codes::MATERIAL_GROUP, CanonicalField::Category),
    text(codes::MANUFACTURER, CanonicalField::Manufacturer),
    text(codes::MATERIALS, CanonicalField::Materials),
    text(codes::CARBON_FOOTPRINT, CanonicalField::CarbonFootprint),
    text(codes::RECYCLABILITY, CanonicalField::Recyclability),
    text(codes::REPAIRABILITY, CanonicalField::RepairabilityScore),
    text(codes::WARRANTY, CanonicalField::Warranty),
    text(codes::ORIGIN, CanonicalField::CountryOfOrigin),
    text(codes::CERTIFICATIONS, CanonicalField::Certifications),
    DefaultMapping {
        code: codes::MANUFACTURE_DATE,
        field: CanonicalField::ManufactureDate,
        encoding: ValueEncoding::ErpDate,
    },
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn every_canonical_field_has_one_default_code() {
        let fields: HashSet<_> = DEFAULT_MAPPINGS.iter().map(|m| m.field).collect();
        let codes: HashSet<_> = DEFAULT_MAPPINGS.iter().map(|m| m.code).collect();

        assert_eq!(fields.len(), CanonicalField::ALL.len());
        assert_eq!(codes.len(), DEFAULT_MAPPINGS.len());
    }
}
