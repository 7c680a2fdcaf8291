//! Rule-driven field mapper
//!
//! Inbound: default code table first, then connector rules in order, so the
//! last rule writing a canonical field wins. Outbound applies the same rules
//! inverted: the canonical `target_field` is read, transformed and written to
//! the ERP `source_field`.

use chrono::NaiveDate;
use matsync_domain::utils::erp_date::format_erp_day;
use matsync_domain::{
    codes, CanonicalField, CanonicalRecord, ExternalRecord, FieldMap, FieldMappingRule,
    MaterialDraft, ProductFields,
};
use tracing::trace;

use super::defaults::{ValueEncoding, DEFAULT_MAPPINGS};
use super::error::MappingError;

/// Codes the ERP carries as dedicated record members.
const IDENTITY_CODES: [&str; 3] =
    [codes::MATERIAL_NUMBER, codes::BUSINESS_KEY, codes::LAST_CHANGED];

/// Canonical view of one ERP material.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedProduct {
    pub business_key: String,
    pub fields: ProductFields,
}

/// Stateless mapper between ERP materials and canonical products.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldMapper;

impl FieldMapper {
    pub fn new() -> Self {
        Self
    }

    /// Map an ERP material onto canonical fields.
    ///
    /// Source fields that are absent (or empty) are skipped. Values that do
    /// not fit a typed canonical field fail the record.
    pub fn map_external_to_canonical(
        &self,
        external: &ExternalRecord,
        rules: &[FieldMappingRule],
    ) -> Result<MappedProduct, MappingError> {
        // Keys match exactly; blank-only keys count as missing.
        if external.business_key.trim().is_empty() {
            return Err(MappingError::MissingBusinessKey {
                material_number: external.material_number.clone(),
            });
        }

        let mut fields = ProductFields::default();

        for default in &DEFAULT_MAPPINGS {
            if let Some(value) = present(external.field(default.code)) {
                fields
                    .write(default.field, value)
                    .map_err(|err| MappingError::invalid_value(default.code, err))?;
            }
        }

        for rule in rules {
            let target = rule
                .target_field
                .parse::<CanonicalField>()
                .map_err(|_| MappingError::UnknownTargetField(rule.target_field.clone()))?;

            let Some(value) = present(external.field(&rule.source_field)) else {
                trace!(source = %rule.source_field, "Mapping rule source absent; skipped");
                continue;
            };

            let transformed = rule.transformation.apply(value);
            fields
                .write(target, &transformed)
                .map_err(|err| MappingError::invalid_value(&rule.source_field, err))?;
        }

        Ok(MappedProduct { business_key: external.business_key.clone(), fields })
    }

    /// Map a canonical product onto an ERP draft.
    pub fn map_canonical_to_external(
        &self,
        canonical: &CanonicalRecord,
        rules: &[FieldMappingRule],
    ) -> Result<MaterialDraft, MappingError> {
        if canonical.sku.trim().is_empty() {
            return Err(MappingError::MissingBusinessKey {
                material_number: canonical.id.to_string(),
            });
        }

        let mut fields = FieldMap::new();

        for default in &DEFAULT_MAPPINGS {
            if let Some(value) = encode(&canonical.fields, default.field, default.encoding) {
                fields.insert(default.code.to_string(), value);
            }
        }

        for rule in rules {
            // Unknown canonical names read as "no value".
            let Ok(target) = rule.target_field.parse::<CanonicalField>() else {
                continue;
            };
            if IDENTITY_CODES.contains(&rule.source_field.as_str()) {
                trace!(source = %rule.source_field, "Identity code is not written outbound");
                continue;
            }
            if let Some(value) = encode(&canonical.fields, target, encoding_for(target)) {
                fields.insert(rule.source_field.clone(), rule.transformation.apply(&value));
            }
        }

        Ok(MaterialDraft { business_key: canonical.sku.clone(), fields })
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn encoding_for(field: CanonicalField) -> ValueEncoding {
    match field {
        CanonicalField::ManufactureDate => ValueEncoding::ErpDate,
        _ => ValueEncoding::Text,
    }
}

fn encode(fields: &ProductFields, field: CanonicalField, encoding: ValueEncoding) -> Option<String> {
    let value = fields.read(field)?;
    match encoding {
        ValueEncoding::Text => Some(value),
        ValueEncoding::ErpDate => NaiveDate::parse_from_str(&value, "%Y-%m-%d")
            .ok()
            .map(format_erp_day),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use matsync_domain::Transformation;
    use uuid::Uuid;

    use super::*;

    fn material(fields: &[(&str, &str)]) -> ExternalRecord {
        ExternalRecord {
            material_number: "000000000000001001".into(),
            business_key: "SKU-1".into(),
            last_changed: "20240102".into(),
            fields: fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        }
    }

    #[test]
    fn defaults_map_every_known_code() {
        let external = material(&[
            (codes::DESCRIPTION, "Oak chair"),
            (codes::CARBON_FOOTPRINT, "12.5"),
            (codes::RECYCLABILITY, "80"),
            (codes::CERTIFICATIONS, "FSC;EU Ecolabel"),
            (codes::MANUFACTURE_DATE, "20230115"),
        ]);

        let mapped = FieldMapper::new().map_external_to_canonical(&external, &[]).unwrap();

        assert_eq!(mapped.business_key, "SKU-1");
        assert_eq!(mapped.fields.name.as_deref(), Some("Oak chair"));
        assert_eq!(mapped.fields.carbon_footprint, Some(12.5));
        assert_eq!(mapped.fields.recyclability, Some(80.0));
        assert_eq!(mapped.fields.certifications, vec!["FSC", "EU Ecolabel"]);
        assert_eq!(mapped.fields.manufacture_date, NaiveDate::from_ymd_opt(2023, 1, 15));
        assert_eq!(mapped.fields.warranty, None);
    }

    #[test]
    fn later_rules_override_earlier_writes() {
        let external = material(&[("ZZORIGIN", "germany"), ("ZZORIGIN_ALT", "de")]);
        let rules = vec![
            FieldMappingRule::new("ZZORIGIN", "countryOfOrigin", Transformation::Identity),
            FieldMappingRule::new("ZZORIGIN_ALT", "countryOfOrigin", Transformation::Uppercase),
        ];

        let mapped = FieldMapper::new().map_external_to_canonical(&external, &rules).unwrap();

        assert_eq!(mapped.fields.country_of_origin.as_deref(), Some("DE"));
    }

    #[test]
    fn absent_rule_source_keeps_default_value() {
        let external = material(&[("ZZORIGIN", "Portugal")]);
        let rules =
            vec![FieldMappingRule::new("ZZMISSING", "countryOfOrigin", Transformation::Uppercase)];

        let mapped = FieldMapper::new().map_external_to_canonical(&external, &rules).unwrap();

        assert_eq!(mapped.fields.country_of_origin.as_deref(), Some("Portugal"));
    }

    #[test]
    fn invalid_numbers_fail_the_record() {
        let external = material(&[(codes::CARBON_FOOTPRINT, "not-a-number")]);

        let err = FieldMapper::new().map_external_to_canonical(&external, &[]).unwrap_err();

        match err {
            MappingError::InvalidValue { source_field, field, .. } => {
                assert_eq!(source_field, codes::CARBON_FOOTPRINT);
                assert_eq!(field, CanonicalField::CarbonFootprint);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn out_of_range_scores_are_rejected() {
        let external = material(&[(codes::REPAIRABILITY, "11")]);
        assert!(FieldMapper::new().map_external_to_canonical(&external, &[]).is_err());
    }

    #[test]
    fn missing_business_key_is_an_error() {
        let mut external = material(&[]);
        external.business_key = "  ".into();

        let err = FieldMapper::new().map_external_to_canonical(&external, &[]).unwrap_err();
        assert!(matches!(err, MappingError::MissingBusinessKey { .. }));
    }

    #[test]
    fn unknown_rule_target_is_an_error_inbound() {
        let external = material(&[("ZZCOLOR", "red")]);
        let rules = vec![FieldMappingRule::new("ZZCOLOR", "colour", Transformation::Identity)];

        let err = FieldMapper::new().map_external_to_canonical(&external, &rules).unwrap_err();
        assert_eq!(err, MappingError::UnknownTargetField("colour".into()));
    }

    #[test]
    fn outbound_inverts_rules_and_encodes_dates() {
        let mut fields = ProductFields {
            name: Some("Oak chair".into()),
            country_of_origin: Some("germany".into()),
            ..ProductFields::default()
        };
        fields.write(CanonicalField::ManufactureDate, "2023-01-15").unwrap();
        let canonical = CanonicalRecord {
            id: Uuid::new_v4(),
            sku: "SKU-1".into(),
            fields,
            last_modified: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };
        let rules =
            vec![FieldMappingRule::new("ZZLAND", "countryOfOrigin", Transformation::Uppercase)];

        let draft = FieldMapper::new().map_canonical_to_external(&canonical, &rules).unwrap();

        assert_eq!(draft.business_key, "SKU-1");
        assert_eq!(draft.fields.get(codes::DESCRIPTION).map(String::as_str), Some("Oak chair"));
        assert_eq!(draft.fields.get(codes::MANUFACTURE_DATE).map(String::as_str), Some("20230115"));
        assert_eq!(draft.fields.get("ZZLAND").map(String::as_str), Some("GERMANY"));
        assert_eq!(draft.fields.get(codes::ORIGIN).map(String::as_str), Some("germany"));
        assert!(!draft.fields.contains_key(codes::WARRANTY));
    }

    #[test]
    fn identity_rules_round_trip_canonical_fields() {
        let mut fields = ProductFields::default();
        for (field, value) in [
            (CanonicalField::Name, "Desk lamp"),
            (CanonicalField::Category, "LIGHTING"),
            (CanonicalField::Manufacturer, "Lumen GmbH"),
            (CanonicalField::Materials, "aluminium, glass"),
            (CanonicalField::CarbonFootprint, "3.75"),
            (CanonicalField::Recyclability, "92"),
            (CanonicalField::RepairabilityScore, "7.5"),
            (CanonicalField::Warranty, "2 years"),
            (CanonicalField::CountryOfOrigin, "DE"),
            (CanonicalField::Certifications, "CE;RoHS"),
            (CanonicalField::ManufactureDate, "2022-11-30"),
        ] {
            fields.write(field, value).unwrap();
        }
        let canonical = CanonicalRecord {
            id: Uuid::new_v4(),
            sku: "SKU-RT".into(),
            fields,
            last_modified: Utc::now(),
        };
        let rules = vec![
            FieldMappingRule::new("ZZNAME2", "name", Transformation::Identity),
            FieldMappingRule::new("ZZMFG2", "manufactureDate", Transformation::Identity),
        ];
        let mapper = FieldMapper::new();

        let draft = mapper.map_canonical_to_external(&canonical, &rules).unwrap();
        let external = ExternalRecord {
            material_number: "1".into(),
            business_key: draft.business_key.clone(),
            last_changed: "20240101".into(),
            fields: draft.fields,
        };
        let mapped = mapper.map_external_to_canonical(&external, &rules).unwrap();

        assert_eq!(mapped.business_key, canonical.sku);
        assert_eq!(mapped.fields, canonical.fields);
    }

    #[test]
    fn business_keys_are_carried_verbatim() {
        let mut external = material(&[]);
        external.business_key = " SKU-1".into();

        let mapped = FieldMapper::new().map_external_to_canonical(&external, &[]).unwrap();
        assert_eq!(mapped.business_key, " SKU-1");
        assert_ne!(mapped.business_key, "SKU-1");
    }

    #[test]
    fn outbound_skips_erp_identity_codes() {
        let canonical = CanonicalRecord {
            id: Uuid::new_v4(),
            sku: "SKU-1".into(),
            fields: ProductFields { name: Some("Oak chair".into()), ..ProductFields::default() },
            last_modified: Utc::now(),
        };
        let rules = vec![
            FieldMappingRule::new(codes::BUSINESS_KEY, "name", Transformation::Identity),
            FieldMappingRule::new(codes::MATERIAL_NUMBER, "name", Transformation::Identity),
            FieldMappingRule::new(codes::LAST_CHANGED, "name", Transformation::Identity),
        ];

        let draft = FieldMapper::new().map_canonical_to_external(&canonical, &rules).unwrap();

        assert_eq!(draft.business_key, "SKU-1");
        assert!(!draft.fields.contains_key(codes::BUSINESS_KEY));
        assert!(!draft.fields.contains_key(codes::MATERIAL_NUMBER));
        assert!(!draft.fields.contains_key(codes::LAST_CHANGED));
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json[codes::BUSINESS_KEY], "SKU-1");
    }
}
