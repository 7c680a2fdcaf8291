use matsync_domain::{CanonicalField, FieldValueError, MatSyncError};
use thiserror::Error;

/// Failures while mapping a single record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("material {material_number} has no business key")]
    MissingBusinessKey { material_number: String },

    #[error("field {source_field} -> {field}: invalid value '{value}' ({reason})")]
    InvalidValue { source_field: String, field: CanonicalField, value: String, reason: String },

    #[error("mapping rule targets unknown canonical field '{0}'")]
    UnknownTargetField(String),
}

impl MappingError {
    pub(crate) fn invalid_value(source_field: &str, err: FieldValueError) -> Self {
        Self::InvalidValue {
            source_field: source_field.to_string(),
            field: err.field,
            value: err.value,
            reason: err.reason,
        }
    }
}

impl From<MappingError> for MatSyncError {
    fn from(err: MappingError) -> Self {
        MatSyncError::Mapping(err.to_string())
    }
}
