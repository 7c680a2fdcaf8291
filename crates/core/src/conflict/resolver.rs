use chrono::{DateTime, Utc};
use matsync_domain::utils::erp_date::parse_erp_date;
use matsync_domain::{
    CanonicalField, CanonicalRecord, ConflictOutcome, ConflictWinner, ExternalRecord,
    ProductFields,
};

/// Decides which side wins when a canonical record and an ERP material
/// disagree.
///
/// The ERP side wins only when its change date is strictly later than the
/// canonical `last_modified`. Ties and unparseable ERP dates keep canonical
/// data.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictResolver;

impl ConflictResolver {
    pub fn new() -> Self {
        Self
    }

    /// Inbound comparison: fields present in the mapped ERP data that differ
    /// from the canonical record. `None` when nothing differs.
    pub fn resolve(
        &self,
        canonical: &CanonicalRecord,
        external: &ExternalRecord,
        external_fields: &ProductFields,
    ) -> Option<ConflictOutcome> {
        let differing = canonical.fields.differing_fields(external_fields);
        self.decide(canonical, external, differing)
    }

    /// Outbound comparison: canonical fields with a value that the ERP
    /// material lacks or holds differently.
    pub fn resolve_outbound(
        &self,
        canonical: &CanonicalRecord,
        external: &ExternalRecord,
        external_fields: &ProductFields,
    ) -> Option<ConflictOutcome> {
        let differing = external_fields.differing_fields(&canonical.fields);
        self.decide(canonical, external, differing)
    }

    fn decide(
        &self,
        canonical: &CanonicalRecord,
        external: &ExternalRecord,
        differing: Vec<CanonicalField>,
    ) -> Option<ConflictOutcome> {
        if differing.is_empty() {
            return None;
        }

        let external_changed = parse_erp_date(&external.last_changed);
        let (winner, rationale) = match external_changed {
            Some(changed) if changed > canonical.last_modified => (
                ConflictWinner::External,
                format!(
                    "ERP change date {} is later than canonical modification {}",
                    changed.date_naive(),
                    rfc3339(canonical.last_modified)
                ),
            ),
            Some(changed) => (
                ConflictWinner::Canonical,
                format!(
                    "canonical modification {} is not older than ERP change date {}",
                    rfc3339(canonical.last_modified),
                    changed.date_naive()
                ),
            ),
            None => (
                ConflictWinner::Canonical,
                format!(
                    "ERP change date '{}' could not be parsed; keeping canonical data",
                    external.last_changed
                ),
            ),
        };

        Some(ConflictOutcome {
            business_key: canonical.sku.clone(),
            winner,
            canonical_modified: canonical.last_modified,
            external_changed,
            external_changed_raw: external.last_changed.clone(),
            differing_fields: differing.iter().map(|f| f.as_str().to_string()).collect(),
            rationale,
        })
    }
}

fn rfc3339(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
