//! Operator-facing remediation hints derived from probe failures

use matsync_domain::constants::PERSISTENT_FAILURE_THRESHOLD;

/// Map an error message to a remediation hint.
pub fn recommendation_for_error(error: &str) -> String {
    let lower = error.to_lowercase();
    let mentions = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    let hint = if mentions(&["refused", "econnrefused", "unreachable", "dns", "resolve", "no route"]) {
        "Check the ERP hostname, port and network connectivity"
    } else if mentions(&["auth", "401", "403", "unauthorized", "forbidden", "credential"]) {
        "Verify the ERP credentials and the technical user's authorizations"
    } else if mentions(&["timeout", "timed out"]) {
        "The ERP system may be under load; retry later or raise the probe timeout"
    } else if mentions(&["certificate", "tls", "ssl"]) {
        "Check the TLS certificate configuration of the ERP endpoint"
    } else {
        "Review the connector configuration and the ERP gateway logs"
    };
    hint.to_string()
}

/// Hint used once a connector has failed repeatedly in a row.
pub fn persistent_failure_recommendation(consecutive_failures: u32) -> Option<String> {
    (consecutive_failures >= PERSISTENT_FAILURE_THRESHOLD).then(|| {
        format!(
            "Connection has failed {consecutive_failures} consecutive checks; escalate to the ERP \
             administrators"
        )
    })
}

/// Hint for a reachable but slow connector.
pub fn slow_response_recommendation(response_time_ms: u64, threshold_ms: u64) -> String {
    format!(
        "Response time {response_time_ms} ms exceeds the {threshold_ms} ms threshold; the ERP \
         system may be under load"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_follow_error_category() {
        assert!(recommendation_for_error("Network error: connection refused").contains("hostname"));
        assert!(recommendation_for_error("HTTP 401 Unauthorized").contains("credentials"));
        assert!(recommendation_for_error("request timed out after 10s").contains("under load"));
        assert!(recommendation_for_error("something odd").contains("configuration"));
    }

    #[test]
    fn persistent_failures_start_at_threshold() {
        assert_eq!(persistent_failure_recommendation(PERSISTENT_FAILURE_THRESHOLD - 1), None);
        assert!(persistent_failure_recommendation(PERSISTENT_FAILURE_THRESHOLD)
            .unwrap()
            .contains("3 consecutive"));
    }
}
