//! Prometheus metrics for the credential lifecycle.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, CounterVec};

/// Tokens issued counter.
pub static TOKENS_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "credential_service_tokens_issued_total",
        "Total number of tokens issued",
        &["algorithm"]
    )
    .expect("Failed to register tokens_issued metric")
});

/// Verification outcomes counter.
pub static VERIFICATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "credential_service_verifications_total",
        "Total number of token verifications by outcome",
        &["status"]
    )
    .expect("Failed to register verifications metric")
});

/// Key rotations counter.
pub static KEY_ROTATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "credential_service_key_rotations_total",
        "Total number of signing key rotations",
        &["trigger"]
    )
    .expect("Failed to register key_rotations metric")
});

/// Record store writes counter.
pub static RECORD_WRITES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "credential_service_record_writes_total",
        "Total number of verification record writes",
        &["operation", "status"]
    )
    .expect("Failed to register record_writes metric")
});

/// Record a token issuance.
pub fn record_token_issued(algorithm: &str) {
    TOKENS_ISSUED.with_label_values(&[algorithm]).inc();
}

/// Record a verification outcome.
pub fn record_verification(status: &str) {
    VERIFICATIONS.with_label_values(&[status]).inc();
}

/// Record a key rotation.
pub fn record_key_rotation(trigger: &str) {
    KEY_ROTATIONS.with_label_values(&[trigger]).inc();
}

/// Record a store write.
pub fn record_store_write(operation: &str, status: &str) {
    RECORD_WRITES
        .with_label_values(&[operation, status])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_token_issued() {
        record_token_issued("EdDSA");
        let value = TOKENS_ISSUED.with_label_values(&["EdDSA"]).get();
        assert!(value > 0.0);
    }

    #[test]
    fn test_record_verification() {
        record_verification("invalidTokenError");
        let value = VERIFICATIONS
            .with_label_values(&["invalidTokenError"])
            .get();
        assert!(value > 0.0);
    }
}
