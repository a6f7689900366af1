//! Property-based tests for the issue/verify lifecycle.
//!
//! Property 1: Issue-Verify Round Trip
//! Property 2: Reserved Claim Protection
//! Property 3: One Live Record Per Subject

use credential_service::jwt::{is_reserved, JwtSerializer};
use credential_service::{
    Config, IssueOptions, KeyAlgorithm, MemoryRecordStore, RecordStore, TokenGenerator,
    VerificationOutcome, VerifyOptions,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// Generate arbitrary subjects: strings, integers and structured identities.
fn arb_subject() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-zA-Z0-9_@.-]{1,64}".prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        ("[a-z]{1,16}", any::<u32>())
            .prop_map(|(tenant, user)| json!({"tenant": tenant, "user": user})),
    ]
}

/// Generate custom claims, deliberately colliding with reserved names.
fn arb_payload() -> impl Strategy<Value = Vec<(&'static str, String)>> {
    prop::collection::vec(
        (
            prop::sample::select(vec!["sub", "iss", "iat", "exp", "role", "scope", "tenant"]),
            "[a-z]{0,12}",
        ),
        0..8,
    )
}

/// Generate arbitrary algorithms.
fn arb_algorithm() -> impl Strategy<Value = KeyAlgorithm> {
    prop_oneof![
        Just(KeyAlgorithm::EdDSA),
        Just(KeyAlgorithm::ES256),
        Just(KeyAlgorithm::ES384),
    ]
}

fn store_backed(config: Config) -> (Arc<MemoryRecordStore>, TokenGenerator) {
    let store = Arc::new(MemoryRecordStore::new());
    let generator = TokenGenerator::new(config, Some(store.clone())).unwrap();
    (store, generator)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property 1: Issue-Verify Round Trip
    ///
    /// A freshly issued token verifies against the stored record and
    /// resolves to the subject it was issued for.
    #[test]
    fn prop_issue_verify_round_trip(
        subject in arb_subject(),
        algorithm in arb_algorithm(),
    ) {
        tokio_test::block_on(async {
            let (_, generator) = store_backed(Config::default().with_algorithm(algorithm));

            let issued = generator.issue(subject.clone(), IssueOptions::new()).await.unwrap();
            let outcome = generator.verify(&issued.token, VerifyOptions::new()).await;

            let verified = outcome.into_verified();
            prop_assert!(verified.is_some(), "fresh token must verify");
            let verified = verified.unwrap();
            prop_assert_eq!(&verified.subject, &subject);
            prop_assert_eq!(&verified.payload.sub, &subject);
            prop_assert_eq!(verified.payload.iss.as_str(), generator.id());

            generator.dispose().await;
            Ok(())
        })?;
    }

    /// Property 2: Reserved Claim Protection
    ///
    /// Custom claims never overwrite sub/iss/iat/exp, and every other custom
    /// claim survives signing unchanged.
    #[test]
    fn prop_reserved_claims_protected(
        subject in arb_subject(),
        payload in arb_payload(),
    ) {
        tokio_test::block_on(async {
            let config = Config::default()
                .with_generator_id("issuer-prop")
                .with_key_rotation_interval(Duration::ZERO);
            let (_, generator) = store_backed(config);

            let mut options = IssueOptions::new();
            let mut expected = Map::new();
            for (key, value) in &payload {
                options = options.with_claim(*key, value.clone());
                if !is_reserved(key) {
                    expected.insert((*key).to_string(), Value::from(value.clone()));
                }
            }

            let issued = generator.issue(subject.clone(), options).await.unwrap();
            let (_, claims) = JwtSerializer::new(KeyAlgorithm::EdDSA)
                .decode_unverified(&issued.token)
                .unwrap();

            prop_assert_eq!(&claims.sub, &subject);
            prop_assert_eq!(claims.iss.as_str(), "issuer-prop");
            prop_assert_eq!(claims.iat, issued.record.issued_at.timestamp());
            prop_assert_eq!(claims.exp, issued.record.expires_at.timestamp());
            prop_assert_eq!(claims.custom_claims(), &expected);
            Ok(())
        })?;
    }

    /// Property 3: One Live Record Per Subject
    ///
    /// After re-issuing, only the newest token verifies and the store holds
    /// a single record for the subject.
    #[test]
    fn prop_reissue_supersedes_previous_token(
        subject in arb_subject(),
        reissues in 1usize..4,
    ) {
        tokio_test::block_on(async {
            let (store, generator) = store_backed(Config::default());

            let mut tokens = Vec::new();
            for _ in 0..=reissues {
                tokens.push(generator.issue(subject.clone(), IssueOptions::new()).await.unwrap());
            }
            let latest = tokens.pop().unwrap();

            prop_assert_eq!(store.len().await, 1);
            prop_assert_eq!(
                store.find_by_subject(&subject).await.unwrap(),
                Some(latest.record.clone())
            );

            for stale in &tokens {
                let outcome = generator.verify(&stale.token, VerifyOptions::new()).await;
                prop_assert_eq!(outcome, VerificationOutcome::NoRecord);
            }
            let outcome = generator.verify(&latest.token, VerifyOptions::new()).await;
            prop_assert!(outcome.is_success());

            generator.dispose().await;
            Ok(())
        })?;
    }
}
