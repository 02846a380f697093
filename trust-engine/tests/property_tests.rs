//! Property-based tests for scoring invariants
//!
//! - Trust stays within 0-100 and the verdict always agrees with it
//! - Identical evidence maps to the identical bucket and target
//! - A high amount never lowers message risk
//! - Low-risk family requests are floored into the safe band

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use trust_engine::{
    Evidence, ImageEvidence, ImageFeatures, ImageFormat, MessageEvidence, TransactionRecord,
    TrustEngine, UploadSection, Verdict,
};

/// Strategy for free-form message text, salted with known keywords
fn text_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 !₹]{0,60}",
        Just("URGENT pay now or face legal action".to_string()),
        Just("KBC lottery winner claim your prize".to_string()),
        Just("refund pending, dm me on telegram".to_string()),
    ]
}

/// Strategy for payee handles, valid and otherwise
fn payee_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[a-z]{2,8}@[a-z]{2,6}",
        "[a-z]{2,6}[0-9]{3,8}@upi",
        "[A-Za-z ]{1,12}",
    ]
}

fn relationship_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("family".to_string()),
        Just("close friend".to_string()),
        Just("vendor".to_string()),
        Just("unknown".to_string()),
        Just(String::new()),
    ]
}

fn amount_strategy() -> impl Strategy<Value = Option<Decimal>> {
    prop_oneof![
        Just(None),
        (0i64..10_000_000).prop_map(|paise| Some(Decimal::new(paise, 2))),
    ]
}

fn message_strategy() -> impl Strategy<Value = MessageEvidence> {
    (
        text_strategy(),
        payee_strategy(),
        amount_strategy(),
        relationship_strategy(),
        0u32..10,
    )
        .prop_map(|(text, payee, amount, relationship, recent_requests)| MessageEvidence {
            text,
            payee,
            amount,
            relationship,
            recent_requests,
        })
}

fn image_strategy() -> impl Strategy<Value = ImageEvidence> {
    (
        0u32..5000,
        0u32..5000,
        0u64..5_000_000,
        0.0f64..80.0,
        prop_oneof![Just(ImageFormat::Jpeg), Just(ImageFormat::Png)],
        prop_oneof![
            Just(None),
            Just(Some("Photoshop".to_string())),
            Just(Some("Pixel Camera".to_string())),
        ],
        prop_oneof![
            Just(UploadSection::Screenshot),
            Just(UploadSection::Invoice),
            Just(UploadSection::Qr),
        ],
        prop_oneof![
            Just(None),
            Just(Some("https://bit.ly/login".to_string())),
            Just(Some("upi://pay?pa=shop@okaxis".to_string())),
        ],
    )
        .prop_map(
            |(width, height, file_size, anomaly_score, format, editor_software, section, qr_text)| {
                ImageEvidence {
                    features: ImageFeatures {
                        width,
                        height,
                        file_size,
                        anomaly_score,
                        format,
                        editor_software,
                        fingerprint: None,
                    },
                    section,
                    qr_text,
                }
            },
        )
}

fn expected_verdict(trust: u8) -> Verdict {
    if trust >= 75 {
        Verdict::Safe
    } else if trust >= 50 {
        Verdict::Suspicious
    } else {
        Verdict::Fraud
    }
}

proptest! {
    /// Property: message trust is bounded and classified by threshold
    #[test]
    fn prop_message_trust_bounded(evidence in message_strategy(), seed in any::<u64>()) {
        let engine = TrustEngine::default();
        let assessment = engine.assess(&evidence, &mut StdRng::seed_from_u64(seed));

        prop_assert!(assessment.trust.score() <= 100);
        prop_assert_eq!(assessment.verdict, expected_verdict(assessment.trust.score()));
        prop_assert_eq!(assessment.reference_hash.len(), 64);
    }

    /// Property: image trust is bounded and classified by threshold
    #[test]
    fn prop_image_trust_bounded(evidence in image_strategy(), seed in any::<u64>()) {
        let engine = TrustEngine::default();
        let assessment = engine.assess(&evidence, &mut StdRng::seed_from_u64(seed));

        prop_assert!(assessment.trust.score() <= 100);
        prop_assert_eq!(assessment.verdict, expected_verdict(assessment.trust.score()));
    }

    /// Property: same evidence, same bucket and target
    #[test]
    fn prop_target_is_deterministic(evidence in message_strategy(), a in any::<u64>(), b in any::<u64>()) {
        let engine = TrustEngine::default();
        let first = engine.evaluate(&evidence, &mut StdRng::seed_from_u64(a));
        let second = engine.evaluate(&evidence.clone(), &mut StdRng::seed_from_u64(b));

        prop_assert_eq!(first.bucket, second.bucket);
        prop_assert_eq!(engine.target_trust(&evidence), engine.target_trust(&evidence.clone()));
        prop_assert_eq!(first.assessment.reference_hash, second.assessment.reference_hash);
    }

    /// Property: same seed, same assessment
    #[test]
    fn prop_seeded_scoring_reproducible(evidence in message_strategy(), seed in any::<u64>()) {
        let engine = TrustEngine::default();
        let first = engine.assess(&evidence, &mut StdRng::seed_from_u64(seed));
        let second = engine.assess(&evidence, &mut StdRng::seed_from_u64(seed));
        prop_assert_eq!(first, second);
    }

    /// Property: an amount of 20,000 or more adds risk, never removes it
    #[test]
    fn prop_high_amount_never_lowers_risk(
        text in text_strategy(),
        relationship in relationship_strategy(),
        rupees in 20_000i64..10_000_000,
    ) {
        let base = MessageEvidence {
            text: text.clone(),
            amount: Some(Decimal::from(5_000)),
            relationship: relationship.clone(),
            ..Default::default()
        };
        let high = MessageEvidence {
            text,
            amount: Some(Decimal::from(rupees)),
            relationship,
            ..Default::default()
        };

        prop_assert!(high.extract().raw_risk() >= base.extract().raw_risk());
    }

    /// Property: family, small amount and low risk floor the target at 80
    #[test]
    fn prop_family_floor(rupees in 1i64..=2_000, recent in 0u32..10, seed in any::<u64>()) {
        let engine = TrustEngine::default();
        let evidence = MessageEvidence {
            text: "dinner money".to_string(),
            amount: Some(Decimal::from(rupees)),
            relationship: "family".to_string(),
            recent_requests: recent,
            ..Default::default()
        };
        let eval = engine.evaluate(&evidence, &mut StdRng::seed_from_u64(seed));

        prop_assert!(eval.tally.risk < 20);
        prop_assert!(eval.target.score() >= 80);
        prop_assert_eq!(eval.assessment.verdict, Verdict::Safe);
    }

    /// Property: grouping keeps every record and first-seen order
    #[test]
    fn prop_grouping_conserves_records(
        rows in prop::collection::vec((prop_oneof![Just("a@upi"), Just("B@upi"), Just("b@UPI"), Just("c@upi")], 1i64..5_000), 0..40),
    ) {
        let engine = TrustEngine::default();
        let records: Vec<TransactionRecord> = rows
            .iter()
            .map(|(payee, amount)| TransactionRecord::new("2025-08-25", *payee, Decimal::from(*amount)))
            .collect();
        let groups = engine.score_transaction_group_with_rng(&records, &mut StdRng::seed_from_u64(3));

        let counted: usize = groups.iter().map(|g| g.count).sum();
        prop_assert_eq!(counted, records.len());
        let total: Decimal = groups.iter().map(|g| g.total).sum();
        let expected: Decimal = records.iter().map(|r| r.amount).sum();
        prop_assert_eq!(total, expected);
        prop_assert!(groups.len() <= 3);
        if let Some(first) = records.first() {
            prop_assert_eq!(&groups[0].payee, &first.payee);
        }
    }
}
