//! End-to-end flow: endorsements are decayed, signals scored and tiered,
//! the score committed and verified, and the result used to gate badges and
//! an airdrop.

use chrono::{Duration, TimeZone, Utc};
use reputation_core::*;
use rust_decimal_macros::dec;

const WALLET: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

#[test]
fn test_signals_to_airdrop_decision() {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

    // 3 tokens within grace, 2.5 tokens one month past grace (decays to 2.25), 1 inactive
    let endorsements = vec![
        EndorsementRecord {
            stake_amount: dec!(3000000000000000000),
            created_at: now - Duration::days(30),
            active: true,
        },
        EndorsementRecord {
            stake_amount: dec!(2500000000000000000),
            created_at: now - Duration::days(215),
            active: true,
        },
        EndorsementRecord {
            stake_amount: dec!(1000000000000000000),
            created_at: now - Duration::days(10),
            active: false,
        },
    ];
    let raw_weight = aggregate_endorsement_weight(&endorsements, now);
    assert_eq!(raw_weight, dec!(5250000000000000000));
    let weight = to_whole_tokens(raw_weight, TOKEN_DECIMALS);
    assert_eq!(weight, dec!(5.25));

    let signals = UserSignals {
        is_verified: true,
        badge_types: [BadgeType::VerifiedIdentity].into_iter().collect(),
        account_age_days: 400,
        transaction_count: 60,
        endorsement_weight: weight,
        endorsement_count: 12,
        unique_counterparties: 8,
        on_chain_age_days: 400,
        identity_signals: None,
    };
    signals.validate().unwrap();

    // 350+50+25+100+120+5.25+100+16+13.33+50 = 829.58
    let breakdown = calculate_breakdown(&signals, 4);
    assert_eq!(breakdown.overall, 830);
    assert_eq!(breakdown.tier, Tier::Excellent);
    assert_eq!(points_to_next_tier(breakdown.overall), Some(20));

    let address: WalletAddress = WALLET.parse().unwrap();
    let codec = CommitmentCodec::default();
    let published = codec.commit(&address, breakdown.overall);
    assert!(codec.verify_commitment(&address, breakdown.overall, &published));
    assert!(codec.verify(&address, u32::from(breakdown.overall), &signals));
    assert!(!codec.verify(&address, u32::from(breakdown.overall) * 2, &signals));

    let badges = BadgeEvaluator::default().evaluate_all(
        &BadgeContext {
            identity_linked: true,
            endorsements_given: 14,
            active_endorsements_given: 11,
            active_endorsements_received: 2,
            registered_at: Some(now - Duration::days(400)),
            overall_score: breakdown.overall,
        },
        now,
    );
    let earned: Vec<BadgeType> = badges
        .iter()
        .filter(|b| b.eligible)
        .map(|b| b.badge.clone())
        .collect();
    assert_eq!(
        earned,
        vec![
            BadgeType::VerifiedIdentity,
            BadgeType::CommunityBuilder,
            BadgeType::EarlyAdopter,
        ]
    );

    let criteria = EligibilityCriteria {
        min_score: 800,
        required_badges: [BadgeType::VerifiedIdentity, BadgeType::EliteScore]
            .into_iter()
            .collect(),
        badge_requirement: BadgeRequirement::Any,
        min_endorsement_weight: dec!(5),
        requires_registration: true,
    };
    let attributes = UserAttributes {
        is_registered: true,
        score: breakdown.overall,
        owned_badges: earned.into_iter().collect(),
        endorsement_weight: weight,
    };
    let result = evaluate_airdrop(&criteria, &attributes);
    assert!(result.eligible, "unexpected reasons: {:?}", result.reasons);

    let strict = EligibilityCriteria {
        badge_requirement: BadgeRequirement::All,
        ..criteria
    };
    let result = evaluate_airdrop(&strict, &attributes);
    assert!(!result.eligible);
    assert_eq!(result.reasons, vec!["Missing required badge: Elite Score".to_string()]);
}

#[test]
fn test_breakdown_serializes_for_display() {
    let breakdown = calculate_breakdown(&UserSignals::default(), 0);
    let json = serde_json::to_value(&breakdown).unwrap();
    assert_eq!(json["overall"], 400);
    assert_eq!(json["tier"], "at_risk");
}

#[test]
fn test_signals_deserialize_with_defaults_and_unknown_badges() {
    let signals: UserSignals = serde_json::from_str(
        r#"{"is_verified": true, "badge_types": ["TRUSTED_TRADER", "GALAXY_BRAIN"], "endorsement_weight": "2.5"}"#,
    )
    .unwrap();
    assert!(signals.badge_types.contains(&BadgeType::TrustedTrader));
    assert!(signals
        .badge_types
        .contains(&BadgeType::Unknown("GALAXY_BRAIN".to_string())));
    assert_eq!(signals.endorsement_weight, dec!(2.5));
    // 400 + 25 + 30 + 20 + 2.5 = 477.5
    assert_eq!(calculate_score(&signals), 478);
}
