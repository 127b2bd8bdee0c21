//! Composite score calculation
//!
//! The composite score starts from a fixed base and adds independently capped
//! bonuses for badges, account age, activity and identity verification. Every
//! term is non-negative and non-decreasing in its input, so improving any one
//! signal can never lower the score.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::models::{ScoreBreakdown, UserSignals, MAX_KYC_LEVEL};
use crate::tier::tier_from_score;

pub const MIN_SCORE: u16 = 0;
pub const MAX_SCORE: u16 = 1000;

const BASE_SCORE: u32 = 350;
const VERIFIED_BONUS: u32 = 25;
const ENGAGEMENT_BONUS: u32 = 50;

const MATURE_ACCOUNT_DAYS: u32 = 180;
const VETERAN_ACCOUNT_DAYS: u32 = 365;
const ACCOUNT_AGE_BONUS: u32 = 50;

const MAX_CATEGORY_SCORE: u32 = 100;

/// Calculate the composite score (0-1000) for a wallet.
///
/// Negative endorsement weights count as zero and KYC levels above 3 count
/// as 3; use [`UserSignals::validate`] to reject such input instead.
pub fn calculate_score(signals: &UserSignals) -> u16 {
    let mut total = Decimal::from(BASE_SCORE);

    // Badges
    total += Decimal::from(
        signals
            .badge_types
            .iter()
            .map(|badge| badge.score_bonus())
            .sum::<u32>(),
    );
    if signals.is_verified {
        total += Decimal::from(VERIFIED_BONUS);
    }

    // Account age (stacking)
    if signals.account_age_days > MATURE_ACCOUNT_DAYS {
        total += Decimal::from(ACCOUNT_AGE_BONUS);
    }
    if signals.account_age_days > VETERAN_ACCOUNT_DAYS {
        total += Decimal::from(ACCOUNT_AGE_BONUS);
    }

    // Activity
    let weight = endorsement_weight(signals);
    total += Decimal::from(capped(signals.transaction_count, 2, 150));
    total += weight.min(dec!(100));
    total += Decimal::from(capped(signals.endorsement_count, 10, 100));
    total += Decimal::from(capped(signals.unique_counterparties, 2, 75));
    total += (Decimal::from(signals.on_chain_age_days) / dec!(30)).min(dec!(75));

    total += Decimal::from(ENGAGEMENT_BONUS);

    if let Some(identity) = &signals.identity_signals {
        total += Decimal::from(u32::from(identity.kyc_level.min(MAX_KYC_LEVEL)) * 27);
        total += (Decimal::from(identity.account_age_days) / dec!(9)).min(dec!(40));
        if identity.has_verified_email {
            total += dec!(20);
        }
        if identity.has_verified_phone {
            total += dec!(30);
        }
        if identity.profile_complete {
            total += dec!(30);
        }
    }

    let rounded = total.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let clamped = rounded
        .max(Decimal::from(MIN_SCORE))
        .min(Decimal::from(MAX_SCORE));

    clamped.to_u16().unwrap_or(MAX_SCORE)
}

/// Calculate the composite score together with its category sub-scores.
///
/// `trend` is the caller's delta against a previous snapshot and is carried
/// through unchanged.
pub fn calculate_breakdown(signals: &UserSignals, trend: i32) -> ScoreBreakdown {
    let overall = calculate_score(signals);
    let tier = tier_from_score(overall);

    let breakdown = ScoreBreakdown {
        overall,
        identity: identity_score(signals),
        financial: financial_score(signals),
        social: social_score(signals),
        transactional: transactional_score(signals),
        behavioral: behavioral_score(signals),
        tier,
        trend,
    };

    tracing::debug!(
        overall = breakdown.overall,
        tier = tier.label(),
        identity = breakdown.identity,
        financial = breakdown.financial,
        social = breakdown.social,
        transactional = breakdown.transactional,
        behavioral = breakdown.behavioral,
        "Calculated score breakdown"
    );

    breakdown
}

fn identity_score(signals: &UserSignals) -> u8 {
    let mut score = (signals.badge_types.len() as u64).saturating_mul(15);
    if signals.is_verified {
        score += 25;
    }
    if let Some(identity) = &signals.identity_signals {
        score += u64::from(identity.kyc_level.min(MAX_KYC_LEVEL)) * 10;
        if identity.has_verified_email {
            score += 5;
        }
        if identity.has_verified_phone {
            score += 5;
        }
        if identity.profile_complete {
            score += 5;
        }
    }
    category(Decimal::from(score))
}

fn financial_score(signals: &UserSignals) -> u8 {
    let weight = endorsement_weight(signals);
    category(weight * dec!(10) + Decimal::from(u64::from(signals.transaction_count) * 3))
}

fn social_score(signals: &UserSignals) -> u8 {
    let weight = endorsement_weight(signals);
    category(
        Decimal::from(u64::from(signals.endorsement_count) * 10) + (weight / dec!(100)).floor(),
    )
}

fn transactional_score(signals: &UserSignals) -> u8 {
    category(Decimal::from(
        u64::from(signals.unique_counterparties) * 4 + u64::from(signals.transaction_count) * 2,
    ))
}

fn behavioral_score(signals: &UserSignals) -> u8 {
    category(Decimal::from(signals.on_chain_age_days / 3))
}

fn endorsement_weight(signals: &UserSignals) -> Decimal {
    signals.endorsement_weight.max(Decimal::ZERO)
}

/// `min(count * per_unit, cap)` without overflow.
fn capped(count: u32, per_unit: u64, cap: u64) -> u64 {
    (u64::from(count) * per_unit).min(cap)
}

/// Truncate and cap a raw category value to `0..=100`.
fn category(raw: Decimal) -> u8 {
    raw.floor()
        .max(Decimal::ZERO)
        .min(Decimal::from(MAX_CATEGORY_SCORE))
        .to_u8()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BadgeType, IdentitySignals, Tier};

    fn reference_signals() -> UserSignals {
        UserSignals {
            is_verified: true,
            badge_types: [BadgeType::VerifiedIdentity].into_iter().collect(),
            account_age_days: 400,
            transaction_count: 60,
            endorsement_weight: dec!(5),
            endorsement_count: 12,
            unique_counterparties: 8,
            on_chain_age_days: 400,
            identity_signals: None,
        }
    }

    #[test]
    fn test_empty_signals_get_base_and_engagement() {
        assert_eq!(calculate_score(&UserSignals::default()), 400);
    }

    #[test]
    fn test_reference_wallet() {
        let breakdown = calculate_breakdown(&reference_signals(), 0);
        assert_eq!(breakdown.overall, 829);
        assert_eq!(breakdown.tier, Tier::Excellent);
        assert_eq!(breakdown.identity, 40);
        assert_eq!(breakdown.financial, 100);
        assert_eq!(breakdown.social, 100);
        assert_eq!(breakdown.transactional, 100);
        assert_eq!(breakdown.behavioral, 100);
    }

    #[test]
    fn test_trend_is_passed_through() {
        assert_eq!(calculate_breakdown(&reference_signals(), -12).trend, -12);
    }

    #[test]
    fn test_score_is_clamped_to_max() {
        let signals = UserSignals {
            is_verified: true,
            badge_types: BadgeType::KNOWN.into_iter().collect(),
            account_age_days: u32::MAX,
            transaction_count: u32::MAX,
            endorsement_weight: dec!(1000000),
            endorsement_count: u32::MAX,
            unique_counterparties: u32::MAX,
            on_chain_age_days: u32::MAX,
            identity_signals: Some(IdentitySignals {
                kyc_level: 3,
                has_verified_email: true,
                has_verified_phone: true,
                profile_complete: true,
                account_age_days: u32::MAX,
            }),
        };
        let breakdown = calculate_breakdown(&signals, 0);
        assert_eq!(breakdown.overall, MAX_SCORE);
        assert_eq!(breakdown.tier, Tier::Elite);
        for sub in [
            breakdown.identity,
            breakdown.financial,
            breakdown.social,
            breakdown.transactional,
            breakdown.behavioral,
        ] {
            assert!(sub <= 100);
        }
    }

    #[test]
    fn test_unknown_badge_uses_default_bonus() {
        let mut signals = UserSignals::default();
        signals.badge_types.insert(BadgeType::Unknown("GALAXY_BRAIN".to_string()));
        assert_eq!(calculate_score(&signals), 420);
    }

    #[test]
    fn test_distinct_unknown_badges_each_count() {
        let signals: UserSignals =
            serde_json::from_str(r#"{"badge_types":["FOO_BADGE","BAR_BADGE"]}"#).unwrap();
        assert_eq!(calculate_score(&signals), 440);
        assert_eq!(calculate_breakdown(&signals, 0).identity, 30);
    }

    #[test]
    fn test_account_age_bonuses_stack() {
        let mut signals = UserSignals::default();
        signals.account_age_days = 180;
        assert_eq!(calculate_score(&signals), 400);
        signals.account_age_days = 181;
        assert_eq!(calculate_score(&signals), 450);
        signals.account_age_days = 366;
        assert_eq!(calculate_score(&signals), 500);
    }

    #[test]
    fn test_identity_signals() {
        let signals = UserSignals {
            identity_signals: Some(IdentitySignals {
                kyc_level: 2,
                has_verified_email: true,
                has_verified_phone: false,
                profile_complete: true,
                account_age_days: 90,
            }),
            ..UserSignals::default()
        };
        // 400 + 54 + 10 + 20 + 30
        assert_eq!(calculate_score(&signals), 514);
        // 20 + 5 + 5
        assert_eq!(calculate_breakdown(&signals, 0).identity, 30);
    }

    #[test]
    fn test_malformed_inputs_are_clamped() {
        let negative = UserSignals {
            endorsement_weight: dec!(-50),
            ..UserSignals::default()
        };
        assert_eq!(calculate_score(&negative), 400);
        assert!(negative.validate().is_err());

        let over_kyc = UserSignals {
            identity_signals: Some(IdentitySignals {
                kyc_level: 9,
                ..IdentitySignals::default()
            }),
            ..UserSignals::default()
        };
        assert_eq!(calculate_score(&over_kyc), 481);
        assert!(over_kyc.validate().is_err());
    }

    #[test]
    fn test_fractional_terms_round_half_up() {
        // 45 / 30 = 1.5 on-chain bonus
        let signals = UserSignals {
            on_chain_age_days: 45,
            ..UserSignals::default()
        };
        assert_eq!(calculate_score(&signals), 402);
    }

    #[test]
    fn test_monotonic_in_each_signal() {
        let base = reference_signals();
        let base_score = calculate_score(&base);

        let bumps: Vec<Box<dyn Fn(&mut UserSignals)>> = vec![
            Box::new(|s: &mut UserSignals| s.is_verified = true),
            Box::new(|s: &mut UserSignals| {
                s.badge_types.insert(BadgeType::EliteScore);
            }),
            Box::new(|s: &mut UserSignals| s.account_age_days += 1000),
            Box::new(|s: &mut UserSignals| s.transaction_count += 1),
            Box::new(|s: &mut UserSignals| s.endorsement_weight += dec!(0.5)),
            Box::new(|s: &mut UserSignals| s.endorsement_count += 1),
            Box::new(|s: &mut UserSignals| s.unique_counterparties += 1),
            Box::new(|s: &mut UserSignals| s.on_chain_age_days += 30),
            Box::new(|s: &mut UserSignals| s.identity_signals = Some(IdentitySignals::default())),
        ];

        for bump in bumps {
            let mut signals = base.clone();
            bump(&mut signals);
            assert!(calculate_score(&signals) >= base_score);
        }
    }
}
