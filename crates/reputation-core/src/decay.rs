//! Time decay for endorsement stakes
//!
//! An endorsement keeps its full weight for a six month grace period. After
//! that it loses 10% per elapsed 30-day month, compounding, and the result is
//! truncated to the token's smallest unit.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use crate::models::EndorsementRecord;

/// Decimal places of the staking token.
pub const TOKEN_DECIMALS: u32 = 18;

/// Months an endorsement keeps its full weight.
pub const GRACE_PERIOD_MONTHS: i64 = 6;

/// Fraction of weight kept per decay month.
pub const MONTHLY_RETENTION: Decimal = dec!(0.9);

const SECONDS_PER_MONTH: i64 = 30 * 24 * 60 * 60;

// 0.9^1000 is far below one smallest unit of any representable stake.
const MAX_DECAY_MONTHS: u64 = 1000;

/// Present-day weight of `stake` created at `created_at`.
///
/// `stake` is expressed in the token's smallest unit. A `created_at` in the
/// future yields a negative age, which falls inside the grace period, so
/// minor clock drift between collaborators leaves the stake untouched.
pub fn decayed_weight(stake: Decimal, created_at: DateTime<Utc>, now: DateTime<Utc>) -> Decimal {
    let elapsed_seconds = (now - created_at).num_seconds();
    let months_old = Decimal::from(elapsed_seconds) / Decimal::from(SECONDS_PER_MONTH);

    if months_old <= Decimal::from(GRACE_PERIOD_MONTHS) {
        return stake;
    }

    let decay_months = (months_old - Decimal::from(GRACE_PERIOD_MONTHS))
        .floor()
        .to_u64()
        .unwrap_or(MAX_DECAY_MONTHS);
    if decay_months >= MAX_DECAY_MONTHS {
        return Decimal::ZERO;
    }

    (stake * MONTHLY_RETENTION.powu(decay_months)).floor()
}

impl EndorsementRecord {
    /// Decayed weight of this endorsement at `now`, ignoring the active flag.
    pub fn current_weight(&self, now: DateTime<Utc>) -> Decimal {
        decayed_weight(self.stake_amount, self.created_at, now)
    }
}

/// Sum of the decayed weights of all active endorsements, in smallest units.
pub fn aggregate_endorsement_weight(records: &[EndorsementRecord], now: DateTime<Utc>) -> Decimal {
    records
        .iter()
        .filter(|r| r.active)
        .map(|r| r.current_weight(now))
        .sum()
}

/// Convert a smallest-unit amount into whole-token units.
///
/// Token precisions beyond what `Decimal` can represent yield zero.
pub fn to_whole_tokens(amount: Decimal, decimals: u32) -> Decimal {
    Decimal::TEN
        .checked_powu(u64::from(decimals))
        .map_or(Decimal::ZERO, |divisor| amount / divisor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_no_decay_at_creation() {
        assert_eq!(decayed_weight(dec!(100), t0(), t0()), dec!(100));
    }

    #[test]
    fn test_no_decay_at_end_of_grace_period() {
        let now = t0() + Duration::days(180);
        assert_eq!(decayed_weight(dec!(100), t0(), now), dec!(100));
    }

    #[test]
    fn test_one_month_past_grace() {
        let now = t0() + Duration::days(210);
        assert_eq!(decayed_weight(dec!(100), t0(), now), dec!(90));
    }

    #[test]
    fn test_partial_month_does_not_decay() {
        // 6.9 months old: past the grace period but not a full decay month
        let now = t0() + Duration::days(207);
        assert_eq!(decayed_weight(dec!(100), t0(), now), dec!(100));
    }

    #[test]
    fn test_compounding_and_truncation() {
        // 3 decay months: 0.9^3 = 0.729
        let now = t0() + Duration::days(270);
        assert_eq!(decayed_weight(dec!(1000), t0(), now), dec!(729));
        assert_eq!(decayed_weight(dec!(10), t0(), now), dec!(7));
    }

    #[test]
    fn test_future_timestamp_is_tolerated() {
        let created = t0() + Duration::days(3);
        assert_eq!(decayed_weight(dec!(55), created, t0()), dec!(55));
    }

    #[test]
    fn test_ancient_endorsement_decays_to_zero() {
        let now = t0() + Duration::days(30 * 2000);
        assert_eq!(decayed_weight(dec!(1000000000000000000000), t0(), now), Decimal::ZERO);
    }

    #[test]
    fn test_aggregate_skips_inactive() {
        let now = t0() + Duration::days(210);
        let records = vec![
            EndorsementRecord { stake_amount: dec!(100), created_at: t0(), active: true },
            EndorsementRecord { stake_amount: dec!(50), created_at: now, active: true },
            EndorsementRecord { stake_amount: dec!(500), created_at: t0(), active: false },
        ];
        assert_eq!(aggregate_endorsement_weight(&records, now), dec!(140));
    }

    #[test]
    fn test_to_whole_tokens() {
        assert_eq!(to_whole_tokens(dec!(5000000000000000000), TOKEN_DECIMALS), dec!(5));
        assert_eq!(to_whole_tokens(dec!(250), 2), dec!(2.5));
        assert_eq!(to_whole_tokens(dec!(7), 0), dec!(7));
        assert_eq!(to_whole_tokens(dec!(1), 40), Decimal::ZERO);
    }

    #[test]
    fn test_long_decay_keeps_precision() {
        // 24 decay months: 0.9^24 = 0.0797664430...
        let now = t0() + Duration::days(30 * 30);
        assert_eq!(decayed_weight(dec!(1000000000000), t0(), now), dec!(79766443076));
    }
}
