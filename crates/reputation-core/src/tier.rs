//! Tier classification

use crate::models::Tier;

/// Tiers from highest threshold to lowest; the first match wins.
const TIER_THRESHOLDS: [(Tier, u16); 5] = [
    (Tier::Elite, 850),
    (Tier::Excellent, 750),
    (Tier::Good, 650),
    (Tier::Building, 500),
    (Tier::AtRisk, 0),
];

/// Classify a composite score.
///
/// Scores are expected in `0..=1000`; anything above 1000 still classifies
/// as elite.
pub fn tier_from_score(score: u16) -> Tier {
    TIER_THRESHOLDS
        .iter()
        .find(|(_, min)| score >= *min)
        .map(|(tier, _)| *tier)
        .unwrap_or(Tier::AtRisk)
}

/// Points still needed to reach the next tier, or `None` at the top.
pub fn points_to_next_tier(score: u16) -> Option<u16> {
    tier_from_score(score)
        .next()
        .map(|next| next.min_score().saturating_sub(score))
}

impl Tier {
    pub fn min_score(self) -> u16 {
        match self {
            Tier::Elite => 850,
            Tier::Excellent => 750,
            Tier::Good => 650,
            Tier::Building => 500,
            Tier::AtRisk => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::Elite => "Elite",
            Tier::Excellent => "Excellent",
            Tier::Good => "Good",
            Tier::Building => "Building",
            Tier::AtRisk => "At Risk",
        }
    }

    /// The tier directly above this one.
    pub fn next(self) -> Option<Tier> {
        match self {
            Tier::AtRisk => Some(Tier::Building),
            Tier::Building => Some(Tier::Good),
            Tier::Good => Some(Tier::Excellent),
            Tier::Excellent => Some(Tier::Elite),
            Tier::Elite => None,
        }
    }
}
