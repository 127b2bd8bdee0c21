//! Badge and airdrop eligibility
//!
//! Badges use fixed predicates over a [`BadgeContext`]. Airdrops use the
//! declarative [`EligibilityCriteria`] fixed when the airdrop was created.
//! Both report human-readable reasons suitable for direct display.

use chrono::{DateTime, Duration, Utc};

use crate::models::*;

pub const TRUSTED_TRADER_ENDORSEMENTS: u32 = 50;
pub const COMMUNITY_BUILDER_ENDORSEMENTS: u32 = 10;
pub const ELITE_SCORE_THRESHOLD: u16 = 850;
pub const DEFAULT_EARLY_ADOPTER_WINDOW_DAYS: u32 = 30;

// =============================================================================
// Badge Eligibility
// =============================================================================

/// Cutoff the early adopter predicate compares registration time against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EarlyAdopterPolicy {
    /// Cutoff is `now + days` at evaluation time; effectively any registered
    /// wallet qualifies.
    RollingWindow { days: u32 },
    /// Cutoff is a fixed program launch date.
    FixedCutoff(DateTime<Utc>),
}

impl Default for EarlyAdopterPolicy {
    fn default() -> Self {
        EarlyAdopterPolicy::RollingWindow {
            days: DEFAULT_EARLY_ADOPTER_WINDOW_DAYS,
        }
    }
}

impl EarlyAdopterPolicy {
    /// Saturates at the latest representable instant.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            EarlyAdopterPolicy::RollingWindow { days } => Duration::try_days(i64::from(days))
                .and_then(|window| now.checked_add_signed(window))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            EarlyAdopterPolicy::FixedCutoff(at) => at,
        }
    }
}

/// Evaluates the fixed badge predicates.
#[derive(Debug, Clone, Default)]
pub struct BadgeEvaluator {
    early_adopter: EarlyAdopterPolicy,
}

impl BadgeEvaluator {
    pub fn new(early_adopter: EarlyAdopterPolicy) -> Self {
        Self { early_adopter }
    }

    /// Evaluate every known badge, in canonical order.
    pub fn evaluate_all(&self, context: &BadgeContext, now: DateTime<Utc>) -> Vec<BadgeEligibility> {
        BadgeType::KNOWN
            .iter()
            .map(|badge| self.evaluate(badge.clone(), context, now))
            .collect()
    }

    /// Evaluate one badge predicate.
    pub fn evaluate(&self, badge: BadgeType, context: &BadgeContext, now: DateTime<Utc>) -> BadgeEligibility {
        match badge {
            BadgeType::VerifiedIdentity => {
                if context.identity_linked {
                    eligible(badge, "Identity verification linked", None)
                } else {
                    ineligible(badge, "Link a verified identity to unlock this badge", None)
                }
            }
            BadgeType::TrustedTrader => threshold(
                badge,
                context
                    .endorsements_given
                    .saturating_add(context.active_endorsements_received),
                TRUSTED_TRADER_ENDORSEMENTS,
                "endorsements given or received",
            ),
            BadgeType::CommunityBuilder => threshold(
                badge,
                context.active_endorsements_given,
                COMMUNITY_BUILDER_ENDORSEMENTS,
                "active endorsements given",
            ),
            BadgeType::EarlyAdopter => match context.registered_at {
                None => ineligible(badge, "Registration required", None),
                Some(registered_at) => {
                    let cutoff = self.early_adopter.cutoff(now);
                    if registered_at < cutoff {
                        eligible(badge, "Registered during the early access period", None)
                    } else {
                        ineligible(
                            badge,
                            &format!("Registered after the early access cutoff of {}", cutoff.to_rfc3339()),
                            None,
                        )
                    }
                }
            },
            BadgeType::EliteScore => threshold(
                badge,
                u32::from(context.overall_score),
                u32::from(ELITE_SCORE_THRESHOLD),
                "reputation score",
            ),
            BadgeType::Unknown(_) => ineligible(badge, "Unknown badge type", None),
        }
    }
}

fn threshold(badge: BadgeType, current: u32, required: u32, what: &str) -> BadgeEligibility {
    let progress = Some(BadgeProgress {
        current: u64::from(current),
        required: u64::from(required),
    });

    if current >= required {
        eligible(badge, &format!("Reached {} {}", required, what), progress)
    } else {
        ineligible(
            badge,
            &format!("Need {} more {} ({}/{})", required - current, what, current, required),
            progress,
        )
    }
}

fn eligible(badge: BadgeType, reason: &str, progress: Option<BadgeProgress>) -> BadgeEligibility {
    BadgeEligibility {
        badge,
        eligible: true,
        reason: reason.to_string(),
        progress,
    }
}

fn ineligible(badge: BadgeType, reason: &str, progress: Option<BadgeProgress>) -> BadgeEligibility {
    BadgeEligibility {
        badge,
        eligible: false,
        reason: reason.to_string(),
        progress,
    }
}

// =============================================================================
// Airdrop Eligibility
// =============================================================================

/// Evaluate airdrop criteria against a wallet's current attributes.
///
/// Reasons are appended in a fixed order: registration, score, badges,
/// endorsement weight. Under [`BadgeRequirement::All`] each missing badge
/// gets its own reason; under [`BadgeRequirement::Any`] a single combined
/// reason is reported only when none of the required badges are owned.
pub fn evaluate_airdrop(criteria: &EligibilityCriteria, attributes: &UserAttributes) -> EligibilityResult {
    let mut reasons = Vec::new();

    if criteria.requires_registration && !attributes.is_registered {
        reasons.push("Registration required".to_string());
    }

    if criteria.min_score > 0 && attributes.score < criteria.min_score {
        reasons.push(format!(
            "Score {} is below the required minimum of {}",
            attributes.score, criteria.min_score
        ));
    }

    if !criteria.required_badges.is_empty() {
        match criteria.badge_requirement {
            BadgeRequirement::All => {
                for badge in criteria
                    .required_badges
                    .iter()
                    .filter(|b| !attributes.owned_badges.contains(*b))
                {
                    reasons.push(format!("Missing required badge: {}", badge.display_name()));
                }
            }
            BadgeRequirement::Any => {
                let owns_any = criteria
                    .required_badges
                    .iter()
                    .any(|b| attributes.owned_badges.contains(b));
                if !owns_any {
                    let names: Vec<&str> = criteria
                        .required_badges
                        .iter()
                        .map(|b| b.display_name())
                        .collect();
                    reasons.push(format!("Requires at least one of: {}", names.join(", ")));
                }
            }
        }
    }

    if attributes.endorsement_weight < criteria.min_endorsement_weight {
        reasons.push("Insufficient endorsement weight".to_string());
    }

    tracing::debug!(
        eligible = reasons.is_empty(),
        reason_count = reasons.len(),
        "Evaluated airdrop eligibility"
    );

    EligibilityResult {
        eligible: reasons.is_empty(),
        reasons,
        attributes: attributes.clone(),
    }
}
