//! Data model for reputation scoring and eligibility
//!
//! These are the plain values exchanged with the collaborators around the
//! engine: signals flow in, breakdowns and eligibility results flow out.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ReputationError, ReputationResult};

/// Highest KYC level an identity provider can report.
pub const MAX_KYC_LEVEL: u8 = 3;

// =============================================================================
// Badges
// =============================================================================

/// Non-transferable achievement a wallet can unlock.
///
/// `Unknown` keeps badge identifiers this build does not recognize, verbatim,
/// so that a single unexpected value never blocks scoring for the rest of a
/// wallet and distinct unknown badges still count separately.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BadgeType {
    VerifiedIdentity,
    TrustedTrader,
    CommunityBuilder,
    EarlyAdopter,
    EliteScore,
    Unknown(String),
}

impl BadgeType {
    /// The badges this engine can evaluate, in canonical order.
    pub const KNOWN: [BadgeType; 5] = [
        BadgeType::VerifiedIdentity,
        BadgeType::TrustedTrader,
        BadgeType::CommunityBuilder,
        BadgeType::EarlyAdopter,
        BadgeType::EliteScore,
    ];

    /// Wire identifier, e.g. `VERIFIED_IDENTITY`.
    pub fn as_str(&self) -> &str {
        match self {
            BadgeType::VerifiedIdentity => "VERIFIED_IDENTITY",
            BadgeType::TrustedTrader => "TRUSTED_TRADER",
            BadgeType::CommunityBuilder => "COMMUNITY_BUILDER",
            BadgeType::EarlyAdopter => "EARLY_ADOPTER",
            BadgeType::EliteScore => "ELITE_SCORE",
            BadgeType::Unknown(id) => id,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, BadgeType::Unknown(_))
    }

    /// Points a badge adds to the composite score.
    pub fn score_bonus(&self) -> u32 {
        match self {
            BadgeType::VerifiedIdentity => 50,
            BadgeType::TrustedTrader => 30,
            BadgeType::CommunityBuilder => 25,
            BadgeType::EarlyAdopter => 20,
            BadgeType::EliteScore => 40,
            BadgeType::Unknown(_) => 20,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BadgeType::VerifiedIdentity => "Verified Identity",
            BadgeType::TrustedTrader => "Trusted Trader",
            BadgeType::CommunityBuilder => "Community Builder",
            BadgeType::EarlyAdopter => "Early Adopter",
            BadgeType::EliteScore => "Elite Score",
            BadgeType::Unknown(_) => "Unknown Badge",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BadgeType::VerifiedIdentity => "Linked a verified external identity to this wallet",
            BadgeType::TrustedTrader => "Took part in 50 or more endorsements",
            BadgeType::CommunityBuilder => "Actively endorses 10 or more community members",
            BadgeType::EarlyAdopter => "Registered during the early access program",
            BadgeType::EliteScore => "Reached a reputation score of 850 or higher",
            BadgeType::Unknown(_) => "Badge type not recognized by this engine",
        }
    }
}

impl From<String> for BadgeType {
    fn from(id: String) -> Self {
        match id.as_str() {
            "VERIFIED_IDENTITY" => BadgeType::VerifiedIdentity,
            "TRUSTED_TRADER" => BadgeType::TrustedTrader,
            "COMMUNITY_BUILDER" => BadgeType::CommunityBuilder,
            "EARLY_ADOPTER" => BadgeType::EarlyAdopter,
            "ELITE_SCORE" => BadgeType::EliteScore,
            _ => BadgeType::Unknown(id),
        }
    }
}

impl From<BadgeType> for String {
    fn from(badge: BadgeType) -> Self {
        match badge {
            BadgeType::Unknown(id) => id,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for BadgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Scoring Inputs
// =============================================================================

/// Optional third-party identity verification signals.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IdentitySignals {
    /// KYC level reported by the provider (0-3)
    pub kyc_level: u8,
    pub has_verified_email: bool,
    pub has_verified_phone: bool,
    pub profile_complete: bool,
    /// Age of the linked external account in days
    pub account_age_days: u32,
}

/// Everything the score calculator needs to know about one wallet.
///
/// Assembled fresh by the caller for every scoring request; absent fields
/// deserialize to zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserSignals {
    pub is_verified: bool,
    pub badge_types: BTreeSet<BadgeType>,
    pub account_age_days: u32,
    pub transaction_count: u32,
    /// Decay-adjusted endorsement weight in whole-token units
    pub endorsement_weight: Decimal,
    pub endorsement_count: u32,
    pub unique_counterparties: u32,
    pub on_chain_age_days: u32,
    pub identity_signals: Option<IdentitySignals>,
}

impl UserSignals {
    /// Reject inputs outside the documented domain.
    ///
    /// Scoring itself clamps such values, so calling this is how a caller
    /// finds out its data is malformed instead of silently scoring it.
    pub fn validate(&self) -> ReputationResult<()> {
        if self.endorsement_weight < Decimal::ZERO {
            return Err(ReputationError::InvalidSignal(format!(
                "endorsement_weight must be non-negative, got {}",
                self.endorsement_weight
            )));
        }

        if let Some(identity) = &self.identity_signals {
            if identity.kyc_level > MAX_KYC_LEVEL {
                return Err(ReputationError::InvalidSignal(format!(
                    "kyc_level must be between 0 and {}, got {}",
                    MAX_KYC_LEVEL, identity.kyc_level
                )));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Scoring Outputs
// =============================================================================

/// Coarse reputation label derived from the composite score.
///
/// Declared lowest first so the derived ordering matches the thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    AtRisk,
    Building,
    Good,
    Excellent,
    Elite,
}

/// Composite score with its per-category sub-scores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreBreakdown {
    /// Composite score (0-1000)
    pub overall: u16,

    /// Category sub-scores (0-100 each)
    pub identity: u8,
    pub financial: u8,
    pub social: u8,
    pub transactional: u8,
    pub behavioral: u8,

    pub tier: Tier,

    /// Change since the caller's previous snapshot, passed through untouched
    pub trend: i32,
}

// =============================================================================
// Endorsements
// =============================================================================

/// A stake one wallet placed behind another.
///
/// The stored stake never changes; its present-day weight is derived on read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndorsementRecord {
    /// Staked amount in the token's smallest unit
    pub stake_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

// =============================================================================
// Badge Eligibility
// =============================================================================

/// Raw attributes the badge predicates read.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BadgeContext {
    /// An external identity provider has been linked
    pub identity_linked: bool,
    /// Endorsements this wallet has given, active or not
    pub endorsements_given: u32,
    /// Endorsements this wallet has given that are still active
    pub active_endorsements_given: u32,
    /// Active endorsements this wallet has received
    pub active_endorsements_received: u32,
    /// Registration time, on-chain or off-chain; `None` when unregistered
    pub registered_at: Option<DateTime<Utc>>,
    /// Current composite score
    pub overall_score: u16,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BadgeProgress {
    pub current: u64,
    pub required: u64,
}

/// Outcome of one badge predicate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BadgeEligibility {
    pub badge: BadgeType,
    pub eligible: bool,
    pub reason: String,
    pub progress: Option<BadgeProgress>,
}

// =============================================================================
// Airdrop Eligibility
// =============================================================================

/// How an airdrop's required badges are matched.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BadgeRequirement {
    /// Owning at least one required badge is enough
    #[default]
    Any,
    /// Every required badge must be owned
    All,
}

/// Thresholds an airdrop sets at creation time and never changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EligibilityCriteria {
    pub min_score: u16,
    pub required_badges: BTreeSet<BadgeType>,
    pub badge_requirement: BadgeRequirement,
    /// Minimum endorsement weight in whole-token units
    pub min_endorsement_weight: Decimal,
    pub requires_registration: bool,
}

/// The wallet attributes an airdrop decision is based on.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserAttributes {
    pub is_registered: bool,
    pub score: u16,
    pub owned_badges: BTreeSet<BadgeType>,
    /// Endorsement weight in whole-token units
    pub endorsement_weight: Decimal,
}

/// Airdrop decision plus the attributes it was made from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EligibilityResult {
    pub eligible: bool,
    /// Failure reasons in check order; empty iff eligible
    pub reasons: Vec<String>,
    pub attributes: UserAttributes,
}
