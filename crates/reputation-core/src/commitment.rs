//! Score commitments
//!
//! A commitment binds a wallet, a score and a per-wallet salt into a single
//! 32-byte hash that can be published in place of the raw score. The salt is
//! never stored: it is re-derived from the wallet address and a versioned tag,
//! so bumping the tag invalidates every commitment issued under the old one.
//!
//! Encoding (SHA-256 throughout):
//! - salt       = H(address[20] || utf8(salt_version))
//! - commitment = H(address[20] || score as 32-byte big-endian || salt[32])
//!
//! [`CommitmentCodec::verify`] is a freshness check against signals the caller
//! supplies, not a zero-knowledge proof. It trusts those signals completely.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ReputationError, ReputationResult};
use crate::models::UserSignals;
use crate::score::calculate_score;

/// Salt tag for commitments issued by this release.
pub const DEFAULT_SALT_VERSION: &str = "reputation-salt-v1";

/// Accepted deviation between a claimed and a live score, in basis points of the live score.
pub const DEFAULT_TOLERANCE_BPS: u32 = 500;

const BPS_DENOMINATOR: u64 = 10_000;

// =============================================================================
// Wire Types
// =============================================================================

/// 20-byte account address, written as `0x` followed by 40 hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress([u8; 20]);

impl WalletAddress {
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl From<[u8; 20]> for WalletAddress {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl FromStr for WalletAddress {
    type Err = ReputationError;

    fn from_str(s: &str) -> ReputationResult<Self> {
        let mut bytes = [0u8; 20];
        decode_prefixed_hex(s, &mut bytes).map_err(ReputationError::InvalidAddress)?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = ReputationError;

    fn try_from(value: String) -> ReputationResult<Self> {
        value.parse()
    }
}

impl From<WalletAddress> for String {
    fn from(address: WalletAddress) -> Self {
        address.to_string()
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// 32-byte commitment hash, written as `0x` followed by 64 hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScoreCommitment([u8; 32]);

impl ScoreCommitment {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for ScoreCommitment {
    type Err = ReputationError;

    fn from_str(s: &str) -> ReputationResult<Self> {
        let mut bytes = [0u8; 32];
        decode_prefixed_hex(s, &mut bytes).map_err(ReputationError::InvalidCommitment)?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for ScoreCommitment {
    type Error = ReputationError;

    fn try_from(value: String) -> ReputationResult<Self> {
        value.parse()
    }
}

impl From<ScoreCommitment> for String {
    fn from(commitment: ScoreCommitment) -> Self {
        commitment.to_string()
    }
}

impl fmt::Display for ScoreCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Decode `0x`-prefixed (or bare) hex into exactly `out.len()` bytes.
fn decode_prefixed_hex(s: &str, out: &mut [u8]) -> Result<(), String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);

    if digits.len() != out.len() * 2 {
        return Err(format!(
            "expected {} hex digits, got {}: {}",
            out.len() * 2,
            digits.len(),
            s
        ));
    }

    hex::decode_to_slice(digits, out).map_err(|e| format!("{}: {}", e, s))
}

// =============================================================================
// Codec
// =============================================================================

/// Derives salts, computes commitments and checks claimed scores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitmentCodec {
    salt_version: String,
    tolerance_bps: u32,
}

impl Default for CommitmentCodec {
    fn default() -> Self {
        Self {
            salt_version: DEFAULT_SALT_VERSION.to_string(),
            tolerance_bps: DEFAULT_TOLERANCE_BPS,
        }
    }
}

impl CommitmentCodec {
    pub fn new(salt_version: impl Into<String>) -> Self {
        Self {
            salt_version: salt_version.into(),
            ..Self::default()
        }
    }

    pub fn with_tolerance_bps(mut self, tolerance_bps: u32) -> Self {
        self.tolerance_bps = tolerance_bps;
        self
    }

    pub fn salt_version(&self) -> &str {
        &self.salt_version
    }

    pub fn tolerance_bps(&self) -> u32 {
        self.tolerance_bps
    }

    /// Deterministic per-wallet salt.
    pub fn derive_salt(&self, address: &WalletAddress) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(address.as_bytes());
        hasher.update(self.salt_version.as_bytes());
        hasher.finalize().into()
    }

    /// Commitment binding `address` to `score`.
    pub fn commit(&self, address: &WalletAddress, score: u16) -> ScoreCommitment {
        let mut encoded_score = [0u8; 32];
        encoded_score[30..].copy_from_slice(&score.to_be_bytes());

        let mut hasher = Sha256::new();
        hasher.update(address.as_bytes());
        hasher.update(encoded_score);
        hasher.update(self.derive_salt(address));
        ScoreCommitment(hasher.finalize().into())
    }

    /// Whether `commitment` is the published hash of `address` and `score`.
    pub fn verify_commitment(
        &self,
        address: &WalletAddress,
        score: u16,
        commitment: &ScoreCommitment,
    ) -> bool {
        self.commit(address, score) == *commitment
    }

    /// Whether `claimed_score` is within tolerance of the score the live signals produce.
    ///
    /// The band is measured against the live score, not the claim. A mismatch
    /// is reported only as `false`.
    pub fn verify(&self, address: &WalletAddress, claimed_score: u32, live_signals: &UserSignals) -> bool {
        let true_score = u64::from(calculate_score(live_signals));
        let deviation = true_score.abs_diff(u64::from(claimed_score));
        let valid = deviation * BPS_DENOMINATOR <= true_score * u64::from(self.tolerance_bps);

        tracing::debug!(wallet = %address, valid, "Verified claimed score");

        valid
    }
}
