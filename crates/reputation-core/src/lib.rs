//! # Reputation Core
//!
//! Scoring and eligibility engine for wallet reputation.
//!
//! Raw signals (endorsements, badges, identity flags, activity counts) are
//! gathered by the caller. This crate turns them into a bounded composite
//! score, classifies the score into a tier, decays endorsement stakes over
//! time, commits scores to opaque hashes for public ledgers, and decides
//! badge and airdrop eligibility. Every operation is a pure, synchronous
//! function of its inputs.

pub mod commitment;
pub mod decay;
pub mod eligibility;
pub mod error;
pub mod models;
pub mod score;
pub mod tier;

pub use commitment::*;
pub use decay::*;
pub use eligibility::*;
pub use error::*;
pub use models::*;
pub use score::*;
pub use tier::*;
