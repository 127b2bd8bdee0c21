use chrono::{DateTime, Utc};
use config::{Config, ConfigError, Environment, File};
use reputation_core::{
    CommitmentCodec, EarlyAdopterPolicy, DEFAULT_EARLY_ADOPTER_WINDOW_DAYS, DEFAULT_SALT_VERSION,
    DEFAULT_TOLERANCE_BPS,
};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub commitment: CommitmentConfig,
    pub eligibility: EligibilityConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CommitmentConfig {
    /// Salt tag; changing it invalidates every previously issued commitment
    pub salt_version: String,
    /// Verification tolerance in basis points of the live score
    pub tolerance_bps: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EligibilityConfig {
    /// Rolling window used when no fixed cutoff is configured
    pub early_adopter_window_days: u32,
    /// Fixed early adopter cutoff (RFC 3339)
    #[serde(default)]
    pub early_adopter_cutoff: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    /// Requests allowed per key per window
    pub max_requests: u32,
    /// Window length in seconds
    pub window_seconds: u64,
    /// Maximum number of keys tracked at once
    pub max_tracked_keys: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window_seconds: 60,
            max_tracked_keys: 10_000,
        }
    }
}

impl CommitmentConfig {
    pub fn codec(&self) -> CommitmentCodec {
        CommitmentCodec::new(self.salt_version.clone()).with_tolerance_bps(self.tolerance_bps)
    }
}

impl EligibilityConfig {
    pub fn early_adopter_policy(&self) -> EarlyAdopterPolicy {
        match self.early_adopter_cutoff {
            Some(at) => EarlyAdopterPolicy::FixedCutoff(at),
            None => EarlyAdopterPolicy::RollingWindow {
                days: self.early_adopter_window_days,
            },
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Commitment defaults
            .set_default("commitment.salt_version", DEFAULT_SALT_VERSION)?
            .set_default("commitment.tolerance_bps", i64::from(DEFAULT_TOLERANCE_BPS))?
            // Eligibility defaults
            .set_default(
                "eligibility.early_adopter_window_days",
                i64::from(DEFAULT_EARLY_ADOPTER_WINDOW_DAYS),
            )?
            // Rate limit defaults
            .set_default("rate_limit.max_requests", 30)?
            .set_default("rate_limit.window_seconds", 60)?
            .set_default("rate_limit.max_tracked_keys", 10_000)?
            // Load from config files if they exist
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables
            // REPUTATION__COMMITMENT__SALT_VERSION, etc.
            .add_source(
                Environment::with_prefix("REPUTATION")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_defaults_load() {
        let config = AppConfig::load().unwrap();
        assert_eq!(config.commitment.salt_version, DEFAULT_SALT_VERSION);
        assert_eq!(config.commitment.tolerance_bps, DEFAULT_TOLERANCE_BPS);
        assert_eq!(config.rate_limit.max_requests, RateLimitConfig::default().max_requests);
        assert_eq!(
            config.eligibility.early_adopter_policy(),
            EarlyAdopterPolicy::RollingWindow { days: 30 }
        );
    }

    #[test]
    fn test_fixed_cutoff_policy() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let eligibility = EligibilityConfig {
            early_adopter_window_days: 30,
            early_adopter_cutoff: Some(at),
        };
        assert_eq!(eligibility.early_adopter_policy(), EarlyAdopterPolicy::FixedCutoff(at));
    }

    #[test]
    fn test_window_days_outside_u32_are_rejected() {
        for days in [-5_i64, 1_i64 << 40] {
            let result = Config::builder()
                .set_override("early_adopter_window_days", days)
                .and_then(|builder| builder.build())
                .and_then(|config| config.try_deserialize::<EligibilityConfig>());
            assert!(result.is_err(), "window of {} days was accepted", days);
        }
    }

    #[test]
    fn test_codec_uses_configured_version() {
        let commitment = CommitmentConfig {
            salt_version: "reputation-salt-v9".to_string(),
            tolerance_bps: 100,
        };
        let codec = commitment.codec();
        assert_eq!(codec.salt_version(), "reputation-salt-v9");
        assert_eq!(codec.tolerance_bps(), 100);
    }
}
