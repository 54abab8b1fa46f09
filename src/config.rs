use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Default values for configuration
const DEFAULT_MULTI_CARD_MINIMUM_MINOR: i64 = 1_000; // 10.00 currency units
const DEFAULT_EXACT_MATCH_TARGET_CEILING_MINOR: i64 = 1_000_000; // 10,000.00 units
const DEFAULT_SUBSET_SEARCH_LIMIT: u64 = 1 << 20;
const DEFAULT_CHANGE_COUPON_VALIDITY_DAYS: i64 = 365;
const DEFAULT_CODE_GENERATION_ATTEMPTS: u32 = 8;
const CONFIG_DIR: &str = "config";

/// Settlement configuration.
///
/// All monetary thresholds are integers in minor currency units (cents).
#[derive(Clone, Debug, Deserialize)]
pub struct SettlementConfig {
    /// Minimum per-card contribution when more than one card participates in
    /// a settlement. A single card has no minimum.
    #[serde(default = "default_multi_card_minimum")]
    pub multi_card_minimum_minor: i64,

    /// Largest purchase total for which the exact-match subset-sum table is
    /// built. The table grows linearly with the target in minor units, so
    /// totals above this ceiling fall through to the bounded search.
    #[serde(default = "default_exact_match_ceiling")]
    pub exact_match_target_ceiling_minor: i64,

    /// Maximum number of coupon subsets the minimal-change search examines
    /// before settling for the best surplus found so far.
    #[serde(default = "default_subset_search_limit")]
    pub subset_search_limit: u64,

    /// Validity window for freshly minted change coupons, in days.
    #[serde(default = "default_change_validity_days")]
    pub change_coupon_validity_days: i64,

    /// How many unique-code candidates the change issuer tries before giving
    /// up with an internal error.
    #[serde(default = "default_code_attempts")]
    pub code_generation_attempts: u32,
}

fn default_multi_card_minimum() -> i64 {
    DEFAULT_MULTI_CARD_MINIMUM_MINOR
}

fn default_exact_match_ceiling() -> i64 {
    DEFAULT_EXACT_MATCH_TARGET_CEILING_MINOR
}

fn default_subset_search_limit() -> u64 {
    DEFAULT_SUBSET_SEARCH_LIMIT
}

fn default_change_validity_days() -> i64 {
    DEFAULT_CHANGE_COUPON_VALIDITY_DAYS
}

fn default_code_attempts() -> u32 {
    DEFAULT_CODE_GENERATION_ATTEMPTS
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            multi_card_minimum_minor: default_multi_card_minimum(),
            exact_match_target_ceiling_minor: default_exact_match_ceiling(),
            subset_search_limit: default_subset_search_limit(),
            change_coupon_validity_days: default_change_validity_days(),
            code_generation_attempts: default_code_attempts(),
        }
    }
}

impl SettlementConfig {
    /// Loads configuration from `config/settlement.toml` (when present) with
    /// `SETTLEMENT__`-prefixed environment variables layered on top.
    pub fn load() -> Result<Self, ConfigError> {
        let file_path = Path::new(CONFIG_DIR).join("settlement");

        let cfg = Config::builder()
            .add_source(File::with_name(&file_path.to_string_lossy()).required(false))
            .add_source(Environment::with_prefix("SETTLEMENT").separator("__"))
            .build()?;

        let loaded: Self = cfg.try_deserialize()?;
        info!(
            multi_card_minimum_minor = loaded.multi_card_minimum_minor,
            exact_match_target_ceiling_minor = loaded.exact_match_target_ceiling_minor,
            "settlement configuration loaded"
        );
        Ok(loaded)
    }
}
