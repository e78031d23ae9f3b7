//! Configuration for surety-bridge

use serde::{Deserialize, Serialize};
use surety_core::types::PayoutRatio;
use surety_core::SuretyConfig;

/// Main bridge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Economic constants handed to the engines
    #[serde(default)]
    pub economics: EconomicsConfig,

    /// Simulated oracle population
    #[serde(default)]
    pub oracles: OracleSimConfig,

    /// Demo scenario driven after start-up
    #[serde(default)]
    pub demo: DemoConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// File-facing view of [`SuretyConfig`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomicsConfig {
    /// Minor units per native unit
    #[serde(default = "default_unit")]
    pub unit: u64,

    #[serde(default = "default_max_premium_units")]
    pub max_premium_units: u64,

    #[serde(default = "default_min_stake_units")]
    pub min_stake_units: u64,

    #[serde(default = "default_registration_fee_units")]
    pub oracle_registration_fee_units: u64,

    #[serde(default = "default_index_space")]
    pub oracle_index_space: u8,

    #[serde(default = "default_response_threshold")]
    pub response_threshold: usize,

    #[serde(default = "default_consensus_floor")]
    pub consensus_floor: usize,

    #[serde(default = "default_payout_numerator")]
    pub payout_numerator: u64,

    #[serde(default = "default_payout_denominator")]
    pub payout_denominator: u64,
}

impl Default for EconomicsConfig {
    fn default() -> Self {
        Self {
            unit: default_unit(),
            max_premium_units: default_max_premium_units(),
            min_stake_units: default_min_stake_units(),
            oracle_registration_fee_units: default_registration_fee_units(),
            oracle_index_space: default_index_space(),
            response_threshold: default_response_threshold(),
            consensus_floor: default_consensus_floor(),
            payout_numerator: default_payout_numerator(),
            payout_denominator: default_payout_denominator(),
        }
    }
}

impl EconomicsConfig {
    pub fn to_surety_config(&self) -> SuretyConfig {
        SuretyConfig {
            unit: u128::from(self.unit),
            max_premium_units: u128::from(self.max_premium_units),
            min_stake_units: u128::from(self.min_stake_units),
            oracle_registration_fee_units: u128::from(self.oracle_registration_fee_units),
            oracle_index_space: self.oracle_index_space,
            response_threshold: self.response_threshold,
            consensus_floor: self.consensus_floor,
            payout_ratio: PayoutRatio::new(
                u128::from(self.payout_numerator),
                u128::from(self.payout_denominator),
            ),
            ..SuretyConfig::default()
        }
    }
}

/// Simulated oracle population
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleSimConfig {
    /// Number of oracles to register
    #[serde(default = "default_oracle_count")]
    pub count: usize,

    /// Seed for index assignment and answers (random when unset)
    #[serde(default)]
    pub seed: Option<u64>,

    /// Status code every oracle reports; each oracle picks one at random when unset
    #[serde(default)]
    pub fixed_status: Option<u8>,

    /// Stop once no event has arrived for this long
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

impl Default for OracleSimConfig {
    fn default() -> Self {
        Self {
            count: default_oracle_count(),
            seed: None,
            fixed_status: None,
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

/// Demo scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Flight designator registered by the founder airline
    #[serde(default = "default_flight")]
    pub flight: String,

    /// Departure, unix seconds
    #[serde(default = "default_departure")]
    pub departure: u64,

    /// Premium each passenger pays, in minor units
    #[serde(default = "default_premium")]
    pub premium: u64,

    /// Number of insured passengers
    #[serde(default = "default_passengers")]
    pub passengers: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            flight: default_flight(),
            departure: default_departure(),
            premium: default_premium(),
            passengers: default_passengers(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_unit() -> u64 {
    1_000_000_000
}

fn default_max_premium_units() -> u64 {
    1
}

fn default_min_stake_units() -> u64 {
    10
}

fn default_registration_fee_units() -> u64 {
    1
}

fn default_index_space() -> u8 {
    10
}

fn default_response_threshold() -> usize {
    3
}

fn default_consensus_floor() -> usize {
    4
}

fn default_payout_numerator() -> u64 {
    3
}

fn default_payout_denominator() -> u64 {
    2
}

fn default_oracle_count() -> usize {
    20
}

fn default_idle_timeout_ms() -> u64 {
    250
}

fn default_flight() -> String {
    "ND1309".to_string()
}

fn default_departure() -> u64 {
    1_700_000_000
}

fn default_premium() -> u64 {
    1_000_000_000
}

fn default_passengers() -> usize {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

impl BridgeConfig {
    /// Load configuration from an optional file, then `SURETY_`-prefixed environment variables
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // e.g. SURETY_ORACLES__COUNT=40
        builder = builder.add_source(
            config::Environment::with_prefix("SURETY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
