//! Economic constants for the consensus engines.

use serde::{Deserialize, Serialize};
use surety_types::{Amount, PayoutRatio};

use crate::error::SuretyError;
use crate::outbox::DEFAULT_EVENT_CAPACITY;

/// Minor units in one native unit of the settlement asset (10^18).
pub const DEFAULT_UNIT: u128 = 1_000_000_000_000_000_000;

/// Engine configuration.
///
/// Monetary limits are expressed in whole native units and converted with
/// [`SuretyConfig::unit`] on access.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuretyConfig {
    /// Minor units per native unit.
    pub unit: u128,
    /// Premium cap per policy, in native units.
    pub max_premium_units: u128,
    /// Stake an airline must commit before it may vote or register flights.
    pub min_stake_units: u128,
    /// Non-refundable oracle registration fee, in native units.
    pub oracle_registration_fee_units: u128,
    /// Oracle indexes are drawn from `0..oracle_index_space`.
    pub oracle_index_space: u8,
    /// Matching oracle reports needed to resolve a request.
    pub response_threshold: usize,
    /// Registered-airline count from which admission requires a quorum.
    pub consensus_floor: usize,
    /// Payout owed per unit of premium on an airline-caused delay.
    pub payout_ratio: PayoutRatio,
    /// Events buffered on the outbound stream before new ones are dropped.
    pub event_capacity: usize,
}

impl Default for SuretyConfig {
    fn default() -> Self {
        Self {
            unit: DEFAULT_UNIT,
            max_premium_units: 1,
            min_stake_units: 10,
            oracle_registration_fee_units: 1,
            oracle_index_space: 10,
            response_threshold: 3,
            consensus_floor: 4,
            payout_ratio: PayoutRatio::new(3, 2),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl SuretyConfig {
    /// Same limits with a unit of one minor unit; keeps amounts small in demos and tests.
    pub fn development() -> Self {
        Self {
            unit: 1,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), SuretyError> {
        if self.unit == 0 {
            return Err(SuretyError::InvalidConfig("unit must be non-zero".into()));
        }
        if self.oracle_index_space == 0 {
            return Err(SuretyError::InvalidConfig(
                "oracle_index_space must be non-zero".into(),
            ));
        }
        if self.response_threshold == 0 {
            return Err(SuretyError::InvalidConfig(
                "response_threshold must be non-zero".into(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(SuretyError::InvalidConfig(
                "event_capacity must be non-zero".into(),
            ));
        }
        if self.payout_ratio.denominator == 0 {
            return Err(SuretyError::InvalidConfig(
                "payout_ratio denominator must be non-zero".into(),
            ));
        }
        for (name, units) in [
            ("max_premium_units", self.max_premium_units),
            ("min_stake_units", self.min_stake_units),
            (
                "oracle_registration_fee_units",
                self.oracle_registration_fee_units,
            ),
        ] {
            if Amount::from_units(units, self.unit).is_none() {
                return Err(SuretyError::InvalidConfig(format!(
                    "{name} overflows at unit {}",
                    self.unit
                )));
            }
        }
        Ok(())
    }

    pub fn max_premium(&self) -> Amount {
        self.units(self.max_premium_units)
    }

    pub fn min_stake(&self) -> Amount {
        self.units(self.min_stake_units)
    }

    pub fn registration_fee(&self) -> Amount {
        self.units(self.oracle_registration_fee_units)
    }

    /// Admission threshold for a registered set of `registered` airlines.
    pub fn required_endorsements(&self, registered: usize) -> usize {
        if registered < self.consensus_floor {
            1
        } else {
            registered.div_ceil(2)
        }
    }

    // Validated configs never overflow; saturate otherwise.
    fn units(&self, units: u128) -> Amount {
        Amount::from_units(units, self.unit).unwrap_or(Amount(u128::MAX))
    }
}
