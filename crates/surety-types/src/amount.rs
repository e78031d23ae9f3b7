use std::fmt;

use serde::{Deserialize, Serialize};

/// Value in the smallest indivisible unit of the settlement asset.
///
/// Only integer arithmetic is performed on amounts. All combinators are
/// checked; callers decide how an overflow is surfaced.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Amount(pub u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn new(minor: u128) -> Self {
        Self(minor)
    }

    /// `units` whole native units, where one unit is `unit` minor units.
    pub fn from_units(units: u128, unit: u128) -> Option<Self> {
        units.checked_mul(unit).map(Self)
    }

    pub fn minor(self) -> u128 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// `self * ratio.numerator / ratio.denominator`, rounding toward zero.
    ///
    /// Returns `None` on overflow or a zero denominator.
    pub fn scale(self, ratio: PayoutRatio) -> Option<Amount> {
        if ratio.denominator == 0 {
            return None;
        }
        self.0
            .checked_mul(ratio.numerator)
            .map(|scaled| Amount(scaled / ratio.denominator))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payout as a fraction of the premium paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRatio {
    pub numerator: u128,
    pub denominator: u128,
}

impl PayoutRatio {
    pub fn new(numerator: u128, denominator: u128) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
}

impl Default for PayoutRatio {
    fn default() -> Self {
        Self::new(3, 2)
    }
}
