use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypesError;
use crate::ids::AccountId;

/// Index an oracle is assigned and a request is addressed to.
pub type OracleIndex = u8;

/// Identity of a flight: (airline, designator, departure timestamp).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlightKey {
    pub airline: AccountId,
    /// Flight designator, e.g. "ND1309".
    pub designator: String,
    /// Scheduled departure, unix seconds.
    pub departure: u64,
}

impl FlightKey {
    pub fn new(airline: AccountId, designator: impl Into<String>, departure: u64) -> Self {
        Self {
            airline,
            designator: designator.into(),
            departure,
        }
    }
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.airline, self.designator, self.departure)
    }
}

/// Identity of an oracle request: the flight plus the index it was sent to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    pub index: OracleIndex,
    pub flight: FlightKey,
}

impl RequestKey {
    pub fn new(index: OracleIndex, flight: FlightKey) -> Self {
        Self { index, flight }
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.index, self.flight)
    }
}

/// Flight status as reported by oracles.
///
/// Discriminants are the wire codes oracles submit.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum FlightStatus {
    #[default]
    Unknown,
    OnTime,
    LateAirline,
    LateWeather,
    LateTechnical,
    LateOther,
}

impl FlightStatus {
    pub const ALL: [FlightStatus; 6] = [
        FlightStatus::Unknown,
        FlightStatus::OnTime,
        FlightStatus::LateAirline,
        FlightStatus::LateWeather,
        FlightStatus::LateTechnical,
        FlightStatus::LateOther,
    ];

    pub fn code(self) -> u8 {
        match self {
            FlightStatus::Unknown => 0,
            FlightStatus::OnTime => 10,
            FlightStatus::LateAirline => 20,
            FlightStatus::LateWeather => 30,
            FlightStatus::LateTechnical => 40,
            FlightStatus::LateOther => 50,
        }
    }

    /// Delays the airline is liable for. Only these trigger payouts.
    pub fn is_airline_fault(self) -> bool {
        self == FlightStatus::LateAirline
    }
}

impl TryFrom<u8> for FlightStatus {
    type Error = TypesError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        FlightStatus::ALL
            .into_iter()
            .find(|status| status.code() == code)
            .ok_or(TypesError::InvalidStatusCode(code))
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlightStatus::Unknown => "unknown",
            FlightStatus::OnTime => "on-time",
            FlightStatus::LateAirline => "late-airline",
            FlightStatus::LateWeather => "late-weather",
            FlightStatus::LateTechnical => "late-technical",
            FlightStatus::LateOther => "late-other",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_decode() {
        for status in FlightStatus::ALL {
            assert_eq!(FlightStatus::try_from(status.code()), Ok(status));
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert_eq!(
            FlightStatus::try_from(25),
            Err(TypesError::InvalidStatusCode(25))
        );
    }

    #[test]
    fn only_airline_delay_is_airline_fault() {
        let faults: Vec<_> = FlightStatus::ALL
            .into_iter()
            .filter(|s| s.is_airline_fault())
            .collect();
        assert_eq!(faults, vec![FlightStatus::LateAirline]);
    }

    #[test]
    fn flight_key_display() {
        let key = FlightKey::new(AccountId::new("a1"), "ND1309", 1_700_000_000);
        assert_eq!(key.to_string(), "a1/ND1309@1700000000");
        assert_eq!(RequestKey::new(4, key).to_string(), "#4:a1/ND1309@1700000000");
    }
}
