use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::amount::Amount;
use crate::flight::{FlightKey, FlightStatus, OracleIndex};
use crate::ids::AccountId;

/// Outbound notification emitted after a committed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SuretyEvent {
    OperatingStatusChanged {
        operational: bool,
    },
    AirlineRegistered {
        airline: AccountId,
        endorsements: usize,
    },
    AirlineEndorsed {
        candidate: AccountId,
        endorser: AccountId,
        endorsements: usize,
        required: usize,
    },
    StakeAdded {
        airline: AccountId,
        amount: Amount,
        total: Amount,
    },
    FlightRegistered {
        flight: FlightKey,
    },
    InsurancePurchased {
        flight: FlightKey,
        passenger: AccountId,
        premium: Amount,
    },
    InsureesCredited {
        flight: FlightKey,
        policies: usize,
        total: Amount,
    },
    CreditsWithdrawn {
        passenger: AccountId,
        amount: Amount,
    },
    OracleRegistered {
        oracle: AccountId,
        indexes: [OracleIndex; 3],
    },
    /// Asks every oracle holding `index` to report on `flight`.
    OracleRequest {
        index: OracleIndex,
        flight: FlightKey,
    },
    OracleReport {
        index: OracleIndex,
        flight: FlightKey,
        oracle: AccountId,
        status: FlightStatus,
    },
    FlightStatusResolved {
        flight: FlightKey,
        status: FlightStatus,
    },
}

/// An event stamped with a unique id and emission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: Uuid,
    pub emitted_at: DateTime<Utc>,
    pub event: SuretyEvent,
}

impl EventEnvelope {
    pub fn new(event: SuretyEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            emitted_at: Utc::now(),
            event,
        }
    }
}
