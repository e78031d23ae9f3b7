//! Ledger Store: durable state for airlines, flights, policies, credits and oracles.
//!
//! The store holds no business rules. Engines run each operation as one
//! [`LedgerStore::transact`] call under the write lock, checking every
//! precondition before the first write so a failed operation leaves the
//! state untouched.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surety_types::{AccountId, Amount, FlightKey, FlightStatus, OracleIndex, RequestKey};

use crate::error::SuretyError;

/// A governance participant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirlineRecord {
    pub registered: bool,
    pub has_stake: bool,
    pub stake: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightRecord {
    pub key: FlightKey,
    pub status: FlightStatus,
    pub registered_at: DateTime<Utc>,
}

/// One passenger's cover on one flight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub passenger: AccountId,
    pub premium: Amount,
    pub payout: Amount,
    pub credited: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleRecord {
    /// Three independent draws; repeats are possible.
    pub indexes: [OracleIndex; 3],
    pub fee_paid: Amount,
}

impl OracleRecord {
    pub fn holds(&self, index: OracleIndex) -> bool {
        self.indexes.contains(&index)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestState {
    Open,
    Resolved(FlightStatus),
}

/// Responses collected for one request key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleRequestRecord {
    pub key: RequestKey,
    pub requester: AccountId,
    pub opened_at: DateTime<Utc>,
    pub state: RequestState,
    pub responses: BTreeMap<FlightStatus, BTreeSet<AccountId>>,
}

impl OracleRequestRecord {
    pub fn new(key: RequestKey, requester: AccountId) -> Self {
        Self {
            key,
            requester,
            opened_at: Utc::now(),
            state: RequestState::Open,
            responses: BTreeMap::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == RequestState::Open
    }

    pub fn has_responded(&self, oracle: &AccountId) -> bool {
        self.responses.values().any(|oracles| oracles.contains(oracle))
    }

    /// Distinct oracles that reported `status`.
    pub fn matching(&self, status: FlightStatus) -> usize {
        self.responses.get(&status).map_or(0, BTreeSet::len)
    }
}

/// Everything the engines read and write.
#[derive(Debug)]
pub struct LedgerState {
    administrator: AccountId,
    operational: bool,
    airlines: HashMap<AccountId, AirlineRecord>,
    registered_airlines: usize,
    endorsements: HashMap<AccountId, BTreeSet<AccountId>>,
    flights: HashMap<FlightKey, FlightRecord>,
    policies: HashMap<FlightKey, BTreeMap<AccountId, PolicyRecord>>,
    credits: HashMap<AccountId, Amount>,
    oracles: HashMap<AccountId, OracleRecord>,
    requests: HashMap<RequestKey, OracleRequestRecord>,
}

impl LedgerState {
    fn new(administrator: AccountId) -> Self {
        Self {
            administrator,
            operational: true,
            airlines: HashMap::new(),
            registered_airlines: 0,
            endorsements: HashMap::new(),
            flights: HashMap::new(),
            policies: HashMap::new(),
            credits: HashMap::new(),
            oracles: HashMap::new(),
            requests: HashMap::new(),
        }
    }

    // --- Operational flag ---

    pub fn administrator(&self) -> &AccountId {
        &self.administrator
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    pub fn set_operational(&mut self, operational: bool) {
        self.operational = operational;
    }

    // --- Airlines ---

    pub fn airline(&self, id: &AccountId) -> Option<&AirlineRecord> {
        self.airlines.get(id)
    }

    pub fn is_registered_airline(&self, id: &AccountId) -> bool {
        self.airline(id).is_some_and(|a| a.registered)
    }

    pub fn is_staked_airline(&self, id: &AccountId) -> bool {
        self.airline(id).is_some_and(|a| a.registered && a.has_stake)
    }

    pub fn registered_airline_count(&self) -> usize {
        self.registered_airlines
    }

    /// Mark `id` registered and consume its vote record.
    pub fn admit_airline(&mut self, id: &AccountId) {
        let record = self.airlines.entry(id.clone()).or_default();
        if !record.registered {
            record.registered = true;
            self.registered_airlines += 1;
        }
        self.endorsements.remove(id);
    }

    /// Replace the stake fields of a registered airline.
    pub fn set_stake(&mut self, id: &AccountId, stake: Amount, has_stake: bool) {
        if let Some(record) = self.airlines.get_mut(id) {
            record.stake = stake;
            record.has_stake = has_stake;
        }
    }

    pub fn endorsements(&self, candidate: &AccountId) -> Option<&BTreeSet<AccountId>> {
        self.endorsements.get(candidate)
    }

    /// Record `endorser` for `candidate`; returns the new endorsement count.
    pub fn record_endorsement(
        &mut self,
        candidate: &AccountId,
        endorser: &AccountId,
    ) -> Result<usize, SuretyError> {
        let voters = self.endorsements.entry(candidate.clone()).or_default();
        if !voters.insert(endorser.clone()) {
            return Err(SuretyError::DuplicateVote {
                candidate: candidate.clone(),
                endorser: endorser.clone(),
            });
        }
        Ok(voters.len())
    }

    // --- Flights and policies ---

    pub fn flight(&self, key: &FlightKey) -> Option<&FlightRecord> {
        self.flights.get(key)
    }

    pub fn insert_flight(&mut self, key: FlightKey) -> Result<(), SuretyError> {
        if self.flights.contains_key(&key) {
            return Err(SuretyError::DuplicateFlight(key));
        }
        let record = FlightRecord {
            key: key.clone(),
            status: FlightStatus::Unknown,
            registered_at: Utc::now(),
        };
        self.flights.insert(key, record);
        Ok(())
    }

    pub fn set_flight_status(&mut self, key: &FlightKey, status: FlightStatus) {
        if let Some(flight) = self.flights.get_mut(key) {
            flight.status = status;
        }
    }

    pub fn policy(&self, flight: &FlightKey, passenger: &AccountId) -> Option<&PolicyRecord> {
        self.policies.get(flight).and_then(|p| p.get(passenger))
    }

    pub fn policies(&self, flight: &FlightKey) -> impl Iterator<Item = &PolicyRecord> {
        self.policies.get(flight).into_iter().flat_map(|p| p.values())
    }

    pub fn insert_policy(
        &mut self,
        flight: &FlightKey,
        passenger: &AccountId,
        premium: Amount,
    ) -> Result<(), SuretyError> {
        let by_passenger = self.policies.entry(flight.clone()).or_default();
        if by_passenger.contains_key(passenger) {
            return Err(SuretyError::DuplicatePolicy {
                flight: flight.clone(),
                passenger: passenger.clone(),
            });
        }
        by_passenger.insert(
            passenger.clone(),
            PolicyRecord {
                passenger: passenger.clone(),
                premium,
                payout: Amount::ZERO,
                credited: false,
            },
        );
        Ok(())
    }

    /// Record the payout on a policy and flag it credited.
    pub fn mark_credited(&mut self, flight: &FlightKey, passenger: &AccountId, payout: Amount) {
        if let Some(policy) = self
            .policies
            .get_mut(flight)
            .and_then(|p| p.get_mut(passenger))
        {
            policy.payout = payout;
            policy.credited = true;
        }
    }

    // --- Passenger credit ---

    pub fn credit(&self, passenger: &AccountId) -> Amount {
        self.credits.get(passenger).copied().unwrap_or_default()
    }

    pub fn set_credit(&mut self, passenger: &AccountId, balance: Amount) {
        if balance.is_zero() {
            self.credits.remove(passenger);
        } else {
            self.credits.insert(passenger.clone(), balance);
        }
    }

    // --- Oracles ---

    pub fn oracle(&self, id: &AccountId) -> Option<&OracleRecord> {
        self.oracles.get(id)
    }

    pub fn insert_oracle(&mut self, id: &AccountId, record: OracleRecord) -> Result<(), SuretyError> {
        if self.oracles.contains_key(id) {
            return Err(SuretyError::AlreadyRegistered(id.clone()));
        }
        self.oracles.insert(id.clone(), record);
        Ok(())
    }

    pub fn request(&self, key: &RequestKey) -> Option<&OracleRequestRecord> {
        self.requests.get(key)
    }

    pub fn request_mut(&mut self, key: &RequestKey) -> Option<&mut OracleRequestRecord> {
        self.requests.get_mut(key)
    }

    /// Open a request unless one already exists for `key`. Returns `true` if opened.
    pub fn open_request(&mut self, key: &RequestKey, requester: &AccountId) -> bool {
        if self.requests.contains_key(key) {
            return false;
        }
        self.requests.insert(
            key.clone(),
            OracleRequestRecord::new(key.clone(), requester.clone()),
        );
        true
    }
}

/// Shared handle to the ledger state.
///
/// Created once per process and passed to every engine.
#[derive(Debug)]
pub struct LedgerStore {
    inner: RwLock<LedgerState>,
}

impl LedgerStore {
    pub fn new(administrator: AccountId) -> Self {
        Self {
            inner: RwLock::new(LedgerState::new(administrator)),
        }
    }

    /// Run a read-only query.
    pub fn read<T>(&self, query: impl FnOnce(&LedgerState) -> T) -> Result<T, SuretyError> {
        let state = self.inner.read().map_err(|_| SuretyError::LedgerUnavailable)?;
        Ok(query(&state))
    }

    /// Run one serialized transaction under the write lock.
    ///
    /// The closure must check all preconditions before writing.
    pub fn transact<T>(
        &self,
        operation: impl FnOnce(&mut LedgerState) -> Result<T, SuretyError>,
    ) -> Result<T, SuretyError> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| SuretyError::LedgerUnavailable)?;
        operation(&mut state)
    }
}
