//! Oracle Consensus Engine: oracle registration, status requests and
//! majority resolution of flight status.
//!
//! Each request key moves `Open -> Resolved` exactly once. The first status
//! to collect `response_threshold` distinct oracles wins; an airline-caused
//! delay credits the flight's policyholders in the same transaction.

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use surety_types::{AccountId, Amount, FlightKey, FlightStatus, OracleIndex, RequestKey, SuretyEvent};
use tracing::{debug, info, warn};

use crate::config::SuretyConfig;
use crate::error::SuretyError;
use crate::gate::ensure_operational;
use crate::insurance::{credit_insurees, CreditSummary};
use crate::outbox::EventOutbox;
use crate::store::{LedgerStore, OracleRecord, OracleRequestRecord, RequestState};

/// Result of a submitted oracle response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseOutcome {
    /// Counted; the request stays open.
    Recorded { matching: usize },
    /// This response completed consensus.
    Resolved {
        status: FlightStatus,
        credited: Option<CreditSummary>,
    },
    /// The key was already resolved; nothing recorded.
    AlreadyResolved { status: FlightStatus },
}

pub struct OracleEngine {
    store: Arc<LedgerStore>,
    outbox: EventOutbox,
    config: Arc<SuretyConfig>,
    rng: Mutex<StdRng>,
}

impl OracleEngine {
    pub fn new(
        store: Arc<LedgerStore>,
        outbox: EventOutbox,
        config: Arc<SuretyConfig>,
    ) -> Result<Self, SuretyError> {
        Self::with_rng(store, outbox, config, StdRng::from_entropy())
    }

    /// Engine drawing indexes from a caller-supplied generator.
    ///
    /// Fails with [`SuretyError::InvalidConfig`] if `config` does not validate.
    pub fn with_rng(
        store: Arc<LedgerStore>,
        outbox: EventOutbox,
        config: Arc<SuretyConfig>,
        rng: StdRng,
    ) -> Result<Self, SuretyError> {
        config.validate()?;
        Ok(Self {
            store,
            outbox,
            config,
            rng: Mutex::new(rng),
        })
    }

    fn draw_index(&self) -> Result<OracleIndex, SuretyError> {
        let mut rng = self.rng.lock().map_err(|_| SuretyError::LedgerUnavailable)?;
        Ok(rng.gen_range(0..self.config.oracle_index_space))
    }

    /// Three independent draws. Repeats are kept.
    fn draw_indexes(&self) -> Result<[OracleIndex; 3], SuretyError> {
        Ok([self.draw_index()?, self.draw_index()?, self.draw_index()?])
    }

    /// Register `caller` as an oracle for a non-refundable `fee`.
    pub fn register_oracle(
        &self,
        caller: &AccountId,
        fee: Amount,
    ) -> Result<[OracleIndex; 3], SuretyError> {
        let required = self.config.registration_fee();
        let indexes = self.draw_indexes()?;
        self.store
            .transact(|state| {
                ensure_operational(state)?;
                if fee < required {
                    return Err(SuretyError::InsufficientFee {
                        paid: fee,
                        required,
                    });
                }
                state.insert_oracle(
                    caller,
                    OracleRecord {
                        indexes,
                        fee_paid: fee,
                    },
                )
            })
            .inspect_err(|err| {
                warn!(oracle = %caller, error = %err, "Oracle registration rejected");
            })?;

        info!(oracle = %caller, ?indexes, "Oracle registered");
        self.outbox.emit(SuretyEvent::OracleRegistered {
            oracle: caller.clone(),
            indexes,
        });
        Ok(indexes)
    }

    /// Ask the oracles holding a freshly drawn index to report on `flight`.
    ///
    /// An existing record for the drawn key is left as it is; the request
    /// event is emitted again either way.
    pub fn fetch_flight_status(
        &self,
        flight: &FlightKey,
        caller: &AccountId,
    ) -> Result<RequestKey, SuretyError> {
        let key = RequestKey::new(self.draw_index()?, flight.clone());
        let opened = self
            .store
            .transact(|state| {
                ensure_operational(state)?;
                if state.flight(flight).is_none() {
                    return Err(SuretyError::UnknownFlight(flight.clone()));
                }
                Ok(state.open_request(&key, caller))
            })
            .inspect_err(|err| {
                warn!(flight = %flight, caller = %caller, error = %err, "Status fetch rejected");
            })?;

        if opened {
            info!(request = %key, requester = %caller, "Oracle request opened");
        } else {
            debug!(request = %key, "Oracle request already exists; re-announcing");
        }
        self.outbox.emit(SuretyEvent::OracleRequest {
            index: key.index,
            flight: key.flight.clone(),
        });
        Ok(key)
    }

    /// Count `caller`'s report of `status` for the request at `index`.
    pub fn submit_oracle_response(
        &self,
        index: OracleIndex,
        flight: &FlightKey,
        status: FlightStatus,
        caller: &AccountId,
    ) -> Result<ResponseOutcome, SuretyError> {
        let key = RequestKey::new(index, flight.clone());
        let threshold = self.config.response_threshold;
        let ratio = self.config.payout_ratio;

        let outcome = self
            .store
            .transact(|state| {
                ensure_operational(state)?;
                if !state.oracle(caller).is_some_and(|o| o.holds(index)) {
                    return Err(SuretyError::UnassignedIndex {
                        oracle: caller.clone(),
                        index,
                    });
                }
                let request = state
                    .request(&key)
                    .ok_or_else(|| SuretyError::NoSuchRequest(key.clone()))?;
                if let RequestState::Resolved(resolved) = request.state {
                    return Ok(ResponseOutcome::AlreadyResolved { status: resolved });
                }
                if request.has_responded(caller) {
                    return Err(SuretyError::DuplicateResponse {
                        key: key.clone(),
                        oracle: caller.clone(),
                    });
                }
                let matching = request.matching(status) + 1;

                if matching < threshold {
                    record_response(state.request_mut(&key), status, caller, None);
                    return Ok(ResponseOutcome::Recorded { matching });
                }

                // Compute the credit before touching the request so a failure
                // leaves the response unrecorded.
                let credited = if status.is_airline_fault() {
                    Some(credit_insurees(state, flight, ratio)?)
                } else {
                    None
                };
                record_response(
                    state.request_mut(&key),
                    status,
                    caller,
                    Some(RequestState::Resolved(status)),
                );
                state.set_flight_status(flight, status);
                Ok(ResponseOutcome::Resolved { status, credited })
            })
            .inspect_err(|err| {
                warn!(request = %key, oracle = %caller, error = %err, "Oracle response rejected");
            })?;

        match &outcome {
            ResponseOutcome::AlreadyResolved { status } => {
                debug!(request = %key, oracle = %caller, %status, "Response for resolved request ignored");
                return Ok(outcome);
            }
            ResponseOutcome::Recorded { matching } => {
                debug!(request = %key, oracle = %caller, %status, matching, "Oracle response recorded");
            }
            ResponseOutcome::Resolved { .. } => {}
        }

        self.outbox.emit(SuretyEvent::OracleReport {
            index,
            flight: flight.clone(),
            oracle: caller.clone(),
            status,
        });

        if let ResponseOutcome::Resolved { status, credited } = &outcome {
            info!(request = %key, %status, "Flight status resolved");
            self.outbox.emit(SuretyEvent::FlightStatusResolved {
                flight: flight.clone(),
                status: *status,
            });
            if let Some(summary) = credited.as_ref().filter(|s| s.policies > 0) {
                info!(flight = %flight, policies = summary.policies, total = %summary.total, "Insurees credited");
                self.outbox.emit(SuretyEvent::InsureesCredited {
                    flight: flight.clone(),
                    policies: summary.policies,
                    total: summary.total,
                });
            }
        }
        Ok(outcome)
    }

    /// The indexes assigned to `oracle`, if registered.
    pub fn oracle_indexes(&self, oracle: &AccountId) -> Result<Option<[OracleIndex; 3]>, SuretyError> {
        self.store
            .read(|state| state.oracle(oracle).map(|o| o.indexes))
    }

    pub fn is_oracle_registered(&self, oracle: &AccountId) -> Result<bool, SuretyError> {
        self.store.read(|state| state.oracle(oracle).is_some())
    }

    pub fn request(&self, key: &RequestKey) -> Result<Option<OracleRequestRecord>, SuretyError> {
        self.store.read(|state| state.request(key).cloned())
    }
}

fn record_response(
    request: Option<&mut OracleRequestRecord>,
    status: FlightStatus,
    oracle: &AccountId,
    transition: Option<RequestState>,
) {
    if let Some(request) = request {
        request
            .responses
            .entry(status)
            .or_default()
            .insert(oracle.clone());
        if let Some(next) = transition {
            request.state = next;
        }
    }
}
