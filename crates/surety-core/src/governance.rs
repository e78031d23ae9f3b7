//! Governance Engine: airline admission and stake tracking.
//!
//! While fewer than `consensus_floor` airlines are registered, one endorsement
//! from a staked airline admits a candidate. From the floor upwards a
//! candidate needs `ceil(n / 2)` distinct endorsements, with `n` re-read from
//! the ledger on every vote.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use surety_types::{AccountId, Amount, SuretyEvent};
use tracing::{debug, info, warn};

use crate::config::SuretyConfig;
use crate::error::SuretyError;
use crate::gate::ensure_operational;
use crate::outbox::EventOutbox;
use crate::store::{AirlineRecord, LedgerStore};

/// Result of an endorsement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationOutcome {
    Registered { endorsements: usize },
    Pending { endorsements: usize, required: usize },
}

impl RegistrationOutcome {
    pub fn is_registered(&self) -> bool {
        matches!(self, RegistrationOutcome::Registered { .. })
    }
}

pub struct GovernanceEngine {
    store: Arc<LedgerStore>,
    outbox: EventOutbox,
    config: Arc<SuretyConfig>,
}

impl GovernanceEngine {
    pub fn new(store: Arc<LedgerStore>, outbox: EventOutbox, config: Arc<SuretyConfig>) -> Self {
        Self {
            store,
            outbox,
            config,
        }
    }

    /// Admit the founder airline, already staked, into an empty registry.
    pub(crate) fn bootstrap_founder(&self, founder: &AccountId) -> Result<(), SuretyError> {
        let stake = self.config.min_stake();
        self.store.transact(|state| {
            if state.is_registered_airline(founder) {
                return Err(SuretyError::AlreadyRegistered(founder.clone()));
            }
            state.admit_airline(founder);
            state.set_stake(founder, stake, true);
            Ok(())
        })?;
        info!(airline = %founder, stake = %stake, "Founder airline registered");
        self.outbox.emit(SuretyEvent::AirlineRegistered {
            airline: founder.clone(),
            endorsements: 0,
        });
        Ok(())
    }

    /// Endorse `candidate` on behalf of `caller`, admitting it once the quorum is met.
    pub fn register_airline(
        &self,
        candidate: &AccountId,
        caller: &AccountId,
    ) -> Result<RegistrationOutcome, SuretyError> {
        let config = &self.config;
        let (outcome, registered) = self
            .store
            .transact(|state| {
                ensure_operational(state)?;
                if !state.is_staked_airline(caller) {
                    return Err(SuretyError::unauthorized(
                        caller,
                        "is not a registered, staked airline",
                    ));
                }
                if state.is_registered_airline(candidate) {
                    return Err(SuretyError::AlreadyRegistered(candidate.clone()));
                }

                let registered = state.registered_airline_count();
                if registered < config.consensus_floor {
                    state.admit_airline(candidate);
                    return Ok((RegistrationOutcome::Registered { endorsements: 1 }, registered));
                }

                let endorsements = state.record_endorsement(candidate, caller)?;
                let required = config.required_endorsements(registered);
                if endorsements >= required {
                    state.admit_airline(candidate);
                    Ok((RegistrationOutcome::Registered { endorsements }, registered))
                } else {
                    Ok((
                        RegistrationOutcome::Pending {
                            endorsements,
                            required,
                        },
                        registered,
                    ))
                }
            })
            .inspect_err(|err| {
                warn!(candidate = %candidate, caller = %caller, error = %err, "Airline registration rejected");
            })?;

        match &outcome {
            RegistrationOutcome::Registered { endorsements } => {
                info!(
                    candidate = %candidate,
                    endorsements,
                    registered_before = registered,
                    "Airline registered"
                );
                if registered >= self.config.consensus_floor {
                    self.outbox.emit(SuretyEvent::AirlineEndorsed {
                        candidate: candidate.clone(),
                        endorser: caller.clone(),
                        endorsements: *endorsements,
                        required: self.config.required_endorsements(registered),
                    });
                }
                self.outbox.emit(SuretyEvent::AirlineRegistered {
                    airline: candidate.clone(),
                    endorsements: *endorsements,
                });
            }
            RegistrationOutcome::Pending {
                endorsements,
                required,
            } => {
                debug!(
                    candidate = %candidate,
                    endorsements,
                    required,
                    "Endorsement recorded"
                );
                self.outbox.emit(SuretyEvent::AirlineEndorsed {
                    candidate: candidate.clone(),
                    endorser: caller.clone(),
                    endorsements: *endorsements,
                    required: *required,
                });
            }
        }
        Ok(outcome)
    }

    /// Add `amount` to a registered airline's stake.
    ///
    /// Each deposit must be at least the minimum stake. Returns the new total.
    pub fn add_stake(&self, airline: &AccountId, amount: Amount) -> Result<Amount, SuretyError> {
        let min_stake = self.config.min_stake();
        let total = self
            .store
            .transact(|state| {
                ensure_operational(state)?;
                let record = state
                    .airline(airline)
                    .filter(|a| a.registered)
                    .ok_or_else(|| SuretyError::unauthorized(airline, "is not a registered airline"))?;
                if amount < min_stake {
                    return Err(SuretyError::InvalidAmount {
                        amount,
                        reason: format!("stake deposits must be at least {min_stake}"),
                    });
                }
                let total = record
                    .stake
                    .checked_add(amount)
                    .ok_or(SuretyError::ArithmeticOverflow("airline stake"))?;
                state.set_stake(airline, total, total >= min_stake);
                Ok(total)
            })
            .inspect_err(|err| {
                warn!(airline = %airline, amount = %amount, error = %err, "Stake rejected");
            })?;

        info!(airline = %airline, amount = %amount, total = %total, "Stake added");
        self.outbox.emit(SuretyEvent::StakeAdded {
            airline: airline.clone(),
            amount,
            total,
        });
        Ok(total)
    }

    pub fn is_registered(&self, airline: &AccountId) -> Result<bool, SuretyError> {
        self.store.read(|state| state.is_registered_airline(airline))
    }

    pub fn has_stakes(&self, airline: &AccountId) -> Result<bool, SuretyError> {
        self.store
            .read(|state| state.airline(airline).is_some_and(|a| a.has_stake))
    }

    pub fn airline(&self, airline: &AccountId) -> Result<Option<AirlineRecord>, SuretyError> {
        self.store.read(|state| state.airline(airline).cloned())
    }

    pub fn registered_airline_count(&self) -> Result<usize, SuretyError> {
        self.store.read(|state| state.registered_airline_count())
    }

    /// Airlines that have endorsed a still-pending candidate.
    pub fn endorsements(&self, candidate: &AccountId) -> Result<BTreeSet<AccountId>, SuretyError> {
        self.store
            .read(|state| state.endorsements(candidate).cloned().unwrap_or_default())
    }
}
