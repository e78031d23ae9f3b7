//! Insurance Engine: flights, policies, passenger credit and withdrawal.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use surety_types::{AccountId, Amount, FlightKey, PayoutRatio, SuretyEvent};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SuretyConfig;
use crate::error::SuretyError;
use crate::gate::ensure_operational;
use crate::outbox::EventOutbox;
use crate::store::{FlightRecord, LedgerState, LedgerStore, PolicyRecord};

/// Refusal from the external value rail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct RailError(pub String);

/// External account transfer used by withdrawals.
///
/// Called after the ledger lock is released, so an implementation may call
/// back into the engines.
pub trait SettlementRail: Send + Sync {
    fn transfer(&self, to: &AccountId, amount: Amount) -> Result<(), RailError>;
}

/// Policies credited by one `credit_insurees` application.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditSummary {
    pub policies: usize,
    pub total: Amount,
}

/// Credit every not-yet-credited policy on `flight` with `premium * ratio`.
///
/// Runs inside the oracle engine's resolving transaction. All payouts and
/// balances are computed before the first write, so the flight is credited
/// in full or not at all.
pub(crate) fn credit_insurees(
    state: &mut LedgerState,
    flight: &FlightKey,
    ratio: PayoutRatio,
) -> Result<CreditSummary, SuretyError> {
    if state.flight(flight).is_none() {
        return Err(SuretyError::UnknownFlight(flight.clone()));
    }

    let mut pending: Vec<(AccountId, Amount, Amount)> = Vec::new();
    let mut total = Amount::ZERO;
    for policy in state.policies(flight).filter(|p| !p.credited) {
        let payout = policy
            .premium
            .scale(ratio)
            .ok_or(SuretyError::ArithmeticOverflow("policy payout"))?;
        let balance = state
            .credit(&policy.passenger)
            .checked_add(payout)
            .ok_or(SuretyError::ArithmeticOverflow("passenger credit"))?;
        total = total
            .checked_add(payout)
            .ok_or(SuretyError::ArithmeticOverflow("flight payout total"))?;
        pending.push((policy.passenger.clone(), payout, balance));
    }

    for (passenger, payout, balance) in &pending {
        state.mark_credited(flight, passenger, *payout);
        state.set_credit(passenger, *balance);
    }

    Ok(CreditSummary {
        policies: pending.len(),
        total,
    })
}

pub struct InsuranceEngine {
    store: Arc<LedgerStore>,
    outbox: EventOutbox,
    config: Arc<SuretyConfig>,
}

impl InsuranceEngine {
    pub fn new(store: Arc<LedgerStore>, outbox: EventOutbox, config: Arc<SuretyConfig>) -> Self {
        Self {
            store,
            outbox,
            config,
        }
    }

    /// Register a flight owned by `airline`. Only the staked airline itself may call this.
    pub fn register_flight(
        &self,
        airline: &AccountId,
        designator: &str,
        departure: u64,
        caller: &AccountId,
    ) -> Result<FlightKey, SuretyError> {
        let key = FlightKey::new(airline.clone(), designator, departure);
        self.store
            .transact(|state| {
                ensure_operational(state)?;
                if caller != airline {
                    return Err(SuretyError::unauthorized(
                        caller,
                        format!("cannot register flights for {airline}"),
                    ));
                }
                if !state.is_staked_airline(airline) {
                    return Err(SuretyError::unauthorized(
                        caller,
                        "is not a registered, staked airline",
                    ));
                }
                state.insert_flight(key.clone())
            })
            .inspect_err(|err| {
                warn!(flight = %key, caller = %caller, error = %err, "Flight registration rejected");
            })?;

        info!(flight = %key, "Flight registered");
        self.outbox
            .emit(SuretyEvent::FlightRegistered { flight: key.clone() });
        Ok(key)
    }

    pub fn buy_insurance(
        &self,
        flight: &FlightKey,
        passenger: &AccountId,
        paid: Amount,
    ) -> Result<(), SuretyError> {
        let cap = self.config.max_premium();
        self.store
            .transact(|state| {
                ensure_operational(state)?;
                if paid.is_zero() {
                    return Err(SuretyError::InvalidAmount {
                        amount: paid,
                        reason: "premium must be positive".into(),
                    });
                }
                if paid > cap {
                    return Err(SuretyError::InvalidAmount {
                        amount: paid,
                        reason: format!("premium exceeds cap of {cap}"),
                    });
                }
                if state.flight(flight).is_none() {
                    return Err(SuretyError::UnknownFlight(flight.clone()));
                }
                state.insert_policy(flight, passenger, paid)
            })
            .inspect_err(|err| {
                warn!(flight = %flight, passenger = %passenger, error = %err, "Insurance purchase rejected");
            })?;

        info!(flight = %flight, passenger = %passenger, premium = %paid, "Insurance purchased");
        self.outbox.emit(SuretyEvent::InsurancePurchased {
            flight: flight.clone(),
            passenger: passenger.clone(),
            premium: paid,
        });
        Ok(())
    }

    /// Pay out a passenger's whole credit balance through `rail`.
    ///
    /// The balance is zeroed before the transfer; if the rail refuses, the
    /// amount is credited back and [`SuretyError::TransferFailed`] returned.
    pub fn withdraw_credits(
        &self,
        passenger: &AccountId,
        rail: &dyn SettlementRail,
    ) -> Result<Amount, SuretyError> {
        let amount = self
            .store
            .transact(|state| {
                ensure_operational(state)?;
                let balance = state.credit(passenger);
                if balance.is_zero() {
                    return Err(SuretyError::InsufficientCredit(passenger.clone()));
                }
                state.set_credit(passenger, Amount::ZERO);
                Ok(balance)
            })
            .inspect_err(|err| {
                warn!(passenger = %passenger, error = %err, "Withdrawal rejected");
            })?;

        debug!(passenger = %passenger, amount = %amount, "Balance cleared; transferring");
        if let Err(rail_err) = rail.transfer(passenger, amount) {
            warn!(passenger = %passenger, amount = %amount, error = %rail_err, "Transfer failed; restoring credit");
            self.store.transact(|state| {
                let restored = state
                    .credit(passenger)
                    .checked_add(amount)
                    .ok_or(SuretyError::ArithmeticOverflow("restored credit"))?;
                state.set_credit(passenger, restored);
                Ok(())
            })?;
            return Err(SuretyError::TransferFailed {
                passenger: passenger.clone(),
                amount,
                reason: rail_err.0,
            });
        }

        info!(passenger = %passenger, amount = %amount, "Credits withdrawn");
        self.outbox.emit(SuretyEvent::CreditsWithdrawn {
            passenger: passenger.clone(),
            amount,
        });
        Ok(amount)
    }

    pub fn flight(&self, key: &FlightKey) -> Result<Option<FlightRecord>, SuretyError> {
        self.store.read(|state| state.flight(key).cloned())
    }

    pub fn policy(
        &self,
        flight: &FlightKey,
        passenger: &AccountId,
    ) -> Result<Option<PolicyRecord>, SuretyError> {
        self.store
            .read(|state| state.policy(flight, passenger).cloned())
    }

    pub fn credit_balance(&self, passenger: &AccountId) -> Result<Amount, SuretyError> {
        self.store.read(|state| state.credit(passenger))
    }
}
