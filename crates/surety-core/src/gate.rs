//! Operational Gate: the administrator's pause switch.

use std::sync::Arc;

use surety_types::{AccountId, SuretyEvent};
use tracing::{info, warn};

use crate::error::SuretyError;
use crate::outbox::EventOutbox;
use crate::store::{LedgerState, LedgerStore};

/// Fail with [`SuretyError::ContractPaused`] when the gate is closed.
///
/// Every mutating engine operation calls this first inside its transaction.
pub(crate) fn ensure_operational(state: &LedgerState) -> Result<(), SuretyError> {
    if state.is_operational() {
        Ok(())
    } else {
        Err(SuretyError::ContractPaused)
    }
}

pub struct OperationalGate {
    store: Arc<LedgerStore>,
    outbox: EventOutbox,
}

impl OperationalGate {
    pub fn new(store: Arc<LedgerStore>, outbox: EventOutbox) -> Self {
        Self { store, outbox }
    }

    pub fn is_operational(&self) -> Result<bool, SuretyError> {
        self.store.read(LedgerState::is_operational)
    }

    /// Open or close the gate. Only the administrator fixed at construction may do this.
    pub fn set_operating_status(
        &self,
        operational: bool,
        caller: &AccountId,
    ) -> Result<(), SuretyError> {
        let changed = self.store.transact(|state| {
            if state.administrator() != caller {
                warn!(caller = %caller, "Rejected operating status change");
                return Err(SuretyError::unauthorized(caller, "is not the administrator"));
            }
            let changed = state.is_operational() != operational;
            state.set_operational(operational);
            Ok(changed)
        })?;

        if changed {
            info!(operational, "Operating status changed");
            self.outbox
                .emit(SuretyEvent::OperatingStatusChanged { operational });
        }
        Ok(())
    }
}
