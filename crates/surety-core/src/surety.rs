use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use surety_types::AccountId;
use tracing::info;

use crate::config::SuretyConfig;
use crate::error::SuretyError;
use crate::gate::OperationalGate;
use crate::governance::GovernanceEngine;
use crate::insurance::InsuranceEngine;
use crate::oracle::OracleEngine;
use crate::outbox::{EventOutbox, EventStream};
use crate::store::LedgerStore;

/// The assembled system: one ledger shared by the gate and three engines.
///
/// Callers reach operations through the engine accessors, e.g.
/// `surety.governance().register_airline(..)`.
pub struct FlightSurety {
    store: Arc<LedgerStore>,
    config: Arc<SuretyConfig>,
    gate: OperationalGate,
    governance: GovernanceEngine,
    insurance: InsuranceEngine,
    oracles: OracleEngine,
}

impl FlightSurety {
    /// Build the system with `administrator` holding the pause switch and
    /// `founder` as the first, already staked, airline.
    pub fn new(
        config: SuretyConfig,
        administrator: AccountId,
        founder: AccountId,
    ) -> Result<(Self, EventStream), SuretyError> {
        Self::with_rng(config, administrator, founder, StdRng::from_entropy())
    }

    /// As [`FlightSurety::new`], drawing oracle indexes from `rng`.
    pub fn with_rng(
        config: SuretyConfig,
        administrator: AccountId,
        founder: AccountId,
        rng: StdRng,
    ) -> Result<(Self, EventStream), SuretyError> {
        config.validate()?;
        let config = Arc::new(config);
        let store = Arc::new(LedgerStore::new(administrator.clone()));
        let (outbox, stream) = EventOutbox::with_capacity(config.event_capacity);

        let surety = Self {
            gate: OperationalGate::new(store.clone(), outbox.clone()),
            governance: GovernanceEngine::new(store.clone(), outbox.clone(), config.clone()),
            insurance: InsuranceEngine::new(store.clone(), outbox.clone(), config.clone()),
            oracles: OracleEngine::with_rng(store.clone(), outbox, config.clone(), rng)?,
            store,
            config,
        };
        surety.governance.bootstrap_founder(&founder)?;

        info!(administrator = %administrator, founder = %founder, "FlightSurety initialized");
        Ok((surety, stream))
    }

    pub fn config(&self) -> &SuretyConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<LedgerStore> {
        &self.store
    }

    pub fn gate(&self) -> &OperationalGate {
        &self.gate
    }

    pub fn governance(&self) -> &GovernanceEngine {
        &self.governance
    }

    pub fn insurance(&self) -> &InsuranceEngine {
        &self.insurance
    }

    pub fn oracles(&self) -> &OracleEngine {
        &self.oracles
    }
}
