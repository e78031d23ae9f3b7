//! Simulated oracle network answering FlightSurety status requests.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use surety_core::types::{
    AccountId, EventEnvelope, FlightKey, FlightStatus, OracleIndex, SuretyEvent,
};
use surety_core::{EventStream, FlightSurety, ResponseOutcome, SuretyError};
use tracing::{debug, info, warn};

/// One off-chain oracle with a fixed answer.
#[derive(Debug, Clone)]
pub struct SimulatedOracle {
    pub id: AccountId,
    pub indexes: [OracleIndex; 3],
    pub status: FlightStatus,
}

impl SimulatedOracle {
    pub fn holds(&self, index: OracleIndex) -> bool {
        self.indexes.contains(&index)
    }
}

/// Tally of responses submitted by the bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BridgeStats {
    pub requests: usize,
    pub accepted: usize,
    pub ignored: usize,
    pub rejected: usize,
    pub resolved: Vec<ResolvedFlight>,
}

impl BridgeStats {
    fn absorb(&mut self, other: BridgeStats) {
        self.requests += other.requests;
        self.accepted += other.accepted;
        self.ignored += other.ignored;
        self.rejected += other.rejected;
        self.resolved.extend(other.resolved);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedFlight {
    pub flight: String,
    pub status: FlightStatus,
    pub code: u8,
}

/// Registers simulated oracles and answers every oracle request they are
/// eligible for.
pub struct OracleBridge {
    surety: Arc<FlightSurety>,
    oracles: Vec<SimulatedOracle>,
}

impl OracleBridge {
    /// Register `count` oracles, paying the configured fee for each.
    ///
    /// With `fixed_status` unset each oracle answers a status drawn from `rng`.
    pub fn register(
        surety: Arc<FlightSurety>,
        count: usize,
        fixed_status: Option<FlightStatus>,
        rng: &mut StdRng,
    ) -> Result<Self, SuretyError> {
        let fee = surety.config().registration_fee();
        let mut oracles = Vec::with_capacity(count);
        for _ in 0..count {
            let id = AccountId::generate();
            let indexes = surety.oracles().register_oracle(&id, fee)?;
            let status = fixed_status.unwrap_or_else(|| {
                FlightStatus::ALL[rng.gen_range(0..FlightStatus::ALL.len())]
            });
            debug!(oracle = %id, ?indexes, status = %status, "Simulated oracle ready");
            oracles.push(SimulatedOracle {
                id,
                indexes,
                status,
            });
        }
        info!(count = oracles.len(), "Simulated oracles registered");
        Ok(Self { surety, oracles })
    }

    pub fn oracles(&self) -> &[SimulatedOracle] {
        &self.oracles
    }

    /// Submit the answer of every oracle holding `index`.
    pub fn dispatch(&self, index: OracleIndex, flight: &FlightKey) -> BridgeStats {
        let mut stats = BridgeStats {
            requests: 1,
            ..BridgeStats::default()
        };
        for oracle in self.oracles.iter().filter(|oracle| oracle.holds(index)) {
            let result = self.surety.oracles().submit_oracle_response(
                index,
                flight,
                oracle.status,
                &oracle.id,
            );
            match result {
                Ok(ResponseOutcome::Recorded { matching }) => {
                    debug!(oracle = %oracle.id, status = %oracle.status, matching, "Response accepted");
                    stats.accepted += 1;
                }
                Ok(ResponseOutcome::Resolved { status, credited }) => {
                    info!(
                        flight = %flight,
                        status = %status,
                        credited = credited.as_ref().map_or(0, |summary| summary.policies),
                        "Flight status resolved"
                    );
                    stats.accepted += 1;
                    stats.resolved.push(ResolvedFlight {
                        flight: flight.to_string(),
                        status,
                        code: status.code(),
                    });
                }
                Ok(ResponseOutcome::AlreadyResolved { .. }) => {
                    stats.ignored += 1;
                }
                Err(err) => {
                    warn!(oracle = %oracle.id, error = %err, kind = ?err.kind(), "Response rejected");
                    stats.rejected += 1;
                }
            }
        }
        stats
    }

    fn handle(&self, envelope: &EventEnvelope) -> Option<BridgeStats> {
        match &envelope.event {
            SuretyEvent::OracleRequest { index, flight } => {
                info!(index, flight = %flight, "Oracle request received");
                Some(self.dispatch(*index, flight))
            }
            other => {
                debug!(event = ?other, "Event observed");
                None
            }
        }
    }

    /// Consume events until the stream closes or stays quiet for `idle`.
    pub async fn run(&self, mut stream: EventStream, idle: Duration) -> BridgeStats {
        let mut stats = BridgeStats::default();
        loop {
            match tokio::time::timeout(idle, stream.recv()).await {
                Ok(Some(envelope)) => {
                    if let Some(batch) = self.handle(&envelope) {
                        stats.absorb(batch);
                    }
                }
                Ok(None) => {
                    info!("Event stream closed");
                    break;
                }
                Err(_) => {
                    debug!(idle_ms = idle.as_millis() as u64, "Event stream idle");
                    break;
                }
            }
        }
        stats
    }
}
