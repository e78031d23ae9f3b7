//! # surety-core
//!
//! Consensus engines for decentralized flight-delay insurance:
//!
//! - **Ledger Store** ([`LedgerStore`]): airlines, flights, policies, credit
//!   and oracle state behind one lock; every operation is a single
//!   all-or-nothing transaction
//! - **Operational Gate** ([`OperationalGate`]): administrator pause switch
//!   checked by every mutating call
//! - **Governance** ([`GovernanceEngine`]): stake-gated airline admission,
//!   single endorsement below the consensus floor, `ceil(n/2)` above it
//! - **Insurance** ([`InsuranceEngine`]): flights, capped premiums, credit
//!   and checks-effects-interactions withdrawal
//! - **Oracle Consensus** ([`OracleEngine`]): randomized index assignment,
//!   request dispatch, and threshold resolution of flight status
//!
//! Committed mutations are announced on an [`EventStream`] for the oracle
//! bridge; the core never calls out to it.

pub mod config;
pub mod error;
pub mod gate;
pub mod governance;
pub mod insurance;
pub mod oracle;
pub mod outbox;
pub mod store;
pub mod surety;

pub use config::SuretyConfig;
pub use error::{ErrorKind, SuretyError, SuretyResult};
pub use gate::OperationalGate;
pub use governance::{GovernanceEngine, RegistrationOutcome};
pub use insurance::{CreditSummary, InsuranceEngine, RailError, SettlementRail};
pub use oracle::{OracleEngine, ResponseOutcome};
pub use outbox::{EventOutbox, EventStream, DEFAULT_EVENT_CAPACITY};
pub use store::{
    AirlineRecord, FlightRecord, LedgerState, LedgerStore, OracleRecord, OracleRequestRecord,
    PolicyRecord, RequestState,
};
pub use surety::FlightSurety;

// Shared vocabulary, re-exported for downstream consumers.
pub use surety_types as types;
