//! Shared vocabulary for the FlightSurety consensus engines.
//!
//! This crate carries no behaviour beyond conversions. It defines:
//! - opaque caller identities ([`AccountId`])
//! - value in the smallest indivisible unit ([`Amount`])
//! - flight and oracle-request keys ([`FlightKey`], [`RequestKey`])
//! - the oracle status-code table ([`FlightStatus`])
//! - outbound event payloads ([`SuretyEvent`], [`EventEnvelope`])

pub mod amount;
pub mod error;
pub mod event;
pub mod flight;
pub mod ids;

pub use amount::{Amount, PayoutRatio};
pub use error::TypesError;
pub use event::{EventEnvelope, SuretyEvent};
pub use flight::{FlightKey, FlightStatus, OracleIndex, RequestKey};
pub use ids::AccountId;
