use surety_types::{AccountId, Amount, FlightKey, OracleIndex, RequestKey};
use thiserror::Error;

/// Errors from the consensus engines.
///
/// Every failed operation leaves the ledger unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SuretyError {
    // --- Authorization ---
    #[error("unauthorized: {caller} {reason}")]
    Unauthorized { caller: AccountId, reason: String },

    #[error("contract is paused")]
    ContractPaused,

    // --- Idempotency ---
    #[error("{endorser} already endorsed {candidate}")]
    DuplicateVote {
        candidate: AccountId,
        endorser: AccountId,
    },

    #[error("flight already registered: {0}")]
    DuplicateFlight(FlightKey),

    #[error("{passenger} already holds a policy for {flight}")]
    DuplicatePolicy {
        flight: FlightKey,
        passenger: AccountId,
    },

    #[error("{oracle} already responded to request {key}")]
    DuplicateResponse { key: RequestKey, oracle: AccountId },

    #[error("already registered: {0}")]
    AlreadyRegistered(AccountId),

    // --- Value constraints ---
    #[error("invalid amount {amount}: {reason}")]
    InvalidAmount { amount: Amount, reason: String },

    #[error("insufficient fee: paid {paid}, required {required}")]
    InsufficientFee { paid: Amount, required: Amount },

    #[error("no credit to withdraw for {0}")]
    InsufficientCredit(AccountId),

    // --- Referential integrity ---
    #[error("unknown flight: {0}")]
    UnknownFlight(FlightKey),

    #[error("no open request for {0}")]
    NoSuchRequest(RequestKey),

    #[error("index {index} is not assigned to oracle {oracle}")]
    UnassignedIndex { oracle: AccountId, index: OracleIndex },

    // --- Ambient ---
    #[error("transfer of {amount} to {passenger} failed: {reason}")]
    TransferFailed {
        passenger: AccountId,
        amount: Amount,
        reason: String,
    },

    #[error("arithmetic overflow computing {0}")]
    ArithmeticOverflow(&'static str),

    #[error("ledger store unavailable: lock poisoned")]
    LedgerUnavailable,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Fieldless view of [`SuretyError`] for matching on the taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    ContractPaused,
    DuplicateVote,
    DuplicateFlight,
    DuplicatePolicy,
    DuplicateResponse,
    AlreadyRegistered,
    InvalidAmount,
    InsufficientFee,
    InsufficientCredit,
    UnknownFlight,
    NoSuchRequest,
    UnassignedIndex,
    TransferFailed,
    ArithmeticOverflow,
    LedgerUnavailable,
    InvalidConfig,
}

impl SuretyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SuretyError::Unauthorized { .. } => ErrorKind::Unauthorized,
            SuretyError::ContractPaused => ErrorKind::ContractPaused,
            SuretyError::DuplicateVote { .. } => ErrorKind::DuplicateVote,
            SuretyError::DuplicateFlight(_) => ErrorKind::DuplicateFlight,
            SuretyError::DuplicatePolicy { .. } => ErrorKind::DuplicatePolicy,
            SuretyError::DuplicateResponse { .. } => ErrorKind::DuplicateResponse,
            SuretyError::AlreadyRegistered(_) => ErrorKind::AlreadyRegistered,
            SuretyError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            SuretyError::InsufficientFee { .. } => ErrorKind::InsufficientFee,
            SuretyError::InsufficientCredit(_) => ErrorKind::InsufficientCredit,
            SuretyError::UnknownFlight(_) => ErrorKind::UnknownFlight,
            SuretyError::NoSuchRequest(_) => ErrorKind::NoSuchRequest,
            SuretyError::UnassignedIndex { .. } => ErrorKind::UnassignedIndex,
            SuretyError::TransferFailed { .. } => ErrorKind::TransferFailed,
            SuretyError::ArithmeticOverflow(_) => ErrorKind::ArithmeticOverflow,
            SuretyError::LedgerUnavailable => ErrorKind::LedgerUnavailable,
            SuretyError::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }

    pub(crate) fn unauthorized(caller: &AccountId, reason: impl Into<String>) -> Self {
        SuretyError::Unauthorized {
            caller: caller.clone(),
            reason: reason.into(),
        }
    }
}

pub type SuretyResult<T> = Result<T, SuretyError>;
