use thiserror::Error;

/// Errors from decoding shared types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("unrecognized flight status code: {0}")]
    InvalidStatusCode(u8),
}
