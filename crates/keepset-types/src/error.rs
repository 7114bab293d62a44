use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object id: {0:?}")]
    InvalidObjectId(String),

    #[error("object type must not be empty")]
    EmptyObjectType,

    #[error("unknown object status: {0:?}")]
    UnknownStatus(String),
}
