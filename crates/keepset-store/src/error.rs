use keepset_types::ObjectId;

/// Errors from row store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An object with this id is already present.
    #[error("duplicate object id: {0}")]
    DuplicateObject(ObjectId),

    /// A row references a parent row that does not exist.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The query cannot be executed as written.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A statement failed inside the backend.
    #[error("statement {statement} failed: {reason}")]
    Statement { statement: String, reason: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock guarding backend state was poisoned.
    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
