/// Errors from object store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The requested record was not found.
    #[error("{kind} not found: {pk}")]
    NotFound { kind: String, pk: String },

    /// A record with this primary key already exists.
    #[error("{kind} already exists: {pk}")]
    AlreadyExists { kind: String, pk: String },

    /// A record was decoded as a model of a different kind.
    #[error("kind mismatch: expected {expected}, found {found}")]
    KindMismatch { expected: String, found: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A lock guarding store state was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    pub fn not_found(kind: impl Into<String>, pk: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            pk: pk.into(),
        }
    }

    pub fn already_exists(kind: impl Into<String>, pk: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind: kind.into(),
            pk: pk.into(),
        }
    }

    /// Returns `true` for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for [`StoreError::AlreadyExists`].
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
