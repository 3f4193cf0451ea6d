use inv_store::StoreError;

/// A boxed error from a provider transport.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors from collectors and the inventory supervisor.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// A provider call failed.
    #[error("{kind} {context} failed: {source}")]
    Transport {
        kind: String,
        context: String,
        #[source]
        source: BoxError,
    },

    /// The store rejected a write or read.
    #[error("{kind} {context}: {source}")]
    Store {
        kind: String,
        context: String,
        #[source]
        source: StoreError,
    },

    /// Configuration could not be loaded or is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CollectError {
    pub fn transport(
        kind: impl Into<String>,
        context: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Transport {
            kind: kind.into(),
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn store(kind: impl Into<String>, context: impl Into<String>, source: StoreError) -> Self {
        Self::Store {
            kind: kind.into(),
            context: context.into(),
            source,
        }
    }

    /// The underlying store error, if any.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Store { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

pub type CollectResult<T> = Result<T, CollectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_names_kind_and_stage() {
        let err = CollectError::store(
            "Cluster",
            "reconcile commit",
            StoreError::already_exists("Cluster", "c-1"),
        );
        let message = err.to_string();
        assert!(message.starts_with("Cluster reconcile commit: "));
        assert!(message.contains("c-1"));
        assert!(err.store_error().is_some_and(StoreError::is_already_exists));
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_transport());
    }

    #[test]
    fn transport_error_keeps_source() {
        let err = CollectError::transport("Host", "list", "connection refused");
        assert_eq!(err.to_string(), "Host list failed: connection refused");
        assert!(err.is_transport());
        assert!(err.store_error().is_none());
    }
}
