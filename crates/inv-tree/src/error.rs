use inv_store::StoreError;

/// Errors produced while building a tree.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Listing the children of a node failed. The whole build is aborted.
    #[error("navigating from {kind} {id}: {source}")]
    Navigation {
        kind: String,
        id: String,
        #[source]
        source: StoreError,
    },

    /// Listing the roots failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A model could not be projected into node content.
    #[error("projection failed: {0}")]
    Projection(String),
}

pub type TreeResult<T> = Result<T, TreeError>;
