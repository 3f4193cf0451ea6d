use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::BoxError;

/// Lists every resource of one kind from a provider.
#[async_trait]
pub trait Lister<S>: Send + Sync {
    async fn list(&self) -> Result<Vec<S>, BoxError>;
}

/// Serves a fixed resource list. The list may be replaced between passes.
#[derive(Debug, Default)]
pub struct StaticLister<S> {
    items: RwLock<Vec<S>>,
}

impl<S> StaticLister<S> {
    pub fn new(items: Vec<S>) -> Self {
        Self {
            items: RwLock::new(items),
        }
    }

    /// Replace the served list.
    pub fn set(&self, items: Vec<S>) -> Result<(), BoxError> {
        *self.items.write().map_err(|_| "lister lock poisoned")? = items;
        Ok(())
    }
}

#[async_trait]
impl<S: Clone + Send + Sync> Lister<S> for StaticLister<S> {
    async fn list(&self) -> Result<Vec<S>, BoxError> {
        let items = self.items.read().map_err(|_| "lister lock poisoned")?;
        Ok(items.clone())
    }
}
