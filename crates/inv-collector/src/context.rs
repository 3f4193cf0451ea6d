use std::sync::Arc;

use inv_store::ObjectStore;
use inv_types::{Threshold, ThresholdClock};

/// Shared state handed to every collector of one provider.
///
/// All collectors of a provider write into the same store and draw
/// thresholds from the same clock, so writes from different passes and
/// watch events are totally ordered.
#[derive(Clone)]
pub struct CollectorContext {
    provider: String,
    store: Arc<dyn ObjectStore>,
    clock: Arc<ThresholdClock>,
}

impl CollectorContext {
    pub fn new(provider: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        Self::with_clock(provider, store, Arc::new(ThresholdClock::new()))
    }

    pub fn with_clock(
        provider: impl Into<String>,
        store: Arc<dyn ObjectStore>,
        clock: Arc<ThresholdClock>,
    ) -> Self {
        Self {
            provider: provider.into(),
            store,
            clock,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    pub fn shared_store(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.store)
    }

    pub fn clock(&self) -> &ThresholdClock {
        &self.clock
    }

    /// Issue the next update threshold.
    pub fn tick(&self) -> Threshold {
        self.clock.tick()
    }
}

impl std::fmt::Debug for CollectorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorContext")
            .field("provider", &self.provider)
            .field("threshold", &self.clock.current())
            .finish()
    }
}
