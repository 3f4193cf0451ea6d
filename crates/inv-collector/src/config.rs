use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use inv_store::DEFAULT_TOMBSTONE_LIMIT;
use serde::{Deserialize, Serialize};

use crate::error::{CollectError, CollectResult};

/// Configuration for one provider's inventory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Provider name, used in logs and self links.
    pub provider: String,
    /// Seconds between full reconcile passes. `None` reconciles once.
    pub resync_secs: Option<u64>,
    /// Retry policy for failed passes.
    pub backoff: BackoffConfig,
    /// Capacity of the watch event channel.
    pub event_capacity: usize,
    /// Delete tombstones kept per kind between reconcile passes.
    pub tombstone_limit: usize,
    pub tree: TreeConfig,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            provider: "default".into(),
            resync_secs: None,
            backoff: BackoffConfig::default(),
            event_capacity: 1024,
            tombstone_limit: DEFAULT_TOMBSTONE_LIMIT,
            tree: TreeConfig::default(),
        }
    }
}

impl InventoryConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> CollectResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CollectError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> CollectResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| CollectError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CollectResult<()> {
        if self.provider.is_empty() {
            return Err(CollectError::Config("provider name is empty".into()));
        }
        if self.event_capacity == 0 {
            return Err(CollectError::Config("event_capacity must be positive".into()));
        }
        if self.resync_secs == Some(0) {
            return Err(CollectError::Config("resync_secs must be positive".into()));
        }
        self.backoff.validate()
    }

    pub fn resync(&self) -> Option<Duration> {
        self.resync_secs.map(Duration::from_secs)
    }
}

/// Exponential retry backoff.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub initial_ms: u64,
    pub max_ms: u64,
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_ms: 500,
            max_ms: 60_000,
            multiplier: 2.0,
        }
    }
}

impl BackoffConfig {
    pub fn initial(&self) -> Duration {
        Duration::from_millis(self.initial_ms)
    }

    /// The delay following `current`, capped at `max_ms`.
    pub fn next(&self, current: Duration) -> Duration {
        let next = current.as_millis() as f64 * self.multiplier;
        Duration::from_millis((next as u64).min(self.max_ms))
    }

    fn validate(&self) -> CollectResult<()> {
        if self.multiplier < 1.0 {
            return Err(CollectError::Config("backoff multiplier must be >= 1".into()));
        }
        if self.initial_ms > self.max_ms {
            return Err(CollectError::Config("backoff initial_ms exceeds max_ms".into()));
        }
        Ok(())
    }
}

/// Tree rendering defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Full content for these kinds; unlisted kinds render as summaries.
    pub detail: BTreeMap<String, bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let c = InventoryConfig::default();
        assert_eq!(c.provider, "default");
        assert!(c.resync().is_none());
        assert_eq!(c.event_capacity, 1024);
        assert_eq!(c.tombstone_limit, DEFAULT_TOMBSTONE_LIMIT);
        assert_eq!(c.backoff.initial(), Duration::from_millis(500));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c = InventoryConfig::from_toml(
            r#"
            provider = "ovirt-prod"
            resync_secs = 300
            tombstone_limit = 64

            [tree.detail]
            Host = true
            "#,
        )
        .unwrap();
        assert_eq!(c.provider, "ovirt-prod");
        assert_eq!(c.resync(), Some(Duration::from_secs(300)));
        assert_eq!(c.tombstone_limit, 64);
        assert_eq!(c.tree.detail.get("Host"), Some(&true));
        assert_eq!(c.backoff, BackoffConfig::default());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "provider = \"vsphere-lab\"\n[backoff]\ninitial_ms = 10\nmax_ms = 40").unwrap();
        let c = InventoryConfig::load(file.path()).unwrap();
        assert_eq!(c.provider, "vsphere-lab");
        assert_eq!(c.backoff.initial_ms, 10);
        assert_eq!(c.backoff.multiplier, 2.0);
    }

    #[test]
    fn missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = InventoryConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, CollectError::Config(_)));
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(InventoryConfig::from_toml("provider = \"\"").is_err());
        assert!(InventoryConfig::from_toml("event_capacity = 0").is_err());
        assert!(InventoryConfig::from_toml("[backoff]\nmultiplier = 0.5").is_err());
        assert!(InventoryConfig::from_toml("resync_secs = \"soon\"").is_err());
    }

    #[test]
    fn backoff_grows_and_caps() {
        let b = BackoffConfig {
            initial_ms: 100,
            max_ms: 350,
            multiplier: 2.0,
        };
        let d1 = b.next(b.initial());
        assert_eq!(d1, Duration::from_millis(200));
        assert_eq!(b.next(d1), Duration::from_millis(350));
    }
}
