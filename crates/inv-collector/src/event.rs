use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A raw provider resource as delivered by a watch.
pub type Object = Arc<dyn Any + Send + Sync>;

/// A change notification from a provider watch.
#[derive(Clone)]
pub enum WatchEvent {
    Created(Object),
    Updated { old: Object, new: Object },
    Deleted(Object),
    /// Anything else the watch reports. Collectors ignore it.
    Generic(Object),
}

impl WatchEvent {
    pub fn created<T: Any + Send + Sync>(object: T) -> Self {
        Self::Created(Arc::new(object))
    }

    pub fn updated<T: Any + Send + Sync>(old: T, new: T) -> Self {
        Self::Updated {
            old: Arc::new(old),
            new: Arc::new(new),
        }
    }

    pub fn deleted<T: Any + Send + Sync>(object: T) -> Self {
        Self::Deleted(Arc::new(object))
    }

    pub fn generic<T: Any + Send + Sync>(object: T) -> Self {
        Self::Generic(Arc::new(object))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Updated { .. } => "updated",
            Self::Deleted(_) => "deleted",
            Self::Generic(_) => "generic",
        }
    }
}

impl fmt::Debug for WatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WatchEvent").field(&self.name()).finish()
    }
}

/// Whether a collector claimed an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventResult {
    /// The event carried this collector's resource type.
    Handled,
    /// Not ours; offer it to the next collector.
    PassThrough,
}

impl EventResult {
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_and_names() {
        assert_eq!(WatchEvent::created(1u8).name(), "created");
        assert_eq!(WatchEvent::updated(1u8, 2u8).name(), "updated");
        assert_eq!(WatchEvent::deleted(1u8).name(), "deleted");
        assert_eq!(format!("{:?}", WatchEvent::generic("x")), "WatchEvent(\"generic\")");
    }

    #[test]
    fn payload_downcasts_to_original_type() {
        let WatchEvent::Updated { new, .. } = WatchEvent::updated(1u32, 2u32) else {
            panic!("expected update");
        };
        assert_eq!(new.downcast_ref::<u32>(), Some(&2));
        assert!(new.downcast_ref::<u64>().is_none());
    }
}
