//! Foundation types for the inventory engine.
//!
//! Every other inventory crate depends on `inv-types`.
//!
//! # Key Types
//!
//! - [`Threshold`]: Monotonic write marker used to suppress stale overwrites
//! - [`ThresholdClock`]: Issues strictly increasing thresholds
//! - [`Ref`] / [`RefList`]: Typed `{Kind, ID}` references and their
//!   JSON-in-scalar encoding

pub mod error;
pub mod reference;
pub mod threshold;

pub use error::TypeError;
pub use reference::{Ref, RefList};
pub use threshold::{Threshold, ThresholdClock};
