//! Metric definitions for strongroom.
//!
//! Library crates record through the `metrics` facade re-exported here and
//! take their names from [`crypto`]. Nothing is exported unless the embedding
//! process installs a recorder.
//!
//! ```rust,ignore
//! use strongroom_metrics::{counter, crypto};
//!
//! counter!(crypto::DISPATCH_TOTAL, "direction" => "encrypt", "plugin" => "software")
//!     .increment(1);
//! ```

mod definitions;

pub use definitions::*;

pub use metrics::{counter, gauge, histogram};
