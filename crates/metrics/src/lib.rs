//! Metrics for smsbridge.
//!
//! Only the `metrics` facade is used here: counters are no-ops until the
//! embedding host installs a recorder of its choice.
//!
//! # Usage
//!
//! ```rust,ignore
//! use smsbridge_metrics::{counter, sms};
//!
//! counter!(sms::EVENTS_PUBLISHED_TOTAL).increment(1);
//! ```

mod definitions;

pub use definitions::*;

// Re-export the counter macro for convenience
pub use metrics::counter;
