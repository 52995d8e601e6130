//! Metric name and label definitions.
//!
//! All metric names and label keys used by smsbridge live here so the set of
//! exported series is documented in one place.

/// Short-message intake metrics
pub mod sms {
    /// Host notifications handed to the intake handler
    pub const NOTIFICATIONS_TOTAL: &str = "smsbridge_sms_notifications_total";
    /// Notifications ignored before decoding (foreign action, missing extras)
    pub const NOTIFICATIONS_IGNORED_TOTAL: &str = "smsbridge_sms_notifications_ignored_total";
    /// PDUs successfully decoded
    pub const PDUS_DECODED_TOTAL: &str = "smsbridge_sms_pdus_decoded_total";
    /// PDUs rejected by the codec
    pub const DECODE_ERRORS_TOTAL: &str = "smsbridge_sms_decode_errors_total";
    /// Events published on the runtime bus
    pub const EVENTS_PUBLISHED_TOTAL: &str = "smsbridge_sms_events_published_total";
    /// Events dropped because no runtime context was live
    pub const EVENTS_DROPPED_TOTAL: &str = "smsbridge_sms_events_dropped_total";
    /// Batches abandoned on an unexpected fault
    pub const FAULTS_TOTAL: &str = "smsbridge_sms_faults_total";
}

/// Native host bridge metrics
pub mod ffi {
    /// Total FFI entry point invocations
    pub const CALLS_TOTAL: &str = "smsbridge_ffi_calls_total";
    /// FFI calls that returned an error envelope
    pub const ERRORS_TOTAL: &str = "smsbridge_ffi_errors_total";
}

/// Common label keys used across metrics
pub mod labels {
    pub const FUNCTION: &str = "function";
    pub const CODE: &str = "code";
    pub const REASON: &str = "reason";
}
