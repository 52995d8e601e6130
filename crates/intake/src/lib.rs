//! Short-message intake.
//!
//! Turns the host's "SMS received" notification into `SMS_RECEIVED` events on
//! the scripting runtime's bus. The runtime is reached through the
//! [`RuntimeContextProvider`] capability handed in by the host, so the handler
//! runs without a live host in tests.

pub mod bus;
pub mod error;
pub mod event;
pub mod handler;
pub mod runtime;

pub use {
    bus::{BroadcastBus, BusEvent, SharedRuntime},
    error::{Error, Result},
    event::{CHANNEL_SMS_RECEIVED, EventPayload, LOG_TARGET},
    handler::{IgnoreReason, IntakeReport, MessageIntakeHandler, PduOutcome},
    runtime::{EventBus, RuntimeContext, RuntimeContextProvider},
};
