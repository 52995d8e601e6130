//! Shared types, error definitions, and platform constants used across all
//! smsbridge crates.

pub mod error;
pub mod types;

pub use {
    error::{Error, FromMessage, Result},
    types::{
        ACTION_SMS_RECEIVED, EXTRA_FORMAT, EXTRA_PDUS, Envelope, ExtraValue, Extras, Pdu,
        PdusError,
    },
};
