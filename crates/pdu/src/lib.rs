//! Short-message PDU codec.
//!
//! Decodes the SMS-DELIVER protocol data units a radio layer hands to its
//! host (3GPP TS 23.040, with the data coding rules of TS 23.038) into a
//! sender/body pair plus the envelope metadata that travels with them.
//! Multipart messages are not reassembled; each PDU decodes on its own and
//! exposes its concatenation header so callers can join segments if they
//! need to.

mod address;
pub mod alphabet;
pub mod dcs;
mod deliver;
mod error;
mod reader;
mod timestamp;
pub mod udh;

use std::{fmt, str::FromStr};

pub use {
    dcs::{Alphabet, DataCoding, MessageClass},
    deliver::DecodedMessage,
    error::{PduError, Result},
    udh::{ConcatInfo, InformationElement, PortAddressing, UserDataHeader},
};

/// Wire format of a PDU, as announced by the host alongside the bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MessageFormat {
    /// GSM/UMTS/LTE (3GPP TS 23.040).
    #[default]
    ThreeGpp,
    /// CDMA (3GPP2 C.S0015).
    ThreeGpp2,
}

impl MessageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThreeGpp => "3gpp",
            Self::ThreeGpp2 => "3gpp2",
        }
    }
}

impl fmt::Display for MessageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageFormat {
    type Err = PduError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "3gpp" => Ok(Self::ThreeGpp),
            "3gpp2" => Ok(Self::ThreeGpp2),
            other => Err(PduError::UnknownFormat(other.to_string())),
        }
    }
}

/// Decodes one PDU into a [`DecodedMessage`].
pub trait SmsCodec: Send + Sync {
    fn decode(&self, pdu: &[u8], format: MessageFormat) -> Result<DecodedMessage>;
}

/// Built-in codec for 3GPP SMS-DELIVER PDUs.
///
/// 3GPP2 PDUs are rejected with [`PduError::UnsupportedFormat`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GsmCodec;

impl GsmCodec {
    pub fn new() -> Self {
        Self
    }
}

impl SmsCodec for GsmCodec {
    fn decode(&self, pdu: &[u8], format: MessageFormat) -> Result<DecodedMessage> {
        match format {
            MessageFormat::ThreeGpp => deliver::decode(pdu),
            MessageFormat::ThreeGpp2 => Err(PduError::UnsupportedFormat(format)),
        }
    }
}
