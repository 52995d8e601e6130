use {
    serde::{Deserialize, Serialize},
    smsbridge_pdu::DecodedMessage,
};

use crate::Result;

/// Runtime event channel carrying received messages.
pub const CHANNEL_SMS_RECEIVED: &str = "SMS_RECEIVED";

/// `tracing` target for every intake diagnostic.
pub const LOG_TARGET: &str = "SMSReceiver";

/// Event published for one decoded PDU.
///
/// Serializes to an object with exactly the two string fields `sender` and
/// `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    pub sender: String,
    pub message: String,
}

impl EventPayload {
    pub fn new(sender: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            message: message.into(),
        }
    }

    /// Copies the codec output verbatim.
    pub fn from_decoded(decoded: &DecodedMessage) -> Self {
        Self::new(decoded.sender.clone(), decoded.body.clone())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::Value};

    #[test]
    fn payload_has_exactly_two_string_fields() {
        let json = EventPayload::new("+15551234567", "hi").to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object["sender"], "+15551234567");
        assert_eq!(object["message"], "hi");
    }

    #[test]
    fn from_decoded_keeps_strings_untouched() {
        let decoded = DecodedMessage::new(" +1 ", "  body\n");
        let payload = EventPayload::from_decoded(&decoded);
        assert_eq!(payload, EventPayload::new(" +1 ", "  body\n"));
    }
}
