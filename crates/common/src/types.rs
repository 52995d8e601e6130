//! Host notification envelope model.
//!
//! Mirrors the shape of the platform's broadcast intent: an action tag plus an
//! optional bag of typed extras. Hosts that cannot hand over native objects
//! serialize the envelope as JSON, with byte payloads carried as base64.

use std::collections::BTreeMap;

use {
    base64::{Engine, engine::general_purpose::STANDARD},
    serde::{Deserialize, Serialize},
};

use crate::{Result, error::Context};

/// Platform telephony action delivered for an incoming short message.
pub const ACTION_SMS_RECEIVED: &str = "android.provider.Telephony.SMS_RECEIVED";

/// Extras key holding the ordered PDU array.
pub const EXTRA_PDUS: &str = "pdus";

/// Extras key naming the PDU format (`3gpp` or `3gpp2`).
pub const EXTRA_FORMAT: &str = "format";

// ── Pdu ─────────────────────────────────────────────────────────────────────

/// One raw protocol data unit, exactly as the radio layer produced it.
#[derive(Clone, PartialEq, Eq)]
pub struct Pdu(Vec<u8>);

impl Pdu {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Pdu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Pdu({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for Pdu {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Pdu {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl Serialize for Pdu {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Pdu {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(text.as_bytes())
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

// ── Extras ──────────────────────────────────────────────────────────────────

/// A typed extras value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraValue {
    String(String),
    Int(i64),
    Bool(bool),
    Bytes(Pdu),
    ByteArrays(Vec<Pdu>),
}

impl ExtraValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Int(_) => "int",
            Self::Bool(_) => "bool",
            Self::Bytes(_) => "bytes",
            Self::ByteArrays(_) => "byte_arrays",
        }
    }
}

/// The `pdus` extra was present but did not hold a PDU array.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("extra `{key}` holds {found}, expected byte_arrays")]
pub struct PdusError {
    pub key: &'static str,
    pub found: &'static str,
}

/// Extras mapping carried by an [`Envelope`].
///
/// A key whose value is `null` deserializes as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Extras(BTreeMap<String, ExtraValue>);

impl<'de> Deserialize<'de> for Extras {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let entries = BTreeMap::<String, Option<ExtraValue>>::deserialize(deserializer)?;
        Ok(Self(
            entries
                .into_iter()
                .filter_map(|(key, value)| value.map(|value| (key, value)))
                .collect(),
        ))
    }
}

impl Extras {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&ExtraValue> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ExtraValue) -> Option<ExtraValue> {
        self.0.insert(key.into(), value)
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: ExtraValue) -> Self {
        self.insert(key, value);
        self
    }

    /// The ordered PDU array.
    ///
    /// `None` when the key is absent, `Some(Err)` when it holds some other
    /// kind of value.
    pub fn pdus(&self) -> Option<std::result::Result<&[Pdu], PdusError>> {
        self.get(EXTRA_PDUS).map(|value| match value {
            ExtraValue::ByteArrays(pdus) => Ok(pdus.as_slice()),
            other => Err(PdusError {
                key: EXTRA_PDUS,
                found: other.kind(),
            }),
        })
    }

    /// The declared PDU format, if the host supplied one as a string.
    pub fn format(&self) -> Option<&str> {
        match self.get(EXTRA_FORMAT) {
            Some(ExtraValue::String(format)) => Some(format.as_str()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ── Envelope ────────────────────────────────────────────────────────────────

/// A host notification: action tag plus optional extras.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub extras: Option<Extras>,
}

impl Envelope {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            extras: None,
        }
    }

    /// Envelope carrying `pdus` under the standard SMS-received action.
    pub fn sms_received(pdus: impl IntoIterator<Item = Pdu>) -> Self {
        Self::new(ACTION_SMS_RECEIVED).with_extras(
            Extras::new().with(EXTRA_PDUS, ExtraValue::ByteArrays(pdus.into_iter().collect())),
        )
    }

    #[must_use]
    pub fn with_extras(mut self, extras: Extras) -> Self {
        self.extras = Some(extras);
        self
    }

    pub fn action_is(&self, action: &str) -> bool {
        self.action.as_deref() == Some(action)
    }

    /// Parse the JSON form hosts use to forward a broadcast.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str::<Self>(raw).context("invalid notification envelope")
    }

    /// Parse the JSON form, decoding extras only when the action is `action`.
    ///
    /// Any other action yields an envelope without extras, whatever the
    /// extras held. Only text that is not JSON at all is an error.
    pub fn from_json_for(raw: &str, action: &str) -> Result<Self> {
        let value = serde_json::from_str::<serde_json::Value>(raw)
            .context("invalid notification envelope")?;
        let found = value.get("action").and_then(serde_json::Value::as_str);
        if found != Some(action) {
            return Ok(Self {
                action: found.map(str::to_owned),
                extras: None,
            });
        }
        serde_json::from_value::<Self>(value).context("invalid notification envelope")
    }
}
