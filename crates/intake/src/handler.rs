//! The message intake handler.
//!
//! One host notification becomes zero or more `SMS_RECEIVED` events, one per
//! PDU, published in the order the host supplied the PDUs. Nothing escapes
//! [`MessageIntakeHandler::on_notify`]: every fault ends the current batch and
//! is reported through the log.

use std::{
    any::Any,
    panic::{AssertUnwindSafe, catch_unwind},
};

use {
    smsbridge_common::{ACTION_SMS_RECEIVED, Envelope, Pdu},
    smsbridge_config::IntakeConfig,
    smsbridge_pdu::{GsmCodec, MessageFormat, PduError, SmsCodec},
    tracing::{debug, error},
};

#[cfg(feature = "metrics")]
use smsbridge_metrics::{counter, labels, sms as sms_metrics};

use crate::{
    CHANNEL_SMS_RECEIVED, Error, EventPayload, LOG_TARGET, Result, RuntimeContextProvider,
};

/// Why a notification produced no work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The action tag is not the SMS-received action.
    ForeignAction,
    MissingExtras,
    /// No `pdus` extra, or an empty array.
    MissingPdus,
}

impl IgnoreReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ForeignAction => "foreign_action",
            Self::MissingExtras => "missing_extras",
            Self::MissingPdus => "missing_pdus",
        }
    }
}

/// What happened to one PDU of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PduOutcome {
    Published(EventPayload),
    /// Decoded, but no runtime was live so the event was dropped.
    RuntimeNotReady(EventPayload),
    /// The codec rejected the PDU; later PDUs were not attempted.
    DecodeFault(PduError),
    /// The runtime bus refused the event; later PDUs were not attempted.
    PublishFault(String),
}

impl PduOutcome {
    fn ends_batch(&self) -> bool {
        matches!(self, Self::DecodeFault(_) | Self::PublishFault(_))
    }
}

/// Result of handling one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeReport {
    Ignored(IgnoreReason),
    /// The extras were present but unusable.
    Faulted(String),
    /// One outcome per attempted PDU, in input order.
    Batch(Vec<PduOutcome>),
}

impl IntakeReport {
    /// Payloads that reached the runtime bus.
    pub fn published(&self) -> Vec<&EventPayload> {
        match self {
            Self::Batch(outcomes) => outcomes
                .iter()
                .filter_map(|outcome| match outcome {
                    PduOutcome::Published(payload) => Some(payload),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Handler bound to the host's SMS-received notification.
///
/// Stateless between calls: each notification is handled on its own and the
/// runtime context is looked up per PDU, never retained.
pub struct MessageIntakeHandler<C = GsmCodec> {
    codec: C,
    default_format: MessageFormat,
    log_message_bodies: bool,
}

impl MessageIntakeHandler<GsmCodec> {
    pub fn new(config: &IntakeConfig) -> Result<Self> {
        Self::with_codec(GsmCodec::new(), config)
    }
}

impl<C: SmsCodec> MessageIntakeHandler<C> {
    pub fn with_codec(codec: C, config: &IntakeConfig) -> Result<Self> {
        let default_format = config
            .default_format
            .parse::<MessageFormat>()
            .map_err(|e| Error::invalid_input(format_args!("default_format: {e}")))?;
        Ok(Self {
            codec,
            default_format,
            log_message_bodies: config.log_message_bodies,
        })
    }

    /// Host entry point. Always returns normally; a panic anywhere below is
    /// caught and logged.
    pub fn on_notify(&self, host: &dyn RuntimeContextProvider, envelope: &Envelope) {
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| self.process(host, envelope))) {
            #[cfg(feature = "metrics")]
            counter!(sms_metrics::FAULTS_TOTAL, labels::REASON => "panic").increment(1);

            error!(
                target: LOG_TARGET,
                reason = panic_message(&*panic),
                "unexpected fault while handling SMS"
            );
        }
    }

    /// Handle one notification and report what happened to each PDU.
    pub fn process(&self, host: &dyn RuntimeContextProvider, envelope: &Envelope) -> IntakeReport {
        #[cfg(feature = "metrics")]
        counter!(sms_metrics::NOTIFICATIONS_TOTAL).increment(1);

        if !envelope.action_is(ACTION_SMS_RECEIVED) {
            return ignored(IgnoreReason::ForeignAction);
        }
        let Some(extras) = &envelope.extras else {
            return ignored(IgnoreReason::MissingExtras);
        };
        let pdus = match extras.pdus() {
            None => return ignored(IgnoreReason::MissingPdus),
            Some(Ok([])) => return ignored(IgnoreReason::MissingPdus),
            Some(Ok(pdus)) => pdus,
            Some(Err(e)) => {
                #[cfg(feature = "metrics")]
                counter!(sms_metrics::FAULTS_TOTAL, labels::REASON => "malformed_extras")
                    .increment(1);

                error!(target: LOG_TARGET, error = %e, "malformed SMS extras");
                return IntakeReport::Faulted(e.to_string());
            },
        };
        let format = extras
            .format()
            .map_or(Ok(self.default_format), str::parse::<MessageFormat>);

        IntakeReport::Batch(self.process_batch(host, pdus, &format))
    }

    fn process_batch(
        &self,
        host: &dyn RuntimeContextProvider,
        pdus: &[Pdu],
        format: &std::result::Result<MessageFormat, PduError>,
    ) -> Vec<PduOutcome> {
        let mut outcomes = Vec::with_capacity(pdus.len());
        for (index, pdu) in pdus.iter().enumerate() {
            let decoded = match format {
                Ok(format) => self.codec.decode(pdu.as_bytes(), *format),
                Err(e) => Err(e.clone()),
            };
            let message = match decoded {
                Ok(message) => message,
                Err(e) => {
                    #[cfg(feature = "metrics")]
                    counter!(sms_metrics::DECODE_ERRORS_TOTAL).increment(1);

                    error!(
                        target: LOG_TARGET,
                        index,
                        pdus = pdus.len(),
                        error = %e,
                        "failed to decode SMS PDU, dropping the rest of the batch"
                    );
                    outcomes.push(PduOutcome::DecodeFault(e));
                    break;
                },
            };

            #[cfg(feature = "metrics")]
            counter!(sms_metrics::PDUS_DECODED_TOTAL).increment(1);

            let payload = EventPayload::from_decoded(&message);
            let outcome = publish(host, payload.clone());

            debug!(target: LOG_TARGET, "SMS from: {}", payload.sender);
            if self.log_message_bodies {
                debug!(target: LOG_TARGET, "Message: {}", payload.message);
            } else {
                debug!(target: LOG_TARGET, "Message: <redacted>");
            }

            let stop = outcome.ends_batch();
            outcomes.push(outcome);
            if stop {
                break;
            }
        }
        outcomes
    }
}

fn ignored(reason: IgnoreReason) -> IntakeReport {
    #[cfg(feature = "metrics")]
    counter!(sms_metrics::NOTIFICATIONS_IGNORED_TOTAL, labels::REASON => reason.as_str())
        .increment(1);

    IntakeReport::Ignored(reason)
}

fn publish(host: &dyn RuntimeContextProvider, payload: EventPayload) -> PduOutcome {
    let Some(context) = host.current_context() else {
        #[cfg(feature = "metrics")]
        counter!(sms_metrics::EVENTS_DROPPED_TOTAL).increment(1);

        return PduOutcome::RuntimeNotReady(payload);
    };
    match context
        .event_bus()
        .publish(CHANNEL_SMS_RECEIVED, payload.clone())
    {
        Ok(()) => {
            #[cfg(feature = "metrics")]
            counter!(sms_metrics::EVENTS_PUBLISHED_TOTAL).increment(1);

            PduOutcome::Published(payload)
        },
        Err(e) => {
            #[cfg(feature = "metrics")]
            counter!(sms_metrics::FAULTS_TOTAL, labels::REASON => "publish").increment(1);

            error!(target: LOG_TARGET, error = %e, "failed to publish SMS event");
            PduOutcome::PublishFault(e.to_string())
        },
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
