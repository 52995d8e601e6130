//! C ABI bridge for embedding the SMS intake handler into a native host.
//!
//! The host registers once with its runtime callbacks, then forwards every
//! "SMS received" broadcast as a JSON envelope. Strings returned to the host
//! are owned by Rust and must be released with [`smsbridge_free_string`].

#![allow(unsafe_code)]

mod host;
mod logging;

use std::{
    ffi::{CStr, CString, c_char, c_void},
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, RwLock},
};

use {
    anyhow::{Context, bail},
    serde::Serialize,
    smsbridge_common::{ACTION_SMS_RECEIVED, Envelope},
    smsbridge_config::{Severity, parse_config, validate_toml_str},
    smsbridge_intake::{CHANNEL_SMS_RECEIVED, LOG_TARGET, MessageIntakeHandler},
    tracing::{error, warn},
};

pub use host::{ContextFn, EmitFn};

use crate::{host::HostRuntime, logging::init_logging};

// ── Global bridge state ────────────────────────────────────────────────────

struct Bridge {
    handler: MessageIntakeHandler,
    host: HostRuntime,
}

static BRIDGE: RwLock<Option<Arc<Bridge>>> = RwLock::new(None);

fn current_bridge() -> Option<Arc<Bridge>> {
    BRIDGE.read().unwrap_or_else(|e| e.into_inner()).clone()
}

fn install_bridge(bridge: Option<Arc<Bridge>>) -> Option<Arc<Bridge>> {
    let mut guard = BRIDGE.write().unwrap_or_else(|e| e.into_inner());
    std::mem::replace(&mut *guard, bridge)
}

// ── Response types ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct VersionResponse {
    bridge_version: &'static str,
    channel: &'static str,
    action: &'static str,
}

#[derive(Debug, Serialize)]
struct OkResponse {
    ok: bool,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorPayload<'a>,
}

#[derive(Debug, Serialize)]
struct ErrorPayload<'a> {
    code: &'a str,
    message: &'a str,
}

// ── Encoding helpers ───────────────────────────────────────────────────────

fn encode_json<T: Serialize>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => json,
        Err(_) => {
            "{\"error\":{\"code\":\"serialization_error\",\"message\":\"failed to serialize response\"}}"
                .to_owned()
        },
    }
}

fn encode_error(code: &str, message: &str) -> String {
    encode_json(&ErrorEnvelope {
        error: ErrorPayload { code, message },
    })
}

fn into_c_ptr(payload: String) -> *mut c_char {
    match CString::new(payload) {
        Ok(value) => value.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

fn with_ffi_boundary<F>(work: F) -> *mut c_char
where
    F: FnOnce() -> String,
{
    match catch_unwind(AssertUnwindSafe(work)) {
        Ok(payload) => into_c_ptr(payload),
        Err(_) => into_c_ptr(encode_error(
            "panic",
            "unexpected panic occurred in Rust FFI boundary",
        )),
    }
}

/// Boundary for entry points that return nothing to the host.
fn with_silent_boundary<F>(function: &'static str, work: F)
where
    F: FnOnce(),
{
    if catch_unwind(AssertUnwindSafe(work)).is_err() {
        record_error(function, "panic");
        error!(target: LOG_TARGET, function, "unexpected panic occurred in Rust FFI boundary");
    }
}

fn read_c_string(ptr: *const c_char, name: &str) -> Result<String, String> {
    if ptr.is_null() {
        return Err(format!("{name} pointer was null"));
    }

    // SAFETY: pointer nullability is checked above, and callers guarantee a
    // valid NUL-terminated C string for the duration of the call.
    let c_str = unsafe { CStr::from_ptr(ptr) };
    match c_str.to_str() {
        Ok(text) => Ok(text.to_owned()),
        Err(_) => Err(format!("{name} was not valid UTF-8")),
    }
}

// ── Registration ───────────────────────────────────────────────────────────

fn build_bridge(config_toml: &str, host: HostRuntime) -> anyhow::Result<Bridge> {
    let validation = validate_toml_str(config_toml);
    if let Some(diagnostic) = validation
        .diagnostics
        .iter()
        .find(|d| d.severity == Severity::Error)
    {
        bail!(
            "{} at {}: {}",
            diagnostic.category,
            diagnostic.path,
            diagnostic.message
        );
    }

    let config = parse_config(config_toml)?;
    init_logging(&config.logging);

    for diagnostic in &validation.diagnostics {
        warn!(
            target: LOG_TARGET,
            path = %diagnostic.path,
            severity = %diagnostic.severity,
            "config: {}",
            diagnostic.message
        );
    }

    let handler = MessageIntakeHandler::new(&config).context("failed to build intake handler")?;
    Ok(Bridge { handler, host })
}

// ── Metrics helpers ────────────────────────────────────────────────────────

#[cfg(feature = "metrics")]
fn record_call(function: &'static str) {
    use smsbridge_metrics::{counter, ffi as ffi_metrics, labels};

    counter!(ffi_metrics::CALLS_TOTAL, labels::FUNCTION => function).increment(1);
}

#[cfg(not(feature = "metrics"))]
fn record_call(_function: &'static str) {}

#[cfg(feature = "metrics")]
fn record_error(function: &'static str, code: &'static str) {
    use smsbridge_metrics::{counter, ffi as ffi_metrics, labels};

    counter!(
        ffi_metrics::ERRORS_TOTAL,
        labels::FUNCTION => function,
        labels::CODE => code
    )
    .increment(1);
}

#[cfg(not(feature = "metrics"))]
fn record_error(_function: &'static str, _code: &'static str) {}

fn trace_call(function: &'static str) {
    tracing::trace!(target: "smsbridge_ffi", function, "ffi call");
}

// ── FFI exports ────────────────────────────────────────────────────────────

#[unsafe(no_mangle)]
pub extern "C" fn smsbridge_version() -> *mut c_char {
    record_call("smsbridge_version");
    trace_call("smsbridge_version");

    with_ffi_boundary(|| {
        encode_json(&VersionResponse {
            bridge_version: env!("CARGO_PKG_VERSION"),
            channel: CHANNEL_SMS_RECEIVED,
            action: ACTION_SMS_RECEIVED,
        })
    })
}

/// Register the intake handler with the host's runtime callbacks.
///
/// `config_toml` may be null to use the defaults. A second registration
/// replaces the first.
///
/// # Safety contract
///
/// `user_data` and every context pointer returned by `context_fn` must stay
/// valid until [`smsbridge_unregister`] returns, and both callbacks must be
/// callable from any thread.
#[unsafe(no_mangle)]
pub extern "C" fn smsbridge_register(
    config_toml: *const c_char,
    context_fn: Option<ContextFn>,
    emit_fn: Option<EmitFn>,
    user_data: *mut c_void,
) -> *mut c_char {
    record_call("smsbridge_register");
    trace_call("smsbridge_register");

    with_ffi_boundary(|| {
        let (Some(context_fn), Some(emit_fn)) = (context_fn, emit_fn) else {
            record_error("smsbridge_register", "missing_callback");
            return encode_error(
                "missing_callback",
                "context_fn and emit_fn must both be provided",
            );
        };

        let raw = if config_toml.is_null() {
            String::new()
        } else {
            match read_c_string(config_toml, "config_toml") {
                Ok(value) => value,
                Err(message) => {
                    record_error("smsbridge_register", "invalid_utf8");
                    return encode_error("invalid_utf8", &message);
                },
            }
        };

        let host = HostRuntime::new(context_fn, emit_fn, user_data);
        match build_bridge(&raw, host) {
            Ok(bridge) => {
                install_bridge(Some(Arc::new(bridge)));
                encode_json(&OkResponse { ok: true })
            },
            Err(e) => {
                record_error("smsbridge_register", "invalid_config");
                encode_error("invalid_config", &format!("{e:#}"))
            },
        }
    })
}

/// Forward one host broadcast, serialized as a JSON envelope.
///
/// Never reports failure to the host: an unregistered bridge, a bad envelope
/// or a fault while handling it is only logged. Extras are only decoded for
/// the SMS-received action, so other broadcasts pass through silently.
#[unsafe(no_mangle)]
pub extern "C" fn smsbridge_on_notify(envelope_json: *const c_char) {
    record_call("smsbridge_on_notify");
    trace_call("smsbridge_on_notify");

    with_silent_boundary("smsbridge_on_notify", || {
        let Some(bridge) = current_bridge() else {
            record_error("smsbridge_on_notify", "not_registered");
            warn!(target: LOG_TARGET, "notification received before registration, ignoring");
            return;
        };

        let envelope = match read_c_string(envelope_json, "envelope_json").and_then(|raw| {
            Envelope::from_json_for(&raw, ACTION_SMS_RECEIVED).map_err(|e| e.to_string())
        }) {
            Ok(envelope) => envelope,
            Err(message) => {
                record_error("smsbridge_on_notify", "invalid_envelope");
                error!(target: LOG_TARGET, %message, "invalid notification envelope");
                return;
            },
        };

        bridge.handler.on_notify(&bridge.host, &envelope);
    });
}

/// Drop the registered handler. Later notifications are ignored until the
/// host registers again.
#[unsafe(no_mangle)]
pub extern "C" fn smsbridge_unregister() {
    record_call("smsbridge_unregister");
    trace_call("smsbridge_unregister");

    with_silent_boundary("smsbridge_unregister", || {
        install_bridge(None);
    });
}

#[unsafe(no_mangle)]
/// # Safety
///
/// `ptr` must either be null or a pointer previously returned by one of the
/// `smsbridge_*` FFI functions from this crate. Passing any other pointer, or
/// freeing the same pointer more than once, is undefined behavior.
pub unsafe extern "C" fn smsbridge_free_string(ptr: *mut c_char) {
    record_call("smsbridge_free_string");

    if ptr.is_null() {
        return;
    }

    // SAFETY: pointer must originate from `CString::into_raw` in this crate.
    let _ = unsafe { CString::from_raw(ptr) };
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    };

    use {
        super::*,
        serde_json::Value,
        tracing::Level,
        tracing_subscriber::{Layer, layer::Context, layer::SubscriberExt},
    };

    /// The bridge is process-global; tests touching it run one at a time.
    static SERIAL: Mutex<()> = Mutex::new(());

    #[derive(Default)]
    struct Recorder {
        ready: AtomicBool,
        accept: AtomicBool,
        events: Mutex<Vec<(String, Value)>>,
    }

    impl Recorder {
        fn live() -> Self {
            let recorder = Self::default();
            recorder.ready.store(true, Ordering::SeqCst);
            recorder.accept.store(true, Ordering::SeqCst);
            recorder
        }

        fn as_user_data(&self) -> *mut c_void {
            (self as *const Self).cast_mut().cast()
        }

        fn events(&self) -> Vec<(String, Value)> {
            self.events.lock().unwrap().clone()
        }
    }

    unsafe extern "C" fn test_context(user_data: *mut c_void) -> *mut c_void {
        // SAFETY: tests pass a `Recorder` that outlives the registration.
        let recorder = unsafe { &*(user_data as *const Recorder) };
        if recorder.ready.load(Ordering::SeqCst) {
            user_data
        } else {
            std::ptr::null_mut()
        }
    }

    unsafe extern "C" fn test_emit(
        user_data: *mut c_void,
        context: *mut c_void,
        channel: *const c_char,
        payload_json: *const c_char,
    ) -> bool {
        if user_data != context {
            return false;
        }
        // SAFETY: see `test_context`; strings are valid for the call.
        let (recorder, channel, payload) = unsafe {
            (
                &*(user_data as *const Recorder),
                CStr::from_ptr(channel).to_str().unwrap().to_owned(),
                CStr::from_ptr(payload_json).to_str().unwrap().to_owned(),
            )
        };
        recorder
            .events
            .lock()
            .unwrap()
            .push((channel, serde_json::from_str(&payload).unwrap()));
        recorder.accept.load(Ordering::SeqCst)
    }

    /// Records `(level, target)` of every event.
    #[derive(Clone, Default)]
    struct EventLog(Arc<Mutex<Vec<(Level, String)>>>);

    impl EventLog {
        fn intake_events(&self) -> Vec<Level> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, target)| target == LOG_TARGET)
                .map(|(level, _)| *level)
                .collect()
        }
    }

    impl<S: tracing::Subscriber> Layer<S> for EventLog {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            let metadata = event.metadata();
            self.0
                .lock()
                .unwrap()
                .push((*metadata.level(), metadata.target().to_owned()));
        }
    }

    fn logged(f: impl FnOnce()) -> EventLog {
        let log = EventLog::default();
        let subscriber = tracing_subscriber::registry().with(log.clone());
        tracing::subscriber::with_default(subscriber, f);
        log
    }

    fn text_from_ptr(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null(), "ffi returned null pointer");

        // SAFETY: pointer returned by this crate, converted back exactly once.
        let owned = unsafe { CString::from_raw(ptr) };

        match owned.into_string() {
            Ok(text) => text,
            Err(error) => panic!("failed to decode UTF-8 from ffi pointer: {error}"),
        }
    }

    fn json_from_ptr(ptr: *mut c_char) -> Value {
        let text = text_from_ptr(ptr);
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => value,
            Err(error) => panic!("failed to parse ffi json payload: {error}; payload={text}"),
        }
    }

    fn error_code(payload: &Value) -> &str {
        payload
            .get("error")
            .and_then(|value| value.get("code"))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    fn register(recorder: &Recorder, config: Option<&str>) -> Value {
        let config = config.map(|raw| CString::new(raw).unwrap());
        json_from_ptr(smsbridge_register(
            config.as_ref().map_or(std::ptr::null(), |c| c.as_ptr()),
            Some(test_context),
            Some(test_emit),
            recorder.as_user_data(),
        ))
    }

    fn notify(envelope: &str) {
        let envelope = CString::new(envelope).unwrap();
        smsbridge_on_notify(envelope.as_ptr());
    }

    /// `+15551234567` / `hi`.
    const HI_ENVELOPE: &str = r#"{
        "action": "android.provider.Telephony.SMS_RECEIVED",
        "extras": { "pdus": { "byte_arrays": ["B5EhYBMDAPQEC5FRVSFDZfcAAEIwUSEDVIAC6DQ="] } }
    }"#;

    #[test]
    fn version_returns_expected_payload() {
        let payload = json_from_ptr(smsbridge_version());

        assert_eq!(payload["bridge_version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(payload["channel"], "SMS_RECEIVED");
        assert_eq!(payload["action"], "android.provider.Telephony.SMS_RECEIVED");
    }

    #[test]
    fn received_sms_is_emitted_to_host() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let recorder = Recorder::live();

        let payload = register(&recorder, None);
        assert_eq!(payload["ok"], true);

        notify(HI_ENVELOPE);
        smsbridge_unregister();

        let events = recorder.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "SMS_RECEIVED");
        assert_eq!(
            events[0].1,
            serde_json::json!({ "sender": "+15551234567", "message": "hi" })
        );
    }

    #[test]
    fn runtime_not_ready_emits_nothing() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let recorder = Recorder::default();

        register(&recorder, Some("log_message_bodies = false"));
        notify(HI_ENVELOPE);
        smsbridge_unregister();

        assert!(recorder.events().is_empty());
    }

    #[test]
    fn rejected_event_is_contained() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let recorder = Recorder::live();
        recorder.accept.store(false, Ordering::SeqCst);

        register(&recorder, None);
        notify(HI_ENVELOPE);
        smsbridge_unregister();

        // The host saw the attempt and refused it.
        assert_eq!(recorder.events().len(), 1);
    }

    #[test]
    fn notifications_after_unregister_are_ignored() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let recorder = Recorder::live();

        register(&recorder, None);
        smsbridge_unregister();
        notify(HI_ENVELOPE);

        assert!(recorder.events().is_empty());
    }

    #[test]
    fn invalid_envelopes_are_swallowed() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let recorder = Recorder::live();

        register(&recorder, None);
        notify("not json");
        notify(r#"{"action":"OTHER"}"#);
        smsbridge_on_notify(std::ptr::null());
        smsbridge_unregister();

        assert!(recorder.events().is_empty());
    }

    #[test]
    fn foreign_broadcasts_are_silent_whatever_their_extras() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let recorder = Recorder::live();
        register(&recorder, None);

        let log = logged(|| {
            notify(r#"{"action":"OTHER","extras":{"seq":{"long":5}}}"#);
            notify(r#"{"action":"OTHER","extras":{"format":"3gpp"}}"#);
            notify(r#"{"action":null,"extras":{"pdus":{"byte_arrays":["not base64!"]}}}"#);
            notify(r#"{"extras":{"pdus":7}}"#);
        });
        smsbridge_unregister();

        assert_eq!(log.intake_events(), Vec::<Level>::new());
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn null_pdus_are_ignored_silently() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let recorder = Recorder::live();
        register(&recorder, None);

        let log = logged(|| {
            notify(r#"{"action":"android.provider.Telephony.SMS_RECEIVED","extras":{"pdus":null}}"#);
            notify(r#"{"action":"android.provider.Telephony.SMS_RECEIVED","extras":null}"#);
        });
        smsbridge_unregister();

        assert_eq!(log.intake_events(), Vec::<Level>::new());
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn malformed_sms_envelope_is_logged_once() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let recorder = Recorder::live();
        register(&recorder, None);

        let log = logged(|| notify("not json"));
        smsbridge_unregister();

        assert_eq!(log.intake_events(), vec![Level::ERROR]);
    }

    #[test]
    fn register_rejects_invalid_config() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let recorder = Recorder::live();

        let payload = register(&recorder, Some("default_format = \"cdma\""));
        assert_eq!(error_code(&payload), "invalid_config");

        let payload = register(&recorder, Some("log_message_bodies = ["));
        assert_eq!(error_code(&payload), "invalid_config");

        assert!(current_bridge().is_none());
    }

    #[test]
    fn register_requires_callbacks() {
        let payload = json_from_ptr(smsbridge_register(
            std::ptr::null(),
            None,
            None,
            std::ptr::null_mut(),
        ));
        assert_eq!(error_code(&payload), "missing_callback");
    }

    #[test]
    fn free_string_tolerates_null_pointer() {
        // SAFETY: null pointers are explicitly accepted and treated as no-op.
        unsafe {
            smsbridge_free_string(std::ptr::null_mut());
        }
    }
}
