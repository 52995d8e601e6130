//! Runtime capabilities backed by host callbacks.

use std::{
    ffi::{CString, c_char, c_void},
    sync::Arc,
};

use smsbridge_intake::{
    Error, EventBus, EventPayload, Result, RuntimeContext, RuntimeContextProvider,
};

/// Returns the live runtime context, or null while the runtime is not ready.
pub type ContextFn = unsafe extern "C" fn(user_data: *mut c_void) -> *mut c_void;

/// Delivers one event to the runtime; returns `true` once it is queued.
pub type EmitFn = unsafe extern "C" fn(
    user_data: *mut c_void,
    context: *mut c_void,
    channel: *const c_char,
    payload_json: *const c_char,
) -> bool;

#[derive(Debug, Clone, Copy)]
struct HostPtr(*mut c_void);

// SAFETY: the registering host guarantees its pointers stay valid, and its
// callbacks may be called from any thread, until `smsbridge_unregister`.
unsafe impl Send for HostPtr {}
unsafe impl Sync for HostPtr {}

/// Host callbacks captured at registration.
pub(crate) struct HostRuntime {
    context_fn: ContextFn,
    emit_fn: EmitFn,
    user_data: HostPtr,
}

impl HostRuntime {
    pub(crate) fn new(context_fn: ContextFn, emit_fn: EmitFn, user_data: *mut c_void) -> Self {
        Self {
            context_fn,
            emit_fn,
            user_data: HostPtr(user_data),
        }
    }
}

impl RuntimeContextProvider for HostRuntime {
    fn current_context(&self) -> Option<Arc<dyn RuntimeContext>> {
        // SAFETY: `context_fn` and `user_data` come from the same registration
        // and are valid until unregistration.
        let context = unsafe { (self.context_fn)(self.user_data.0) };
        if context.is_null() {
            return None;
        }
        Some(Arc::new(HostContext {
            emit_fn: self.emit_fn,
            user_data: self.user_data,
            context: HostPtr(context),
        }))
    }
}

/// One live runtime context handed out by the host.
struct HostContext {
    emit_fn: EmitFn,
    user_data: HostPtr,
    context: HostPtr,
}

impl RuntimeContext for HostContext {
    fn event_bus(&self) -> &dyn EventBus {
        self
    }
}

impl EventBus for HostContext {
    fn publish(&self, channel: &str, payload: EventPayload) -> Result<()> {
        let channel =
            CString::new(channel).map_err(|e| Error::external("channel name contains NUL", e))?;
        let payload = CString::new(payload.to_json()?)
            .map_err(|e| Error::external("event payload contains NUL", e))?;

        // SAFETY: both strings outlive the call; the host must not retain
        // them after returning.
        let accepted = unsafe {
            (self.emit_fn)(
                self.user_data.0,
                self.context.0,
                channel.as_ptr(),
                payload.as_ptr(),
            )
        };
        if accepted {
            Ok(())
        } else {
            Err(Error::unavailable("host rejected event"))
        }
    }
}
