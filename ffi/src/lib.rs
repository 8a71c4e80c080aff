use std::ffi::{CStr, CString};
use std::future::Future;
use std::os::raw::c_char;
use std::ptr;
use anyhow::Context as _;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orchestra_core::{
    AgentDraft, AgentPatch, ApiKeyPatch, Console, ConsoleConfig, NewApiKey, OrchestraError,
    MODEL_CATALOG, PRESET_NAMES,
};

/// Opaque console handle owned by the caller.
///
/// Holds the runtime that drives the console's timers, so pending
/// transitions and replies keep firing between calls.
pub struct ConsoleHandle {
    console: Console,
    runtime: tokio::runtime::Runtime,
}

/// Convert C string to Rust String. Null reads as empty; invalid UTF-8 is an error.
unsafe fn c_str_to_string(ptr: *const c_char) -> anyhow::Result<String> {
    if ptr.is_null() {
        return Ok(String::new());
    }
    let text = CStr::from_ptr(ptr).to_str().context("argument is not valid UTF-8")?;
    Ok(text.to_owned())
}

/// Convert Rust String to C string
fn string_to_c_str(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c_str) => c_str.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

fn parse_json<T: DeserializeOwned>(ptr: *const c_char, what: &str) -> anyhow::Result<T> {
    let text = unsafe { c_str_to_string(ptr) }?;
    serde_json::from_str(&text).with_context(|| format!("invalid {} JSON", what))
}

fn error_json(kind: &str, message: String) -> serde_json::Value {
    json!({
        "ok": false,
        "error": { "kind": kind, "message": message },
    })
}

/// Folds any outcome into the `{"ok": ..}` envelope returned to callers.
fn envelope<T: Serialize>(result: anyhow::Result<T>) -> *mut c_char {
    let value = match result {
        Ok(data) => match serde_json::to_value(data) {
            Ok(data) => json!({ "ok": true, "data": data }),
            Err(e) => error_json("serialization", e.to_string()),
        },
        Err(e) => {
            let kind = e
                .downcast_ref::<OrchestraError>()
                .map(OrchestraError::kind)
                .unwrap_or("invalid_input");
            error_json(kind, format!("{:#}", e))
        }
    };
    string_to_c_str(value.to_string())
}

/// Runs `action` on the handle's runtime.
fn run<T, F, Fut>(handle: *mut ConsoleHandle, action: F) -> anyhow::Result<T>
where
    F: FnOnce(Console) -> Fut,
    Fut: Future<Output = T>,
{
    let handle = unsafe { handle.as_ref() }.context("console handle is null")?;
    Ok(handle.runtime.block_on(action(handle.console.clone())))
}

fn run_fallible<T, F, Fut>(handle: *mut ConsoleHandle, action: F) -> anyhow::Result<T>
where
    F: FnOnce(Console) -> Fut,
    Fut: Future<Output = orchestra_core::Result<T>>,
{
    Ok(run(handle, action)??)
}

fn open_console(config_json: *const c_char) -> anyhow::Result<ConsoleHandle> {
    let config_str = unsafe { c_str_to_string(config_json) }?;
    let config = if config_str.trim().is_empty() {
        ConsoleConfig::default()
    } else {
        ConsoleConfig::from_json(&config_str)?
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("orchestra-timers")
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    let console = Console::new(config)?;
    Ok(ConsoleHandle { console, runtime })
}

/// Install a fmt subscriber filtered by `RUST_LOG`.
///
/// Returns 0 when installed, 1 when a subscriber was already set.
#[no_mangle]
pub extern "C" fn orchestra_init_logging() -> i32 {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "orchestra_core=info,orchestra_ffi=info".into());
    match tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
    {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

/// Open a console. `config_json` may be null or empty for defaults.
/// Returns null when the config is rejected.
#[no_mangle]
pub extern "C" fn orchestra_console_new(config_json: *const c_char) -> *mut ConsoleHandle {
    match open_console(config_json) {
        Ok(handle) => Box::into_raw(Box::new(handle)),
        Err(e) => {
            tracing::error!("Failed to open console: {:#}", e);
            ptr::null_mut()
        }
    }
}

/// Free a console, cancelling everything still pending
#[no_mangle]
pub extern "C" fn orchestra_console_free(handle: *mut ConsoleHandle) {
    if handle.is_null() {
        return;
    }

    let handle = unsafe { Box::from_raw(handle) };
    handle.runtime.block_on(handle.console.shutdown());
}

// ---- agents ----

#[no_mangle]
pub extern "C" fn orchestra_create_agent(handle: *mut ConsoleHandle, draft_json: *const c_char) -> *mut c_char {
    let result = parse_json::<AgentDraft>(draft_json, "agent draft").and_then(|draft| {
        run_fallible(handle, |console| async move { console.create_agent(draft).await })
    });
    envelope(result)
}

#[no_mangle]
pub extern "C" fn orchestra_update_agent(
    handle: *mut ConsoleHandle,
    id: *const c_char,
    patch_json: *const c_char,
) -> *mut c_char {
    let result = unsafe { c_str_to_string(id) }.and_then(|id| {
        let patch = parse_json::<AgentPatch>(patch_json, "agent patch")?;
        run_fallible(handle, |console| async move { console.update_agent(&id, patch).await })
    });
    envelope(result)
}

#[no_mangle]
pub extern "C" fn orchestra_delete_agent(handle: *mut ConsoleHandle, id: *const c_char) -> *mut c_char {
    let result = unsafe { c_str_to_string(id) }.and_then(|id| {
        run_fallible(handle, |console| async move { console.delete_agent(&id).await })
    });
    envelope(result)
}

#[no_mangle]
pub extern "C" fn orchestra_list_agents(handle: *mut ConsoleHandle) -> *mut c_char {
    envelope(run(handle, |console| async move { console.agents().await }))
}

#[no_mangle]
pub extern "C" fn orchestra_dashboard_stats(handle: *mut ConsoleHandle) -> *mut c_char {
    envelope(run(handle, |console| async move { console.dashboard_stats().await }))
}

// ---- api keys ----

#[no_mangle]
pub extern "C" fn orchestra_add_key(handle: *mut ConsoleHandle, key_json: *const c_char) -> *mut c_char {
    let result = parse_json::<NewApiKey>(key_json, "api key").and_then(|new_key| {
        run_fallible(handle, |console| async move { console.add_key(new_key).await })
    });
    envelope(result)
}

/// Rename a key. `patch_json` is `{"name": ...}`.
#[no_mangle]
pub extern "C" fn orchestra_update_key(
    handle: *mut ConsoleHandle,
    id: *const c_char,
    patch_json: *const c_char,
) -> *mut c_char {
    let result = unsafe { c_str_to_string(id) }.and_then(|id| {
        let patch = parse_json::<ApiKeyPatch>(patch_json, "api key patch")?;
        run_fallible(handle, |console| async move { console.update_key(&id, patch).await })
    });
    envelope(result)
}

#[no_mangle]
pub extern "C" fn orchestra_delete_key(handle: *mut ConsoleHandle, id: *const c_char) -> *mut c_char {
    let result = unsafe { c_str_to_string(id) }.and_then(|id| {
        run_fallible(handle, |console| async move { console.delete_key(&id).await })
    });
    envelope(result)
}

#[no_mangle]
pub extern "C" fn orchestra_toggle_key_visibility(handle: *mut ConsoleHandle, id: *const c_char) -> *mut c_char {
    let result = unsafe { c_str_to_string(id) }.and_then(|id| {
        run_fallible(handle, |console| async move { console.toggle_key_visibility(&id).await })
    });
    envelope(result)
}

#[no_mangle]
pub extern "C" fn orchestra_record_key_usage(handle: *mut ConsoleHandle, id: *const c_char) -> *mut c_char {
    let result = unsafe { c_str_to_string(id) }.and_then(|id| {
        run_fallible(handle, |console| async move { console.record_key_usage(&id).await })
    });
    envelope(result)
}

#[no_mangle]
pub extern "C" fn orchestra_list_keys(handle: *mut ConsoleHandle) -> *mut c_char {
    envelope(run_fallible(handle, |console| async move { console.keys().await }))
}

#[no_mangle]
pub extern "C" fn orchestra_key_stats(handle: *mut ConsoleHandle) -> *mut c_char {
    envelope(run(handle, |console| async move { console.key_stats().await }))
}

// ---- conversation ----

/// Send a chat message. The reply lands later; poll `orchestra_transcript`.
#[no_mangle]
pub extern "C" fn orchestra_send_message(handle: *mut ConsoleHandle, text: *const c_char) -> *mut c_char {
    let result = unsafe { c_str_to_string(text) }.and_then(|text| {
        run_fallible(handle, |console| async move { console.send_message(text).await })
    });
    envelope(result)
}

#[no_mangle]
pub extern "C" fn orchestra_clear_conversation(handle: *mut ConsoleHandle) -> *mut c_char {
    envelope(run(handle, |console| async move { console.clear_conversation().await }))
}

#[no_mangle]
pub extern "C" fn orchestra_transcript(handle: *mut ConsoleHandle) -> *mut c_char {
    envelope(run(handle, |console| async move {
        let messages = console.transcript().await;
        let busy = console.is_busy().await;
        json!({ "messages": messages, "busy": busy })
    }))
}

#[no_mangle]
pub extern "C" fn orchestra_export_transcript(handle: *mut ConsoleHandle) -> *mut c_char {
    envelope(run(handle, |console| async move { console.export_transcript().await }))
}

// ---- catalog ----

#[no_mangle]
pub extern "C" fn orchestra_list_models() -> *mut c_char {
    envelope(Ok(MODEL_CATALOG))
}

#[no_mangle]
pub extern "C" fn orchestra_list_presets() -> *mut c_char {
    envelope(Ok(PRESET_NAMES))
}

/// Library version. Static; do not free.
#[no_mangle]
pub extern "C" fn orchestra_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

/// Free a string allocated by Rust
#[no_mangle]
pub extern "C" fn orchestra_free_str(s: *mut c_char) {
    if !s.is_null() {
        unsafe {
            let _ = CString::from_raw(s);
        }
    }
}
