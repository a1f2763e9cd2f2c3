//! FFI bindings for Synheart Focus
//!
//! This module provides C-compatible functions for driving a focus session from
//! other languages. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using `focus_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::EngineConfig;
use crate::error::FocusError;
use crate::mailbox::UiEvents;
use crate::pipeline::{replay_to_record, FocusProcessor};
use crate::schema::{post_command, FrameAdapter, RawCommand, RawFrame, ValidationError};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Engine configuration from an optional TOML string; NULL means defaults
unsafe fn config_from_cstr(config_toml: *const c_char) -> Result<EngineConfig, FocusError> {
    if config_toml.is_null() {
        return Ok(EngineConfig::default());
    }
    let text = cstr_to_string(config_toml)
        .ok_or_else(|| FocusError::ConfigError("configuration is not valid UTF-8".to_string()))?;
    EngineConfig::from_toml_str(&text)
}

// ============================================================================
// Stateless API
// ============================================================================

/// Replay an NDJSON landmark recording and return the session record JSON.
///
/// # Safety
/// - `ndjson` must be a valid null-terminated C string.
/// - `config_toml` must be a valid null-terminated C string or NULL for defaults.
/// - Returns a newly allocated string that must be freed with `focus_free_string`.
/// - Returns NULL on error; call `focus_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn focus_replay_to_record(
    ndjson: *const c_char,
    config_toml: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let ndjson_str = match cstr_to_string(ndjson) {
        Some(s) => s,
        None => {
            set_last_error("Invalid NDJSON string pointer");
            return ptr::null_mut();
        }
    };

    let config = match config_from_cstr(config_toml) {
        Ok(config) => config,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    match replay_to_record(&ndjson_str, &config) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a live focus session
pub struct FocusProcessorHandle {
    processor: FocusProcessor,
    events: UiEvents,
}

impl FocusProcessorHandle {
    fn process_frame_json(&mut self, json: &str) -> Result<String, FocusError> {
        let frame: RawFrame = serde_json::from_str(json)?;
        frame
            .validate()
            .map_err(|e| FocusError::InvalidFrame(e.to_string()))?;

        if let Some(last) = self.processor.last_report() {
            if frame.timestamp < last.timestamp {
                let e = ValidationError::TimestampRegression {
                    previous: last.timestamp,
                    current: frame.timestamp,
                };
                return Err(FocusError::InvalidFrame(e.to_string()));
            }
        }

        if let Some(command) = frame.command {
            post_command(&self.events, command);
        }
        let inbox = self.events.take();
        if inbox.quit {
            return Err(FocusError::SourceFailed("session was quit".to_string()));
        }

        let timed = FrameAdapter::to_timed_frame(&frame);
        let report = self
            .processor
            .process_frame(&timed.frame, timed.timestamp, inbox);
        Ok(serde_json::to_string(&report)?)
    }
}

/// Create a new focus session.
///
/// # Safety
/// - `config_toml` must be a valid null-terminated C string or NULL for defaults.
/// - Returns a pointer to a newly allocated session handle.
/// - Must be freed with `focus_processor_free`.
/// - Returns NULL on error; call `focus_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn focus_processor_new(
    config_toml: *const c_char,
) -> *mut FocusProcessorHandle {
    clear_last_error();

    let config = match config_from_cstr(config_toml) {
        Ok(config) => config,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    match FocusProcessor::new(config) {
        Ok(processor) => Box::into_raw(Box::new(FocusProcessorHandle {
            processor,
            events: UiEvents::new(),
        })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a focus session.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `focus_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn focus_processor_free(processor: *mut FocusProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Process one focus.landmark_frame.v1 JSON frame and return its report JSON.
///
/// Commands posted since the previous frame, plus any command embedded in the
/// frame itself, are applied to this frame.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `focus_processor_new`.
/// - `frame_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `focus_free_string`.
/// - Returns NULL on error (including after a quit request); call
///   `focus_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn focus_processor_process_frame(
    processor: *mut FocusProcessorHandle,
    frame_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(frame_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid frame string pointer");
            return ptr::null_mut();
        }
    };

    match handle.process_frame_json(&json_str) {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Post a UI command ("continue", "end", "recalibrate" or "quit").
///
/// The command takes effect on the next processed frame.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `focus_processor_new`.
/// - `command` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `focus_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn focus_processor_post_command(
    processor: *mut FocusProcessorHandle,
    command: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &*processor;

    let command_str = match cstr_to_string(command) {
        Some(s) => s,
        None => {
            set_last_error("Invalid command string pointer");
            return -1;
        }
    };

    match command_str.parse::<RawCommand>() {
        Ok(command) => {
            post_command(&handle.events, command);
            0
        }
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Build the session record JSON for everything processed so far.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `focus_processor_new`.
/// - Returns a newly allocated string that must be freed with `focus_free_string`.
/// - Returns NULL on error; call `focus_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn focus_processor_finish(
    processor: *mut FocusProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    match handle.processor.finish().to_json() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Focus functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Focus function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn focus_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Focus function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn focus_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Focus library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn focus_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
