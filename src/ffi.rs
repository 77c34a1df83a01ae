//! FFI bindings for the proof-of-human collector
//!
//! C-compatible functions for embedding the collector in browser extensions, mobile
//! apps and other SDKs. Strings returned by these functions are allocated here and
//! must be released with `proof_free_string`. Fixed-size buffers (nonces, hashes,
//! responses) are passed as raw pointers to 32 bytes.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::slice;

use crate::challenge::{self, CHALLENGE_LEN};
use crate::config::ProofConfig;
use crate::generator::ProofGenerator;
use crate::schema::parse_records;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

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

/// View a caller buffer as a 32-byte block
unsafe fn block<'a>(ptr: *const u8) -> Option<&'a [u8]> {
    if ptr.is_null() {
        return None;
    }
    Some(slice::from_raw_parts(ptr, CHALLENGE_LEN))
}

// ============================================================================
// Generator lifecycle
// ============================================================================

/// Opaque handle to a ProofGenerator
pub struct ProofGeneratorHandle {
    generator: ProofGenerator,
}

/// Create a generator on the wall clock.
///
/// `config_json` may be NULL for default thresholds.
///
/// # Safety
/// - `config_json` must be NULL or a valid null-terminated C string.
/// - Must be freed with `proof_generator_free`.
/// - Returns NULL on error; call `proof_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn proof_generator_new(config_json: *const c_char) -> *mut ProofGeneratorHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        ProofConfig::default()
    } else {
        let json = match cstr_to_string(config_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        };
        match ProofConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    match ProofGenerator::with_config(config) {
        Ok(generator) => Box::into_raw(Box::new(ProofGeneratorHandle { generator })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a generator.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `proof_generator_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn proof_generator_free(handle: *mut ProofGeneratorHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

// ============================================================================
// Recording
// ============================================================================

/// # Safety
/// - `handle` must be a valid pointer returned by `proof_generator_new`, or NULL.
#[no_mangle]
pub unsafe extern "C" fn proof_record_keystroke(
    handle: *mut ProofGeneratorHandle,
    key_down_time: f64,
    key_up_time: f64,
) {
    if let Some(handle) = handle.as_mut() {
        handle.generator.record_keystroke(key_down_time, key_up_time);
    }
}

/// # Safety
/// - `handle` must be a valid pointer returned by `proof_generator_new`, or NULL.
#[no_mangle]
pub unsafe extern "C" fn proof_record_mouse_movement(
    handle: *mut ProofGeneratorHandle,
    x: f64,
    y: f64,
    timestamp: f64,
) {
    if let Some(handle) = handle.as_mut() {
        handle.generator.record_mouse_movement(x, y, timestamp);
    }
}

/// # Safety
/// - `handle` must be a valid pointer returned by `proof_generator_new`, or NULL.
#[no_mangle]
pub unsafe extern "C" fn proof_record_scroll(
    handle: *mut ProofGeneratorHandle,
    delta_y: f64,
    timestamp: f64,
) {
    if let Some(handle) = handle.as_mut() {
        handle.generator.record_scroll(delta_y, timestamp);
    }
}

/// `has_focus` is treated as true when non-zero.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `proof_generator_new`, or NULL.
#[no_mangle]
pub unsafe extern "C" fn proof_record_focus_change(
    handle: *mut ProofGeneratorHandle,
    has_focus: i32,
    timestamp: f64,
) {
    if let Some(handle) = handle.as_mut() {
        handle.generator.record_focus_change(has_focus != 0, timestamp);
    }
}

/// # Safety
/// - `handle` must be a valid pointer returned by `proof_generator_new`, or NULL.
#[no_mangle]
pub unsafe extern "C" fn proof_record_idle_period(
    handle: *mut ProofGeneratorHandle,
    start_time: f64,
    end_time: f64,
) {
    if let Some(handle) = handle.as_mut() {
        handle.generator.record_idle_period(start_time, end_time);
    }
}

/// Replay NDJSON or JSON-array interaction records into the generator.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `proof_generator_new`.
/// - `records` must be a valid null-terminated C string.
/// - Returns the number of records applied, or -1 on error.
#[no_mangle]
pub unsafe extern "C" fn proof_record_batch(
    handle: *mut ProofGeneratorHandle,
    records: *const c_char,
) -> i64 {
    clear_last_error();

    let Some(handle) = handle.as_mut() else {
        set_last_error("Null generator pointer");
        return -1;
    };

    let input = match cstr_to_string(records) {
        Some(s) => s,
        None => {
            set_last_error("Invalid records string pointer");
            return -1;
        }
    };

    match parse_records(&input) {
        Ok(records) => {
            for record in &records {
                record.apply(&mut handle.generator);
            }
            records.len() as i64
        }
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Queries
// ============================================================================

/// # Safety
/// - `handle` must be a valid pointer returned by `proof_generator_new`, or NULL.
/// - Returns 0 for a NULL handle.
#[no_mangle]
pub unsafe extern "C" fn proof_event_count(handle: *const ProofGeneratorHandle) -> u64 {
    handle
        .as_ref()
        .map(|h| h.generator.event_count() as u64)
        .unwrap_or(0)
}

/// # Safety
/// - `handle` must be a valid pointer returned by `proof_generator_new`, or NULL.
/// - Returns 1 when ready, 0 otherwise (including a NULL handle).
#[no_mangle]
pub unsafe extern "C" fn proof_is_ready(handle: *const ProofGeneratorHandle) -> i32 {
    match handle.as_ref() {
        Some(h) if h.generator.is_ready() => 1,
        _ => 0,
    }
}

/// # Safety
/// - `handle` must be a valid pointer returned by `proof_generator_new`, or NULL.
#[no_mangle]
pub unsafe extern "C" fn proof_reset(handle: *mut ProofGeneratorHandle) {
    if let Some(handle) = handle.as_mut() {
        handle.generator.reset();
    }
}

/// Generate the fingerprint as JSON (`{"hash": "<hex>", "metrics": {...}, "confidence": n}`).
///
/// # Safety
/// - `handle` must be a valid pointer returned by `proof_generator_new`.
/// - Returns a newly allocated string that must be freed with `proof_free_string`.
/// - Returns NULL on error; call `proof_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn proof_generate_fingerprint(handle: *const ProofGeneratorHandle) -> *mut c_char {
    clear_last_error();

    let Some(handle) = handle.as_ref() else {
        set_last_error("Null generator pointer");
        return ptr::null_mut();
    };

    let result = handle.generator.generate_fingerprint();
    match serde_json::to_string(&result) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Challenge API (stateless)
// ============================================================================

/// Fill `out` with a fresh 32-byte nonce.
///
/// # Safety
/// - `out` must point to at least 32 writable bytes.
/// - Returns 0 on success, -1 if `out` is NULL.
#[no_mangle]
pub unsafe extern "C" fn proof_generate_nonce(out: *mut u8) -> i32 {
    clear_last_error();

    if out.is_null() {
        set_last_error("Null output buffer");
        return -1;
    }
    let nonce = challenge::generate_challenge_nonce();
    ptr::copy_nonoverlapping(nonce.as_ptr(), out, CHALLENGE_LEN);
    0
}

/// Solve a challenge, writing 32 bytes to `out`.
///
/// # Safety
/// - `nonce` and `fingerprint_hash` must each point to 32 readable bytes.
/// - `out` must point to at least 32 writable bytes.
/// - Returns 0 on success, -1 on error; call `proof_last_error` for details.
#[no_mangle]
pub unsafe extern "C" fn proof_solve_challenge(
    nonce: *const u8,
    fingerprint_hash: *const u8,
    out: *mut u8,
) -> i32 {
    clear_last_error();

    let (Some(nonce), Some(fingerprint_hash)) = (block(nonce), block(fingerprint_hash)) else {
        set_last_error("Null input buffer");
        return -1;
    };
    if out.is_null() {
        set_last_error("Null output buffer");
        return -1;
    }

    match challenge::solve_challenge(nonce, fingerprint_hash) {
        Ok(solution) => {
            ptr::copy_nonoverlapping(solution.as_ptr(), out, CHALLENGE_LEN);
            0
        }
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by this library.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a `proof_*` function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn proof_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next `proof_*` call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn proof_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn proof_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
