use std::ffi::{c_char, CStr, CString};
use std::path::PathBuf;
use std::sync::Mutex;

use once_cell::sync::Lazy;

use crate::pipeline::{Overrides, PipelineConfig, TranslationPipeline};
use crate::progress::ConsoleProgress;

static LAST_ERROR: Lazy<Mutex<Option<CString>>> = Lazy::new(|| Mutex::new(None));

fn set_last_error(msg: &str) {
    let c = CString::new(msg.replace('\0', " ")).unwrap_or_default();
    let mut guard = LAST_ERROR.lock().unwrap_or_else(|e| e.into_inner());
    *guard = Some(c);
}

fn clear_last_error() {
    let mut guard = LAST_ERROR.lock().unwrap_or_else(|e| e.into_inner());
    *guard = None;
}

fn take_cstr(ptr: *const c_char, name: &str) -> Result<String, String> {
    if ptr.is_null() {
        return Err(format!("{name} is null"));
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map(|s| s.to_string())
        .map_err(|_| format!("{name} is not valid UTF-8"))
}

fn take_optional_path(ptr: *const c_char, name: &str) -> Result<Option<PathBuf>, String> {
    if ptr.is_null() {
        return Ok(None);
    }
    take_cstr(ptr, name).map(|s| Some(PathBuf::from(s)))
}

/// Translate a text file using `large-file-translator.toml` settings.
///
/// `input_path` / `output_path` may be null to use the values from the config file.
/// Returns 0 on success; non-zero on failure (see `lft_last_error_utf8()`).
///
/// # Safety
/// Non-null pointers must point to NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn lft_translate_file(
    config_path: *const c_char,
    input_path: *const c_char,
    output_path: *const c_char,
) -> i32 {
    clear_last_error();
    let cfg_path = match take_cstr(config_path, "config_path") {
        Ok(v) => PathBuf::from(v),
        Err(e) => {
            set_last_error(&e);
            return 2;
        }
    };
    let input = match take_optional_path(input_path, "input_path") {
        Ok(v) => v,
        Err(e) => {
            set_last_error(&e);
            return 3;
        }
    };
    let output = match take_optional_path(output_path, "output_path") {
        Ok(v) => v,
        Err(e) => {
            set_last_error(&e);
            return 4;
        }
    };

    let overrides = Overrides {
        input_file: input,
        output_file: output,
        ..Default::default()
    };
    let cfg = match PipelineConfig::from_file_and_overrides(Some(cfg_path), overrides) {
        Ok(v) => v,
        Err(err) => {
            set_last_error(&format!("{err:#}"));
            return 10;
        }
    };

    let progress = ConsoleProgress::new(false);
    let mut pipeline = match TranslationPipeline::connect(cfg, progress) {
        Ok(p) => p,
        Err(err) => {
            set_last_error(&err.to_string());
            return 10;
        }
    };
    match pipeline.run() {
        Ok(_) => 0,
        Err(err) => {
            set_last_error(&err.to_string());
            11
        }
    }
}

/// Returns the last error message as a UTF-8 C string pointer (or null if none).
/// The pointer is valid until the next `lft_translate_file` call.
#[no_mangle]
pub extern "C" fn lft_last_error_utf8() -> *const c_char {
    let guard = LAST_ERROR.lock().unwrap_or_else(|e| e.into_inner());
    match guard.as_ref() {
        Some(s) => s.as_ptr(),
        None => std::ptr::null(),
    }
}
