use std::ffi::CStr;
use std::os::raw::c_char;

use serde::de::DeserializeOwned;

/// Serialize `value` to a JSON string for a result envelope.
pub fn to_json(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("serialization failed: {}", e))
}

/// Parse `json` into `T`, naming `what` in the error message.
pub fn deserialize_json<T: DeserializeOwned>(json: &str, what: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("failed to parse {} JSON: {}", what, e))
}

/// Borrow the null-terminated C string at `ptr` and return it as an owned
/// `String`.
///
/// # Safety
///
/// `ptr` must be null or point to a null-terminated string that remains
/// alive for the duration of this call.
///
/// Returns an error string if `ptr` is null or if the bytes are not valid
/// UTF-8.
pub unsafe fn cstring_to_str(ptr: *const c_char) -> Result<String, String> {
    if ptr.is_null() {
        return Err("received null pointer".to_string());
    }

    CStr::from_ptr(ptr)
        .to_str()
        .map(|s| s.to_owned())
        .map_err(|e| format!("invalid UTF-8 in C string: {}", e))
}
