use std::ffi::CString;
use std::os::raw::c_char;

/// C-compatible result envelope for all FFI calls.
///
/// Both `data` and `error` are heap-allocated C strings owned by this struct.
/// The caller must free the entire envelope (including the inner strings) by
/// passing the pointer to `paraanno_free`.
#[repr(C)]
pub struct PaResult {
    /// `true` on success, `false` on failure.
    pub ok: bool,
    /// JSON payload on success; null pointer on failure.
    pub data: *mut c_char,
    /// Error message on failure; null pointer on success.
    pub error: *mut c_char,
}

impl PaResult {
    /// Allocate a successful result whose data field holds `json`.
    ///
    /// Ownership passes to the caller, who must eventually call
    /// `paraanno_free`.
    pub fn success(json: &str) -> *mut Self {
        Box::into_raw(Box::new(PaResult {
            ok: true,
            data: to_c_string(json).into_raw(),
            error: std::ptr::null_mut(),
        }))
    }

    /// Allocate a failure result whose error field holds `message`.
    ///
    /// Ownership passes to the caller, who must eventually call
    /// `paraanno_free`.
    pub fn failure(message: &str) -> *mut Self {
        Box::into_raw(Box::new(PaResult {
            ok: false,
            data: std::ptr::null_mut(),
            error: to_c_string(message).into_raw(),
        }))
    }

    /// Reclaim ownership of the inner C strings and the struct itself.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a pointer produced by `PaResult::success` or
    /// `PaResult::failure` that has not been freed already.
    pub unsafe fn free(ptr: *mut Self) {
        if ptr.is_null() {
            return;
        }

        let result = Box::from_raw(ptr);

        if !result.data.is_null() {
            drop(CString::from_raw(result.data));
        }

        if !result.error.is_null() {
            drop(CString::from_raw(result.error));
        }
    }
}

/// Interior NUL bytes cannot cross the boundary; they are dropped.
fn to_c_string(text: &str) -> CString {
    CString::new(text.replace('\0', "")).unwrap_or_default()
}
