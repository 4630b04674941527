use std::os::raw::c_char;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use pa_align::normalize::to_display;
use pa_align::{AlignEngine, PairResult, RenderedPair, RenderedSide};
use pa_core::{MatchSpan, Selection};

use crate::marshal::{cstring_to_str, deserialize_json, to_json};
use crate::result::PaResult;

/// Filter used when neither an explicit directive nor `RUST_LOG` is given.
const DEFAULT_FILTER: &str = "info";

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PairRequest {
    d1_text: String,
    d2_text: String,
    #[serde(default)]
    annotations: Vec<(String, String)>,
}

#[derive(Debug, Serialize)]
struct PairResponse {
    #[serde(flatten)]
    pair: PairResult,
    rendered: RenderedPair,
}

#[derive(Debug, Deserialize)]
struct RenderRequest {
    text: String,
    #[serde(default)]
    spans: Vec<MatchSpan>,
}

/// Unwrap `Ok` or return a failure envelope from the enclosing function.
macro_rules! try_ffi {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => return PaResult::failure(&e),
        }
    };
}

// ---------------------------------------------------------------------------
// Memory management
// ---------------------------------------------------------------------------

/// Free a `PaResult` that was returned by any `paraanno_*` function.
///
/// Passing a null pointer is a no-op.
///
/// # Safety
///
/// `ptr` must be either null or a valid pointer that was previously returned
/// by one of the `paraanno_*` functions and has not yet been freed.
#[no_mangle]
pub unsafe extern "C" fn paraanno_free(ptr: *mut PaResult) {
    PaResult::free(ptr);
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Install a `tracing` subscriber writing to stderr.
///
/// `filter` is an `EnvFilter` directive such as `"pa_batch=debug"`. When it
/// is null, `RUST_LOG` is used, falling back to `info`. Only the first call
/// in a process succeeds.
///
/// # Safety
///
/// `filter` must be null or a valid, null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn paraanno_init_logging(filter: *const c_char) -> *mut PaResult {
    let filter = if filter.is_null() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    } else {
        let directive = try_ffi!(cstring_to_str(filter));
        try_ffi!(EnvFilter::try_new(&directive)
            .map_err(|e| format!("invalid log filter {:?}: {}", directive, e)))
    };

    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        Ok(()) => {
            tracing::info!("logging initialized");
            PaResult::success("{}")
        }
        Err(e) => PaResult::failure(&format!("logging already initialized: {}", e)),
    }
}

// ---------------------------------------------------------------------------
// Core operations
// ---------------------------------------------------------------------------

/// Normalize raw subtitle text to its display form.
///
/// The `data` field holds the display text as a JSON string.
///
/// # Safety
///
/// `text` must be a valid, non-null, null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn paraanno_to_display(text: *const c_char) -> *mut PaResult {
    let raw = try_ffi!(cstring_to_str(text));
    PaResult::success(&try_ffi!(to_json(&to_display(&raw))))
}

/// Project the selections of one document pair and render both sides.
///
/// `json` is `{"d1_text": str, "d2_text": str, "annotations": [[seg1, seg2]]}`.
/// The `data` field holds the `PairResult` fields plus a `rendered` object
/// with the highlight runs of each side.
///
/// # Safety
///
/// `json` must be a valid, non-null, null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn paraanno_process_pair(json: *const c_char) -> *mut PaResult {
    let input = try_ffi!(cstring_to_str(json));
    let request: PairRequest = try_ffi!(deserialize_json(&input, "pair"));

    let selections: Vec<Selection> = request
        .annotations
        .into_iter()
        .map(|(seg1, seg2)| Selection::new(seg1, seg2))
        .collect();

    let engine = AlignEngine::default();
    let pair = engine.process_pair(&request.d1_text, &request.d2_text, &selections);
    let rendered = engine.render_pair(&pair);

    PaResult::success(&try_ffi!(to_json(&PairResponse { pair, rendered })))
}

/// Merge `(offset, length)` spans over a display text into highlight runs.
///
/// `json` is `{"text": str, "spans": [[offset, length]]}`. Sentinel pairs
/// `[0,0]` and `[1,1]` are ignored. The `data` field holds
/// `{"runs": [...], "min_depth": n, "max_depth": n}`.
///
/// # Safety
///
/// `json` must be a valid, non-null, null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn paraanno_render(json: *const c_char) -> *mut PaResult {
    let input = try_ffi!(cstring_to_str(json));
    let request: RenderRequest = try_ffi!(deserialize_json(&input, "render"));

    let rendered: RenderedSide = AlignEngine::default().render(&request.text, &request.spans);
    PaResult::success(&try_ffi!(to_json(&rendered)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
