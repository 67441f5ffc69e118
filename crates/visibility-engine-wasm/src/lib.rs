//! WASM bindings for the visibility transition evaluator.
//!
//! Exposes the evaluator to JavaScript hosts (edge workers, block editor
//! previews) as plain functions over JSON strings.

use wasm_bindgen::prelude::*;

use visibility_engine::{
    extract_schedules, next_content_transition, parse_blocks, parse_reference_instant,
};

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Next visibility transition of the content, as Unix seconds, or
/// `undefined` when no rule predicts a change.
///
/// `now` is an RFC 3339 datetime; `timezone` an IANA name used to read
/// wall-clock rules. Throws on invalid `now`, `timezone` or JSON.
#[wasm_bindgen(js_name = "nextTransition")]
pub fn next_transition(content_json: &str, now: &str, timezone: &str) -> Result<Option<f64>, JsValue> {
    let now = parse_reference_instant(now, timezone).map_err(to_js_error)?;
    let blocks = parse_blocks(content_json).map_err(to_js_error)?;
    Ok(next_content_transition(&blocks, &now).map(|ts| ts as f64))
}

/// Number of enabled schedules found in the content.
#[wasm_bindgen(js_name = "countSchedules")]
pub fn count_schedules(content_json: &str) -> Result<u32, JsValue> {
    let blocks = parse_blocks(content_json).map_err(to_js_error)?;
    Ok(extract_schedules(&blocks).len() as u32)
}
