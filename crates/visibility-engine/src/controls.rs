//! Restrict the visibility plugin's settings to controls a cached edge can honour.
//!
//! Only date/time rules can be turned into scheduled purges. Controls that
//! depend on the individual request (cookies, location, user role, ...) would
//! be frozen into whatever page the edge cached first, so they are forced off
//! in both the defaults and the saved settings.

use serde_json::Value;

/// Controls forced off regardless of saved settings.
pub const DISABLED_CONTROLS: &[&str] = &[
    "browser_device",
    "cookie",
    "hide_block",
    "location",
    "metadata",
    "query_string",
    "referral_source",
    "screen_size",
    "url_path",
    "visibility_by_role",
    "visibility_presets",
    "edd",
    "woocommerce",
    "wp_fusion",
    "acf",
];

/// Set `visibility_controls.<name>.enable = false` for every disabled
/// control present in `settings`.
///
/// Entries that are missing or not objects are left alone, as is any
/// document without a `visibility_controls` object.
pub fn restrict_visibility_controls(mut settings: Value) -> Value {
    if let Some(controls) = settings
        .get_mut("visibility_controls")
        .and_then(Value::as_object_mut)
    {
        for name in DISABLED_CONTROLS {
            if let Some(control) = controls.get_mut(*name).and_then(Value::as_object_mut) {
                control.insert("enable".to_string(), Value::Bool(false));
            }
        }
    }

    settings
}
