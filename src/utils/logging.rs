use serde::Serialize;

/// Max characters of a raw backend body kept in errors and logs.
pub const BODY_PREVIEW_CHARS: usize = 300;

/// Runs `log_action` with `value` pretty-printed, only when DEBUG is enabled.
pub(crate) fn with_pretty_json_debug<T, F>(value: &T, log_action: F)
where
    T: Serialize + ?Sized,
    F: FnOnce(&str),
{
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    let pretty_json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|error| format!("<pretty serialize failed: {error}>"));
    log_action(pretty_json.as_str());
}

/// Lossy UTF-8 view of `bytes`, cut to [`BODY_PREVIEW_CHARS`] characters.
pub(crate) fn body_preview(bytes: &[u8]) -> String {
    let raw = String::from_utf8_lossy(bytes);
    match raw.char_indices().nth(BODY_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...<truncated>", &raw[..idx]),
        None => raw.into_owned(),
    }
}
