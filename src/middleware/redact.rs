//! Header flattening and redaction for log output.

use std::collections::BTreeMap;

use http::HeaderMap;

/// Headers whose values never reach a log. Matched case-insensitively.
pub const REDACTED_HEADERS: [&str; 3] = ["authorization", "cookie", "set-cookie"];

/// What a redacted value is replaced with.
pub const REDACTION_MASK: &str = "***";

/// Flattens `headers` into one display string per lower-cased name.
///
/// A single value is kept as is; repeated values render as `[a], [b]`.
/// Values of [`REDACTED_HEADERS`] become [`REDACTION_MASK`] however many there
/// were. Bytes that are not UTF-8 are rendered lossily.
pub fn redact_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();

    for key in headers.keys() {
        let name = key.as_str().to_ascii_lowercase();
        let values: Vec<_> = headers
            .get_all(key)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()))
            .collect();

        let display = match values.as_slice() {
            [] => continue,
            [single] => single.to_string(),
            many => format!("[{}]", many.join("], [")),
        };

        let display = if is_redacted(&name) { REDACTION_MASK.to_owned() } else { display };
        out.insert(name, display);
    }

    out
}

fn is_redacted(name: &str) -> bool {
    REDACTED_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name))
}
