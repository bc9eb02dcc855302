use std::sync::LazyLock;

use realtime::{Error, decode_error};
use regex::Regex;

// Any callback name up to the first `(`, then everything to the final `)` or `);`.
static JSONP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^[^(]+\((.*)\);?$").expect("JSONP pattern should compile"));

/// Strips a script-callback wrapper (`callback([...]);`) from a feed body,
/// returning the inner JSON text.
///
/// # Errors
///
/// Returns [`Error::Decode`] when the body is not wrapped in a callback.
pub fn unwrap_jsonp(body: &str) -> Result<&str, Error> {
    let trimmed = body.trim();
    JSONP
        .captures(trimmed)
        .and_then(|captures| captures.get(1))
        .map(|inner| inner.as_str())
        .ok_or_else(|| {
            let preview: String = trimmed.chars().take(40).collect();
            decode_error!("response is not a JSONP callback: {:?}", preview)
        })
}
