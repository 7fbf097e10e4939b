//! Text truncation applied to history entries and prompt payloads.

/// Truncates `text` to at most `max_chars` characters, appending `marker`
/// when anything was cut. Operates on character boundaries so multi-byte
/// content is never split mid-codepoint.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize, marker: &str) -> String {
    let mut iter = text.char_indices();
    match iter.nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => {
            let mut out = String::with_capacity(cut + marker.len());
            out.push_str(&text[..cut]);
            out.push_str(marker);
            out
        }
    }
}
