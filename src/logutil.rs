//! Helpers for writing radio-supplied text into log records.
//!
//! Message text arrives from arbitrary mesh nodes, so it may contain newlines or
//! control characters that would split or corrupt a log line. Everything that
//! originates on the mesh goes through [`escape_log`] or [`preview`] first.
use std::fmt::Write;

const MAX_ESCAPED_CHARS: usize = 300;

/// Escape a string for single-line logging:
/// - `\n` => `\\n`
/// - `\r` => `\\r`
/// - `\t` => `\\t`
/// - backslash => `\\\\`
/// - other control characters => `\xNN`
///
/// Strings longer than 300 characters are cut with an ellipsis.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_ESCAPED_CHARS) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_ESCAPED_CHARS {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Escaped preview of at most `max_bytes` of `input`, cut on a char boundary and
/// suffixed with `...` when shortened.
pub fn preview(input: &str, max_bytes: usize) -> String {
    if input.len() <= max_bytes {
        return escape_log(input);
    }
    let mut cut = max_bytes.saturating_sub(3);
    while cut > 0 && !input.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut out = escape_log(&input[..cut]);
    out.push_str("...");
    out
}

/// Lowercase hex of the first `max` bytes, for frame tracing.
pub fn hex_snippet(data: &[u8], max: usize) -> String {
    let mut out = String::with_capacity(max.min(data.len()) * 2);
    for b in data.iter().take(max) {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
