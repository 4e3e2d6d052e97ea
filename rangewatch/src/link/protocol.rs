//! Reading wire format.
//!
//! One reading per line: decimal digits (optionally signed) followed by a
//! newline. Decoding takes the leading integer of the line, which keeps
//! the receiver compatible with senders that pad their frames with
//! trailing bytes.

/// Encode one reading as a newline-terminated decimal string.
pub fn encode_reading(value: i64) -> String {
    format!("{value}\n")
}

/// Decode the leading integer of one received line.
///
/// Leading whitespace is skipped; `None` when the line carries no digits.
pub fn parse_reading(line: &str) -> Option<i64> {
    let trimmed = line.trim_start();
    let bytes = trimmed.as_bytes();

    let mut end = usize::from(bytes.first() == Some(&b'-'));
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }

    let digits = &trimmed[..end];
    if digits.is_empty() || digits == "-" {
        return None;
    }
    digits.parse().ok()
}
