//! Human-readable rendering of a [`JsonError`] against the buffer that produced it.
//!
//! This is presentation only: nothing in `parser` or `serializer` calls into this
//! module, and it never changes control flow. It exists for CLI and tooling
//! callers that want more than `thiserror`'s terse one-line `Display` impl — a
//! source excerpt with a caret under the offending byte.

use crate::error::JsonError;

/// Renders `err` as a source excerpt with a caret under the byte at `err.pos()`,
/// or falls back to `err`'s own `Display` message for errors with no position
/// (structural errors raised outside of scanning, such as [`JsonError::NotAContainer`]).
///
/// The excerpt is the single line of `buf` containing the offending byte, with
/// tabs expanded to a single space so the caret lines up in a monospace terminal.
pub fn render(err: &JsonError, buf: &[u8]) -> String {
    let Some(pos) = err.pos() else {
        return err.to_string();
    };
    let pos = pos.min(buf.len());
    let line_start = buf[..pos].iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
    let line_end = buf[pos..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(buf.len(), |i| pos + i);

    let line = String::from_utf8_lossy(&buf[line_start..line_end]);
    let column = pos - line_start;
    let caret_prefix: String = line
        .chars()
        .take(column)
        .map(|c| if c == '\t' { ' ' } else { c })
        .collect();

    format!("{err}\n{line}\n{caret_prefix}^", line = line.replace('\t', " "))
}
