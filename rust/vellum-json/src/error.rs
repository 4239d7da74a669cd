//! The flat error enum surfaced by every fallible operation in this crate.

use std::fmt;

/// Everything that can go wrong while parsing, building, or serializing a document.
///
/// Every variant that can occur while scanning the input buffer carries the byte
/// offset (`pos`) at which the problem was detected, mirroring the scanning
/// context's cursor at the moment of failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JsonError {
    #[error("unexpected end of input at byte {pos}")]
    Incomplete { pos: usize },

    #[error("unexpected byte {found:#04x} at byte {pos}")]
    Unexpected { pos: usize, found: u8 },

    #[error("malformed number at byte {pos}")]
    Number { pos: usize },

    #[error("invalid string at byte {pos}: {reason}")]
    String { pos: usize, reason: StringErrorReason },

    #[error("nesting depth exceeded limit of {limit} at byte {pos}")]
    Depth { pos: usize, limit: usize },

    #[error("node count exceeded limit of {limit}")]
    Nodes { limit: usize },

    /// Reserved for a future comment extension; never produced today.
    #[error("comments are not supported")]
    Comment,

    #[error("node allocation failed")]
    MemAlloc,

    #[error("required pointer argument was null")]
    NullPtr,

    #[error("output buffer of {capacity} bytes is too small")]
    Overflow { capacity: usize },

    #[error("node is not a container (object or array)")]
    NotAContainer,

    #[error("unknown node type during serialization")]
    Type,

    #[error("object member is missing its key")]
    NoString,
}

/// Sub-reasons for [`JsonError::String`], kept separate so callers can match on the
/// coarse `String` variant without losing the specific cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringErrorReason {
    /// The string ran past the end of the buffer without a closing quote.
    Unterminated,
    /// The string's decoded byte length exceeded the configured limit.
    TooLong,
    /// A `\` was followed by a byte that is not a recognized escape.
    BadEscape,
    /// A `\uXXXX` escape had fewer than four hex digits before the buffer ended.
    TruncatedUnicodeEscape,
    /// A `\uXXXX` escape's four bytes were not valid hex digits.
    InvalidUnicodeEscape,
    /// A lone low or high surrogate was not paired correctly.
    UnpairedSurrogate,
}

impl fmt::Display for StringErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            StringErrorReason::Unterminated => "unterminated string",
            StringErrorReason::TooLong => "string exceeds maximum length",
            StringErrorReason::BadEscape => "unrecognized escape sequence",
            StringErrorReason::TruncatedUnicodeEscape => "truncated \\u escape",
            StringErrorReason::InvalidUnicodeEscape => "invalid hex digits in \\u escape",
            StringErrorReason::UnpairedSurrogate => "unpaired UTF-16 surrogate",
        };
        f.write_str(msg)
    }
}

impl JsonError {
    /// The byte offset this error pinpoints, if it has one.
    ///
    /// Structural errors raised during tree building (`NotAContainer`, `Type`, ...)
    /// have no associated cursor position and return `None`.
    pub fn pos(&self) -> Option<usize> {
        match *self {
            JsonError::Incomplete { pos }
            | JsonError::Unexpected { pos, .. }
            | JsonError::Number { pos }
            | JsonError::String { pos, .. }
            | JsonError::Depth { pos, .. } => Some(pos),
            _ => None,
        }
    }
}
