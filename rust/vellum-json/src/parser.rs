//! The document-owning [`Context`]: single-pass recursive-descent parsing plus the
//! tree-building and lookup operations exposed at the crate's API surface.
//!
//! Mirrors the reference library's `json_ctx`: one type owns the node arena, the
//! input buffer, and the cursor/error/depth state that the parser and the explicit
//! insertion API share. Unlike the reference, the buffer is owned (`Vec<u8>`)
//! rather than borrowed from the caller — this sidesteps the "caller must not
//! free or reuse the buffer" contract entirely, since the `Context` is the only
//! thing that can touch it once parsing starts.

use crate::config::{Allocation, Limits};
use crate::error::{JsonError, StringErrorReason};
use crate::numeric::atonum::{self, NumberValue};
use crate::tree::{Node, NodeId, NodeKind, Text, Tree};

/// Owns a parsed (or in-progress) document: the node arena, the buffer parsed
/// nodes' `String`/key spans point into, and the cursor/error state left behind
/// by the last `parse` call.
pub struct Context {
    tree: Tree,
    buf: Vec<u8>,
    root: Option<NodeId>,
    pos: usize,
    depth: usize,
    decode: bool,
    err: Option<JsonError>,
    limits: Limits,
}

impl Context {
    pub fn new(limits: Limits, allocation: Allocation) -> Self {
        Context {
            tree: Tree::new(allocation),
            buf: Vec::new(),
            root: None,
            pos: 0,
            depth: 0,
            decode: false,
            err: None,
            limits,
        }
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self::new(limits, Allocation::default())
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// The byte offset parsing stopped at: the offending byte on error, or the
    /// position just past the accepted value on success.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn err(&self) -> Option<&JsonError> {
        self.err.as_ref()
    }

    pub fn nused(&self) -> usize {
        self.tree.nused()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        self.tree.node(id)
    }

    pub fn buf(&self) -> &[u8] {
        &self.buf
    }

    /// Resolves a [`Text`] (borrowed key or string value) to a `str`, slicing this
    /// context's buffer for `Text::Span`.
    ///
    /// # Panics
    /// Panics if `text` is a `Span` produced by a different buffer than the one
    /// currently owned by this context, or if the span is not valid UTF-8 — both
    /// are internal invariant violations, never a consequence of untrusted input.
    pub fn text<'a>(&'a self, text: &'a Text) -> &'a str {
        match text {
            Text::Owned(s) => s.as_str(),
            Text::Span(start, end) => std::str::from_utf8(&self.buf[*start..*end])
                .expect("parsed span is not valid UTF-8"),
        }
    }

    /// Parses `buf` as a single JSON document, consuming it: escape sequences are
    /// decoded in place, and surviving `String`/key nodes hold byte-range views
    /// into the buffer this context now owns.
    ///
    /// `decode` selects whether `\uXXXX` escapes are transcoded to UTF-8 or passed
    /// through unchanged (see [`crate::tree::Text`] and §4.6 of the design).
    ///
    /// On success, returns the root node id. On failure, `self.err()` and
    /// `self.pos()` describe the failure, and whatever partial tree was built
    /// before it is retained — the caller may still inspect it.
    pub fn parse(&mut self, buf: Vec<u8>, decode: bool) -> Result<NodeId, JsonError> {
        self.buf = buf;
        self.decode = decode;
        self.pos = 0;
        self.depth = 0;
        match self.get_value(None, None) {
            Ok(id) => {
                self.root = Some(id);
                self.err = None;
                Ok(id)
            }
            Err(e) => {
                self.err = Some(e.clone());
                Err(e)
            }
        }
    }

    fn add_node(
        &mut self,
        parent: Option<NodeId>,
        kind: NodeKind,
        key: Option<Text>,
    ) -> Result<NodeId, JsonError> {
        self.tree.add_last(parent, kind, key, &self.limits)
    }

    fn skip_ws(&mut self) {
        while matches!(self.buf.get(self.pos), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    fn get_value(&mut self, parent: Option<NodeId>, key: Option<Text>) -> Result<NodeId, JsonError> {
        self.skip_ws();
        match self.buf.get(self.pos).copied() {
            None => Err(JsonError::Incomplete { pos: self.pos }),
            Some(b'{') => self.get_object(parent, key),
            Some(b'[') => self.get_array(parent, key),
            Some(b'"') => self.get_string(parent, key),
            Some(b'-' | b'0'..=b'9') => self.get_number(parent, key),
            Some(b't') => self.get_literal(parent, key, b"true", NodeKind::Bool(true)),
            Some(b'f') => self.get_literal(parent, key, b"false", NodeKind::Bool(false)),
            Some(b'n') => self.get_literal(parent, key, b"null", NodeKind::Dummy),
            Some(found) => Err(JsonError::Unexpected { pos: self.pos, found }),
        }
    }

    fn get_object(&mut self, parent: Option<NodeId>, key: Option<Text>) -> Result<NodeId, JsonError> {
        self.depth += 1;
        if self.depth > self.limits.max_depth {
            return Err(JsonError::Depth {
                pos: self.pos,
                limit: self.limits.max_depth,
            });
        }
        let id = self.add_node(parent, NodeKind::Object, key)?;
        self.pos += 1;
        loop {
            match self.get_key()? {
                None => {
                    self.pos += 1;
                    self.depth -= 1;
                    return Ok(id);
                }
                Some(member_key) => {
                    self.get_value(Some(id), Some(member_key))?;
                    self.skip_ws();
                    match self.buf.get(self.pos).copied() {
                        Some(b',') => self.pos += 1,
                        Some(b'}') => {
                            self.pos += 1;
                            self.depth -= 1;
                            return Ok(id);
                        }
                        Some(found) => return Err(JsonError::Unexpected { pos: self.pos, found }),
                        None => return Err(JsonError::Incomplete { pos: self.pos }),
                    }
                }
            }
        }
    }

    fn get_array(&mut self, parent: Option<NodeId>, key: Option<Text>) -> Result<NodeId, JsonError> {
        self.depth += 1;
        if self.depth > self.limits.max_depth {
            return Err(JsonError::Depth {
                pos: self.pos,
                limit: self.limits.max_depth,
            });
        }
        let id = self.add_node(parent, NodeKind::Array, key)?;
        self.pos += 1;
        self.skip_ws();
        if self.buf.get(self.pos) == Some(&b']') {
            self.pos += 1;
            self.depth -= 1;
            return Ok(id);
        }
        loop {
            self.get_value(Some(id), None)?;
            self.skip_ws();
            match self.buf.get(self.pos).copied() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    self.depth -= 1;
                    return Ok(id);
                }
                Some(found) => return Err(JsonError::Unexpected { pos: self.pos, found }),
                None => return Err(JsonError::Incomplete { pos: self.pos }),
            }
        }
    }

    /// Skips whitespace, then reads a member key up to and including its `:`
    /// separator. Returns `None` (without consuming) if a `}` is seen first — the
    /// empty-object case.
    fn get_key(&mut self) -> Result<Option<Text>, JsonError> {
        self.skip_ws();
        match self.buf.get(self.pos).copied() {
            Some(b'"') => {
                self.pos += 1;
                let (start, end) = self.parse_string()?;
                self.skip_ws();
                match self.buf.get(self.pos).copied() {
                    Some(b':') => {
                        self.pos += 1;
                        Ok(Some(Text::Span(start, end)))
                    }
                    Some(found) => Err(JsonError::Unexpected { pos: self.pos, found }),
                    None => Err(JsonError::Incomplete { pos: self.pos }),
                }
            }
            Some(b'}') => Ok(None),
            Some(found) => Err(JsonError::Unexpected { pos: self.pos, found }),
            None => Err(JsonError::Incomplete { pos: self.pos }),
        }
    }

    fn get_string(&mut self, parent: Option<NodeId>, key: Option<Text>) -> Result<NodeId, JsonError> {
        self.pos += 1;
        let (start, end) = self.parse_string()?;
        self.add_node(parent, NodeKind::String(Text::Span(start, end)), key)
    }

    fn get_number(&mut self, parent: Option<NodeId>, key: Option<Text>) -> Result<NodeId, JsonError> {
        let start = self.pos;
        let result = atonum::atonum(&self.buf[start..], self.limits.max_exp_abs)
            .map_err(|offset| JsonError::Number { pos: start + offset })?;
        let kind = match result.value {
            NumberValue::Integer(i) => NodeKind::Integer(i),
            NumberValue::Double(d) => NodeKind::Double(d),
            NumberValue::Overflow => NodeKind::String(Text::Span(start, start + result.consumed)),
        };
        self.pos = start + result.consumed;
        self.add_node(parent, kind, key)
    }

    fn get_literal(
        &mut self,
        parent: Option<NodeId>,
        key: Option<Text>,
        token: &[u8],
        kind: NodeKind,
    ) -> Result<NodeId, JsonError> {
        if self.buf[self.pos..].len() < token.len() || &self.buf[self.pos..self.pos + token.len()] != token {
            let found = self.buf.get(self.pos).copied().unwrap_or(0);
            return Err(JsonError::Unexpected { pos: self.pos, found });
        }
        let id = self.add_node(parent, kind, key)?;
        self.pos += token.len();
        Ok(id)
    }

    /// Unescapes the string starting right after the opening quote (already
    /// consumed by the caller) in place, returning the `[start, end)` byte range
    /// of the decoded text within `self.buf`.
    fn parse_string(&mut self) -> Result<(usize, usize), JsonError> {
        let start = self.pos;
        let mut write = self.pos;
        loop {
            if write - start > self.limits.max_string_len {
                return Err(JsonError::String {
                    pos: self.pos,
                    reason: StringErrorReason::TooLong,
                });
            }
            match self.buf.get(self.pos).copied() {
                None => {
                    return Err(JsonError::String {
                        pos: self.pos,
                        reason: StringErrorReason::Unterminated,
                    })
                }
                Some(b'"') => {
                    self.pos += 1;
                    return Ok((start, write));
                }
                Some(b'\\') => {
                    self.pos += 1;
                    match self.buf.get(self.pos).copied() {
                        Some(b @ (b'\\' | b'/' | b'"')) => {
                            self.buf[write] = b;
                            write += 1;
                            self.pos += 1;
                        }
                        Some(b'b') => {
                            self.buf[write] = 0x08;
                            write += 1;
                            self.pos += 1;
                        }
                        Some(b'f') => {
                            self.buf[write] = 0x0C;
                            write += 1;
                            self.pos += 1;
                        }
                        Some(b'n') => {
                            self.buf[write] = b'\n';
                            write += 1;
                            self.pos += 1;
                        }
                        Some(b'r') => {
                            self.buf[write] = b'\r';
                            write += 1;
                            self.pos += 1;
                        }
                        Some(b't') => {
                            self.buf[write] = b'\t';
                            write += 1;
                            self.pos += 1;
                        }
                        Some(b'u') => {
                            if !self.decode {
                                // Leave the whole `\uXXXX` escape untouched: write
                                // the backslash now, and leave `self.pos` on the
                                // `u` so the next iteration copies it (and the
                                // following hex digits) through as plain bytes.
                                self.buf[write] = b'\\';
                                write += 1;
                            } else {
                                self.pos += 1;
                                let cp = self.decode_unicode_escape()?;
                                write = self.emit_utf8(write, cp);
                            }
                        }
                        Some(_) => {
                            return Err(JsonError::String {
                                pos: self.pos,
                                reason: StringErrorReason::BadEscape,
                            })
                        }
                        None => {
                            return Err(JsonError::String {
                                pos: self.pos,
                                reason: StringErrorReason::Unterminated,
                            })
                        }
                    }
                }
                Some(b) => {
                    self.buf[write] = b;
                    write += 1;
                    self.pos += 1;
                }
            }
        }
    }

    /// Reads exactly 4 hex digits at the cursor into a codepoint, advancing past
    /// them. If the cursor is a high surrogate, also consumes a following
    /// `\uXXXX` low surrogate and combines the pair.
    ///
    /// Uses the standard Unicode convention (`0xD800..=0xDBFF` high, first;
    /// `0xDC00..=0xDFFF` low, second) — the reference implementation has these
    /// inverted, a source quirk this rewrite does not preserve (see DESIGN.md).
    fn decode_unicode_escape(&mut self) -> Result<u32, JsonError> {
        let cp = self.read_hex4()?;
        if (0xD800..=0xDBFF).contains(&cp) {
            if self.buf.get(self.pos).copied() != Some(b'\\')
                || self.buf.get(self.pos + 1).copied() != Some(b'u')
            {
                return Err(JsonError::String {
                    pos: self.pos,
                    reason: StringErrorReason::UnpairedSurrogate,
                });
            }
            self.pos += 2;
            let low = self.read_hex4()?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(JsonError::String {
                    pos: self.pos,
                    reason: StringErrorReason::UnpairedSurrogate,
                });
            }
            Ok(0x10000 + ((cp - 0xD800) << 10) + (low - 0xDC00))
        } else if (0xDC00..=0xDFFF).contains(&cp) {
            Err(JsonError::String {
                pos: self.pos,
                reason: StringErrorReason::UnpairedSurrogate,
            })
        } else {
            Ok(cp)
        }
    }

    fn read_hex4(&mut self) -> Result<u32, JsonError> {
        if self.pos + 4 > self.buf.len() {
            return Err(JsonError::String {
                pos: self.pos,
                reason: StringErrorReason::TruncatedUnicodeEscape,
            });
        }
        let mut cp = 0u32;
        for i in 0..4 {
            let digit = (self.buf[self.pos + i] as char).to_digit(16).ok_or(JsonError::String {
                pos: self.pos + i,
                reason: StringErrorReason::InvalidUnicodeEscape,
            })?;
            cp = (cp << 4) | digit;
        }
        self.pos += 4;
        Ok(cp)
    }

    fn emit_utf8(&mut self, write: usize, cp: u32) -> usize {
        let ch = char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER);
        let mut tmp = [0u8; 4];
        let encoded = ch.encode_utf8(&mut tmp);
        self.buf[write..write + encoded.len()].copy_from_slice(encoded.as_bytes());
        write + encoded.len()
    }

    // -- Tree-building API (§4.5), delegated to the arena with this context's
    //    configured limits. ----------------------------------------------------

    pub fn add_first(
        &mut self,
        parent: Option<NodeId>,
        kind: NodeKind,
        key: Option<&str>,
    ) -> Result<NodeId, JsonError> {
        self.tree
            .add_first(parent, kind, key.map(Text::owned), &self.limits)
    }

    pub fn add_last(
        &mut self,
        parent: Option<NodeId>,
        kind: NodeKind,
        key: Option<&str>,
    ) -> Result<NodeId, JsonError> {
        self.tree
            .add_last(parent, kind, key.map(Text::owned), &self.limits)
    }

    pub fn add_after(
        &mut self,
        anchor: NodeId,
        kind: NodeKind,
        key: Option<&str>,
    ) -> Result<NodeId, JsonError> {
        self.tree
            .add_after(anchor, kind, key.map(Text::owned), &self.limits)
    }

    pub fn add_before(
        &mut self,
        anchor: NodeId,
        kind: NodeKind,
        key: Option<&str>,
    ) -> Result<NodeId, JsonError> {
        self.tree
            .add_before(anchor, kind, key.map(Text::owned), &self.limits)
    }

    /// Removes `id` and its descendants. If `id` was the root, clears it.
    pub fn remove_node(&mut self, id: NodeId) -> usize {
        let removed = self.tree.remove(id);
        if self.root == Some(id) {
            self.root = None;
        }
        removed
    }

    pub fn get_node(&self, parent: NodeId, key: &str) -> Option<NodeId> {
        if !self.tree.node(parent).kind.is_container() {
            return None;
        }
        let mut cur = self.tree.node(parent).first_child;
        while let Some(id) = cur {
            if let Some(k) = &self.tree.node(id).key {
                if self.text(k) == key {
                    return Some(id);
                }
            }
            cur = self.tree.node(id).next;
        }
        None
    }

    pub fn get_element(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.tree.get_element(parent, index)
    }

    pub fn count_elements(&self, parent: NodeId) -> Result<usize, JsonError> {
        self.tree.count_elements(parent)
    }
}
