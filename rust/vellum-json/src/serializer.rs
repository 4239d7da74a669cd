//! Serializing a document back to JSON text into a caller-supplied buffer.
//!
//! Mirrors the reference library's `print_value`/`print_value_fmt` pair: one pass
//! for compact output, one for indented. Both write directly into the output slice
//! and report [`JsonError::Overflow`] the moment it would run out of room, rather
//! than growing a buffer — this crate's serializer never allocates on the hot path.
//!
//! The indented writer's bracket placement is driven by an explicit `needs_own_line`
//! flag passed down the recursion instead of the reference's trick of inspecting the
//! previously written byte (`*(buf - 1) == ' '`) to decide whether a container's
//! opening brace needs a line of its own. Same output, no dependence on what was
//! written immediately before the call.

use crate::error::JsonError;
use crate::numeric::{dtoa, itoa};
use crate::parser::Context;
use crate::tree::{NodeId, NodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Compact,
    Indented,
}

struct Writer<'a> {
    out: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    fn new(out: &'a mut [u8]) -> Self {
        Writer { out, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.out.len() - self.pos
    }

    fn overflow(&self) -> JsonError {
        JsonError::Overflow {
            capacity: self.out.len(),
        }
    }

    fn push(&mut self, b: u8) -> Result<(), JsonError> {
        if self.remaining() < 1 {
            return Err(self.overflow());
        }
        self.out[self.pos] = b;
        self.pos += 1;
        Ok(())
    }

    fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), JsonError> {
        if self.remaining() < bytes.len() {
            return Err(self.overflow());
        }
        self.out[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    fn push_crlf(&mut self) -> Result<(), JsonError> {
        self.push_bytes(b"\r\n")
    }

    fn push_tabs(&mut self, n: usize) -> Result<(), JsonError> {
        for _ in 0..n {
            self.push(b'\t')?;
        }
        Ok(())
    }
}

const HEX: &[u8; 16] = b"0123456789abcdef";

fn write_escaped_string(w: &mut Writer, s: &str) -> Result<(), JsonError> {
    w.push(b'"')?;
    for &b in s.as_bytes() {
        match b {
            b'\\' | b'"' | b'/' | 0x08 | b'\t' | b'\n' | 0x0C | b'\r' => {
                let esc = match b {
                    0x08 => b'b',
                    0x0C => b'f',
                    b'\n' => b'n',
                    b'\r' => b'r',
                    b'\t' => b't',
                    other => other,
                };
                w.push(b'\\')?;
                w.push(esc)?;
            }
            0x00..=0x1f => {
                w.push_bytes(b"\\u00")?;
                w.push(HEX[((b >> 4) & 0xf) as usize])?;
                w.push(HEX[(b & 0xf) as usize])?;
            }
            other => w.push(other)?,
        }
    }
    w.push(b'"')
}

fn write_number(w: &mut Writer, value: NumberText) -> Result<(), JsonError> {
    match value {
        NumberText::Integer(i) => {
            let mut tmp = [0u8; 20];
            let n = itoa::itoa(i, &mut tmp).ok_or_else(|| w.overflow())?;
            w.push_bytes(&tmp[..n])
        }
        NumberText::Double(d) => {
            let mut tmp = [0u8; 32];
            let n = dtoa::dtoa(d, &mut tmp).ok_or_else(|| w.overflow())?;
            w.push_bytes(&tmp[..n])
        }
    }
}

enum NumberText {
    Integer(i64),
    Double(f64),
}

/// Writes the leaf forms shared verbatim by both styles: `null`, a string, an
/// integer, a double, or a boolean. Containers are handled by the caller, since
/// only they differ between compact and indented output.
fn write_leaf(w: &mut Writer, ctx: &Context, id: NodeId) -> Result<bool, JsonError> {
    match &ctx.node(id).kind {
        NodeKind::Dummy => {
            w.push_bytes(b"null")?;
            Ok(true)
        }
        NodeKind::String(t) => {
            write_escaped_string(w, ctx.text(t))?;
            Ok(true)
        }
        NodeKind::Integer(i) => {
            write_number(w, NumberText::Integer(*i))?;
            Ok(true)
        }
        NodeKind::Double(d) => {
            write_number(w, NumberText::Double(*d))?;
            Ok(true)
        }
        NodeKind::Bool(b) => {
            w.push_bytes(if *b { b"true" } else { b"false" })?;
            Ok(true)
        }
        NodeKind::Object | NodeKind::Array => Ok(false),
    }
}

fn write_value_compact(w: &mut Writer, ctx: &Context, id: NodeId) -> Result<(), JsonError> {
    if write_leaf(w, ctx, id)? {
        return Ok(());
    }
    match ctx.node(id).kind {
        NodeKind::Array => {
            w.push(b'[')?;
            let mut cur = ctx.node(id).first_child;
            let mut first = true;
            while let Some(c) = cur {
                if !first {
                    w.push(b',')?;
                }
                first = false;
                write_value_compact(w, ctx, c)?;
                cur = ctx.node(c).next;
            }
            w.push(b']')
        }
        NodeKind::Object => {
            w.push(b'{')?;
            let mut cur = ctx.node(id).first_child;
            let mut first = true;
            while let Some(c) = cur {
                if !first {
                    w.push(b',')?;
                }
                first = false;
                let key = ctx.node(c).key.as_ref().ok_or(JsonError::NoString)?.clone();
                write_escaped_string(w, ctx.text(&key))?;
                w.push(b':')?;
                write_value_compact(w, ctx, c)?;
                cur = ctx.node(c).next;
            }
            w.push(b'}')
        }
        _ => unreachable!("write_leaf handles every non-container kind"),
    }
}

fn write_value_indented(
    w: &mut Writer,
    ctx: &Context,
    id: NodeId,
    depth: usize,
    needs_own_line: bool,
) -> Result<(), JsonError> {
    if write_leaf(w, ctx, id)? {
        return Ok(());
    }
    match ctx.node(id).kind {
        NodeKind::Array => write_array_indented(w, ctx, id, depth),
        NodeKind::Object => write_object_indented(w, ctx, id, depth, needs_own_line),
        _ => unreachable!("write_leaf handles every non-container kind"),
    }
}

/// Array elements are joined by a bare `,` regardless of style — the reference
/// implementation never indents array elements onto their own lines, only object
/// members. An object element still gets its own indented block, via the
/// `needs_own_line = true` passed down here.
fn write_array_indented(w: &mut Writer, ctx: &Context, id: NodeId, depth: usize) -> Result<(), JsonError> {
    w.push(b'[')?;
    let mut cur = ctx.node(id).first_child;
    if cur.is_none() {
        return w.push(b']');
    }
    let mut first = true;
    while let Some(c) = cur {
        if !first {
            w.push(b',')?;
        }
        first = false;
        write_value_indented(w, ctx, c, depth, true)?;
        cur = ctx.node(c).next;
    }
    w.push(b']')
}

/// A non-empty object always opens with `{` then a CRLF and `depth` tabs before
/// its first member, and an empty object closes right there with no CRLF of its
/// own — the asymmetry with the empty array above is intentional and preserved
/// from the reference implementation.
fn write_object_indented(
    w: &mut Writer,
    ctx: &Context,
    id: NodeId,
    depth: usize,
    needs_own_line: bool,
) -> Result<(), JsonError> {
    // An object at depth 0 never gets a leading CRLF, even as an array element —
    // there is no enclosing object yet to indent relative to. Only once an
    // object is nested inside another object does the "came after a key or
    // not" distinction (`needs_own_line`) start to matter.
    if needs_own_line && depth > 0 {
        w.push_crlf()?;
        w.push_tabs(depth)?;
    }
    w.push(b'{')?;
    w.push_crlf()?;
    w.push_tabs(depth)?;

    let mut cur = match ctx.node(id).first_child {
        Some(c) => c,
        None => return w.push(b'}'),
    };
    loop {
        let key = ctx.node(cur).key.as_ref().ok_or(JsonError::NoString)?.clone();
        write_escaped_string(w, ctx.text(&key))?;
        w.push(b':')?;
        w.push(b' ')?;
        write_value_indented(w, ctx, cur, depth + 1, false)?;
        match ctx.node(cur).next {
            Some(next) => {
                w.push(b',')?;
                w.push_crlf()?;
                w.push_tabs(depth)?;
                cur = next;
            }
            None => break,
        }
    }
    w.push_crlf()?;
    w.push_tabs(depth)?;
    w.push(b'}')
}

impl Context {
    /// Serializes the subtree rooted at `id` into `out`, returning the number of
    /// bytes written. Fails with [`JsonError::Overflow`] the instant `out` would
    /// run out of room, and with [`JsonError::NoString`] if a non-empty object
    /// holds a member with no key (only possible via the tree-building API, since
    /// the parser never produces one).
    pub fn write_to(&self, id: NodeId, out: &mut [u8], style: Style) -> Result<usize, JsonError> {
        let mut w = Writer::new(out);
        match style {
            Style::Compact => write_value_compact(&mut w, self, id)?,
            Style::Indented => write_value_indented(&mut w, self, id, 0, false)?,
        }
        Ok(w.pos)
    }

    /// Convenience wrapper over [`Context::write_to`] that allocates its own
    /// `capacity`-byte buffer and returns the result as a `String`.
    pub fn to_string_style(&self, id: NodeId, style: Style, capacity: usize) -> Result<String, JsonError> {
        let mut buf = vec![0u8; capacity];
        let n = self.write_to(id, &mut buf, style)?;
        buf.truncate(n);
        String::from_utf8(buf).map_err(|_| JsonError::Type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Allocation, Limits};

    fn parse(src: &str) -> Context {
        let mut ctx = Context::new(Limits::default(), Allocation::Heap);
        ctx.parse(src.as_bytes().to_vec(), true).unwrap();
        ctx
    }

    #[test]
    fn compact_round_trips_a_simple_object() {
        let ctx = parse(r#"{"a":1,"b":[1,2,3],"c":"hi","d":true,"e":null}"#);
        let root = ctx.root().unwrap();
        let out = ctx.to_string_style(root, Style::Compact, 256).unwrap();
        assert_eq!(out, r#"{"a":1,"b":[1,2,3],"c":"hi","d":true,"e":null}"#);
    }

    #[test]
    fn compact_escapes_control_characters_and_quotes() {
        let mut ctx = Context::new(Limits::default(), Allocation::Heap);
        let root = ctx.add_first(None, NodeKind::Array, None).unwrap();
        ctx.add_last(Some(root), NodeKind::String(crate::tree::Text::owned("a\"\\\n\tb")), None)
            .unwrap();
        let out = ctx.to_string_style(root, Style::Compact, 64).unwrap();
        assert_eq!(out, r#"["a\"\\\n\tb"]"#);
    }

    #[test]
    fn indented_empty_array_has_no_newline() {
        let ctx = parse("[]");
        let root = ctx.root().unwrap();
        let out = ctx.to_string_style(root, Style::Indented, 64).unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn indented_empty_object_has_crlf_before_the_closing_brace() {
        let ctx = parse("{}");
        let root = ctx.root().unwrap();
        let out = ctx.to_string_style(root, Style::Indented, 64).unwrap();
        assert_eq!(out, "{\r\n}");
    }

    #[test]
    fn indented_object_indents_members_one_tab_per_depth() {
        let ctx = parse(r#"{"a":1,"b":{"c":2}}"#);
        let root = ctx.root().unwrap();
        let out = ctx.to_string_style(root, Style::Indented, 256).unwrap();
        assert_eq!(
            out,
            "{\r\n\"a\": 1,\r\n\"b\": {\r\n\t\"c\": 2\r\n\t}\r\n}"
        );
    }

    #[test]
    fn indented_array_elements_are_comma_joined_without_newlines() {
        let ctx = parse("[1,2,3]");
        let root = ctx.root().unwrap();
        let out = ctx.to_string_style(root, Style::Indented, 64).unwrap();
        assert_eq!(out, "[1,2,3]");
    }

    #[test]
    fn indented_object_at_the_root_array_gets_no_indentation() {
        // An object nested only inside arrays, never inside another object, sits
        // at depth 0 the whole way down — no enclosing object exists to indent
        // relative to, so it prints exactly as it would at the top level.
        let ctx = parse(r#"[{"x":1}]"#);
        let root = ctx.root().unwrap();
        let out = ctx.to_string_style(root, Style::Indented, 128).unwrap();
        assert_eq!(out, "[{\r\n\"x\": 1\r\n}]");
    }

    #[test]
    fn indented_object_inside_an_array_nested_in_an_object_gets_its_own_block() {
        let ctx = parse(r#"{"arr":[{"x":1}]}"#);
        let root = ctx.root().unwrap();
        let out = ctx.to_string_style(root, Style::Indented, 128).unwrap();
        assert_eq!(out, "{\r\n\"arr\": [\r\n\t{\r\n\t\"x\": 1\r\n\t}]\r\n}");
    }

    #[test]
    fn overflow_is_reported_before_any_partial_write_is_trusted() {
        let ctx = parse(r#"{"a":1}"#);
        let root = ctx.root().unwrap();
        let mut out = [0u8; 3];
        let err = ctx.write_to(root, &mut out, Style::Compact).unwrap_err();
        assert!(matches!(err, JsonError::Overflow { .. }));
    }

    #[test]
    fn missing_key_on_a_non_empty_object_is_rejected() {
        let mut ctx = Context::new(Limits::default(), Allocation::Heap);
        let root = ctx.add_first(None, NodeKind::Object, None).unwrap();
        ctx.add_last(Some(root), NodeKind::Integer(1), None).unwrap();
        let mut out = [0u8; 64];
        let err = ctx.write_to(root, &mut out, Style::Compact).unwrap_err();
        assert_eq!(err, JsonError::NoString);
    }
}
