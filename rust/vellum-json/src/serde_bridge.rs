//! Optional, feature-gated interop with [`serde_json::Value`].
//!
//! This is an escape hatch for callers already standardized on `serde_json`
//! elsewhere in their application, not a replacement for the parser and
//! serializer above: `serde_json` is never used to parse or format JSON text in
//! this crate, only as a conversion target/source at the tree's boundary.

use crate::error::JsonError;
use crate::parser::Context;
use crate::tree::{NodeId, NodeKind, Text};

impl Context {
    /// Converts the subtree rooted at `id` into an owned [`serde_json::Value`].
    ///
    /// An overflowing number (stored as [`NodeKind::String`] because it does not
    /// fit in an `i64` or round-trip through `f64`, see §4.6) is emitted as a
    /// `serde_json::Value::String` of its original digits, since `serde_json` has
    /// no arbitrary-precision number representation enabled by default.
    pub fn to_serde_value(&self, id: NodeId) -> serde_json::Value {
        match &self.node(id).kind {
            NodeKind::Dummy => serde_json::Value::Null,
            NodeKind::Bool(b) => serde_json::Value::Bool(*b),
            NodeKind::Integer(i) => serde_json::Value::Number((*i).into()),
            NodeKind::Double(d) => serde_json::Number::from_f64(*d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            NodeKind::String(t) => serde_json::Value::String(self.text(t).to_string()),
            NodeKind::Array => {
                let mut elems = Vec::new();
                let mut cur = self.node(id).first_child;
                while let Some(c) = cur {
                    elems.push(self.to_serde_value(c));
                    cur = self.node(c).next;
                }
                serde_json::Value::Array(elems)
            }
            NodeKind::Object => {
                let mut map = serde_json::Map::new();
                let mut cur = self.node(id).first_child;
                while let Some(c) = cur {
                    if let Some(key) = &self.node(c).key {
                        map.insert(self.text(key).to_string(), self.to_serde_value(c));
                    }
                    cur = self.node(c).next;
                }
                serde_json::Value::Object(map)
            }
        }
    }
}

/// Builds a subtree under `parent` (or a fresh root, if `parent` is `None`) from
/// `value`, using the same public tree-building operations ([`Context::add_last`]
/// and friends) a caller assembling a document by hand would use.
///
/// A `serde_json::Number` that fits neither `i64` nor `f64` (only reachable with
/// `serde_json`'s `arbitrary_precision` feature enabled downstream) is rejected
/// with [`JsonError::Type`], since this crate's tree has no representation for it
/// short of the string-encoded overflow form the parser itself produces.
pub fn from_serde_value(
    ctx: &mut Context,
    parent: Option<NodeId>,
    key: Option<&str>,
    value: &serde_json::Value,
) -> Result<NodeId, JsonError> {
    match value {
        serde_json::Value::Null => insert(ctx, parent, key, NodeKind::Dummy),
        serde_json::Value::Bool(b) => insert(ctx, parent, key, NodeKind::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                insert(ctx, parent, key, NodeKind::Integer(i))
            } else if let Some(f) = n.as_f64() {
                insert(ctx, parent, key, NodeKind::Double(f))
            } else {
                Err(JsonError::Type)
            }
        }
        serde_json::Value::String(s) => {
            insert(ctx, parent, key, NodeKind::String(Text::owned(s.as_str())))
        }
        serde_json::Value::Array(items) => {
            let id = insert(ctx, parent, key, NodeKind::Array)?;
            for item in items {
                from_serde_value(ctx, Some(id), None, item)?;
            }
            Ok(id)
        }
        serde_json::Value::Object(members) => {
            let id = insert(ctx, parent, key, NodeKind::Object)?;
            for (k, v) in members {
                from_serde_value(ctx, Some(id), Some(k.as_str()), v)?;
            }
            Ok(id)
        }
    }
}

fn insert(
    ctx: &mut Context,
    parent: Option<NodeId>,
    key: Option<&str>,
    kind: NodeKind,
) -> Result<NodeId, JsonError> {
    match parent {
        Some(p) => ctx.add_last(Some(p), kind, key),
        None => ctx.add_first(None, kind, key),
    }
}
