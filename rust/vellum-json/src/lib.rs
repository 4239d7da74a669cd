//! In-place JSON parsing, a document tree, and Grisu3-based serialization.
//!
//! This crate decodes JSON in the caller's own buffer — escape sequences are
//! rewritten in place and string/key nodes point back into it rather than
//! allocating copies — then exposes the result as an arena-backed tree that can
//! be queried, mutated, and serialized back to compact or indented JSON text.
//!
//! ```
//! use vellum_json::{Context, Limits, Style};
//!
//! let mut ctx = Context::with_limits(Limits::default());
//! let root = ctx.parse(br#"{"answer":42}"#.to_vec(), true).unwrap();
//! let answer = ctx.get_node(root, "answer").unwrap();
//! assert_eq!(ctx.to_string_style(answer, Style::Compact, 16).unwrap(), "42");
//! ```

mod bytes;
mod config;
mod diagnostics;
mod error;
mod numeric;
mod parser;
mod serializer;
mod tree;

#[cfg(feature = "serde")]
mod serde_bridge;

pub use config::{Allocation, Limits};
pub use diagnostics::render;
pub use error::{JsonError, StringErrorReason};
pub use numeric::atonum::{NumberResult, NumberValue};
pub use parser::Context;
pub use serializer::Style;
pub use tree::{Node, NodeId, NodeKind, Text};

#[cfg(feature = "serde")]
pub use serde_bridge::from_serde_value;
