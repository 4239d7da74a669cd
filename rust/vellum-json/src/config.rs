//! Parse-time limits and the node allocation strategy.

/// Structural limits enforced while parsing and while building a tree through the
/// explicit insertion API.
///
/// Defaults match the reference limits: a generous per-string byte cap, a shallow
/// default nesting depth suited to typical configuration/document payloads, a large
/// node ceiling, and an absolute decimal exponent cap beyond which a value is
/// certain to under/overflow `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_string_len: usize,
    pub max_depth: usize,
    pub max_nodes: usize,
    pub max_exp_abs: i32,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_string_len: 512,
            max_depth: 10,
            max_nodes: 1_000_000,
            max_exp_abs: 511,
        }
    }
}

impl Limits {
    pub fn with_max_string_len(mut self, max_string_len: usize) -> Self {
        self.max_string_len = max_string_len;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn with_max_exp_abs(mut self, max_exp_abs: i32) -> Self {
        self.max_exp_abs = max_exp_abs;
        self
    }
}

/// Node allocation strategy for a [`crate::tree::Tree`].
///
/// `Heap` grows without bound (subject to `Limits::max_nodes`); `Pool` pre-reserves
/// a fixed-capacity arena and never grows past it, trading flexibility for a hard
/// upper bound on memory use known up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    Heap,
    Pool { capacity: usize },
}

impl Default for Allocation {
    fn default() -> Self {
        Allocation::Heap
    }
}
