//! The document tree: an arena of [`Node`] values plus the insertion, removal, and
//! lookup operations that keep sibling order and parent links consistent.
//!
//! The reference implementation links nodes with raw pointers (`parent`, `next`,
//! `first_child`) and offers two allocation strategies selected at compile time:
//! individually heap-allocated nodes, or a fixed-capacity pool recycled by
//! scanning for a free (`Dummy`-typed) slot. Here both strategies live behind one
//! arena indexed by [`NodeId`], with `Option<NodeId>` standing in for null
//! pointers; the allocation strategy becomes a runtime choice (see
//! [`crate::config::Allocation`]) instead of a build-time `#define`.

use crate::config::{Allocation, Limits};
use crate::error::JsonError;

/// A stable index into a [`Tree`]'s arena. Cheap to copy, never dereferenced
/// directly by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

/// A borrowed or owned run of text attached to a node as its key or string value.
///
/// `Span` is how the parser attaches text without copying: a byte range into the
/// buffer it is parsing in place. `Owned` is for text supplied directly through the
/// tree-building API ([`Context::add_first`] and friends), which has no backing
/// buffer to borrow from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Text {
    Span(usize, usize),
    Owned(String),
}

impl Text {
    pub fn owned(s: impl Into<String>) -> Self {
        Text::Owned(s.into())
    }
}

/// The tagged value (or absence of one) carried by a node, keyed by [`NodeKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// The JSON literal `null`, or (internally) a recycled pool slot.
    Dummy,
    Object,
    Array,
    String(Text),
    Integer(i64),
    Double(f64),
    Bool(bool),
}

impl NodeKind {
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Object | NodeKind::Array)
    }
}

/// One entry in the document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Set iff this node is a member of an object.
    pub key: Option<Text>,
    pub parent: Option<NodeId>,
    pub next: Option<NodeId>,
    pub first_child: Option<NodeId>,
}

impl Node {
    fn dummy() -> Self {
        Node {
            kind: NodeKind::Dummy,
            key: None,
            parent: None,
            next: None,
            first_child: None,
        }
    }
}

struct Slot {
    node: Node,
    /// Distinguishes a recycled, reusable slot from a live node whose `kind`
    /// happens to be `Dummy` (a parsed JSON `null`). The reference implementation
    /// conflates these — any live `null` node is indistinguishable from a free
    /// slot to its pool scan, a latent corruption hazard we do not reproduce.
    free: bool,
}

/// The node arena. Does not track a root or an error/cursor state; see
/// [`crate::parser::Context`] for the owning type that does.
pub struct Tree {
    slots: Vec<Slot>,
    allocation: Allocation,
    nused: usize,
}

impl Tree {
    pub fn new(allocation: Allocation) -> Self {
        let initial_cap = match allocation {
            Allocation::Heap => 0,
            Allocation::Pool { capacity } => capacity,
        };
        Tree {
            slots: Vec::with_capacity(initial_cap),
            allocation,
            nused: 0,
        }
    }

    pub fn nused(&self) -> usize {
        self.nused
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.slots[id.0 as usize].node
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.slots[id.0 as usize].node
    }

    fn allocate(&mut self, node: Node, limits: &Limits) -> Result<NodeId, JsonError> {
        if self.nused >= limits.max_nodes {
            return Err(JsonError::Nodes {
                limit: limits.max_nodes,
            });
        }
        let id = match self.allocation {
            Allocation::Heap => {
                self.slots.push(Slot { node, free: false });
                self.slots.len() - 1
            }
            Allocation::Pool { capacity } => {
                if let Some(idx) = self.slots.iter().position(|s| s.free) {
                    self.slots[idx] = Slot { node, free: false };
                    idx
                } else {
                    if self.slots.len() >= capacity {
                        return Err(JsonError::Nodes { limit: capacity });
                    }
                    self.slots.push(Slot { node, free: false });
                    self.slots.len() - 1
                }
            }
        };
        self.nused += 1;
        Ok(NodeId(id as u32))
    }

    /// Links `newnode` as the first child of `parent`, or leaves it parentless if
    /// `parent` is `None` (the caller is expected to treat a parentless node as a
    /// new root).
    pub fn add_first(
        &mut self,
        parent: Option<NodeId>,
        kind: NodeKind,
        key: Option<Text>,
        limits: &Limits,
    ) -> Result<NodeId, JsonError> {
        if let Some(p) = parent {
            if !self.node(p).kind.is_container() {
                return Err(JsonError::NotAContainer);
            }
        }
        let first_child = parent.and_then(|p| self.node(p).first_child);
        let id = self.allocate(
            Node {
                kind,
                key,
                parent,
                next: first_child,
                first_child: None,
            },
            limits,
        )?;
        if let Some(p) = parent {
            self.node_mut(p).first_child = Some(id);
        }
        Ok(id)
    }

    /// Links `newnode` as the last child of `parent` by walking the sibling chain.
    pub fn add_last(
        &mut self,
        parent: Option<NodeId>,
        kind: NodeKind,
        key: Option<Text>,
        limits: &Limits,
    ) -> Result<NodeId, JsonError> {
        if let Some(p) = parent {
            if !self.node(p).kind.is_container() {
                return Err(JsonError::NotAContainer);
            }
        }
        let id = self.allocate(
            Node {
                kind,
                key,
                parent,
                next: None,
                first_child: None,
            },
            limits,
        )?;
        if let Some(p) = parent {
            match self.node(p).first_child {
                None => self.node_mut(p).first_child = Some(id),
                Some(first) => {
                    let mut cur = first;
                    while let Some(next) = self.node(cur).next {
                        cur = next;
                    }
                    self.node_mut(cur).next = Some(id);
                }
            }
        }
        Ok(id)
    }

    /// Links `newnode` immediately after `anchor` in its sibling chain.
    pub fn add_after(
        &mut self,
        anchor: NodeId,
        kind: NodeKind,
        key: Option<Text>,
        limits: &Limits,
    ) -> Result<NodeId, JsonError> {
        let parent = self.node(anchor).parent;
        let next = self.node(anchor).next;
        let id = self.allocate(
            Node {
                kind,
                key,
                parent,
                next,
                first_child: None,
            },
            limits,
        )?;
        self.node_mut(anchor).next = Some(id);
        Ok(id)
    }

    /// Links `newnode` immediately before `anchor` in its sibling chain.
    pub fn add_before(
        &mut self,
        anchor: NodeId,
        kind: NodeKind,
        key: Option<Text>,
        limits: &Limits,
    ) -> Result<NodeId, JsonError> {
        let parent = self.node(anchor).parent;
        let id = self.allocate(
            Node {
                kind,
                key,
                parent,
                next: Some(anchor),
                first_child: None,
            },
            limits,
        )?;
        match parent {
            None => {}
            Some(p) => {
                if self.node(p).first_child == Some(anchor) {
                    self.node_mut(p).first_child = Some(id);
                } else if let Some(prev) = self.find_prev(p, anchor) {
                    self.node_mut(prev).next = Some(id);
                }
            }
        }
        Ok(id)
    }

    /// Finds `node`'s immediate predecessor among `parent`'s children, or `None`
    /// if `node` is the first child.
    fn find_prev(&self, parent: NodeId, node: NodeId) -> Option<NodeId> {
        let mut cur = self.node(parent).first_child?;
        if cur == node {
            return None;
        }
        loop {
            let next = self.node(cur).next?;
            if next == node {
                return Some(cur);
            }
            cur = next;
        }
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut child = self.node(id).first_child;
        while let Some(c) = child {
            let next = self.node(c).next;
            self.free_subtree(c);
            child = next;
        }
        let slot = &mut self.slots[id.0 as usize];
        slot.node = Node::dummy();
        slot.free = true;
        self.nused -= 1;
    }

    /// Unlinks `id` from its parent's child chain and releases it along with all
    /// descendants. Returns the number of nodes released (the removed subtree's
    /// size), so the caller can adjust its own bookkeeping (e.g. clearing a root
    /// reference when the removed node had no parent).
    pub fn remove(&mut self, id: NodeId) -> usize {
        let before = self.nused;
        if let Some(parent) = self.node(id).parent {
            if self.node(parent).first_child == Some(id) {
                self.node_mut(parent).first_child = self.node(id).next;
            } else if let Some(prev) = self.find_prev(parent, id) {
                self.node_mut(prev).next = self.node(id).next;
            }
        }
        self.free_subtree(id);
        before - self.nused
    }

    /// Scans `parent`'s children for one whose key resolves (via `resolve`) to
    /// `key`. Returns `None` if `parent` is not a container or no member matches.
    pub fn get_node<'a>(
        &'a self,
        parent: NodeId,
        key: &str,
        resolve: impl Fn(&'a Text) -> &'a str,
    ) -> Option<NodeId> {
        if !self.node(parent).kind.is_container() {
            return None;
        }
        let mut cur = self.node(parent).first_child;
        while let Some(id) = cur {
            if let Some(k) = &self.node(id).key {
                if resolve(k) == key {
                    return Some(id);
                }
            }
            cur = self.node(id).next;
        }
        None
    }

    /// Walks to the `index`-th child of `parent` (zero-based).
    pub fn get_element(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        if !self.node(parent).kind.is_container() {
            return None;
        }
        let mut cur = self.node(parent).first_child?;
        for _ in 0..index {
            cur = self.node(cur).next?;
        }
        Some(cur)
    }

    /// Length of `parent`'s sibling chain, or an error if it is not a container.
    pub fn count_elements(&self, parent: NodeId) -> Result<usize, JsonError> {
        if !self.node(parent).kind.is_container() {
            return Err(JsonError::NotAContainer);
        }
        let mut n = 0;
        let mut cur = self.node(parent).first_child;
        while let Some(id) = cur {
            n += 1;
            cur = self.node(id).next;
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> Limits {
        Limits::default()
    }

    #[test]
    fn add_last_preserves_insertion_order() {
        let mut tree = Tree::new(Allocation::Heap);
        let root = tree
            .add_first(None, NodeKind::Array, None, &limits())
            .unwrap();
        let a = tree
            .add_last(Some(root), NodeKind::Integer(1), None, &limits())
            .unwrap();
        let b = tree
            .add_last(Some(root), NodeKind::Integer(2), None, &limits())
            .unwrap();
        assert_eq!(tree.get_element(root, 0), Some(a));
        assert_eq!(tree.get_element(root, 1), Some(b));
        assert_eq!(tree.count_elements(root).unwrap(), 2);
    }

    #[test]
    fn add_first_inserts_before_existing_children() {
        let mut tree = Tree::new(Allocation::Heap);
        let root = tree
            .add_first(None, NodeKind::Array, None, &limits())
            .unwrap();
        let a = tree
            .add_first(Some(root), NodeKind::Integer(1), None, &limits())
            .unwrap();
        let b = tree
            .add_first(Some(root), NodeKind::Integer(2), None, &limits())
            .unwrap();
        assert_eq!(tree.get_element(root, 0), Some(b));
        assert_eq!(tree.get_element(root, 1), Some(a));
    }

    #[test]
    fn add_to_non_container_is_rejected() {
        let mut tree = Tree::new(Allocation::Heap);
        let leaf = tree
            .add_first(None, NodeKind::Integer(1), None, &limits())
            .unwrap();
        let err = tree
            .add_last(Some(leaf), NodeKind::Bool(true), None, &limits())
            .unwrap_err();
        assert_eq!(err, JsonError::NotAContainer);
    }

    #[test]
    fn get_node_matches_by_key() {
        let mut tree = Tree::new(Allocation::Heap);
        let root = tree
            .add_first(None, NodeKind::Object, None, &limits())
            .unwrap();
        tree.add_last(
            Some(root),
            NodeKind::Bool(true),
            Some(Text::owned("flag")),
            &limits(),
        )
        .unwrap();
        let found = tree.get_node(root, "flag", |t| match t {
            Text::Owned(s) => s.as_str(),
            Text::Span(..) => unreachable!(),
        });
        assert!(found.is_some());
        assert_eq!(tree.node(found.unwrap()).kind, NodeKind::Bool(true));
    }

    #[test]
    fn remove_unlinks_and_reports_subtree_size() {
        let mut tree = Tree::new(Allocation::Heap);
        let root = tree
            .add_first(None, NodeKind::Array, None, &limits())
            .unwrap();
        let a = tree
            .add_last(Some(root), NodeKind::Integer(1), None, &limits())
            .unwrap();
        let b = tree
            .add_last(Some(root), NodeKind::Object, None, &limits())
            .unwrap();
        tree.add_last(Some(b), NodeKind::Integer(2), Some(Text::owned("x")), &limits())
            .unwrap();
        let c = tree
            .add_last(Some(root), NodeKind::Integer(3), None, &limits())
            .unwrap();

        let before = tree.nused();
        let removed = tree.remove(b);
        assert_eq!(removed, 2); // b and its one child
        assert_eq!(tree.nused(), before - 2);
        assert_eq!(tree.get_element(root, 0), Some(a));
        assert_eq!(tree.get_element(root, 1), Some(c));
        assert_eq!(tree.count_elements(root).unwrap(), 2);
    }

    #[test]
    fn pool_mode_recycles_freed_slots() {
        let mut tree = Tree::new(Allocation::Pool { capacity: 2 });
        let root = tree
            .add_first(None, NodeKind::Array, None, &limits())
            .unwrap();
        let a = tree
            .add_last(Some(root), NodeKind::Integer(1), None, &limits())
            .unwrap();
        tree.remove(a);
        // With capacity 2 and one live node (root), this must reuse a's freed slot.
        let b = tree
            .add_last(Some(root), NodeKind::Integer(2), None, &limits())
            .unwrap();
        assert_eq!(tree.node(b).kind, NodeKind::Integer(2));
        assert_eq!(tree.nused(), 2);
    }

    #[test]
    fn pool_mode_rejects_allocation_past_capacity() {
        let mut tree = Tree::new(Allocation::Pool { capacity: 1 });
        tree.add_first(None, NodeKind::Array, None, &limits())
            .unwrap();
        let err = tree
            .add_last(None, NodeKind::Integer(1), None, &limits())
            .unwrap_err();
        assert_eq!(err, JsonError::Nodes { limit: 1 });
    }
}
