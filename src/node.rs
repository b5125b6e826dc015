//! Tree nodes and the arena that owns them.
//!
//! Every node is reachable through exactly one child slot of its parent.
//! The arena only provides storage and id reuse; the shape of the tree is
//! carried by the child lists.

use std::collections::{HashSet, VecDeque};
use std::ops::{Index, IndexMut};
use std::sync::Arc;

use smallvec::SmallVec;
use tracing::trace;

use crate::error::{Error, Result};

// =============================================================================
// Node ids
// =============================================================================

/// Index of a node slot in the [`NodeArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
    /// The root always occupies slot 0.
    pub(crate) const ROOT: NodeId = NodeId(0);

    #[inline]
    fn from_index(idx: usize) -> Self {
        debug_assert!(idx <= u32::MAX as usize);
        Self(idx as u32)
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

// =============================================================================
// Node
// =============================================================================

/// Child edges, sorted by the first byte of each child's span.
type Children = SmallVec<[(u8, NodeId); 4]>;

#[derive(Clone, Debug)]
pub(crate) struct Node<V> {
    /// Backing string the span is cut from. `key[..end]` is the full path
    /// from the root to the end of this node.
    key: Arc<str>,
    /// Span start (inclusive). Equals the depth of the node in bytes.
    pub(crate) start: usize,
    /// Span end (exclusive).
    pub(crate) end: usize,
    pub(crate) value: Option<V>,
    children: Children,
}

impl<V> Node<V> {
    fn root() -> Self {
        Self {
            key: Arc::from(""),
            start: 0,
            end: 0,
            value: None,
            children: Children::new(),
        }
    }

    pub(crate) fn leaf(key: Arc<str>, start: usize, value: V) -> Self {
        let end = key.len();
        debug_assert!(start < end);
        Self {
            key,
            start,
            end,
            value: Some(value),
            children: Children::new(),
        }
    }

    /// Bytes this node consumes from any key passing through it.
    #[inline]
    pub(crate) fn span(&self) -> &[u8] {
        &self.key.as_bytes()[self.start..self.end]
    }

    /// The key this node completes.
    ///
    /// Only value nodes are guaranteed to end on a character boundary.
    #[inline]
    pub(crate) fn key(&self) -> &str {
        debug_assert!(self.key.is_char_boundary(self.end));
        &self.key[..self.end]
    }

    #[inline]
    fn first_byte(&self) -> u8 {
        self.key.as_bytes()[self.start]
    }

    #[inline]
    pub(crate) fn child(&self, byte: u8) -> Option<NodeId> {
        self.children
            .binary_search_by_key(&byte, |&(b, _)| b)
            .ok()
            .map(|idx| self.children[idx].1)
    }

    #[inline]
    pub(crate) fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().map(|&(_, id)| id)
    }

    #[inline]
    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub(crate) fn clear_children(&mut self) {
        self.children.clear();
    }

    fn attach(&mut self, byte: u8, child: NodeId) {
        match self.children.binary_search_by_key(&byte, |&(b, _)| b) {
            Ok(_) => panic!("edge {byte:#04x} already has a child"),
            Err(idx) => self.children.insert(idx, (byte, child)),
        }
    }

    fn detach(&mut self, byte: u8) -> Option<NodeId> {
        let idx = self
            .children
            .binary_search_by_key(&byte, |&(b, _)| b)
            .ok()?;
        Some(self.children.remove(idx).1)
    }
}

// =============================================================================
// Node Arena
// =============================================================================

/// Slot storage for nodes, with a free list for released ids.
#[derive(Clone, Debug)]
pub(crate) struct NodeArena<V> {
    slots: Vec<Option<Node<V>>>,
    free: Vec<NodeId>,
    max_nodes: usize,
}

impl<V> NodeArena<V> {
    pub(crate) fn new(capacity: usize, max_nodes: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity.max(1));
        slots.push(Some(Node::root()));
        Self {
            slots,
            free: Vec::new(),
            max_nodes,
        }
    }

    /// Number of live nodes, root included.
    pub(crate) fn node_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Drop every node except a fresh root.
    pub(crate) fn clear(&mut self) {
        self.slots.truncate(1);
        self.slots[0] = Some(Node::root());
        self.free.clear();
    }

    /// Fail unless `n` more nodes can be allocated.
    pub(crate) fn ensure_room(&self, n: usize) -> Result<()> {
        let available = self.free.len() + self.max_nodes.saturating_sub(self.slots.len());
        if available < n {
            return Err(Error::CapacityExceeded {
                limit: self.max_nodes,
            });
        }
        Ok(())
    }

    fn alloc(&mut self, node: Node<V>) -> Result<NodeId> {
        if let Some(id) = self.free.pop() {
            self.slots[id.index()] = Some(node);
            return Ok(id);
        }
        if self.slots.len() >= self.max_nodes {
            return Err(Error::CapacityExceeded {
                limit: self.max_nodes,
            });
        }
        let id = NodeId::from_index(self.slots.len());
        self.slots.push(Some(node));
        Ok(id)
    }

    /// Take a node out of its slot. The caller must already have detached it.
    pub(crate) fn release(&mut self, id: NodeId) -> Node<V> {
        debug_assert_ne!(id, NodeId::ROOT);
        let node = self.slots[id.index()]
            .take()
            .unwrap_or_else(|| panic!("node {} released twice", id.0));
        self.free.push(id);
        node
    }

    /// Allocate `node` and hang it under `parent`, keyed by its first byte.
    pub(crate) fn adopt(&mut self, parent: NodeId, node: Node<V>) -> Result<NodeId> {
        let byte = node.first_byte();
        let id = self.alloc(node)?;
        self[parent].attach(byte, id);
        Ok(id)
    }

    /// Unlink `child` from `parent`. Returns false if it was not linked there.
    pub(crate) fn detach(&mut self, parent: NodeId, child: NodeId) -> bool {
        let byte = self[child].first_byte();
        let unlinked = self[parent].detach(byte);
        match unlinked {
            Some(found) if found == child => {
                trace!(?parent, ?child, "detached subtree");
                true
            }
            Some(other) => {
                // Not ours; put it back.
                self[parent].attach(byte, other);
                false
            }
            None => false,
        }
    }

    /// Split `id` at absolute offset `at`, so that it ends exactly there.
    ///
    /// The tail of the span, the value and the children move to a new node
    /// that becomes the sole child of `id`. Returns the new node.
    pub(crate) fn split(&mut self, id: NodeId, at: usize) -> Result<NodeId> {
        let node = &self[id];
        debug_assert!(node.start < at && at < node.end);

        let tail = Node {
            key: Arc::clone(&node.key),
            start: at,
            end: node.end,
            value: None,
            children: Children::new(),
        };
        let tail_id = self.alloc(tail)?;

        let node = &mut self[id];
        node.end = at;
        let value = node.value.take();
        let children = std::mem::take(&mut node.children);

        let tail = &mut self[tail_id];
        tail.value = value;
        tail.children = children;
        let byte = tail.first_byte();

        self[id].attach(byte, tail_id);
        trace!(node = ?id, tail = ?tail_id, at, "split");
        Ok(tail_id)
    }

    /// Absorb the only child of a value-less, non-root node.
    ///
    /// Returns whether a merge took place.
    pub(crate) fn try_merge(&mut self, id: NodeId) -> bool {
        let node = &self[id];
        if id == NodeId::ROOT || node.value.is_some() || node.child_count() != 1 {
            return false;
        }

        let child_id = node.children[0].1;
        let child = self.release(child_id);

        // The child's backing string shares our path up to `child.start`,
        // so adopting it keeps `start` valid and extends `end`.
        let node = &mut self[id];
        node.key = child.key;
        node.end = child.end;
        node.value = child.value;
        node.children = child.children;
        trace!(node = ?id, absorbed = ?child_id, "merge");
        true
    }

    /// Rebuild the slots in breadth-first order, dropping free-list holes.
    ///
    /// Returns the number of nodes rewritten.
    pub(crate) fn rebuild(&mut self) -> usize {
        let live = self.node_count();
        let mut old = std::mem::take(&mut self.slots);
        let mut slots = Vec::with_capacity(live);

        let mut queue = VecDeque::new();
        queue.push_back(NodeId::ROOT);
        while let Some(old_id) = queue.pop_front() {
            let Some(mut node) = old[old_id.index()].take() else {
                continue;
            };
            for (_, child) in node.children.iter_mut() {
                queue.push_back(*child);
                *child = NodeId::from_index(slots.len() + queue.len());
            }
            slots.push(Some(node));
        }

        self.slots = slots;
        self.free.clear();
        self.slots.len()
    }

    /// Approximate heap bytes held by the arena, backing strings included.
    pub(crate) fn memory_usage(&self) -> usize {
        let mut seen = HashSet::new();
        let mut bytes = self.slots.capacity() * std::mem::size_of::<Option<Node<V>>>()
            + self.free.capacity() * std::mem::size_of::<NodeId>();

        for node in self.slots.iter().flatten() {
            if node.children.spilled() {
                bytes += node.children.capacity() * std::mem::size_of::<(u8, NodeId)>();
            }
            if seen.insert(Arc::as_ptr(&node.key) as *const u8 as usize) {
                bytes += node.key.len();
            }
        }
        bytes
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
        let len = self.slots.len();
        self.free.retain(|id| id.index() < len);
        self.slots.shrink_to_fit();
        self.free.shrink_to_fit();
        for node in self.slots.iter_mut().flatten() {
            node.children.shrink_to_fit();
        }
    }
}

impl<V> Index<NodeId> for NodeArena<V> {
    type Output = Node<V>;

    #[inline]
    fn index(&self, id: NodeId) -> &Node<V> {
        self.slots[id.index()]
            .as_ref()
            .unwrap_or_else(|| panic!("node {} is not live", id.0))
    }
}

impl<V> IndexMut<NodeId> for NodeArena<V> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Node<V> {
        self.slots[id.index()]
            .as_mut()
            .unwrap_or_else(|| panic!("node {} is not live", id.0))
    }
}
