//! Breadth-first collection of the entries below a node.

use std::collections::VecDeque;

use crate::node::{NodeArena, NodeId};

/// Iterator over the `(key, value)` pairs stored at or below one node.
///
/// Entries come out in breadth-first order, which is not key order.
pub struct Entries<'a, V> {
    nodes: &'a NodeArena<V>,
    queue: VecDeque<NodeId>,
}

impl<'a, V> Entries<'a, V> {
    pub(crate) fn new(nodes: &'a NodeArena<V>, start: NodeId) -> Self {
        let mut queue = VecDeque::new();
        queue.push_back(start);
        Self { nodes, queue }
    }

    pub(crate) fn empty(nodes: &'a NodeArena<V>) -> Self {
        Self {
            nodes,
            queue: VecDeque::new(),
        }
    }
}

impl<'a, V> Iterator for Entries<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        while let Some(id) = self.queue.pop_front() {
            let node = &nodes[id];
            self.queue.extend(node.children());
            if let Some(value) = node.value.as_ref() {
                return Some((node.key(), value));
            }
        }
        None
    }
}

/// Keys stored at or below one node.
pub struct Keys<'a, V>(pub(crate) Entries<'a, V>);

impl<'a, V> Iterator for Keys<'a, V> {
    type Item = &'a str;

    #[inline]
    fn next(&mut self) -> Option<&'a str> {
        self.0.next().map(|(k, _)| k)
    }
}

/// Values stored at or below one node.
pub struct Values<'a, V>(pub(crate) Entries<'a, V>);

impl<'a, V> Iterator for Values<'a, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<&'a V> {
        self.0.next().map(|(_, v)| v)
    }
}

impl<V> NodeArena<V> {
    /// Release every node below `start` and return their entries.
    ///
    /// `start` itself is released too unless it is the root, which only
    /// gives up its value and children. Callers must detach `start` first.
    pub(crate) fn drain(&mut self, start: NodeId) -> Vec<(String, V)> {
        let mut out = Vec::new();
        let mut queue = VecDeque::new();

        if start == NodeId::ROOT {
            let root = &mut self[NodeId::ROOT];
            if let Some(value) = root.value.take() {
                out.push((String::new(), value));
            }
            queue.extend(root.children());
            root.clear_children();
        } else {
            queue.push_back(start);
        }

        while let Some(id) = queue.pop_front() {
            let mut node = self.release(id);
            queue.extend(node.children());
            if let Some(value) = node.value.take() {
                out.push((node.key().to_owned(), value));
            }
        }
        out
    }
}
