//! Prefix matching: the single walk every lookup and edit is built on.

use crate::node::{Node, NodeArena, NodeId};

/// Where a walk along a query stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PrefixMatch {
    /// Exclusive end of the matched part of the query.
    pub(crate) end: usize,
    /// Deepest node reached. The match ends inside or at the end of its span.
    pub(crate) node: NodeId,
    /// Parent of `node`, `None` when `node` is the root.
    pub(crate) parent: Option<NodeId>,
}

impl PrefixMatch {
    /// The whole query lies on a path from the root.
    #[inline]
    pub(crate) fn covers(&self, query: &[u8]) -> bool {
        self.end == query.len()
    }
}

impl<V> NodeArena<V> {
    /// Walk from the root as far as `query` agrees with the tree.
    #[inline]
    pub(crate) fn match_prefix(&self, query: &[u8]) -> PrefixMatch {
        self.match_prefix_with(query, |_, _| {})
    }

    /// Like [`match_prefix`](Self::match_prefix), calling `on_boundary` for
    /// each node (root included) whose whole span lies within the query.
    pub(crate) fn match_prefix_with<F>(&self, query: &[u8], mut on_boundary: F) -> PrefixMatch
    where
        F: FnMut(NodeId, &Node<V>),
    {
        let mut parent = None;
        let mut id = NodeId::ROOT;
        // Invariant: `offset == self[id].start` on entry to each iteration.
        let mut offset = 0;

        loop {
            let node = &self[id];
            let matched = node
                .span()
                .iter()
                .zip(&query[offset..])
                .take_while(|(a, b)| a == b)
                .count();
            offset += matched;

            if offset < node.end {
                // Mismatch or end of query inside the span.
                return PrefixMatch {
                    end: offset,
                    node: id,
                    parent,
                };
            }

            on_boundary(id, node);

            let next = query.get(offset).and_then(|&byte| node.child(byte));
            match next {
                Some(child) => {
                    parent = Some(id);
                    id = child;
                }
                None => {
                    return PrefixMatch {
                        end: offset,
                        node: id,
                        parent,
                    }
                }
            }
        }
    }

    /// Node whose path spells exactly `key`, value or not.
    pub(crate) fn find_exact(&self, key: &[u8]) -> Option<PrefixMatch> {
        let found = self.match_prefix(key);
        (found.covers(key) && found.end == self[found.node].end).then_some(found)
    }
}
