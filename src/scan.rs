//! Searching a text for occurrences of stored keys.
//!
//! Both searches restart the prefix walk at every character offset of the
//! text, so they cost `O(|text| * longest key)`. An Aho-Corasick automaton
//! would make this linear, at the price of rebuilding it after each edit.

use std::fmt;

use crate::node::NodeId;
use crate::RadixMap;

/// One occurrence of a stored key in a searched text.
pub struct KeyMatch<'a, V> {
    /// The stored key that occurred.
    pub key: &'a str,
    /// The value stored under `key`.
    pub value: &'a V,
    /// Byte offset where the occurrence starts (inclusive).
    pub start: usize,
    /// Byte offset where the occurrence ends (exclusive).
    pub end: usize,
}

impl<'a, V> KeyMatch<'a, V> {
    /// The matched entry as a `(key, value)` pair.
    #[inline]
    pub fn entry(&self) -> (&'a str, &'a V) {
        (self.key, self.value)
    }
}

impl<V> Clone for KeyMatch<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for KeyMatch<'_, V> {}

impl<V: fmt::Debug> fmt::Debug for KeyMatch<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMatch")
            .field("key", &self.key)
            .field("value", self.value)
            .field("start", &self.start)
            .field("end", &self.end)
            .finish()
    }
}

impl<V: PartialEq> PartialEq for KeyMatch<'_, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.value == other.value
            && self.start == other.start
            && self.end == other.end
    }
}

impl<V> RadixMap<V> {
    /// Find the longest stored key starting at each offset of `text`.
    ///
    /// An empty key, if stored, is reported once as `0..0`. Matches are
    /// ordered by start offset.
    ///
    /// ```rust
    /// use radix_map::RadixMap;
    ///
    /// let map = RadixMap::from_iter([("test", 1), ("testing", 2), ("tea", 3)]);
    /// let found: Vec<_> = map
    ///     .find_keys("testing tea")
    ///     .iter()
    ///     .map(|m| (m.key, m.start, m.end))
    ///     .collect();
    /// assert_eq!(found, vec![("testing", 0, 7), ("tea", 8, 11)]);
    /// ```
    pub fn find_keys(&self, text: &str) -> Vec<KeyMatch<'_, V>> {
        let mut matches: Vec<_> = self.empty_key_match().into_iter().collect();

        for (start, _) in text.char_indices() {
            let mut longest = None;
            self.nodes
                .match_prefix_with(&text.as_bytes()[start..], |id, node| {
                    if id != NodeId::ROOT && node.value.is_some() {
                        longest = Some(id);
                    }
                });
            if let Some(id) = longest {
                matches.push(self.key_match(id, start));
            }
        }
        matches
    }

    /// Find every occurrence of every stored key in `text`, including keys
    /// that are prefixes of a longer match at the same offset.
    ///
    /// An empty key, if stored, is reported once as `0..0`. Matches are
    /// ordered by start offset, then by length.
    pub fn find_all_keys(&self, text: &str) -> Vec<KeyMatch<'_, V>> {
        let mut matches: Vec<_> = self.empty_key_match().into_iter().collect();

        for (start, _) in text.char_indices() {
            let mut found = Vec::new();
            self.nodes
                .match_prefix_with(&text.as_bytes()[start..], |id, node| {
                    if id != NodeId::ROOT && node.value.is_some() {
                        found.push(id);
                    }
                });
            matches.extend(found.into_iter().map(|id| self.key_match(id, start)));
        }
        matches
    }

    fn empty_key_match(&self) -> Option<KeyMatch<'_, V>> {
        self.nodes[NodeId::ROOT].value.as_ref().map(|value| KeyMatch {
            key: "",
            value,
            start: 0,
            end: 0,
        })
    }

    fn key_match(&self, id: NodeId, start: usize) -> KeyMatch<'_, V> {
        let node = &self.nodes[id];
        let key = node.key();
        KeyMatch {
            key,
            // Value presence was checked during the walk.
            value: node
                .value
                .as_ref()
                .unwrap_or_else(|| panic!("match on value-less node {id:?}")),
            start,
            end: start + key.len(),
        }
    }
}
