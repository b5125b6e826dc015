//! # radix-map
//!
//! A string-keyed map stored as a compressed prefix tree (radix tree).
//!
//! Besides the usual map operations it answers prefix questions in time
//! proportional to the prefix rather than the map: whether any key starts
//! with a prefix, which entries do, and removing all of them at once. It
//! can also scan a text for every occurrence of every stored key.
//!
//! ## Example
//!
//! ```rust
//! use radix_map::RadixMap;
//!
//! let mut map = RadixMap::new();
//! map.insert("test", "abc");
//! map.insert("testing", "123");
//! map.insert("tea", "party");
//!
//! assert_eq!(map.get("tea"), Some(&"party"));
//! assert_eq!(map.get("te"), None);
//! assert!(map.contains_prefix("te"));
//! assert_eq!(map.keys_with_prefix("tes").count(), 2);
//!
//! let removed = map.remove_prefix("test");
//! assert_eq!(removed.len(), 2);
//! assert_eq!(map.len(), 1);
//! ```
//!
//! Nodes keep a shared reference to the key they were created from and
//! describe their edge as a byte span of it, so splitting an edge never
//! copies key bytes.

use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use tracing::debug;

mod collect;
mod config;
mod error;
mod matcher;
mod node;
mod scan;

pub use collect::{Entries, Keys, Values};
pub use config::{Config, MAX_INITIAL_CAPACITY, MAX_NODES};
pub use error::{Error, Result};
pub use scan::KeyMatch;

use node::{Node, NodeArena, NodeId};

// =============================================================================
// RadixMap
// =============================================================================

/// A map from strings to `V` backed by a radix tree.
///
/// Not synchronized: wrap it in a lock to share it between threads.
pub struct RadixMap<V> {
    nodes: NodeArena<V>,
    len: usize,
    config: Config,
}

impl<V> RadixMap<V> {
    pub fn new() -> Self {
        Self::build(Config::default())
    }

    /// Create a map with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if `config` does not pass [`Config::validate`].
    pub fn with_config(config: Config) -> Self {
        match Self::try_with_config(config) {
            Ok(map) => map,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: Config) -> Self {
        Self {
            nodes: NodeArena::new(config.initial_capacity, config.max_nodes),
            len: 0,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.len = 0;
    }

    pub fn memory_usage(&self) -> usize {
        self.nodes.memory_usage()
    }

    pub fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
    }

    /// Compact the node arena by rebuilding live nodes in breadth-first
    /// order, dropping the holes left by removals.
    ///
    /// Returns the number of nodes rewritten.
    pub fn compact(&mut self) -> usize {
        let before = self.nodes.memory_usage();
        let rewritten = self.nodes.rebuild();
        debug!(
            rewritten,
            before,
            after = self.nodes.memory_usage(),
            "compacted node arena"
        );
        rewritten
    }
}

// =============================================================================
// Lookups
// =============================================================================

impl<V> RadixMap<V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        let found = self.nodes.find_exact(key.as_bytes())?;
        self.nodes[found.node].value.as_ref()
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let found = self.nodes.find_exact(key.as_bytes())?;
        self.nodes[found.node].value.as_mut()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Whether any stored key starts with `prefix`, `prefix` itself included.
    ///
    /// Every map contains the empty prefix.
    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.nodes.match_prefix(prefix.as_bytes()).covers(prefix.as_bytes())
    }

    /// Linear scan over all values.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.values().any(|v| v == value)
    }
}

// =============================================================================
// Mutation
// =============================================================================

impl<V> RadixMap<V> {
    /// Insert `value` under `key`, returning the value it replaced.
    ///
    /// # Panics
    ///
    /// Panics if the map already holds [`Config::max_nodes`] nodes and the
    /// key needs new ones. Use [`try_insert`](Self::try_insert) to handle it.
    pub fn insert(&mut self, key: &str, value: V) -> Option<V> {
        match self.try_insert(key, value) {
            Ok(previous) => previous,
            Err(e) => panic!("{e}"),
        }
    }

    /// Insert `value` under `key`, returning the value it replaced.
    ///
    /// Fails without touching the map if the nodes the key needs cannot be
    /// allocated.
    pub fn try_insert(&mut self, key: &str, value: V) -> Result<Option<V>> {
        let bytes = key.as_bytes();
        let found = self.nodes.match_prefix(bytes);
        let node = found.node;

        let needs_split = found.end < self.nodes[node].end;
        let needs_leaf = found.end < bytes.len();
        self.nodes
            .ensure_room(usize::from(needs_split) + usize::from(needs_leaf))?;

        if needs_split {
            // `node` now ends exactly where the match stopped.
            self.nodes.split(node, found.end)?;
        }

        if needs_leaf {
            self.nodes
                .adopt(node, Node::leaf(Arc::from(key), found.end, value))?;
            self.len += 1;
            return Ok(None);
        }

        let previous = self.nodes[node].value.replace(value);
        if previous.is_none() {
            self.len += 1;
        }
        Ok(previous)
    }

    /// Remove `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let found = self.nodes.find_exact(key.as_bytes())?;
        let node = found.node;
        let value = self.nodes[node].value.take()?;
        self.len -= 1;

        match found.parent {
            Some(parent) if self.nodes[node].is_leaf() => {
                self.nodes.detach(parent, node);
                self.nodes.release(node);
                // The parent may be left with a single child and no value.
                self.nodes.try_merge(parent);
            }
            _ => {
                self.nodes.try_merge(node);
            }
        }

        Some(value)
    }

    /// Remove every entry whose key starts with `prefix` and return them.
    ///
    /// Returns an empty list, leaving the map untouched, when no key starts
    /// with `prefix`.
    pub fn remove_prefix(&mut self, prefix: &str) -> Vec<(String, V)> {
        let found = self.nodes.match_prefix(prefix.as_bytes());
        if !found.covers(prefix.as_bytes()) {
            return Vec::new();
        }

        let removed = match found.parent {
            None => {
                let removed = self.nodes.drain(NodeId::ROOT);
                self.nodes.clear();
                removed
            }
            Some(parent) => {
                self.nodes.detach(parent, found.node);
                let removed = self.nodes.drain(found.node);
                self.nodes.try_merge(parent);
                removed
            }
        };

        self.len -= removed.len();
        debug!(prefix, removed = removed.len(), "removed prefix");
        removed
    }
}

// =============================================================================
// Enumeration
// =============================================================================

impl<V> RadixMap<V> {
    /// All entries, in breadth-first tree order.
    pub fn iter(&self) -> Entries<'_, V> {
        Entries::new(&self.nodes, NodeId::ROOT)
    }

    pub fn entries(&self) -> Entries<'_, V> {
        self.iter()
    }

    pub fn keys(&self) -> Keys<'_, V> {
        Keys(self.iter())
    }

    pub fn values(&self) -> Values<'_, V> {
        Values(self.iter())
    }

    /// Entries whose key starts with `prefix`.
    pub fn entries_with_prefix(&self, prefix: &str) -> Entries<'_, V> {
        let found = self.nodes.match_prefix(prefix.as_bytes());
        if found.covers(prefix.as_bytes()) {
            Entries::new(&self.nodes, found.node)
        } else {
            Entries::empty(&self.nodes)
        }
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> Keys<'_, V> {
        Keys(self.entries_with_prefix(prefix))
    }

    pub fn values_with_prefix(&self, prefix: &str) -> Values<'_, V> {
        Values(self.entries_with_prefix(prefix))
    }
}

// =============================================================================
// Trait impls
// =============================================================================

impl<V> Default for RadixMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Clone for RadixMap<V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            len: self.len,
            config: self.config.clone(),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for RadixMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<V: PartialEq> PartialEq for RadixMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<V: Eq> Eq for RadixMap<V> {}

impl<V> Index<&str> for RadixMap<V> {
    type Output = V;

    /// # Panics
    ///
    /// Panics if `key` is not present.
    fn index(&self, key: &str) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("key {key:?} not found in RadixMap"),
        }
    }
}

impl<K: AsRef<str>, V> Extend<(K, V)> for RadixMap<V> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key.as_ref(), value);
        }
    }
}

impl<K: AsRef<str>, V> FromIterator<(K, V)> for RadixMap<V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<'a, V> IntoIterator for &'a RadixMap<V> {
    type Item = (&'a str, &'a V);
    type IntoIter = Entries<'a, V>;

    fn into_iter(self) -> Entries<'a, V> {
        self.iter()
    }
}

impl<V> IntoIterator for RadixMap<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(mut self) -> Self::IntoIter {
        self.nodes.drain(NodeId::ROOT).into_iter()
    }
}


#[cfg(test)]
mod proptests;
