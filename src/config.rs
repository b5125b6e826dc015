//! Map configuration and its validation.

use crate::error::{Error, Result};

/// Hard upper bound on arena slots, since node ids are stored as `u32`.
pub const MAX_NODES: usize = u32::MAX as usize;

/// Largest number of nodes the arena will preallocate up front.
pub const MAX_INITIAL_CAPACITY: usize = 1 << 20;

/// Configuration for a [`RadixMap`](crate::RadixMap).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of nodes the arena preallocates
    pub initial_capacity: usize,
    /// Maximum number of arena slots (root included)
    pub max_nodes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            max_nodes: MAX_NODES,
        }
    }
}

impl Config {
    /// Check that the settings describe a usable map.
    pub fn validate(&self) -> Result<()> {
        if self.max_nodes == 0 {
            return Err(Error::InvalidConfig(
                "max_nodes must leave room for the root node".into(),
            ));
        }
        if self.max_nodes > MAX_NODES {
            return Err(Error::InvalidConfig(format!(
                "max_nodes {} exceeds the addressable limit {}",
                self.max_nodes, MAX_NODES
            )));
        }
        if self.initial_capacity > MAX_INITIAL_CAPACITY {
            return Err(Error::InvalidConfig(format!(
                "initial_capacity {} exceeds the preallocation limit {}",
                self.initial_capacity, MAX_INITIAL_CAPACITY
            )));
        }
        if self.initial_capacity > self.max_nodes {
            return Err(Error::InvalidConfig(format!(
                "initial_capacity {} exceeds max_nodes {}",
                self.initial_capacity, self.max_nodes
            )));
        }
        Ok(())
    }
}
