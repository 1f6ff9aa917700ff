//! Bidirectional maps

use rustc_hash::FxHashMap;
use std::hash::Hash;

/// A one-to-one map that can be queried from either side
///
/// Both directions are stored and every mutation updates them together, so
/// `forward` and `inverse` always describe the same set of pairs.
#[derive(Debug, Clone)]
pub struct BiMap<K, V> {
    forward: FxHashMap<K, V>,
    inverse: FxHashMap<V, K>,
}

/// Which side of a pair was already bound when inserting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiMapConflict {
    /// The key is already mapped
    Key,
    /// The value is already mapped from another key
    Value,
}

impl<K, V> BiMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
{
    /// Creates an empty map
    #[must_use]
    pub fn new() -> Self {
        Self {
            forward: FxHashMap::default(),
            inverse: FxHashMap::default(),
        }
    }

    /// Adds a pair, refusing to rebind either side
    ///
    /// # Errors
    ///
    /// Returns which side was already bound; the map is left unchanged
    pub fn insert(&mut self, key: K, value: V) -> Result<(), BiMapConflict> {
        if self.forward.contains_key(&key) {
            return Err(BiMapConflict::Key);
        }
        if self.inverse.contains_key(&value) {
            return Err(BiMapConflict::Value);
        }
        self.forward.insert(key.clone(), value.clone());
        self.inverse.insert(value, key);
        Ok(())
    }

    /// Key → value view
    pub fn forward(&self) -> &FxHashMap<K, V> {
        &self.forward
    }

    /// Value → key view
    pub fn inverse(&self) -> &FxHashMap<V, K> {
        &self.inverse
    }
}

impl<K, V> Default for BiMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_views_stay_in_sync() {
        let mut map = BiMap::new();
        map.insert("a", 1).unwrap();
        map.insert("b", 2).unwrap();
        assert_eq!(map.forward().get("a"), Some(&1));
        assert_eq!(map.inverse().get(&2), Some(&"b"));
        assert_eq!(map.forward().len(), map.inverse().len());
    }

    #[test]
    fn test_conflicts_leave_map_unchanged() {
        let mut map = BiMap::new();
        map.insert("a", 1).unwrap();
        assert_eq!(map.insert("a", 2), Err(BiMapConflict::Key));
        assert_eq!(map.insert("b", 1), Err(BiMapConflict::Value));
        assert_eq!(map.forward().len(), 1);
        assert_eq!(map.inverse().get(&1), Some(&"a"));
    }
}
