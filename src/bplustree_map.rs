//! An ordered map backed by an order-parameterized B+ tree.

use core::fmt;
use core::iter::FusedIterator;

use crate::error::Result;
use crate::raw::{Handle, Order, RawBPlusTree};

/// An ordered map based on an in-memory B+ tree with doubly-linked leaves.
///
/// Unlike the standard library's `BTreeMap`, the branching factor (the
/// *order*, at least 3) is chosen per tree at construction time, and the
/// ordering policy is a stored strict-less-than comparator rather than a
/// compile-time `Ord` obligation. All key/value pairs live in leaf nodes;
/// the leaves form a sorted doubly-linked chain, so ascending and
/// descending scans never revisit internal levels.
///
/// Keys must be `Clone` because a leaf split copies its split key upward
/// as a separator. Values carry no bounds.
///
/// It is a logic error for the comparator to be anything other than a
/// strict weak ordering, or for a key to change its ordering relative to
/// other keys while it is in the map. The behavior resulting from either
/// is unspecified (panics, incorrect results), but never undefined.
///
/// # Examples
///
/// ```
/// use bptree::BPlusTreeMap;
///
/// let mut headcount = BPlusTreeMap::new(4)?;
/// headcount.insert("records", 12);
/// headcount.insert("shipping", 31);
/// headcount.insert("support", 9);
///
/// assert_eq!(headcount.get(&"support"), Some(&9));
/// assert_eq!(headcount.remove(&"records"), Some(12));
///
/// // Entries come back in key order.
/// let names: Vec<&str> = headcount.iter().map(|(k, _)| *k).collect();
/// assert_eq!(names, ["shipping", "support"]);
/// # Ok::<(), bptree::Error>(())
/// ```
pub struct BPlusTreeMap<K, V, F = fn(&K, &K) -> bool> {
    raw: RawBPlusTree<K, V, F>,
}

impl<K: Ord, V> BPlusTreeMap<K, V> {
    /// Creates an empty map of the given order, keyed by the natural `Ord`
    /// ordering.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOrder`](crate::Error::InvalidOrder) if
    /// `order < 3`.
    pub fn new(order: usize) -> Result<Self> {
        Self::with_comparator(order, |a, b| a.lt(b))
    }
}

impl<K, V, F> BPlusTreeMap<K, V, F>
where
    F: Fn(&K, &K) -> bool,
{
    /// Creates an empty map of the given order, keyed by a strict
    /// less-than comparator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOrder`](crate::Error::InvalidOrder) if
    /// `order < 3`.
    pub fn with_comparator(order: usize, less: F) -> Result<Self> {
        Ok(Self {
            raw: RawBPlusTree::new(Order::new(order)?, less),
        })
    }

    /// Returns the order the map was constructed with.
    #[must_use]
    pub fn order(&self) -> usize {
        self.raw.order().get()
    }

    /// Returns the number of key/value pairs in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns true if the map contains no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Removes all pairs from the map. The order and comparator persist.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.raw.get(key)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.raw.get_mut(key)
    }

    /// Returns true if the map contains the given key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.raw.search(key).is_some()
    }

    /// Inserts a key/value pair into the map.
    ///
    /// If the key was already present its value is overwritten and the old
    /// value returned; the tree shape is unchanged in that case.
    pub fn insert(&mut self, key: K, value: V) -> Option<V>
    where
        K: Clone,
    {
        self.raw.insert(key, value)
    }

    /// Removes a key from the map, returning its value if it was present.
    pub fn remove(&mut self, key: &K) -> Option<V>
    where
        K: Clone,
    {
        self.raw.remove(key)
    }

    /// Returns the first (smallest) key/value pair, if any.
    #[must_use]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let leaf = self.raw.first_leaf()?;
        Some(self.raw.leaf_entry(leaf, 0))
    }

    /// Returns the last (greatest) key/value pair, if any.
    #[must_use]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let leaf = self.raw.last_leaf()?;
        let last = self.raw.node(leaf).key_count() - 1;
        Some(self.raw.leaf_entry(leaf, last))
    }

    /// An iterator over the pairs of the map in ascending key order.
    ///
    /// The iterator walks the leaf chain, so advancing is amortized O(1);
    /// it is double-ended, with the reverse direction following the `prev`
    /// links from the rightmost leaf.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V, F> {
        let front = self.raw.first_leaf().map(|leaf| (leaf, 0));
        let back = self.raw.last_leaf().map(|leaf| (leaf, self.raw.node(leaf).key_count() - 1));
        Iter {
            raw: &self.raw,
            front,
            back,
            remaining: self.raw.len(),
        }
    }

    /// An iterator over the keys of the map in ascending order.
    #[must_use]
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    /// An iterator over the values of the map in ascending key order.
    #[must_use]
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    /// Renders the tree level by level for diagnostics and tests.
    ///
    /// The output is deterministic for identical map content; its exact
    /// shape is not a compatibility surface.
    #[must_use]
    pub fn dump(&self) -> String
    where
        K: fmt::Debug,
        V: fmt::Debug,
    {
        self.raw.dump()
    }
}

impl<K, V, F> fmt::Debug for BPlusTreeMap<K, V, F>
where
    K: fmt::Debug,
    V: fmt::Debug,
    F: Fn(&K, &K) -> bool,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, F> IntoIterator for &'a BPlusTreeMap<K, V, F>
where
    F: Fn(&K, &K) -> bool,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, F>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the entries of a [`BPlusTreeMap`] in key order.
pub struct Iter<'a, K, V, F> {
    raw: &'a RawBPlusTree<K, V, F>,
    /// Next position to yield from the front: a leaf and an index into it.
    front: Option<(Handle, usize)>,
    /// Next position to yield from the back.
    back: Option<(Handle, usize)>,
    /// Entries not yet yielded from either end.
    remaining: usize,
}

impl<'a, K, V, F> Iterator for Iter<'a, K, V, F>
where
    F: Fn(&K, &K) -> bool,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let (leaf, index) = self.front?;
        let entry = self.raw.leaf_entry(leaf, index);
        self.remaining -= 1;

        let node = self.raw.node(leaf);
        self.front = if index + 1 < node.key_count() {
            Some((leaf, index + 1))
        } else {
            node.next().map(|next| (next, 0))
        };
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, F> DoubleEndedIterator for Iter<'_, K, V, F>
where
    F: Fn(&K, &K) -> bool,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let (leaf, index) = self.back?;
        let entry = self.raw.leaf_entry(leaf, index);
        self.remaining -= 1;

        self.back = if index > 0 {
            Some((leaf, index - 1))
        } else {
            self.raw
                .node(leaf)
                .prev()
                .map(|prev| (prev, self.raw.node(prev).key_count() - 1))
        };
        Some(entry)
    }
}

impl<K, V, F> ExactSizeIterator for Iter<'_, K, V, F>
where
    F: Fn(&K, &K) -> bool,
{
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V, F> FusedIterator for Iter<'_, K, V, F> where F: Fn(&K, &K) -> bool {}
