use smallvec::SmallVec;

use super::handle::Handle;

/// Inline capacity for per-node sequences. Nodes of small orders never
/// touch the heap for their key/value/child storage; larger orders spill.
pub(crate) const INLINE: usize = 8;

pub(crate) type Keys<K> = SmallVec<[K; INLINE]>;
pub(crate) type Values<V> = SmallVec<[V; INLINE]>;
pub(crate) type Children = SmallVec<[Handle; INLINE]>;

/// A B+ tree node: one tagged type serving both the internal and the leaf
/// role.
///
/// Common to both roles: a strictly increasing key sequence and a
/// non-owning back-reference to the parent (absent only for the root).
/// An internal node additionally holds `keys + 1` child handles; a leaf
/// holds a value sequence parallel to its keys plus the `prev`/`next`
/// links of the sorted leaf chain.
pub(crate) struct Node<K, V> {
    parent: Option<Handle>,
    keys: Keys<K>,
    role: Role<V>,
}

pub(crate) enum Role<V> {
    Internal {
        children: Children,
    },
    Leaf {
        values: Values<V>,
        prev: Option<Handle>,
        next: Option<Handle>,
    },
}

/// Result of locating a key within a node's key sequence: the matching
/// index if present, or the insertion point if absent.
pub(crate) fn locate<K, F>(keys: &[K], key: &K, less: &F) -> (usize, bool)
where
    F: Fn(&K, &K) -> bool,
{
    // Keys are strictly increasing, so the partition point is the first
    // key >= `key`; it matches exactly when `key` is not below it either.
    let index = keys.partition_point(|k| less(k, key));
    let found = index < keys.len() && !less(key, &keys[index]);
    (index, found)
}

impl<K, V> Node<K, V> {
    /// Creates a new empty leaf node.
    pub(crate) fn new_leaf() -> Self {
        Self {
            parent: None,
            keys: SmallVec::new(),
            role: Role::Leaf {
                values: SmallVec::new(),
                prev: None,
                next: None,
            },
        }
    }

    /// Creates a new empty internal node.
    pub(crate) fn new_internal() -> Self {
        Self {
            parent: None,
            keys: SmallVec::new(),
            role: Role::Internal {
                children: SmallVec::new(),
            },
        }
    }

    /// Returns true if this node plays the leaf role.
    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self.role, Role::Leaf { .. })
    }

    pub(crate) fn parent(&self) -> Option<Handle> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Handle>) {
        self.parent = parent;
    }

    /// Returns the number of keys in this node.
    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    pub(crate) fn keys_mut(&mut self) -> &mut Keys<K> {
        &mut self.keys
    }

    // ─── Internal role ──────────────────────────────────────────────────────

    /// Returns the child handles, panicking if this is a leaf.
    pub(crate) fn children(&self) -> &[Handle] {
        match &self.role {
            Role::Internal { children } => children,
            Role::Leaf { .. } => panic!("expected internal node"),
        }
    }

    pub(crate) fn children_mut(&mut self) -> &mut Children {
        match &mut self.role {
            Role::Internal { children } => children,
            Role::Leaf { .. } => panic!("expected internal node"),
        }
    }

    /// Consumes an internal node, yielding its keys and children.
    pub(crate) fn into_internal_parts(self) -> (Keys<K>, Children) {
        match self.role {
            Role::Internal { children } => (self.keys, children),
            Role::Leaf { .. } => panic!("expected internal node"),
        }
    }

    // ─── Leaf role ──────────────────────────────────────────────────────────

    /// Returns the value slots, panicking if this is an internal node.
    pub(crate) fn values(&self) -> &[V] {
        match &self.role {
            Role::Leaf { values, .. } => values,
            Role::Internal { .. } => panic!("expected leaf node"),
        }
    }

    pub(crate) fn values_mut(&mut self) -> &mut Values<V> {
        match &mut self.role {
            Role::Leaf { values, .. } => values,
            Role::Internal { .. } => panic!("expected leaf node"),
        }
    }

    pub(crate) fn prev(&self) -> Option<Handle> {
        match &self.role {
            Role::Leaf { prev, .. } => *prev,
            Role::Internal { .. } => panic!("expected leaf node"),
        }
    }

    pub(crate) fn set_prev(&mut self, link: Option<Handle>) {
        match &mut self.role {
            Role::Leaf { prev, .. } => *prev = link,
            Role::Internal { .. } => panic!("expected leaf node"),
        }
    }

    pub(crate) fn next(&self) -> Option<Handle> {
        match &self.role {
            Role::Leaf { next, .. } => *next,
            Role::Internal { .. } => panic!("expected leaf node"),
        }
    }

    pub(crate) fn set_next(&mut self, link: Option<Handle>) {
        match &mut self.role {
            Role::Leaf { next, .. } => *next = link,
            Role::Internal { .. } => panic!("expected leaf node"),
        }
    }

    /// Inserts a key/value pair at `index`, shifting later pairs right.
    pub(crate) fn leaf_insert(&mut self, index: usize, key: K, value: V) {
        match &mut self.role {
            Role::Leaf { values, .. } => {
                self.keys.insert(index, key);
                values.insert(index, value);
            }
            Role::Internal { .. } => panic!("expected leaf node"),
        }
    }

    /// Removes the key/value pair at `index`, shifting later pairs left.
    pub(crate) fn leaf_remove(&mut self, index: usize) -> (K, V) {
        match &mut self.role {
            Role::Leaf { values, .. } => (self.keys.remove(index), values.remove(index)),
            Role::Internal { .. } => panic!("expected leaf node"),
        }
    }

    /// Consumes a leaf, yielding its keys, values and forward link.
    pub(crate) fn into_leaf_parts(self) -> (Keys<K>, Values<V>, Option<Handle>) {
        match self.role {
            Role::Leaf { values, next, .. } => (self.keys, values, next),
            Role::Internal { .. } => panic!("expected leaf node"),
        }
    }
}
