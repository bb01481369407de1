//! A height-balanced (AVL) binary search tree set.
//!
//! Independent of the B+ tree: a plain recursive structure with owned
//! child boxes, rebalanced by rotations whenever a subtree's height
//! difference exceeds one.

use core::fmt;
use core::mem;

type Link<T> = Option<Box<AvlNode<T>>>;

struct AvlNode<T> {
    value: T,
    height: i32,
    left: Link<T>,
    right: Link<T>,
}

/// An ordered set based on an AVL tree.
///
/// Duplicates are rejected: [`insert`](AvlTree::insert) reports whether the
/// value was actually added. The ordering policy is a stored strict
/// less-than comparator, defaulting to `Ord`.
///
/// # Examples
///
/// ```
/// use bptree::AvlTree;
///
/// let mut set = AvlTree::new();
/// assert!(set.insert(3));
/// assert!(set.insert(1));
/// assert!(!set.insert(3)); // already present
///
/// assert_eq!(set.remove(&1), Some(1));
/// assert!(set.contains(&3));
/// ```
pub struct AvlTree<T, F = fn(&T, &T) -> bool> {
    root: Link<T>,
    less: F,
    len: usize,
}

impl<T: Ord> AvlTree<T> {
    /// Creates an empty set ordered by the natural `Ord` ordering.
    #[must_use]
    pub fn new() -> Self {
        Self::with_comparator(|a, b| a.lt(b))
    }
}

impl<T: Ord> Default for AvlTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, F> AvlTree<T, F>
where
    F: Fn(&T, &T) -> bool,
{
    /// Creates an empty set ordered by a strict less-than comparator.
    pub fn with_comparator(less: F) -> Self {
        Self {
            root: None,
            less,
            len: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if the set contains a value equal to `value`.
    pub fn contains(&self, value: &T) -> bool {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            if (self.less)(value, &node.value) {
                current = node.left.as_deref();
            } else if (self.less)(&node.value, value) {
                current = node.right.as_deref();
            } else {
                return true;
            }
        }
        false
    }

    /// Inserts a value, returning true if it was not already present.
    pub fn insert(&mut self, value: T) -> bool {
        let (root, inserted) = insert_node(self.root.take(), value, &self.less);
        self.root = Some(root);
        if inserted {
            self.len += 1;
        }
        inserted
    }

    /// Removes a value, returning the stored element if it was present.
    pub fn remove(&mut self, value: &T) -> Option<T> {
        let (root, removed) = remove_node(self.root.take(), value, &self.less);
        self.root = root;
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Renders the tree with box-drawing branches, root first.
    ///
    /// Deterministic for identical set content; diagnostic use only.
    #[must_use]
    pub fn dump(&self) -> String
    where
        T: fmt::Display,
    {
        let Some(root) = self.root.as_deref() else {
            return String::new();
        };
        let mut out = format!("{}", root.value);
        pretty_print(root.left.as_deref(), &mut out, "", pointer_for(root.right.is_some()), root.right.is_some());
        pretty_print(root.right.as_deref(), &mut out, "", "└──", false);
        out.push('\n');
        out
    }
}

impl<T> AvlNode<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            height: 1, // a new node starts as a leaf
            left: None,
            right: None,
        }
    }

    fn update_height(&mut self) {
        self.height = height(&self.left).max(height(&self.right)) + 1;
    }

    /// Positive when right-heavy, negative when left-heavy.
    fn balance_factor(&self) -> i32 {
        height(&self.right) - height(&self.left)
    }
}

fn height<T>(link: &Link<T>) -> i32 {
    link.as_deref().map_or(0, |node| node.height)
}

fn insert_node<T, F>(link: Link<T>, value: T, less: &F) -> (Box<AvlNode<T>>, bool)
where
    F: Fn(&T, &T) -> bool,
{
    let Some(mut node) = link else {
        return (Box::new(AvlNode::new(value)), true);
    };

    let inserted;
    if less(&value, &node.value) {
        let (child, ok) = insert_node(node.left.take(), value, less);
        node.left = Some(child);
        inserted = ok;
    } else if less(&node.value, &value) {
        let (child, ok) = insert_node(node.right.take(), value, less);
        node.right = Some(child);
        inserted = ok;
    } else {
        // Equal values are skipped.
        return (node, false);
    }

    (rebalance(node), inserted)
}

fn remove_node<T, F>(link: Link<T>, value: &T, less: &F) -> (Link<T>, Option<T>)
where
    F: Fn(&T, &T) -> bool,
{
    let Some(mut node) = link else {
        return (None, None);
    };

    let removed;
    if less(value, &node.value) {
        let (child, out) = remove_node(node.left.take(), value, less);
        node.left = child;
        removed = out;
    } else if less(&node.value, value) {
        let (child, out) = remove_node(node.right.take(), value, less);
        node.right = child;
        removed = out;
    } else {
        match (node.left.take(), node.right.take()) {
            (None, None) => return (None, Some(node.value)),
            (Some(child), None) | (None, Some(child)) => return (Some(child), Some(node.value)),
            (left, Some(right)) => {
                // Two children: the in-order successor replaces this value.
                let (right, successor) = take_min(right);
                node.left = left;
                node.right = right;
                removed = Some(mem::replace(&mut node.value, successor));
            }
        }
    }

    if removed.is_none() {
        return (Some(node), None);
    }
    (Some(rebalance(node)), removed)
}

/// Detaches the minimum value of a subtree, rebalancing on the way out.
fn take_min<T>(mut node: Box<AvlNode<T>>) -> (Link<T>, T) {
    match node.left.take() {
        None => (node.right.take(), node.value),
        Some(left) => {
            let (rest, min) = take_min(left);
            node.left = rest;
            (Some(rebalance(node)), min)
        }
    }
}

fn rebalance<T>(mut node: Box<AvlNode<T>>) -> Box<AvlNode<T>> {
    node.update_height();
    let bf = node.balance_factor();

    if bf < -1 {
        // Left-right case: rotate the left child first.
        if node.left.as_deref().is_some_and(|left| left.balance_factor() > 0) {
            let left = node.left.take().expect("left-heavy node without a left child");
            node.left = Some(rotate_left(left));
        }
        return rotate_right(node);
    }
    if bf > 1 {
        // Right-left case: rotate the right child first.
        if node.right.as_deref().is_some_and(|right| right.balance_factor() < 0) {
            let right = node.right.take().expect("right-heavy node without a right child");
            node.right = Some(rotate_right(right));
        }
        return rotate_left(node);
    }
    node
}

//      y                             x
//     / \                           / \
//    T1  x    --> rotate_left(y)   y  T3
//       / \                       / \
//      T2 T3                     T1 T2
fn rotate_left<T>(mut y: Box<AvlNode<T>>) -> Box<AvlNode<T>> {
    let mut x = y.right.take().expect("left rotation without a right child");
    y.right = x.left.take();
    y.update_height();
    x.left = Some(y);
    x.update_height();
    x
}

//      y                             x
//     / \                           / \
//    x  T3    --> rotate_right(y)  T1  y
//   / \                               / \
//  T1 T2                             T2 T3
fn rotate_right<T>(mut y: Box<AvlNode<T>>) -> Box<AvlNode<T>> {
    let mut x = y.left.take().expect("right rotation without a left child");
    y.left = x.right.take();
    y.update_height();
    x.right = Some(y);
    x.update_height();
    x
}

fn pointer_for(has_right_sibling: bool) -> &'static str {
    if has_right_sibling { "├──" } else { "└──" }
}

fn pretty_print<T: fmt::Display>(
    link: Option<&AvlNode<T>>,
    out: &mut String,
    padding: &str,
    pointer: &str,
    has_right_sibling: bool,
) {
    let Some(node) = link else {
        return;
    };
    out.push('\n');
    out.push_str(padding);
    out.push_str(pointer);
    out.push_str(&format!("{}", node.value));

    let child_padding = format!("{padding}{}", if has_right_sibling { "│  " } else { "   " });
    pretty_print(node.left.as_deref(), out, &child_padding, pointer_for(node.right.is_some()), node.right.is_some());
    pretty_print(node.right.as_deref(), out, &child_padding, "└──", false);
}
