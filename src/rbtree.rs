//! A red-black binary search tree set.
//!
//! Implemented in the left-leaning style: red links only ever lean left,
//! which collapses the rebalancing cases to three local fixups applied on
//! the way back up from every insert and remove.

use core::fmt;
use core::mem;

type Link<T> = Option<Box<RbNode<T>>>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

impl Color {
    fn flipped(self) -> Self {
        match self {
            Self::Red => Self::Black,
            Self::Black => Self::Red,
        }
    }
}

struct RbNode<T> {
    value: T,
    color: Color,
    left: Link<T>,
    right: Link<T>,
}

/// An ordered set based on a left-leaning red-black tree.
///
/// Same surface as [`AvlTree`](crate::AvlTree): duplicates are rejected,
/// the ordering policy is a stored strict less-than comparator defaulting
/// to `Ord`, and the balancing discipline is the only difference.
///
/// # Examples
///
/// ```
/// use bptree::RbTree;
///
/// let mut set = RbTree::new();
/// assert!(set.insert("oak"));
/// assert!(set.insert("ash"));
/// assert!(!set.insert("oak"));
///
/// assert_eq!(set.remove(&"ash"), Some("ash"));
/// assert!(!set.contains(&"ash"));
/// ```
pub struct RbTree<T, F = fn(&T, &T) -> bool> {
    root: Link<T>,
    less: F,
    len: usize,
}

impl<T: Ord> RbTree<T> {
    /// Creates an empty set ordered by the natural `Ord` ordering.
    #[must_use]
    pub fn new() -> Self {
        Self::with_comparator(|a, b| a.lt(b))
    }
}

impl<T: Ord> Default for RbTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, F> RbTree<T, F>
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
        let (mut root, inserted) = insert_node(self.root.take(), value, &self.less);
        root.color = Color::Black;
        self.root = Some(root);
        if inserted {
            self.len += 1;
        }
        inserted
    }

    /// Removes a value, returning the stored element if it was present.
    pub fn remove(&mut self, value: &T) -> Option<T> {
        // The removal walk assumes the value is present; check up front.
        if !self.contains(value) {
            return None;
        }
        let root = self.root.take()?;
        let (root, removed) = remove_node(root, value, &self.less);
        self.root = root.map(|mut node| {
            node.color = Color::Black;
            node
        });
        self.len -= 1;
        removed
    }

    /// Renders the tree with box-drawing branches, root first. Red nodes
    /// carry a trailing `*`.
    ///
    /// Deterministic for identical insertion histories; diagnostic use only.
    #[must_use]
    pub fn dump(&self) -> String
    where
        T: fmt::Display,
    {
        let Some(root) = self.root.as_deref() else {
            return String::new();
        };
        let mut out = String::new();
        write_value(&mut out, root);
        pretty_print(root.left.as_deref(), &mut out, "", pointer_for(root.right.is_some()), root.right.is_some());
        pretty_print(root.right.as_deref(), &mut out, "", "└──", false);
        out.push('\n');
        out
    }
}

impl<T> RbNode<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            color: Color::Red, // new links start red
            left: None,
            right: None,
        }
    }
}

fn is_red<T>(link: &Link<T>) -> bool {
    link.as_deref().is_some_and(|node| node.color == Color::Red)
}

fn left_left_is_red<T>(node: &RbNode<T>) -> bool {
    node.left.as_deref().is_some_and(|left| is_red(&left.left))
}

fn insert_node<T, F>(link: Link<T>, value: T, less: &F) -> (Box<RbNode<T>>, bool)
where
    F: Fn(&T, &T) -> bool,
{
    let Some(mut node) = link else {
        return (Box::new(RbNode::new(value)), true);
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
        return (node, false);
    }

    (fix_up(node), inserted)
}

fn remove_node<T, F>(mut node: Box<RbNode<T>>, value: &T, less: &F) -> (Link<T>, Option<T>)
where
    F: Fn(&T, &T) -> bool,
{
    let removed;
    if less(value, &node.value) {
        if !is_red(&node.left) && !left_left_is_red(&node) {
            node = move_red_left(node);
        }
        let left = node.left.take().expect("removal descended into an absent left subtree");
        let (child, out) = remove_node(left, value, less);
        node.left = child;
        removed = out;
    } else {
        if is_red(&node.left) {
            node = rotate_right(node);
        }
        if !less(&node.value, value) && node.right.is_none() {
            // A match at the bottom of the tree simply drops out.
            return (None, Some(node.value));
        }
        if !is_red(&node.right) && !node.right.as_deref().is_some_and(|right| is_red(&right.left)) {
            node = move_red_right(node);
        }
        if !less(&node.value, value) && !less(value, &node.value) {
            // An interior match is replaced by its in-order successor.
            let right = node.right.take().expect("interior match without a right subtree");
            let (rest, successor) = take_min(right);
            node.right = rest;
            removed = Some(mem::replace(&mut node.value, successor));
        } else {
            let right = node.right.take().expect("removal descended into an absent right subtree");
            let (child, out) = remove_node(right, value, less);
            node.right = child;
            removed = out;
        }
    }

    (Some(fix_up(node)), removed)
}

/// Detaches the minimum value of a subtree, fixing up on the way out.
fn take_min<T>(mut node: Box<RbNode<T>>) -> (Link<T>, T) {
    if node.left.is_none() {
        return (None, node.value);
    }
    if !is_red(&node.left) && !left_left_is_red(&node) {
        node = move_red_left(node);
    }
    let left = node.left.take().expect("minimum walk lost its left subtree");
    let (rest, min) = take_min(left);
    node.left = rest;
    (Some(fix_up(node)), min)
}

/// Restores the left-leaning invariants after a local change: no right
/// red link, no two consecutive left red links, no red sibling pair.
fn fix_up<T>(mut node: Box<RbNode<T>>) -> Box<RbNode<T>> {
    if is_red(&node.right) && !is_red(&node.left) {
        node = rotate_left(node);
    }
    if is_red(&node.left) && left_left_is_red(&node) {
        node = rotate_right(node);
    }
    if is_red(&node.left) && is_red(&node.right) {
        flip_colors(&mut node);
    }
    node
}

fn rotate_left<T>(mut node: Box<RbNode<T>>) -> Box<RbNode<T>> {
    let mut x = node.right.take().expect("left rotation without a right child");
    node.right = x.left.take();
    x.color = node.color;
    node.color = Color::Red;
    x.left = Some(node);
    x
}

fn rotate_right<T>(mut node: Box<RbNode<T>>) -> Box<RbNode<T>> {
    let mut x = node.left.take().expect("right rotation without a left child");
    node.left = x.right.take();
    x.color = node.color;
    node.color = Color::Red;
    x.right = Some(node);
    x
}

/// Inverts the colors of a node and both of its children.
fn flip_colors<T>(node: &mut RbNode<T>) {
    node.color = node.color.flipped();
    if let Some(left) = node.left.as_deref_mut() {
        left.color = left.color.flipped();
    }
    if let Some(right) = node.right.as_deref_mut() {
        right.color = right.color.flipped();
    }
}

/// Borrows from the right sibling so the left spine has a red link to
/// descend through.
fn move_red_left<T>(mut node: Box<RbNode<T>>) -> Box<RbNode<T>> {
    flip_colors(&mut node);
    if node.right.as_deref().is_some_and(|right| is_red(&right.left)) {
        let right = node.right.take().expect("red borrow from an absent right sibling");
        node.right = Some(rotate_right(right));
        node = rotate_left(node);
        flip_colors(&mut node);
    }
    node
}

/// Borrows from the left sibling so the right spine has a red link to
/// descend through.
fn move_red_right<T>(mut node: Box<RbNode<T>>) -> Box<RbNode<T>> {
    flip_colors(&mut node);
    if left_left_is_red(&node) {
        node = rotate_right(node);
        flip_colors(&mut node);
    }
    node
}

fn pointer_for(has_right_sibling: bool) -> &'static str {
    if has_right_sibling { "├──" } else { "└──" }
}

fn write_value<T: fmt::Display>(out: &mut String, node: &RbNode<T>) {
    out.push_str(&format!("{}", node.value));
    if node.color == Color::Red {
        out.push('*');
    }
}

fn pretty_print<T: fmt::Display>(
    link: Option<&RbNode<T>>,
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
    write_value(out, node);

    let child_padding = format!("{padding}{}", if has_right_sibling { "│  " } else { "   " });
    pretty_print(node.left.as_deref(), out, &child_padding, pointer_for(node.right.is_some()), node.right.is_some());
    pretty_print(node.right.as_deref(), out, &child_padding, "└──", false);
}
