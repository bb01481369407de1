//! Self-balancing search trees for Rust.
//!
//! The centerpiece of this crate is [`BPlusTreeMap`], an in-memory,
//! order-parameterized B+ tree: all key/value pairs live in leaf nodes, the
//! leaves are stitched into a sorted doubly-linked chain for sequential
//! scans, and internal nodes carry only separator keys. The fan-out (the
//! *order*) is chosen at construction time, as is the key comparison policy.
//!
//! ```
//! use bptree::BPlusTreeMap;
//!
//! let mut map = BPlusTreeMap::new(4).unwrap();
//! for k in 1..=10 {
//!     map.insert(k, k * 10);
//! }
//! map.remove(&5);
//!
//! let keys: Vec<i32> = map.iter().map(|(k, _)| *k).collect();
//! assert_eq!(keys, [1, 2, 3, 4, 6, 7, 8, 9, 10]);
//! ```
//!
//! Two simpler self-balancing structures ship alongside it as independent
//! modules; they share no code or invariants with the B+ tree:
//!
//! - [`AvlTree`] - a height-balanced binary search tree.
//! - [`RbTree`] - a red-black binary search tree.
//!
//! # Scope
//!
//! Everything here is a pure in-process data structure: no persistence, no
//! transactions, and no internal synchronization. A tree exclusively owns
//! its nodes; callers needing concurrent access must serialize access to
//! the tree themselves.

#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod raw;

pub mod avltree;
pub mod bplustree_map;
pub mod rbtree;

pub use avltree::AvlTree;
pub use bplustree_map::BPlusTreeMap;
pub use error::{Error, Result};
pub use rbtree::RbTree;
