mod arena;
mod handle;
mod node;
mod order;
mod raw_tree;

pub(crate) use handle::Handle;
pub(crate) use order::Order;
pub(crate) use raw_tree::RawBPlusTree;
