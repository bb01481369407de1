use crate::error::Error;

/// The configured order `m` of a B+ tree, fixed at construction.
///
/// The order bounds the fan-out of internal nodes and the capacity of
/// leaves. With `d = ceil(m / 2)` (the *degree*), the role-dependent key
/// count bounds are:
///
/// - internal: `d - 1 ..= m - 1` keys, always exactly `keys + 1` children
/// - leaf: `d ..= m` keys
///
/// The root is exempt from the minimums.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(transparent)]
pub(crate) struct Order(usize);

impl Order {
    /// The smallest order that can satisfy the capacity invariants.
    pub(crate) const MIN: usize = 3;

    /// Validates and wraps an order, rejecting anything below [`Order::MIN`].
    pub(crate) fn new(order: usize) -> Result<Self, Error> {
        if order < Self::MIN {
            return Err(Error::InvalidOrder { order });
        }
        Ok(Self(order))
    }

    #[inline]
    pub(crate) const fn get(self) -> usize {
        self.0
    }

    /// The degree `d = ceil(m / 2)`, the minimum fan-out of a non-root
    /// internal node.
    #[inline]
    pub(crate) const fn degree(self) -> usize {
        self.0.div_ceil(2)
    }

    #[inline]
    pub(crate) const fn max_internal_keys(self) -> usize {
        self.0 - 1
    }

    #[inline]
    pub(crate) const fn min_internal_keys(self) -> usize {
        self.degree() - 1
    }

    #[inline]
    pub(crate) const fn max_leaf_keys(self) -> usize {
        self.0
    }

    #[inline]
    pub(crate) const fn min_leaf_keys(self) -> usize {
        self.degree()
    }
}
