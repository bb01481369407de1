use thiserror::Error;

/// Convenient alias for results carrying a crate [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

/// Errors surfaced by tree construction.
///
/// Mutating operations never return errors: a missing key is a normal
/// outcome communicated through `Option`, and an internal invariant
/// violation is a bug that panics rather than being swallowed.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The requested B+ tree order is below the minimum of 3.
    ///
    /// Orders below 3 cannot satisfy the node capacity invariants, so they
    /// are rejected at construction time instead of being silently clamped.
    #[error("invalid B+ tree order {order}: order must be at least 3")]
    InvalidOrder { order: usize },
}
