use thiserror::Error;

/// Errors reported by construction and splat operations.
///
/// Every variant is caller-correctable. A splat that returns one of these
/// has not allocated or modified anything.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// `(depth + 1) * ceil(size / 64)` words cannot be addressed.
    #[error("bitmap of depth {depth} and size {size} overflows the addressable word count")]
    InvalidArgument {
        /// Requested number of value bits.
        depth: usize,
        /// Requested number of id slots.
        size: u64,
    },

    /// An id is not below the bitmap size.
    #[error("id {id} out of range for bitmap of size {size}")]
    OutOfRange {
        /// The offending id.
        id: u64,
        /// Size of the bitmap the batch was applied to.
        size: u64,
    },

    /// The id and value sequences differ in length.
    #[error("batch has {ids} ids but {values} values")]
    LengthMismatch {
        /// Length of the id sequence.
        ids: usize,
        /// Length of the value sequence.
        values: usize,
    },

    /// The batched algorithm was handed ids that are not in ascending order.
    #[error("id {id} at position {index} follows larger id {previous}")]
    PreconditionViolation {
        /// Position of the first id that breaks the order.
        index: usize,
        /// The id just before it.
        previous: u64,
        /// The offending id.
        id: u64,
    },
}

/// A specialized Result type for bit-sliced bitmap operations.
pub type Result<T> = core::result::Result<T, Error>;
