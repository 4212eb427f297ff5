//! Error type shared by the bit cursor and both codecs.

/// Errors raised while reading or writing a bitstream
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Stream64Error {
    /// The field width is outside `1..=MAX_BIT_WIDTH`.
    #[error("bit width {0} is outside the supported range 1..=56")]
    InvalidBitWidth(usize),
    /// The element count can't be derived from the buffer length at this width:
    /// the zero bits padding the final byte would decode as extra elements.
    #[error("bit width {0} is too narrow to derive an element count, supply the count explicitly")]
    AmbiguousCount(usize),
    /// A read would end past the last bit of the buffer.
    #[error("reading {requested} bits at bit {position} runs past the end of a {available}-bit buffer")]
    OutOfBounds {
        /// absolute bit position the read started at
        position: usize,
        /// number of bits requested
        requested: usize,
        /// bit length of the buffer
        available: usize,
    },
    /// The encoded bitstream does not fit into the output buffer.
    #[error("encoded bitstream does not fit into the {capacity}-byte output buffer")]
    IllegalInput {
        /// size of the output buffer in bytes
        capacity: usize,
    },
    /// The buffer ran out before the requested number of elements was decoded.
    #[error("buffer exhausted after {decoded} of {expected} elements")]
    Exhausted {
        /// elements decoded before running out
        decoded: usize,
        /// elements requested
        expected: usize,
    },
    /// The input to a sorted-set encoder decreases at `index`.
    #[error("input is not sorted: element {index} is smaller than its predecessor")]
    Unsorted {
        /// position of the offending element
        index: usize,
    },
    /// A decoded delta pushed the running sum past `u64::MAX`.
    #[error("decoded value {index} overflows u64")]
    Overflow {
        /// position of the offending element
        index: usize,
    },
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Stream64Error>;
