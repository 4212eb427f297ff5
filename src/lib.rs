//! Crate implementing two bit-level encodings of `u64` integers:
//!
//! * **Stream64**: fixed-width bit packing, every value stored with exactly `p` bits,
//!   no alignment between values.
//! * **Golomb-Rice coded sets**: a sorted set stored as successive differences,
//!   each split into a unary quotient and a `p`-bit remainder, as used by compact block filters
//!   (see [BIP-158](https://github.com/bitcoin/bips/blob/master/bip-0158.mediawiki)).
//!
//! # Overview
//! Both codecs drive the same primitive, a [`bitcursor::Cursor`] over a byte buffer,
//! which reads and writes fields of 1..=56 bits at arbitrary bit offsets.
//!
//! # Note
//! * Neither format is self-describing: the element count and `p` have to be supplied out-of-band
//!   when decoding (e.g. from a length prefix of the enclosing message).
//! * The reference format asks callers to append [`PADDING_BYTES`] zero bytes to any buffer they decode.
//!   Here this is never required: reads beyond the slice are bounds-checked, never performed.
//!   Padded buffers are still accepted, the padding decodes as zero bits.
//!
//! # Example
//! ```rust
//! use stream64::{stream_write, Stream64, GolombCodedSetClient};
//! // fixed width
//! let values = vec![0_u64, 2047, 0, 2047];
//! let packed = stream_write(&values, 11).unwrap();
//! assert_eq!(packed, vec![0, 31, 252, 0, 127, 240]);
//! let stream = Stream64::new(packed, 11).unwrap();
//! assert_eq!(stream.iter().collect::<Vec<_>>(), values);
//!
//! // Golomb-Rice coded set
//! let client = GolombCodedSetClient::stream64();
//! let set = vec![3_u64, 700_000, 12, 1_000_000];
//! let encoded = client.encode_unsorted(&set, 19).unwrap();
//! let decoded = client.decode(&encoded, set.len(), 19).unwrap();
//! assert_eq!(decoded, vec![3, 12, 700_000, 1_000_000]);
//! ```
//!
//! # Memory layout
//!
//! Stream64:
//! - |p bits|p bits|p bits|...|zero pad to byte|
//!
//! Golomb-Rice set, per delta `d` to the previous element:
//! - |1 x (d >> p)|0|low p bits of d|...|zero pad to byte|
//!
#![deny(missing_docs)]
pub mod bitcursor;
pub mod error;
pub mod golomb;
pub mod stream64;

pub use error::{Result, Stream64Error};
pub use golomb::{GcsBackend, GolombCodedSetClient, Stream64Gcs};
pub use stream64::{stream_write, Stream64, Stream64Iter};

use bitvec::prelude as bv;

/// The type of bitslice handed out for the undecoded tail of a buffer.
/// MSB-first, matching the bit order of both codecs.
pub type MyBitSlice = bv::BitSlice<u8, bv::Msb0>;

/// Widest field a single read or write handles
pub const MAX_BIT_WIDTH: usize = 56;

/// Zero bytes the reference format appends behind meaningful data,
/// so a 64-bit word can be loaded starting at the final byte.
pub const PADDING_BYTES: usize = 7;
