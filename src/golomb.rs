//! Golomb-Rice coded sets.
//!
//! A sorted set of `u64` is stored as the differences between consecutive elements
//! (the first element is stored relative to 0). Each difference `d` is split into
//! a quotient `d >> p`, written in unary (that many `1` bits and a terminating `0`),
//! and the lowest `p` bits of `d`, written as is.
//!
//! For values hashed uniformly into a range `N * M`, with `M ~ 2^p`, this is close to
//! the entropy of the set (see BIP-158 compact block filters, which use `p = 19`).
//!
//! # Note
//! * The format does not store the number of elements, `n` has to be supplied to [`decode`].
//! * Decoding is all or nothing: a buffer that runs out before `n` elements yields an error,
//!   never a truncated set.
//!
//! # Example
//! ```rust
//! use stream64::golomb::{encode_sorted, decode};
//! let set = vec![2_u64, 10, 10, 1_000_000];
//! let encoded = encode_sorted(&set, 19).unwrap();
//! assert_eq!(decode(&encoded, set.len(), 19).unwrap(), set);
//! ```

use itertools::Itertools;
use tracing::{debug, trace};
use crate::bitcursor::{check_bit_width, read_bits, read_unary, write_bits, write_unary, Cursor};
use crate::error::{Result, Stream64Error};

/// Bytes of output reserved per element when encoding.
/// A set whose bitstream exceeds `values.len() * ENCODE_BYTES_PER_VALUE` fails to encode.
pub const ENCODE_BYTES_PER_VALUE: usize = 8;

/// Encodes a sorted (non-decreasing) set.
///
/// The output buffer is sized at [`ENCODE_BYTES_PER_VALUE`] bytes per element and trimmed to
/// the bytes actually written. For sets meant for Golomb-Rice coding (gaps around `2^p`)
/// that is plenty, but a gap with a very long unary quotient can exceed it.
///
/// # Errors
/// * [`Stream64Error::InvalidBitWidth`] unless `1 <= p <= 56`
/// * [`Stream64Error::Unsorted`] if an element is smaller than its predecessor
/// * [`Stream64Error::IllegalInput`] if the bitstream doesn't fit into the output buffer
pub fn encode_sorted(values: &[u64], p: usize) -> Result<Vec<u8>> {
    check_bit_width(p)?;
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let mut buffer = vec![0_u8; values.len() * ENCODE_BYTES_PER_VALUE];
    let mut cursor = Cursor::new();
    let mut previous = 0_u64;
    for (index, &value) in values.iter().enumerate() {
        let delta = value.checked_sub(previous).ok_or(Stream64Error::Unsorted { index })?;
        previous = value;

        write_unary(&mut buffer, delta >> p, &mut cursor)?;
        write_bits(&mut buffer, p, delta, &mut cursor)?; // lowest p bits only
    }
    buffer.truncate(cursor.byte_len());

    trace!(values = values.len(), p, bytes = buffer.len(), "encoded golomb coded set");
    Ok(buffer)
}

/// Sorts a copy of `values`, then encodes it via [`encode_sorted`].
pub fn encode_unsorted(values: &[u64], p: usize) -> Result<Vec<u8>> {
    let sorted = values.iter().copied().sorted_unstable().collect_vec();
    encode_sorted(&sorted, p)
}

/// Decodes a set of `n` elements, see [`decode_prefix`].
pub fn decode(compressed: &[u8], n: usize, p: usize) -> Result<Vec<u64>> {
    decode_prefix(compressed, n, p).map(|(values, _)| values)
}

/// Decodes a set of `n` elements from the start of `compressed`.
/// Due to limitations of the format, we can't know (internally) how many elements were stored,
/// hence `n` needs to be specified.
///
/// # Returns
/// * the decoded (sorted) set, `len() == n`
/// * the number of bits that were processed in the input buffer.
///   Useful if the buffer holds other data behind the set.
///
/// `n == 0` returns an empty set without looking at the buffer.
///
/// # Errors
/// * [`Stream64Error::InvalidBitWidth`] unless `1 <= p <= 56`
/// * [`Stream64Error::Exhausted`] if the buffer runs out before `n` elements
/// * [`Stream64Error::Overflow`] if the running sum exceeds `u64::MAX`, i.e. the data is corrupt
///
/// # Example
/// ```rust
/// # use stream64::golomb::{encode_sorted, decode_prefix};
/// let set = vec![1_u64, 5, 9];
/// let mut buffer = encode_sorted(&set, 2).unwrap();
/// let set_bytes = buffer.len();
/// buffer.extend_from_slice(b"trailer");
///
/// let (decoded, bits_processed) = decode_prefix(&buffer, set.len(), 2).unwrap();
/// assert_eq!(decoded, set);
/// // the trailer starts at the next byte boundary
/// assert_eq!(bits_processed.div_ceil(8), set_bytes);
/// ```
pub fn decode_prefix(compressed: &[u8], n: usize, p: usize) -> Result<(Vec<u64>, usize)> {
    if n == 0 {
        return Ok((Vec::new(), 0));
    }
    check_bit_width(p)?;

    let mut cursor = Cursor::new();
    let mut accumulator = 0_u64;
    // every element takes at least p+1 bits, don't trust n for the allocation
    let mut values = Vec::with_capacity(n.min(compressed.len() * 8 / (p + 1)));
    for index in 0..n {
        if !cursor.has_more(compressed.len(), p) {
            return Err(Stream64Error::Exhausted { decoded: index, expected: n });
        }

        let (quotient, remainder) = match read_delta(compressed, p, &mut cursor) {
            Ok(parts) => parts,
            Err(error) => {
                trace!(%error, index, "golomb coded set ran out of data");
                return Err(Stream64Error::Exhausted { decoded: index, expected: n });
            }
        };
        if quotient > u64::MAX >> p {
            return Err(Stream64Error::Overflow { index });
        }
        let delta = (quotient << p) | remainder;
        accumulator = accumulator.checked_add(delta).ok_or(Stream64Error::Overflow { index })?;
        values.push(accumulator);
    }
    Ok((values, cursor.bits_processed()))
}

/// unary quotient, then the p-bit remainder
fn read_delta(compressed: &[u8], p: usize, cursor: &mut Cursor) -> Result<(u64, u64)> {
    let quotient = read_unary(compressed, cursor)?;
    let remainder = read_bits(compressed, p, cursor)?;
    Ok((quotient, remainder))
}

/// Engine behind a [`GolombCodedSetClient`].
///
/// Implementations only see the non-degenerate calls: the client answers
/// `n == 0` and empty inputs itself.
pub trait GcsBackend {
    /// Decodes `n` elements, see [`decode`]
    fn decode(&self, compressed: &[u8], n: usize, p: usize) -> Result<Vec<u64>>;
    /// Encodes a sorted set, see [`encode_sorted`]
    fn encode_sorted(&self, sorted: &[u64], p: usize) -> Result<Vec<u8>>;
}

/// The bit cursor based engine of this crate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stream64Gcs;

impl GcsBackend for Stream64Gcs {
    fn decode(&self, compressed: &[u8], n: usize, p: usize) -> Result<Vec<u64>> {
        decode(compressed, n, p)
    }

    fn encode_sorted(&self, sorted: &[u64], p: usize) -> Result<Vec<u8>> {
        encode_sorted(sorted, p)
    }
}

/// Front end for Golomb-Rice coded sets.
///
/// Any failure (corrupt or short data, bad `p`, unsorted input, overflowing output)
/// comes back as `None`, with the cause logged at debug level.
/// Use the functions of this module directly to get at the [`Stream64Error`].
///
/// # Example
/// ```rust
/// # use stream64::GolombCodedSetClient;
/// let client = GolombCodedSetClient::stream64();
/// let encoded = client.encode_sorted(&[1, 2, 3], 4).unwrap();
/// assert_eq!(client.decode(&encoded, 3, 4), Some(vec![1, 2, 3]));
/// // asking for more than there is
/// assert_eq!(client.decode(&encoded, 4, 4), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GolombCodedSetClient<B = Stream64Gcs> {
    backend: B,
}

impl GolombCodedSetClient<Stream64Gcs> {
    /// Client running on [`Stream64Gcs`]
    pub fn stream64() -> Self {
        GolombCodedSetClient { backend: Stream64Gcs }
    }
}

impl<B: GcsBackend> GolombCodedSetClient<B> {
    /// Client running on a custom backend
    pub fn new(backend: B) -> Self {
        GolombCodedSetClient { backend }
    }

    /// The backend doing the actual work
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Decodes a set of `n` elements. `n == 0` is answered without touching the buffer.
    pub fn decode(&self, compressed: &[u8], n: usize, p: usize) -> Option<Vec<u64>> {
        if n == 0 {
            return Some(Vec::new());
        }
        match self.backend.decode(compressed, n, p) {
            Ok(values) => Some(values),
            Err(error) => {
                debug!(%error, n, p, bytes = compressed.len(), "failed to decode golomb coded set");
                None
            }
        }
    }

    /// Encodes a sorted set. An empty set encodes to an empty buffer.
    pub fn encode_sorted(&self, sorted: &[u64], p: usize) -> Option<Vec<u8>> {
        if sorted.is_empty() {
            return Some(Vec::new());
        }
        match self.backend.encode_sorted(sorted, p) {
            Ok(encoded) => Some(encoded),
            Err(error) => {
                debug!(%error, values = sorted.len(), p, "failed to encode golomb coded set");
                None
            }
        }
    }

    /// Sorts a copy of `unsorted`, then encodes it.
    pub fn encode_unsorted(&self, unsorted: &[u64], p: usize) -> Option<Vec<u8>> {
        let sorted = unsorted.iter().copied().sorted_unstable().collect_vec();
        self.encode_sorted(&sorted, p)
    }
}
