//! Fixed-width bit packing: every value is stored using exactly `p` bits,
//! back to back, MSB-first, without any alignment between values.
//!
//! Encoding is eager ([`stream_write`]), decoding is lazy: a [`Stream64`] is an immutable view
//! over the packed bytes which hands out independent iterators, each with its own cursor.
//!
//! # Example
//! ```rust
//! use stream64::{stream_write, Stream64};
//! let values = vec![0_u64, 524287, 0, 524287];
//! let packed = stream_write(&values, 19).unwrap();
//! assert_eq!(packed, vec![0, 0, 0x1f, 0xff, 0xfc, 0, 0, 127, 0xff, 0xf0]);
//!
//! // the element count is derived from the buffer length
//! let stream = Stream64::new(packed.clone(), 19).unwrap();
//! assert_eq!(stream.len(), 4);
//! assert_eq!(stream.iter().collect::<Vec<_>>(), values);
//!
//! // or given explicitly, required for p < 8
//! let stream = Stream64::with_count(packed, 4, 19).unwrap();
//! assert_eq!(stream.decode_all().unwrap(), values);
//! ```

use std::iter::FusedIterator;
use tracing::{debug, trace};
use crate::bitcursor::{check_bit_width, read_bits, write_bits, Cursor};
use crate::error::{Result, Stream64Error};
use crate::PADDING_BYTES;

/// Packs `values` using `p` bits each.
///
/// The output is exactly `ceil(values.len() * p / 8)` bytes, the last byte zero-padded.
/// **Warning** this DOES NOT check if each element fits into `p` bits
/// but just takes each element's lowest `p` bits, truncating the higher bits.
///
/// # Errors
/// [`Stream64Error::InvalidBitWidth`] unless `1 <= p <= 56`.
///
/// # Example
/// ```rust
/// # use stream64::stream_write;
/// let mut input = vec![1_u64; 103];
/// input.push(0);
/// let packed = stream_write(&input, 1).unwrap();
/// assert_eq!(packed.len(), 13);
/// assert_eq!(packed[12], 0b1111_1110);
/// ```
pub fn stream_write(values: &[u64], p: usize) -> Result<Vec<u8>> {
    check_bit_width(p)?;

    let bits = values.len() * p;
    let mut buffer = vec![0_u8; bits.div_ceil(8)];
    let mut cursor = Cursor::new();
    for &v in values {
        write_bits(&mut buffer, p, v, &mut cursor)?;
    }
    debug_assert_eq!(cursor.byte_len(), buffer.len());

    trace!(values = values.len(), p, bytes = buffer.len(), "packed fixed-width stream");
    Ok(buffer)
}

/// Immutable view over a fixed-width packed buffer.
///
/// Iterating (via [`Stream64::iter`] or `&stream`) always starts from the first element;
/// any number of iterators can run over the same view, also from different threads.
///
/// With the `serde` feature the view can be stored as part of a larger structure.
/// Deserializing validates `p` like [`Stream64::with_count`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "StoredStream64"))]
pub struct Stream64 {
    data: Vec<u8>,
    count: usize,
    p: usize,
}

/// Unvalidated fields of a deserialized [`Stream64`]
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct StoredStream64 {
    data: Vec<u8>,
    count: usize,
    p: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<StoredStream64> for Stream64 {
    type Error = Stream64Error;

    fn try_from(stored: StoredStream64) -> Result<Self> {
        Stream64::with_count(stored.data, stored.count, stored.p)
    }
}

impl Stream64 {
    /// View over `data` holding `count` elements of `p` bits each.
    ///
    /// # Errors
    /// [`Stream64Error::InvalidBitWidth`] unless `1 <= p <= 56`.
    pub fn with_count(data: Vec<u8>, count: usize, p: usize) -> Result<Self> {
        check_bit_width(p)?;
        Ok(Stream64 { data, count, p })
    }

    /// View over `data`, deriving the element count as `floor(data.len() * 8 / p)`.
    /// [`PADDING_BYTES`] zero bytes are appended to the buffer.
    ///
    /// # Errors
    /// * [`Stream64Error::InvalidBitWidth`] unless `1 <= p <= 56`
    /// * [`Stream64Error::AmbiguousCount`] if `p < 8`: the zero bits padding the final byte
    ///   could hold a whole extra element. Use [`Stream64::with_count`] instead.
    pub fn new(mut data: Vec<u8>, p: usize) -> Result<Self> {
        check_bit_width(p)?;
        if p < 8 {
            return Err(Stream64Error::AmbiguousCount(p));
        }
        let count = data.len() * 8 / p;
        data.resize(data.len() + PADDING_BYTES, 0);
        Ok(Stream64 { data, count, p })
    }

    /// Number of elements in the stream
    pub fn len(&self) -> usize {
        self.count
    }

    /// true if the stream holds no elements
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Bits per element
    pub fn bit_width(&self) -> usize {
        self.p
    }

    /// The underlying buffer, including padding added by [`Stream64::new`]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// A fresh iterator, starting at the first element
    pub fn iter(&self) -> Stream64Iter<'_> {
        Stream64Iter { stream: self, cursor: Cursor::new(), index: 0 }
    }

    /// Decodes all elements at once.
    /// Unlike the iterator, which just stops early, a buffer too short for the
    /// element count is an error here.
    ///
    /// # Errors
    /// [`Stream64Error::OutOfBounds`] if the buffer runs out before `len()` elements.
    pub fn decode_all(&self) -> Result<Vec<u64>> {
        let mut cursor = Cursor::new();
        (0..self.count)
            .map(|_| read_bits(&self.data, self.p, &mut cursor))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Stream64 {
    type Item = u64;
    type IntoIter = Stream64Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the elements of a [`Stream64`]
///
/// Yields `len()` elements, unless the buffer runs out first. Running out is treated
/// as the end of the stream (logged at debug level), not as an error.
#[derive(Debug, Clone)]
pub struct Stream64Iter<'a> {
    stream: &'a Stream64,
    cursor: Cursor,
    index: usize,
}

impl<'a> Stream64Iter<'a> {
    /// how far did we process into the buffer, in bits
    pub fn bits_processed(&self) -> usize {
        self.cursor.bits_processed()
    }

    fn stop(&mut self) {
        self.index = self.stream.count;
    }
}

impl<'a> Iterator for Stream64Iter<'a> {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.stream.count {
            return None;
        }

        if !self.cursor.has_more(self.stream.data.len(), self.stream.p) {
            debug!(index = self.index, count = self.stream.count, "stream exhausted before its element count");
            self.stop();
            return None;
        }

        match read_bits(&self.stream.data, self.stream.p, &mut self.cursor) {
            Ok(value) => {
                self.index += 1;
                Some(value)
            }
            Err(error) => {
                debug!(%error, index = self.index, count = self.stream.count, "stream ended early");
                self.stop();
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // can stop early on a short buffer
        (0, Some(self.stream.count - self.index))
    }
}

impl<'a> FusedIterator for Stream64Iter<'a> {}
