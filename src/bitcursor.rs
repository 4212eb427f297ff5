//! Bit-level cursor shared by both codecs.
//!
//! A [`Cursor`] is just a position: the byte the last access started at plus a bit offset
//! relative to that byte. Every access first folds whole bytes of the offset into the byte
//! index, then loads the 64-bit big-endian word starting at that byte and shifts the
//! requested field out of it. Bits are MSB-first, the buffer is one continuous bitstream.
//!
//! # Padding
//! Loading a word at the final bytes of a buffer would read past its end.
//! Instead of relying on the caller to append [`PADDING_BYTES`](crate::PADDING_BYTES) zero bytes,
//! the word load zero-fills whatever lies behind the slice. Reads are still bounds-checked
//! against the real bit length of the slice, so the zero fill is never returned as data.
//!
//! # Example
//! ```rust
//! use stream64::bitcursor::{read_bits, write_bits, Cursor};
//! let mut buffer = vec![0_u8; 2];
//! let mut w = Cursor::new();
//! write_bits(&mut buffer, 3, 0b101, &mut w).unwrap();
//! write_bits(&mut buffer, 11, 2047, &mut w).unwrap();
//! assert_eq!(buffer, vec![0b1011_1111, 0b1111_1100]);
//!
//! let mut r = Cursor::new();
//! assert_eq!(read_bits(&buffer, 3, &mut r).unwrap(), 0b101);
//! assert_eq!(read_bits(&buffer, 11, &mut r).unwrap(), 2047);
//! ```

use bitvec::view::BitView;
use bitvec::prelude as bv;
use crate::error::{Result, Stream64Error};
use crate::{MyBitSlice, MAX_BIT_WIDTH};

/// bit terminating a unary run
const UNARY_TERMINATOR: u64 = 0;

/// Validates a field width, returning it unchanged if it's within `1..=MAX_BIT_WIDTH`
/// ```rust
/// # use stream64::bitcursor::check_bit_width;
/// assert!(check_bit_width(19).is_ok());
/// assert!(check_bit_width(0).is_err());
/// assert!(check_bit_width(57).is_err());
/// ```
pub fn check_bit_width(p: usize) -> Result<usize> {
    if (1..=MAX_BIT_WIDTH).contains(&p) {
        Ok(p)
    } else {
        Err(Stream64Error::InvalidBitWidth(p))
    }
}

/// Read/write position in a byte buffer.
///
/// `bit_offset` counts the bits consumed past `byte_index` and stays within `[0, 63]`:
/// it is reduced to `[0, 7]` before each access, and a single access adds at most 56.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    byte_index: usize,
    bit_offset: usize,
}

impl Cursor {
    /// A cursor at the very first bit of a buffer
    pub fn new() -> Self {
        Cursor { byte_index: 0, bit_offset: 0 }
    }

    /// Byte the last access started at
    pub fn byte_index(&self) -> usize {
        self.byte_index
    }

    /// Bits consumed past [`Cursor::byte_index`]
    pub fn bit_offset(&self) -> usize {
        self.bit_offset
    }

    /// how far did we process into the buffer, in bits
    pub fn bits_processed(&self) -> usize {
        self.byte_index * 8 + self.bit_offset
    }

    /// Number of bytes touched so far, counting a partially filled byte.
    /// After a sequence of writes this is the length of the encoded output.
    pub fn byte_len(&self) -> usize {
        self.bits_processed().div_ceil(8)
    }

    /// Exhaustion check run before decoding each element: more data is available
    /// as long as the cursor hasn't reached the last byte of a `len`-byte buffer,
    /// or the bit offset still leaves room for a `p`-bit field in the current word.
    ///
    /// Only catches a cursor that is already past the data, reads are bounds-checked on their own.
    pub fn has_more(&self, len: usize, p: usize) -> bool {
        len > 0 && (self.byte_index + 1 < len || self.bit_offset + p < 64)
    }

    /// Returns the buffer behind the last bit processed.
    /// Comes handy when the buffer contains data OTHER than the encoded values
    /// that needs to be processed externally.
    pub fn remaining<'a>(&self, buffer: &'a [u8]) -> &'a MyBitSlice {
        let bits = buffer.view_bits::<bv::Msb0>();
        &bits[self.bits_processed().min(bits.len())..]
    }

    fn normalize(&mut self) {
        self.byte_index += self.bit_offset >> 3;
        self.bit_offset &= 7;
    }

    fn advance(&mut self, bits: usize) {
        self.bit_offset += bits;
        debug_assert!(self.bit_offset < 64);
    }
}

/// Big-endian load of the 8 bytes starting at `byte_index`.
/// Bytes behind the end of the buffer read as zero.
fn load_word(buffer: &[u8], byte_index: usize) -> u64 {
    let mut word = [0_u8; 8];
    if byte_index < buffer.len() {
        let end = buffer.len().min(byte_index + 8);
        word[..end - byte_index].copy_from_slice(&buffer[byte_index..end]);
    }
    u64::from_be_bytes(word)
}

/// Reads the next `p` bits at the cursor, right-aligned in the result.
///
/// # Errors
/// * [`Stream64Error::InvalidBitWidth`] unless `1 <= p <= 56`
/// * [`Stream64Error::OutOfBounds`] if the field would end past the buffer.
///   The cursor does not move in that case.
pub fn read_bits(buffer: &[u8], p: usize, cursor: &mut Cursor) -> Result<u64> {
    check_bit_width(p)?;
    cursor.normalize();

    let position = cursor.bits_processed();
    let available = buffer.len() * 8;
    if position + p > available {
        return Err(Stream64Error::OutOfBounds { position, requested: p, available });
    }

    let word = load_word(buffer, cursor.byte_index);
    // drop the consumed bits, keep the top p
    let value = (word << cursor.bit_offset) >> (64 - p);
    cursor.advance(p);
    Ok(value)
}

/// Writes the lowest `p` bits of `value` at the cursor.
///
/// Bits are OR-ed into the buffer, so the region behind the cursor must still be zero,
/// which holds for a freshly allocated buffer written front to back.
/// **Warning** this DOES NOT check if `value` fits into `p` bits,
/// higher bits are truncated.
///
/// # Errors
/// * [`Stream64Error::InvalidBitWidth`] unless `1 <= p <= 56`
/// * [`Stream64Error::IllegalInput`] if the field doesn't fit into the buffer.
///   Neither the buffer nor the cursor change in that case.
pub fn write_bits(buffer: &mut [u8], p: usize, value: u64, cursor: &mut Cursor) -> Result<()> {
    check_bit_width(p)?;
    cursor.normalize();

    let end_bit = cursor.bit_offset + p;
    let n_bytes = end_bit.div_ceil(8);
    if cursor.byte_index + n_bytes > buffer.len() {
        return Err(Stream64Error::IllegalInput { capacity: buffer.len() });
    }

    let masked = value & ((1_u64 << p) - 1);
    let aligned = (masked << (64 - end_bit)).to_be_bytes();
    let target = &mut buffer[cursor.byte_index..cursor.byte_index + n_bytes];
    for (dst, src) in target.iter_mut().zip(aligned) {
        *dst |= src;
    }
    cursor.advance(p);
    Ok(())
}

/// Reads a run of `1` bits terminated by a `0`, returning the length of the run.
/// The terminator is consumed but not counted.
///
/// # Errors
/// [`Stream64Error::OutOfBounds`] if the buffer ends before the terminator.
pub fn read_unary(buffer: &[u8], cursor: &mut Cursor) -> Result<u64> {
    let available = buffer.len() * 8;
    let mut run_length = 0_u64;
    loop {
        cursor.normalize();
        let position = cursor.bits_processed();
        let window = MAX_BIT_WIDTH.min(available.saturating_sub(position));
        if window == 0 {
            return Err(Stream64Error::OutOfBounds { position, requested: 1, available });
        }

        let word = load_word(buffer, cursor.byte_index) << cursor.bit_offset;
        let ones = (word.leading_ones() as usize).min(window);
        if ones < window {
            cursor.advance(ones + 1);
            return Ok(run_length + ones as u64);
        }
        // whole window is ones, keep scanning
        cursor.advance(ones);
        run_length += ones as u64;
    }
}

/// Writes `q` one-bits followed by a zero terminator.
///
/// # Errors
/// [`Stream64Error::IllegalInput`] if the run plus terminator doesn't fit into the buffer.
/// Checked upfront, nothing is written in that case.
pub fn write_unary(buffer: &mut [u8], q: u64, cursor: &mut Cursor) -> Result<()> {
    let free = (buffer.len() * 8).saturating_sub(cursor.bits_processed());
    if q >= free as u64 {
        return Err(Stream64Error::IllegalInput { capacity: buffer.len() });
    }

    let mut left = q;
    while left > 0 {
        let chunk = left.min(MAX_BIT_WIDTH as u64) as usize;
        // write_bits truncates the all-ones word down to `chunk` ones
        write_bits(buffer, chunk, u64::MAX, cursor)?;
        left -= chunk as u64;
    }
    write_bits(buffer, 1, UNARY_TERMINATOR, cursor)
}

#[cfg(test)]
mod test {
    use bitvec::prelude as bv;
    use pretty_assertions::assert_eq;
    use test_case::test_case;
    use crate::error::Stream64Error;
    use super::*;

    fn to_bools(buffer: &[u8], nbits: usize) -> Vec<bool> {
        buffer.view_bits::<bv::Msb0>()[..nbits].iter().by_vals().collect()
    }

    #[test]
    fn test_read_msb_first() {
        let buffer = [0b1010_0000_u8];
        let mut c = Cursor::new();
        assert_eq!(read_bits(&buffer, 1, &mut c).unwrap(), 1);
        assert_eq!(read_bits(&buffer, 1, &mut c).unwrap(), 0);
        assert_eq!(read_bits(&buffer, 2, &mut c).unwrap(), 0b10);
        assert_eq!(c.bits_processed(), 4);
    }

    #[test]
    fn test_read_across_bytes() {
        // 0000_0000 0001_1111 1111_1100
        let buffer = [0_u8, 31, 252];
        let mut c = Cursor::new();
        assert_eq!(read_bits(&buffer, 11, &mut c).unwrap(), 0);
        assert_eq!(read_bits(&buffer, 11, &mut c).unwrap(), 2047);
        assert_eq!(c.bits_processed(), 22);
    }

    #[test]
    fn test_read_56_bits_at_every_offset() {
        let buffer = [0xFF_u8; 16];
        for offset in 0..8 {
            let mut c = Cursor::new();
            if offset > 0 {
                read_bits(&buffer, offset, &mut c).unwrap();
            }
            assert_eq!(read_bits(&buffer, 56, &mut c).unwrap(), (1 << 56) - 1);
            assert!(c.bit_offset() < 64);
        }
    }

    #[test]
    fn test_read_without_padding_up_to_the_last_bit() {
        // no trailing zero bytes needed, the final field ends on the last bit
        let buffer = [0xAB_u8, 0xCD];
        let mut c = Cursor::new();
        assert_eq!(read_bits(&buffer, 4, &mut c).unwrap(), 0xA);
        assert_eq!(read_bits(&buffer, 12, &mut c).unwrap(), 0xBCD);
    }

    #[test]
    fn test_read_out_of_bounds() {
        let buffer = [0xFF_u8, 0xFF];
        let mut c = Cursor::new();
        read_bits(&buffer, 10, &mut c).unwrap();
        let before = c;
        assert_eq!(
            read_bits(&buffer, 7, &mut c),
            Err(Stream64Error::OutOfBounds { position: 10, requested: 7, available: 16 })
        );
        // a failed read leaves the position alone (apart from normalizing)
        assert_eq!(c.bits_processed(), before.bits_processed());
        assert_eq!(read_bits(&buffer, 6, &mut c).unwrap(), 0b11_1111);
    }

    #[test]
    fn test_read_empty_buffer() {
        let mut c = Cursor::new();
        assert!(matches!(read_bits(&[], 1, &mut c), Err(Stream64Error::OutOfBounds { .. })));
    }

    #[test_case(0; "zero width")]
    #[test_case(57; "wider than a word minus a byte")]
    #[test_case(64; "full word")]
    fn test_invalid_width(p: usize) {
        let mut buffer = [0_u8; 16];
        let mut c = Cursor::new();
        assert_eq!(read_bits(&buffer, p, &mut c), Err(Stream64Error::InvalidBitWidth(p)));
        assert_eq!(write_bits(&mut buffer, p, 0, &mut c), Err(Stream64Error::InvalidBitWidth(p)));
        assert_eq!(c, Cursor::new());
    }

    #[test]
    fn test_write_layout() {
        let mut buffer = [0_u8; 1];
        let mut c = Cursor::new();
        write_bits(&mut buffer, 2, 3, &mut c).unwrap(); // 11 in binary
        write_bits(&mut buffer, 2, 0, &mut c).unwrap(); // 00 in binary
        write_bits(&mut buffer, 2, 3, &mut c).unwrap(); // 11 in binary
        assert_eq!(
            to_bools(&buffer, 6),
            vec![true, true, false, false, true, true]
        );
        assert_eq!(c.byte_len(), 1);
    }

    #[test]
    fn test_write_truncates() {
        let mut buffer = [0_u8; 1];
        let mut c = Cursor::new();
        write_bits(&mut buffer, 2, 5, &mut c).unwrap(); // 101 in binary

        // should only store the lower two bits
        assert_eq!(to_bools(&buffer, 8), vec![false, true, false, false, false, false, false, false]);
    }

    #[test]
    fn test_write_past_end() {
        let mut buffer = [0_u8; 2];
        let mut c = Cursor::new();
        write_bits(&mut buffer, 10, 1023, &mut c).unwrap();
        assert_eq!(
            write_bits(&mut buffer, 7, 127, &mut c),
            Err(Stream64Error::IllegalInput { capacity: 2 })
        );
        // untouched by the failed write
        assert_eq!(buffer, [0xFF, 0b1100_0000]);
        write_bits(&mut buffer, 6, 63, &mut c).unwrap();
        assert_eq!(buffer, [0xFF, 0xFF]);
        assert_eq!(c.byte_len(), 2);
    }

    #[test]
    fn test_write_read_mixed_widths() {
        let fields: Vec<(usize, u64)> = vec![(1, 1), (56, (1 << 56) - 2), (7, 100), (33, 0x1_2345_6789), (13, 0)];
        let total: usize = fields.iter().map(|(p, _)| p).sum();
        let mut buffer = vec![0_u8; total.div_ceil(8)];
        let mut w = Cursor::new();
        for &(p, v) in fields.iter() {
            write_bits(&mut buffer, p, v, &mut w).unwrap();
        }
        assert_eq!(w.bits_processed(), total);

        let mut r = Cursor::new();
        let decoded: Vec<u64> = fields.iter().map(|&(p, _)| read_bits(&buffer, p, &mut r).unwrap()).collect();
        assert_eq!(decoded, fields.iter().map(|&(_, v)| v).collect::<Vec<_>>());
    }

    #[test]
    fn test_read_unary() {
        // 1110 10 0 1111...
        let buffer = [0b1110_1001_u8, 0b1111_0000];
        let mut c = Cursor::new();
        assert_eq!(read_unary(&buffer, &mut c).unwrap(), 3);
        assert_eq!(read_unary(&buffer, &mut c).unwrap(), 1);
        assert_eq!(read_unary(&buffer, &mut c).unwrap(), 0);
        assert_eq!(read_unary(&buffer, &mut c).unwrap(), 5);
        assert_eq!(c.bits_processed(), 13);
    }

    #[test]
    fn test_read_unary_longer_than_a_word() {
        // 150 ones, then a zero, then 3 more bits
        let mut buffer = vec![0xFF_u8; 18];
        buffer.push(0b1111_1101);
        buffer.push(0b1110_0000);
        let mut c = Cursor::new();
        assert_eq!(read_unary(&buffer, &mut c).unwrap(), 150);
        assert_eq!(read_bits(&buffer, 4, &mut c).unwrap(), 0b1111);
        assert!(c.bit_offset() < 64);
    }

    #[test]
    fn test_read_unary_without_terminator() {
        let buffer = [0xFF_u8; 9];
        let mut c = Cursor::new();
        assert_eq!(
            read_unary(&buffer, &mut c),
            Err(Stream64Error::OutOfBounds { position: 72, requested: 1, available: 72 })
        );
    }

    #[test]
    fn test_write_unary() {
        let mut buffer = vec![0_u8; 20];
        let mut w = Cursor::new();
        write_unary(&mut buffer, 3, &mut w).unwrap();
        write_unary(&mut buffer, 0, &mut w).unwrap();
        write_unary(&mut buffer, 130, &mut w).unwrap();
        assert_eq!(w.bits_processed(), 4 + 1 + 131);

        let mut r = Cursor::new();
        assert_eq!(read_unary(&buffer, &mut r).unwrap(), 3);
        assert_eq!(read_unary(&buffer, &mut r).unwrap(), 0);
        assert_eq!(read_unary(&buffer, &mut r).unwrap(), 130);
        assert_eq!(r.bits_processed(), w.bits_processed());
    }

    #[test]
    fn test_write_unary_capacity() {
        let mut buffer = vec![0_u8; 1];
        let mut w = Cursor::new();
        // 7 ones + terminator fill the byte exactly
        write_unary(&mut buffer, 7, &mut w).unwrap();
        assert_eq!(buffer, vec![0b1111_1110]);

        let mut buffer = vec![0_u8; 1];
        let mut w = Cursor::new();
        assert_eq!(write_unary(&mut buffer, 8, &mut w), Err(Stream64Error::IllegalInput { capacity: 1 }));
        assert_eq!(buffer, vec![0]);
    }

    #[test]
    fn test_has_more() {
        let mut c = Cursor::new();
        assert!(c.has_more(2, 56));
        assert!(!c.has_more(0, 1));

        // a single byte buffer: only the bit offset rule applies
        let buffer = [0_u8; 1];
        read_bits(&buffer, 8, &mut c).unwrap();
        assert!(c.has_more(1, 8)); // 8 + 8 < 64, loose on purpose
        c.bit_offset = 60;
        assert!(!c.has_more(1, 4));
        assert!(c.has_more(1, 3));
        assert!(c.has_more(2, 56));
    }

    #[test]
    fn test_remaining() {
        let buffer = [0b1010_1010_u8, 0b1100_0000];
        let mut c = Cursor::new();
        read_bits(&buffer, 7, &mut c).unwrap();
        let rest = c.remaining(&buffer);
        assert_eq!(rest.len(), 9);
        assert_eq!(rest.iter().by_vals().take(3).collect::<Vec<_>>(), vec![false, true, true]);

        read_bits(&buffer, 9, &mut c).unwrap();
        assert!(c.remaining(&buffer).is_empty());
    }
}
