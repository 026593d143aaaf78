//! Packed bit array used as the per-page occupancy bitmap.
//!
//! Bit `i` lives in byte `i / 8`, most significant bit first.

#[inline]
fn mask(pos: usize) -> u8 {
    0x80 >> (pos % 8)
}

/// Number of bytes needed to hold `bits` bits.
#[inline]
pub fn bytes_for(bits: usize) -> usize {
    bits.div_ceil(8)
}

#[inline]
pub fn is_set(bitmap: &[u8], pos: usize) -> bool {
    bitmap[pos / 8] & mask(pos) != 0
}

#[inline]
pub fn set(bitmap: &mut [u8], pos: usize) {
    bitmap[pos / 8] |= mask(pos);
}

#[inline]
pub fn reset(bitmap: &mut [u8], pos: usize) {
    bitmap[pos / 8] &= !mask(pos);
}

/// Lowest clear bit below `len`, if any.
pub fn first_clear(bitmap: &[u8], len: usize) -> Option<usize> {
    (0..len).find(|&pos| !is_set(bitmap, pos))
}

/// Lowest set bit in `from..len`, if any.
pub fn next_set(bitmap: &[u8], from: usize, len: usize) -> Option<usize> {
    (from..len).find(|&pos| is_set(bitmap, pos))
}
