//! Lossy mantissa-truncation filter (§4.2). Adapted from the teacher's
//! `truncate_precision32`/`64` (`examples/keller-mark-blusc/src/blosc/trunc_prec.rs`),
//! rewritten over `from_ne_bytes`/`to_ne_bytes` instead of `unsafe` pointer
//! casts, and simplified to the spec's `meta` convention (`meta` is always
//! the number of low mantissa bits to zero, not the teacher's signed
//! keep-or-reduce convention).

use crate::constants::{MANTISSA_BITS_F32, MANTISSA_BITS_F64};

/// Zero the low `meta` mantissa bits of every `typesize`-wide IEEE-754
/// element in `block`. Reverse is identity — this filter is lossy by design.
/// `typesize` must be 4 or 8 and `meta` must be less than the type's
/// mantissa width; both are enforced at pipeline construction time.
pub fn forward(block: &[u8], typesize: usize, meta: u8) -> Vec<u8> {
    match typesize {
        4 => truncate::<4, u32>(block, meta),
        8 => truncate::<8, u64>(block, meta),
        _ => block.to_vec(),
    }
}

fn truncate<const N: usize, U>(block: &[u8], meta: u8) -> Vec<u8>
where
    U: Unsigned<N>,
{
    let n = block.len() / N;
    let rem = block.len() % N;
    let mut dest = vec![0u8; block.len()];

    let mask = U::mask_clearing_low_bits(meta);
    for i in 0..n {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&block[i * N..(i + 1) * N]);
        let value = U::from_ne(bytes);
        let truncated = value.bitand(mask);
        dest[i * N..(i + 1) * N].copy_from_slice(&truncated.to_ne());
    }
    if rem > 0 {
        let start = n * N;
        dest[start..].copy_from_slice(&block[start..]);
    }
    dest
}

/// Minimal fixed-width unsigned integer abstraction so `truncate` can be
/// written once for both `u32` and `u64` without `unsafe`.
trait Unsigned<const N: usize>: Copy {
    fn from_ne(bytes: [u8; N]) -> Self;
    fn to_ne(self) -> [u8; N];
    fn bitand(self, mask: Self) -> Self;
    fn mask_clearing_low_bits(bits: u8) -> Self;
}

impl Unsigned<4> for u32 {
    fn from_ne(bytes: [u8; 4]) -> Self {
        u32::from_ne_bytes(bytes)
    }
    fn to_ne(self) -> [u8; 4] {
        self.to_ne_bytes()
    }
    fn bitand(self, mask: Self) -> Self {
        self & mask
    }
    fn mask_clearing_low_bits(bits: u8) -> Self {
        if bits == 0 {
            u32::MAX
        } else {
            !((1u32 << bits) - 1)
        }
    }
}

impl Unsigned<8> for u64 {
    fn from_ne(bytes: [u8; 8]) -> Self {
        u64::from_ne_bytes(bytes)
    }
    fn to_ne(self) -> [u8; 8] {
        self.to_ne_bytes()
    }
    fn bitand(self, mask: Self) -> Self {
        self & mask
    }
    fn mask_clearing_low_bits(bits: u8) -> Self {
        if bits == 0 {
            u64::MAX
        } else {
            !((1u64 << bits) - 1)
        }
    }
}

/// Mantissa width for the type a given typesize represents. Used to validate
/// `meta < mantissa_width` at pipeline construction.
pub fn mantissa_width(typesize: u8) -> Option<u8> {
    match typesize {
        4 => Some(MANTISSA_BITS_F32),
        8 => Some(MANTISSA_BITS_F64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncating_doubles_stays_within_tolerance() {
        let xs: Vec<f64> = (0..1000).map(|i| (i as f64) * 0.0001 - 0.03).collect();
        let mut block = Vec::with_capacity(xs.len() * 8);
        for x in &xs {
            block.extend_from_slice(&x.to_ne_bytes());
        }
        let truncated = forward(&block, 8, 23);
        for (chunk, original) in truncated.chunks(8).zip(xs.iter()) {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            let value = f64::from_ne_bytes(bytes);
            assert!((value - original).abs() < 1e-5, "{value} vs {original}");
        }
    }

    #[test]
    fn zero_meta_is_identity() {
        let block = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        assert_eq!(forward(&block, 4, 0), block);
    }
}
