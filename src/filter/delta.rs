//! Delta (XOR-with-reference) filter. Ported from the teacher's
//! `delta_encoder`/`delta_decoder` split
//! (`examples/keller-mark-blusc/src/blosc/delta.rs`), generalized to any
//! typesize via plain byte loops instead of the teacher's `unsafe` pointer
//! casts to `u16`/`u32`/`u64`.
//!
//! Resolves the Open Question in §9: a chunk's block 0 is the delta
//! reference, coded as a prefix chain against its own previous element
//! (first element passed through verbatim); every other block XORs
//! element-wise against block 0's pre-delta bytes. See SPEC_FULL.md §4.2.

/// Prefix-chain delta: `dest[0] = src[0]`, `dest[i] = src[i] XOR src[i-1]`
/// for whole elements; remainder bytes pass through unshuffled.
pub fn prefix_forward(block: &[u8], typesize: usize) -> Vec<u8> {
    let n = block.len() / typesize;
    let mut dest = block.to_vec();
    for e in (1..n).rev() {
        for b in 0..typesize {
            dest[e * typesize + b] = block[e * typesize + b] ^ block[(e - 1) * typesize + b];
        }
    }
    dest
}

/// Inverse of [`prefix_forward`].
pub fn prefix_reverse(block: &[u8], typesize: usize) -> Vec<u8> {
    let n = block.len() / typesize;
    let mut dest = block.to_vec();
    for e in 1..n {
        for b in 0..typesize {
            let prev = dest[(e - 1) * typesize + b];
            dest[e * typesize + b] ^= prev;
        }
    }
    dest
}

/// XOR each whole element of `block` against the corresponding element of
/// `reference`; remainder bytes pass through unshuffled. Self-inverse, so
/// this same function implements both the forward and reverse direction for
/// non-reference blocks.
pub fn xor_with_ref(block: &[u8], reference: &[u8]) -> Vec<u8> {
    debug_assert!(reference.len() >= block.len());
    block
        .iter()
        .zip(reference.iter())
        .map(|(a, b)| a ^ b)
        .collect()
}
