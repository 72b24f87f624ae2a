//! Byte transpose filter. Adapted from the teacher's generic (non-SIMD)
//! shuffle kernel (`examples/keller-mark-blusc/src/blosc/shuffle_generic.rs`),
//! generalized to work safely for any typesize without pointer casts.

/// View `block` as an `n x typesize` row-major matrix of bytes and emit it
/// column-major. Trailing bytes that don't form a full element pass through
/// verbatim.
pub fn forward(block: &[u8], typesize: usize) -> Vec<u8> {
    let n = block.len() / typesize;
    let rem = block.len() % typesize;
    let mut dest = vec![0u8; block.len()];

    for j in 0..typesize {
        for i in 0..n {
            dest[j * n + i] = block[i * typesize + j];
        }
    }
    if rem > 0 {
        let start = block.len() - rem;
        dest[start..].copy_from_slice(&block[start..]);
    }
    dest
}

/// Inverse of [`forward`].
pub fn reverse(block: &[u8], typesize: usize) -> Vec<u8> {
    let n = block.len() / typesize;
    let rem = block.len() % typesize;
    let mut dest = vec![0u8; block.len()];

    for i in 0..n {
        for j in 0..typesize {
            dest[i * typesize + j] = block[j * n + i];
        }
    }
    if rem > 0 {
        let start = block.len() - rem;
        dest[start..].copy_from_slice(&block[start..]);
    }
    dest
}
