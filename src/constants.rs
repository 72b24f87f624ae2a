//! Layout and tuning constants for the chunk format, adapted from the
//! `c-blosc2` header values the teacher crate carried in
//! `internal/constants.rs`, trimmed to what this engine actually uses.

/// Current chunk format version written into the header's `version` byte.
pub const CHUNK_VERSION: u8 = 2;

/// Format marker written into the header's `version_format` byte. Bumped
/// only if the fixed-field layout in §6 changes.
pub const VERSION_FORMAT: u8 = 1;

/// Maximum number of filters in a pipeline.
pub const MAX_FILTERS: usize = 6;

/// Size in bytes of the chunk's fixed-position header fields (version,
/// version_format, flags, typesize, nbytes, blocksize, cbytes).
pub const CHUNK_HEADER_FIXED_LEN: usize = 16;

/// Total header length including the filter id/meta arrays, before the
/// block-offset table.
pub const CHUNK_HEADER_LEN: usize = CHUNK_HEADER_FIXED_LEN + 2 * MAX_FILTERS;

/// One byte per block payload records whether the payload is codec-compressed
/// (0) or a literal copy of the filtered block (1).
pub const BLOCK_TAG_LEN: usize = 1;

/// Maximum overhead a chunk can add over its uncompressed size: header, the
/// offset table for a single block, and one block tag byte.
pub const MAX_CHUNK_OVERHEAD: usize = CHUNK_HEADER_LEN + 4 + BLOCK_TAG_LEN;

/// Largest source buffer a single chunk can hold (mirrors `c-blosc2`'s
/// `BLOSC2_MAX_BUFFERSIZE`: `i32::MAX` minus header overhead).
pub const MAX_BUFFERSIZE: usize = i32::MAX as usize - MAX_CHUNK_OVERHEAD;

/// Smallest blocksize the auto-selection table will choose.
pub const MIN_BLOCKSIZE: usize = 4 * 1024;

/// Typical L1 data cache size, the starting point for blocksize selection.
pub const L1: usize = 32 * 1024;

/// Typical L2 data cache size.
pub const L2: usize = 256 * 1024;

/// Upper bound the auto-selection table will not exceed.
pub const MAX_AUTO_BLOCKSIZE: usize = L2 * 4;

/// Mantissa width of an IEEE-754 `f32`.
pub const MANTISSA_BITS_F32: u8 = 23;

/// Mantissa width of an IEEE-754 `f64`.
pub const MANTISSA_BITS_F64: u8 = 52;

/// Number of codec ids representable in the header's 3-bit codec field.
pub const MAX_CODEC_ID: u8 = 7;
