//! Environment variable overrides (§6). Read once, at context-construction
//! time, never polled.

use crate::codec::CodecRegistry;

/// Default codec name override. Falls back to `"lz4"` if unset or unknown.
pub const CODEC_ENV: &str = "CHUNKWISE_CODEC";

/// Default thread count override. Falls back to `1` if unset or unparsable.
pub const NTHREADS_ENV: &str = "CHUNKWISE_NTHREADS";

/// If set to any non-empty value, forces every block to the literal
/// (uncompressed) path regardless of codec outcome. Debugging aid.
pub const NOCOMPRESS_ENV: &str = "CHUNKWISE_NOCOMPRESS";

pub(crate) fn codec_name_from_env() -> String {
    std::env::var(CODEC_ENV)
        .ok()
        .filter(|name| CodecRegistry::with_defaults().get_by_name(name).is_ok())
        .unwrap_or_else(|| "lz4".to_string())
}

pub(crate) fn nthreads_from_env() -> usize {
    std::env::var(NTHREADS_ENV)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(1)
}

pub(crate) fn nocompress_from_env() -> bool {
    std::env::var(NOCOMPRESS_ENV)
        .map(|s| !s.is_empty())
        .unwrap_or(false)
}
