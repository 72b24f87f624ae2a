use crate::error::{Error, Result};

use super::Codec;

/// High-ratio codec backed by the `zstd` crate.
pub struct ZstdCodec;

impl Codec for ZstdCodec {
    fn id(&self) -> u8 {
        1
    }

    fn name(&self) -> &'static str {
        "zstd"
    }

    fn max_output_len(&self, src_len: usize) -> usize {
        zstd::zstd_safe::compress_bound(src_len)
    }

    fn encode(&self, clevel: i32, src: &[u8], dst: &mut [u8]) -> Result<usize> {
        zstd::bulk::compress_to_buffer(src, dst, clevel)
            .map_err(|e| Error::codec(format!("zstd encode: {e}")))
    }

    fn decode(&self, src: &[u8], dst: &mut [u8]) -> Result<usize> {
        zstd::bulk::decompress_to_buffer(src, dst)
            .map_err(|e| Error::codec(format!("zstd decode: {e}")))
    }
}
