use snap::raw::{Decoder, Encoder};

use crate::error::{Error, Result};

use super::Codec;

/// Snappy codec backed by the `snap` crate.
pub struct SnappyCodec;

impl Codec for SnappyCodec {
    fn id(&self) -> u8 {
        3
    }

    fn name(&self) -> &'static str {
        "snappy"
    }

    fn max_output_len(&self, src_len: usize) -> usize {
        snap::raw::max_compress_len(src_len)
    }

    fn encode(&self, _clevel: i32, src: &[u8], dst: &mut [u8]) -> Result<usize> {
        Encoder::new()
            .compress(src, dst)
            .map_err(|e| Error::codec(format!("snappy encode: {e}")))
    }

    fn decode(&self, src: &[u8], dst: &mut [u8]) -> Result<usize> {
        Decoder::new()
            .decompress(src, dst)
            .map_err(|e| Error::codec(format!("snappy decode: {e}")))
    }
}
