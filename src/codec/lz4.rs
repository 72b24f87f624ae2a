use lz4_flex::block::{compress_into, decompress_into, get_maximum_output_size};

use crate::error::{Error, Result};

use super::Codec;

/// Fast LZ codec backed by `lz4_flex`'s block format. This is the registry's
/// default (§4.1: "at least one fast LZ codec").
pub struct Lz4Codec;

impl Codec for Lz4Codec {
    fn id(&self) -> u8 {
        0
    }

    fn name(&self) -> &'static str {
        "lz4"
    }

    fn max_output_len(&self, src_len: usize) -> usize {
        get_maximum_output_size(src_len)
    }

    fn encode(&self, _clevel: i32, src: &[u8], dst: &mut [u8]) -> Result<usize> {
        compress_into(src, dst).map_err(|e| Error::codec(format!("lz4 encode: {e}")))
    }

    fn decode(&self, src: &[u8], dst: &mut [u8]) -> Result<usize> {
        decompress_into(src, dst).map_err(|e| Error::codec(format!("lz4 decode: {e}")))
    }
}
