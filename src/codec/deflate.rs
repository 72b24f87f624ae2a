use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use crate::error::{Error, Result};

use super::Codec;

/// Deflate codec backed by `flate2`, used when maximum portability matters
/// more than ratio or speed.
pub struct DeflateCodec;

impl Codec for DeflateCodec {
    fn id(&self) -> u8 {
        2
    }

    fn name(&self) -> &'static str {
        "deflate"
    }

    fn max_output_len(&self, src_len: usize) -> usize {
        // zlib's compressBound formula: worst case is the input plus a small
        // fixed overhead that grows very slowly with input size.
        src_len + (src_len >> 12) + (src_len >> 14) + (src_len >> 25) + 13
    }

    fn encode(&self, clevel: i32, src: &[u8], dst: &mut [u8]) -> Result<usize> {
        let level = clevel.clamp(0, 9) as u32;
        let mut compressor = Compress::new(Compression::new(level), false);
        let status = compressor
            .compress(src, dst, FlushCompress::Finish)
            .map_err(|e| Error::codec(format!("deflate encode: {e}")))?;
        match status {
            Status::StreamEnd => Ok(compressor.total_out() as usize),
            _ => Err(Error::codec("deflate encode: output buffer too small")),
        }
    }

    fn decode(&self, src: &[u8], dst: &mut [u8]) -> Result<usize> {
        let mut decompressor = Decompress::new(false);
        let status = decompressor
            .decompress(src, dst, FlushDecompress::Finish)
            .map_err(|e| Error::codec(format!("deflate decode: {e}")))?;
        match status {
            Status::StreamEnd | Status::Ok => Ok(decompressor.total_out() as usize),
            Status::BufError => Err(Error::size("deflate decode: destination too small")),
        }
    }
}
