//! Super-Chunk (§4.8): an owned, ordered sequence of chunks plus four
//! optional ancillary chunks, compressed and decompressed through a pair of
//! contexts. Grounded in the teacher's `blosc::schunk` model, generalized
//! from a pointer-array-of-chunks struct into an owned `Vec<Chunk>`.

use crate::chunk::Chunk;
use crate::context::{CompressionContext, DecompressionContext};
use crate::error::{Error, Result};
use crate::filter::FilterSpec;

/// Index of each ancillary chunk slot within [`SuperChunk::ancillary`].
pub const ANCILLARY_FILTERS_META: usize = 0;
pub const ANCILLARY_CODEC_META: usize = 1;
pub const ANCILLARY_USER_META: usize = 2;
pub const ANCILLARY_USER_DATA: usize = 3;
pub const ANCILLARY_SLOTS: usize = 4;

/// An ordered, owned sequence of compressed chunks sharing one compression
/// context and one decompression context (§4.7: "contexts are reusable
/// across many chunks").
pub struct SuperChunk {
    cctx: CompressionContext,
    dctx: DecompressionContext,
    chunks: Vec<Chunk>,
    ancillary: [Option<Chunk>; ANCILLARY_SLOTS],
    typesize: Option<u8>,
    blocksize: Option<u32>,
    codec_id: Option<u8>,
    filters: Option<Vec<FilterSpec>>,
    nbytes: u64,
    cbytes: u64,
}

impl SuperChunk {
    pub fn new(cctx: CompressionContext, dctx: DecompressionContext) -> Self {
        SuperChunk {
            cctx,
            dctx,
            chunks: Vec::new(),
            ancillary: Default::default(),
            typesize: None,
            blocksize: None,
            codec_id: None,
            filters: None,
            nbytes: 0,
            cbytes: 0,
        }
    }

    pub fn nchunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn nbytes(&self) -> u64 {
        self.nbytes
    }

    pub fn cbytes(&self) -> u64 {
        self.cbytes
    }

    pub fn chunk(&self, idx: usize) -> Result<&Chunk> {
        self.chunks
            .get(idx)
            .ok_or_else(|| Error::range(format!("chunk index {idx} out of range ({} chunks)", self.chunks.len())))
    }

    pub fn ancillary(&self, slot: usize) -> Option<&Chunk> {
        self.ancillary.get(slot).and_then(|c| c.as_ref())
    }

    pub fn set_ancillary(&mut self, slot: usize, chunk: Option<Chunk>) -> Result<()> {
        if slot >= ANCILLARY_SLOTS {
            return Err(Error::config(format!("ancillary slot {slot} out of range")));
        }
        self.ancillary[slot] = chunk;
        Ok(())
    }

    /// Validate a chunk's shape against the super-chunk's established
    /// parameters, fixing them on the first append (§4.8: "validate its
    /// header against super-chunk parameters").
    fn check_or_fix_shape(&mut self, chunk: &Chunk) -> Result<()> {
        let chunk_filters = chunk.filters()?.entries().to_vec();
        match self.typesize {
            None => {
                self.typesize = Some(chunk.typesize());
                self.blocksize = Some(chunk.blocksize());
                self.codec_id = Some(chunk.codec_id());
                self.filters = Some(chunk_filters);
            }
            Some(typesize) => {
                if typesize != chunk.typesize() {
                    return Err(Error::config(format!(
                        "chunk typesize {} does not match super-chunk typesize {typesize}",
                        chunk.typesize()
                    )));
                }
                if self.blocksize != Some(chunk.blocksize()) {
                    return Err(Error::config(format!(
                        "chunk blocksize {} does not match super-chunk blocksize {:?}",
                        chunk.blocksize(),
                        self.blocksize
                    )));
                }
                if self.codec_id != Some(chunk.codec_id()) {
                    return Err(Error::config(format!(
                        "chunk codec id {} does not match super-chunk codec id {:?}",
                        chunk.codec_id(),
                        self.codec_id
                    )));
                }
                if self.filters.as_deref() != Some(chunk_filters.as_slice()) {
                    return Err(Error::config(
                        "chunk filter list does not match super-chunk filter list",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Compress `src` with the super-chunk's compression context and append
    /// the resulting chunk. Returns the new chunk count.
    pub fn append_buffer(&mut self, src: &[u8]) -> Result<usize> {
        let chunk = self.cctx.compress(src)?;
        self.append_chunk(chunk)
    }

    /// Take ownership of an already-compressed chunk and append it,
    /// validating its shape first. A failed append leaves the super-chunk
    /// unchanged (§3: "Errors never propagate across chunk boundaries").
    pub fn append_chunk(&mut self, chunk: Chunk) -> Result<usize> {
        self.check_or_fix_shape(&chunk)?;
        self.nbytes += chunk.nbytes() as u64;
        self.cbytes += chunk.cbytes() as u64;
        self.chunks.push(chunk);
        Ok(self.chunks.len())
    }

    /// Decompress chunk `idx` into `dst`, which must be at least
    /// `chunk.nbytes()` long.
    pub fn decompress_chunk(&self, idx: usize, dst: &mut [u8]) -> Result<usize> {
        let chunk = self.chunk(idx)?;
        if dst.len() < chunk.nbytes() as usize {
            return Err(Error::size(format!(
                "destination has {} bytes, chunk needs {}",
                dst.len(),
                chunk.nbytes()
            )));
        }
        self.dctx.decompress_into(chunk, dst)
    }

    pub fn decompress_chunk_owned(&self, idx: usize) -> Result<Vec<u8>> {
        let chunk = self.chunk(idx)?;
        self.dctx.decompress(chunk)
    }

    pub fn extract_items(&self, idx: usize, start_item: u64, nitems: u64) -> Result<Vec<u8>> {
        let chunk = self.chunk(idx)?;
        self.dctx.extract_items(chunk, start_item, nitems)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn cctx(&self) -> &CompressionContext {
        &self.cctx
    }

    pub fn dctx(&self) -> &DecompressionContext {
        &self.dctx
    }
}
