//! Chunk Encoder and Decoder (§4.5, §4.6): splits input into blocks,
//! dispatches block workers across a thread pool, and assembles or parses
//! the framed chunk format from §6.

mod header;

use std::collections::HashMap;

use rayon::prelude::*;

pub use header::ChunkHeader;

use crate::block::{decode_block, encode_block};
use crate::codec::{Codec, CodecRegistry};
use crate::constants::{CHUNK_HEADER_LEN, L1, MAX_AUTO_BLOCKSIZE, MAX_BUFFERSIZE, MAX_CHUNK_OVERHEAD, MIN_BLOCKSIZE};
use crate::error::{Error, Result};
use crate::filter::FilterPipeline;

/// A self-describing, immutable compressed buffer (§3).
#[derive(Clone)]
pub struct Chunk {
    bytes: Vec<u8>,
    header: ChunkHeader,
    offsets: Vec<u32>,
}

impl Chunk {
    /// Parse and validate a chunk's framing, without decompressing any
    /// block payloads.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let header = ChunkHeader::from_bytes(&bytes)?;
        let nblocks = header.nblocks();
        let offsets_start = CHUNK_HEADER_LEN;
        let offsets_end = offsets_start + 4 * nblocks;
        if bytes.len() < offsets_end {
            return Err(Error::format("chunk is too short for its offset table"));
        }
        let mut offsets = Vec::with_capacity(nblocks);
        for i in 0..nblocks {
            let start = offsets_start + i * 4;
            offsets.push(u32::from_le_bytes(bytes[start..start + 4].try_into().unwrap()));
        }
        for pair in offsets.windows(2) {
            if pair[1] <= pair[0] {
                return Err(Error::format("block offset table is not strictly increasing"));
            }
        }
        if let Some(&first) = offsets.first() {
            if first as usize != offsets_end {
                return Err(Error::format("first block offset does not follow the offset table"));
            }
        }
        if bytes.len() as u64 != header.cbytes as u64 {
            return Err(Error::format(format!(
                "chunk byte length {} does not match header cbytes {}",
                bytes.len(),
                header.cbytes
            )));
        }
        Ok(Chunk { bytes, header, offsets })
    }

    pub fn typesize(&self) -> u8 {
        self.header.typesize
    }

    pub fn nbytes(&self) -> u32 {
        self.header.nbytes
    }

    pub fn cbytes(&self) -> u32 {
        self.header.cbytes
    }

    pub fn blocksize(&self) -> u32 {
        self.header.blocksize
    }

    pub fn nblocks(&self) -> usize {
        self.offsets.len()
    }

    pub fn nitems(&self) -> u64 {
        self.header.nbytes as u64 / self.header.typesize as u64
    }

    pub fn codec_id(&self) -> u8 {
        self.header.codec_id()
    }

    pub fn filters(&self) -> Result<FilterPipeline> {
        FilterPipeline::from_header_arrays(
            self.header.filter_ids,
            self.header.filter_metas,
            self.header.typesize,
            self.header.blocksize as usize,
        )
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Uncompressed length of block `i`: `blocksize`, except possibly a
    /// shorter final block.
    fn block_len(&self, i: usize) -> usize {
        let blocksize = self.header.blocksize as usize;
        let nbytes = self.header.nbytes as usize;
        let start = i * blocksize;
        blocksize.min(nbytes.saturating_sub(start))
    }

    fn block_payload(&self, i: usize) -> &[u8] {
        let start = self.offsets[i] as usize;
        let end = self.offsets.get(i + 1).map(|&o| o as usize).unwrap_or(self.bytes.len());
        &self.bytes[start..end]
    }
}

/// Deterministic blocksize auto-selection (§4.5, an Open Question in §9):
/// start from the L1 cache size, double once per 3 levels of `clevel` above
/// 1, clamp to `[MIN_BLOCKSIZE, MAX_AUTO_BLOCKSIZE]`, never above `src_len`
/// itself, then align down to a multiple of `typesize` (never below one
/// element).
pub fn choose_blocksize(clevel: i32, typesize: u8, src_len: usize) -> usize {
    let steps = ((clevel.max(1) - 1) / 3).max(0) as u32;
    let mut blocksize = (L1 << steps).clamp(MIN_BLOCKSIZE, MAX_AUTO_BLOCKSIZE);

    if src_len > 0 {
        blocksize = blocksize.min(src_len);
    }

    let typesize = typesize.max(1) as usize;
    let rem = blocksize % typesize;
    if rem != 0 {
        blocksize -= rem;
    }
    blocksize.max(typesize)
}

/// Encode `src` into a chunk (§4.5's five-step algorithm).
#[allow(clippy::too_many_arguments)]
pub fn encode_chunk(
    src: &[u8],
    typesize: u8,
    blocksize: usize,
    pipeline: &FilterPipeline,
    codec: &dyn Codec,
    codec_id: u8,
    clevel: i32,
    pool: &rayon::ThreadPool,
) -> Result<Chunk> {
    if typesize == 0 {
        return Err(Error::config("typesize must be at least 1"));
    }
    if src.len() > MAX_BUFFERSIZE {
        return Err(Error::size(format!(
            "source length {} exceeds maximum buffer size {MAX_BUFFERSIZE}",
            src.len()
        )));
    }
    if blocksize == 0 {
        return Err(Error::config("blocksize must be resolved to a nonzero value before encoding"));
    }

    let nblocks = if src.is_empty() { 0 } else { (src.len() + blocksize - 1) / blocksize };

    let delta_ref = if pipeline.has_delta() && nblocks > 0 {
        let block0_len = blocksize.min(src.len());
        pipeline.state_before_delta(&src[..block0_len], typesize)?
    } else {
        None
    };

    let payloads: Vec<Vec<u8>> = pool.install(|| {
        (0..nblocks)
            .into_par_iter()
            .map(|i| {
                let start = i * blocksize;
                let end = (start + blocksize).min(src.len());
                let is_reference_block = i == 0;
                let dref = if is_reference_block { None } else { delta_ref.as_deref() };
                encode_block(&src[start..end], pipeline, typesize, is_reference_block, dref, codec, clevel, false)
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let (filter_ids, filter_metas) = pipeline.to_header_arrays();
    let offsets_len = 4 * nblocks;
    let payload_total: usize = payloads.iter().map(Vec::len).sum();
    let cbytes = CHUNK_HEADER_LEN + offsets_len + payload_total;
    if cbytes > u32::MAX as usize {
        return Err(Error::size("encoded chunk exceeds the 32-bit cbytes field"));
    }

    let mut offsets = Vec::with_capacity(nblocks);
    let mut cursor = CHUNK_HEADER_LEN + offsets_len;
    for payload in &payloads {
        offsets.push(cursor as u32);
        cursor += payload.len();
    }

    let header = ChunkHeader::new(
        typesize,
        src.len() as u32,
        blocksize as u32,
        cbytes as u32,
        pipeline.has_shuffle(),
        pipeline.has_bitshuffle(),
        codec_id,
        filter_ids,
        filter_metas,
    )?;

    let mut bytes = Vec::with_capacity(cbytes);
    bytes.extend_from_slice(&header.to_bytes());
    for offset in &offsets {
        bytes.extend_from_slice(&offset.to_le_bytes());
    }
    for payload in &payloads {
        bytes.extend_from_slice(payload);
    }

    if cbytes > src.len() + MAX_CHUNK_OVERHEAD {
        #[cfg(feature = "diagnostics")]
        log::warn!("chunk ({cbytes} bytes) exceeds source ({} bytes) plus overhead", src.len());
        return Err(Error::incompressible(format!(
            "chunk ({cbytes} bytes) is larger than source ({} bytes) plus overhead",
            src.len()
        )));
    }

    Chunk::from_bytes(bytes)
}

fn decode_one_block(
    chunk: &Chunk,
    i: usize,
    pipeline: &FilterPipeline,
    typesize: u8,
    is_reference_block: bool,
    delta_ref: Option<&[u8]>,
    codec: &dyn Codec,
) -> Result<Vec<u8>> {
    let payload = chunk.block_payload(i);
    let block_len = chunk.block_len(i);
    decode_block(payload, block_len, pipeline, typesize, is_reference_block, delta_ref, codec)
}

/// Whole-chunk decode (§4.6) into a freshly allocated buffer.
pub fn decode_chunk(chunk: &Chunk, registry: &CodecRegistry, pool: &rayon::ThreadPool) -> Result<Vec<u8>> {
    let mut dst = vec![0u8; chunk.nbytes() as usize];
    decode_chunk_into(chunk, registry, pool, &mut dst)?;
    Ok(dst)
}

/// Whole-chunk decode into a caller-provided buffer.
pub fn decode_chunk_into(chunk: &Chunk, registry: &CodecRegistry, pool: &rayon::ThreadPool, dst: &mut [u8]) -> Result<usize> {
    let nbytes = chunk.nbytes() as usize;
    if dst.len() < nbytes {
        return Err(Error::size(format!("destination has {} bytes, need {nbytes}", dst.len())));
    }

    let pipeline = chunk.filters()?;
    let codec = registry.get(chunk.codec_id())?;
    let typesize = chunk.typesize();
    let nblocks = chunk.nblocks();
    let blocksize = chunk.blocksize() as usize;

    let (block0, delta_ref) = resolve_delta_reference(chunk, &pipeline, typesize, codec.as_ref())?;

    let blocks: Vec<Vec<u8>> = pool.install(|| {
        (0..nblocks)
            .into_par_iter()
            .map(|i| {
                if i == 0 {
                    if let Some(b0) = &block0 {
                        return Ok(b0.clone());
                    }
                }
                decode_one_block(chunk, i, &pipeline, typesize, i == 0, delta_ref.as_deref(), codec.as_ref())
            })
            .collect::<Result<Vec<_>>>()
    })?;

    for (i, block) in blocks.into_iter().enumerate() {
        let start = i * blocksize;
        dst[start..start + block.len()].copy_from_slice(&block);
    }
    Ok(nbytes)
}

/// Decode block 0 once if the pipeline needs a Delta reference, and derive
/// that reference from it. Returns `(None, None)` when Delta isn't in use.
fn resolve_delta_reference(
    chunk: &Chunk,
    pipeline: &FilterPipeline,
    typesize: u8,
    codec: &dyn Codec,
) -> Result<(Option<Vec<u8>>, Option<Vec<u8>>)> {
    if !pipeline.has_delta() || chunk.nblocks() == 0 {
        return Ok((None, None));
    }
    let block0 = decode_one_block(chunk, 0, pipeline, typesize, true, None, codec)?;
    let delta_ref = pipeline.state_before_delta(&block0, typesize)?;
    Ok((Some(block0), delta_ref))
}

/// Item-range extraction (§4.6): returns the same bytes whole-chunk decode
/// would yield for `[start_item, start_item + nitems)`, without decoding
/// blocks outside that range (beyond what Delta's reference requires).
pub fn extract_items(
    chunk: &Chunk,
    registry: &CodecRegistry,
    pool: &rayon::ThreadPool,
    start_item: u64,
    nitems: u64,
) -> Result<Vec<u8>> {
    if nitems == 0 {
        return Ok(Vec::new());
    }
    let total_items = chunk.nitems();
    if start_item + nitems > total_items {
        return Err(Error::range(format!(
            "requested items [{start_item}, {}) exceed chunk's {total_items} items",
            start_item + nitems
        )));
    }

    let typesize = chunk.typesize() as u64;
    let blocksize = chunk.blocksize() as u64;
    let start_byte = start_item * typesize;
    let end_byte = (start_item + nitems) * typesize;
    let b0 = (start_byte / blocksize) as usize;
    let b1 = ((end_byte - 1) / blocksize) as usize;

    let pipeline = chunk.filters()?;
    let codec = registry.get(chunk.codec_id())?;

    let (block0, delta_ref) = resolve_delta_reference(chunk, &pipeline, typesize as u8, codec.as_ref())?;

    let remaining: Vec<usize> = (b0..=b1).filter(|&i| i != 0).collect();
    let decoded_remaining: Vec<(usize, Vec<u8>)> = pool.install(|| {
        remaining
            .par_iter()
            .map(|&i| {
                let block = decode_one_block(chunk, i, &pipeline, typesize as u8, false, delta_ref.as_deref(), codec.as_ref())?;
                Ok((i, block))
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let mut blocks: HashMap<usize, Vec<u8>> = decoded_remaining.into_iter().collect();
    if b0 == 0 || b1 == 0 {
        if let Some(b0_bytes) = block0 {
            blocks.insert(0, b0_bytes);
        }
    }

    let mut out = vec![0u8; (end_byte - start_byte) as usize];
    for i in b0..=b1 {
        let block = blocks.get(&i).ok_or_else(|| Error::format(format!("missing decoded block {i}")))?;
        let block_start_byte = i as u64 * blocksize;
        let lo = start_byte.max(block_start_byte) - block_start_byte;
        let hi = end_byte.min(block_start_byte + block.len() as u64) - block_start_byte;
        let out_offset = (block_start_byte + lo - start_byte) as usize;
        out[out_offset..out_offset + (hi - lo) as usize].copy_from_slice(&block[lo as usize..hi as usize]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Filter, FilterSpec};

    fn pool(n: usize) -> rayon::ThreadPool {
        rayon::ThreadPoolBuilder::new().num_threads(n).build().unwrap()
    }

    #[test]
    fn encode_decode_roundtrip() {
        let registry = CodecRegistry::with_defaults();
        let codec = registry.get(0).unwrap();
        let typesize = 4u8;
        let blocksize = 256usize;
        let pipeline = FilterPipeline::new(vec![FilterSpec::new(Filter::Shuffle, 0)], typesize, blocksize).unwrap();
        let src: Vec<u8> = (0..10_000u32).flat_map(|i| i.to_le_bytes()).collect();
        let p = pool(4);

        let chunk = encode_chunk(&src, typesize, blocksize, &pipeline, codec.as_ref(), 0, 5, &p).unwrap();
        assert_eq!(chunk.nbytes() as usize, src.len());
        assert_eq!(chunk.nblocks(), (src.len() + blocksize - 1) / blocksize);

        let decoded = decode_chunk(&chunk, &registry, &p).unwrap();
        assert_eq!(decoded, src);
    }

    #[test]
    fn extract_matches_decode_slice() {
        let registry = CodecRegistry::with_defaults();
        let codec = registry.get(0).unwrap();
        let typesize = 4u8;
        let blocksize = 128usize;
        let pipeline = FilterPipeline::new(vec![FilterSpec::new(Filter::Shuffle, 0)], typesize, blocksize).unwrap();
        let src: Vec<u8> = (0..10_000_000u32).map(|i| i as u8).take(4000).flat_map(|_| [0u8; 4]).collect();
        let src: Vec<u8> = (0..1000u32).flat_map(|i| i.to_le_bytes()).collect();
        let p = pool(2);
        let chunk = encode_chunk(&src, typesize, blocksize, &pipeline, codec.as_ref(), 0, 5, &p).unwrap();

        let full = decode_chunk(&chunk, &registry, &p).unwrap();
        let extracted = extract_items(&chunk, &registry, &p, 5, 5).unwrap();
        assert_eq!(extracted, full[5 * 4..10 * 4]);
    }

    #[test]
    fn empty_input_produces_zero_blocks() {
        let registry = CodecRegistry::with_defaults();
        let codec = registry.get(0).unwrap();
        let pipeline = FilterPipeline::new(vec![], 4, 256).unwrap();
        let p = pool(1);
        let chunk = encode_chunk(&[], 4, 256, &pipeline, codec.as_ref(), 0, 5, &p).unwrap();
        assert_eq!(chunk.nblocks(), 0);
        assert_eq!(decode_chunk(&chunk, &registry, &p).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn extract_zero_items_returns_empty() {
        let registry = CodecRegistry::with_defaults();
        let codec = registry.get(0).unwrap();
        let pipeline = FilterPipeline::new(vec![], 4, 256).unwrap();
        let p = pool(1);
        let src: Vec<u8> = (0..100u32).flat_map(|i| i.to_le_bytes()).collect();
        let chunk = encode_chunk(&src, 4, 256, &pipeline, codec.as_ref(), 0, 5, &p).unwrap();
        assert_eq!(extract_items(&chunk, &registry, &p, 0, 0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn extract_out_of_range_is_range_error() {
        let registry = CodecRegistry::with_defaults();
        let codec = registry.get(0).unwrap();
        let pipeline = FilterPipeline::new(vec![], 4, 256).unwrap();
        let p = pool(1);
        let src: Vec<u8> = (0..100u32).flat_map(|i| i.to_le_bytes()).collect();
        let chunk = encode_chunk(&src, 4, 256, &pipeline, codec.as_ref(), 0, 5, &p).unwrap();
        let err = extract_items(&chunk, &registry, &p, 99, 10).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Range);
    }

    #[test]
    fn decode_into_undersized_buffer_is_size_error() {
        let registry = CodecRegistry::with_defaults();
        let codec = registry.get(0).unwrap();
        let pipeline = FilterPipeline::new(vec![], 4, 256).unwrap();
        let p = pool(1);
        let src: Vec<u8> = (0..100u32).flat_map(|i| i.to_le_bytes()).collect();
        let chunk = encode_chunk(&src, 4, 256, &pipeline, codec.as_ref(), 0, 5, &p).unwrap();
        let mut dst = vec![0u8; chunk.nbytes() as usize - 1];
        let err = decode_chunk_into(&chunk, &registry, &p, &mut dst).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Size);
    }

    #[test]
    fn delta_roundtrip_across_multiple_blocks() {
        let registry = CodecRegistry::with_defaults();
        let codec = registry.get(0).unwrap();
        let typesize = 4u8;
        let blocksize = 128usize; // 32 elements/block
        let pipeline = FilterPipeline::new(
            vec![FilterSpec::new(Filter::Shuffle, 0), FilterSpec::new(Filter::Delta, 0)],
            typesize,
            blocksize,
        )
        .unwrap();
        let src: Vec<u8> = (0..500u32).flat_map(|i| i.to_le_bytes()).collect();
        let p = pool(3);
        let chunk = encode_chunk(&src, typesize, blocksize, &pipeline, codec.as_ref(), 0, 5, &p).unwrap();
        assert!(chunk.nblocks() > 1);
        let decoded = decode_chunk(&chunk, &registry, &p).unwrap();
        assert_eq!(decoded, src);

        let extracted = extract_items(&chunk, &registry, &p, 60, 4).unwrap();
        assert_eq!(extracted, &src[60 * 4..64 * 4]);
    }
}
