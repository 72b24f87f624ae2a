//! Compression/decompression contexts (§5): the fixed-parameter, thread-pool
//! owning objects that turn a typed buffer into a chunk and back. Grounded in
//! the teacher's `blosc::context::{Context, DContext}`, generalized from a
//! global mutable C-style struct into two small, immutable Rust structs each
//! holding their own `rayon::ThreadPool`.

use std::sync::Arc;

use crate::codec::CodecRegistry;
use crate::constants::MAX_FILTERS;
use crate::env::{codec_name_from_env, nthreads_from_env};
use crate::error::{Error, Result};
use crate::filter::{FilterPipeline, FilterSpec};

/// Parameters fixed for the lifetime of a [`CompressionContext`].
#[derive(Clone, Debug)]
pub struct CompressParams {
    pub typesize: u8,
    pub clevel: i32,
    pub filters: Vec<FilterSpec>,
    pub codec_name: String,
    /// `None` requests auto-selection via [`crate::chunk::choose_blocksize`].
    pub blocksize: Option<usize>,
    pub nthreads: usize,
}

impl Default for CompressParams {
    fn default() -> Self {
        CompressParams {
            typesize: 4,
            clevel: 5,
            filters: vec![FilterSpec::new(crate::filter::Filter::Shuffle, 0)],
            codec_name: "lz4".to_string(),
            blocksize: None,
            nthreads: 1,
        }
    }
}

impl CompressParams {
    /// Start from [`Default::default`] values, then apply
    /// `CHUNKWISE_CODEC`/`CHUNKWISE_NTHREADS` overrides (§5).
    pub fn from_env() -> Self {
        let mut params = Self::default();
        params.codec_name = codec_name_from_env();
        params.nthreads = nthreads_from_env();
        params
    }

    fn validate(&self) -> Result<()> {
        if self.typesize == 0 {
            return Err(Error::config("typesize must be at least 1"));
        }
        if self.filters.len() > MAX_FILTERS {
            return Err(Error::config(format!(
                "pipeline has {} entries, max is {MAX_FILTERS}",
                self.filters.len()
            )));
        }
        if self.nthreads == 0 {
            return Err(Error::config("nthreads must be at least 1"));
        }
        Ok(())
    }
}

/// Parameters fixed for the lifetime of a [`DecompressionContext`].
#[derive(Clone, Debug, Default)]
pub struct DecompressParams {
    pub nthreads_override: Option<usize>,
}

impl DecompressParams {
    pub fn from_env() -> Self {
        DecompressParams {
            nthreads_override: Some(nthreads_from_env()),
        }
    }
}

/// Owns the thread pool and codec registry used to encode chunks, plus a
/// resolved [`FilterPipeline`] once a blocksize is known (§5: "The codec
/// registry is read-only after initialization").
pub struct CompressionContext {
    params: CompressParams,
    registry: Arc<CodecRegistry>,
    pool: rayon::ThreadPool,
}

impl CompressionContext {
    pub fn new(params: CompressParams) -> Result<Self> {
        params.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(params.nthreads)
            .build()
            .map_err(|e| Error::config(format!("failed to build thread pool: {e}")))?;
        Ok(CompressionContext {
            params,
            registry: Arc::new(CodecRegistry::with_defaults()),
            pool,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(CompressParams::from_env())
    }

    pub fn params(&self) -> &CompressParams {
        &self.params
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    pub fn pool(&self) -> &rayon::ThreadPool {
        &self.pool
    }

    /// Resolve this context's blocksize for a `src_len`-byte buffer, building
    /// the matching [`FilterPipeline`] to validate against it.
    pub fn resolve(&self, src_len: usize) -> Result<(usize, FilterPipeline)> {
        let blocksize = self
            .params
            .blocksize
            .unwrap_or_else(|| crate::chunk::choose_blocksize(self.params.clevel, self.params.typesize, src_len));
        let pipeline = FilterPipeline::new(self.params.filters.clone(), self.params.typesize, blocksize)?;
        Ok((blocksize, pipeline))
    }

    /// Compress `src` into a new [`crate::chunk::Chunk`].
    pub fn compress(&self, src: &[u8]) -> Result<crate::chunk::Chunk> {
        let (blocksize, pipeline) = self.resolve(src.len())?;
        let codec = self.registry.get_by_name(&self.params.codec_name)?;
        crate::chunk::encode_chunk(
            src,
            self.params.typesize,
            blocksize,
            &pipeline,
            codec.as_ref(),
            codec.id(),
            self.params.clevel,
            &self.pool,
        )
    }
}

/// Owns the thread pool and codec registry used to decode chunks. Stateless
/// with respect to any particular chunk's filters/codec — those are read back
/// out of each chunk's own header.
pub struct DecompressionContext {
    registry: Arc<CodecRegistry>,
    pool: rayon::ThreadPool,
}

impl DecompressionContext {
    pub fn new(params: DecompressParams) -> Result<Self> {
        let nthreads = params.nthreads_override.unwrap_or(1);
        if nthreads == 0 {
            return Err(Error::config("nthreads must be at least 1"));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(nthreads)
            .build()
            .map_err(|e| Error::config(format!("failed to build thread pool: {e}")))?;
        Ok(DecompressionContext {
            registry: Arc::new(CodecRegistry::with_defaults()),
            pool,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(DecompressParams::from_env())
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    pub fn pool(&self) -> &rayon::ThreadPool {
        &self.pool
    }

    pub fn decompress(&self, chunk: &crate::chunk::Chunk) -> Result<Vec<u8>> {
        crate::chunk::decode_chunk(chunk, &self.registry, &self.pool)
    }

    pub fn decompress_into(&self, chunk: &crate::chunk::Chunk, dst: &mut [u8]) -> Result<usize> {
        crate::chunk::decode_chunk_into(chunk, &self.registry, &self.pool, dst)
    }

    pub fn extract_items(&self, chunk: &crate::chunk::Chunk, start_item: u64, nitems: u64) -> Result<Vec<u8>> {
        crate::chunk::extract_items(chunk, &self.registry, &self.pool, start_item, nitems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compress_decompress_roundtrip() {
        let params = CompressParams {
            typesize: 4,
            ..Default::default()
        };
        let cctx = CompressionContext::new(params).unwrap();
        let dctx = DecompressionContext::new(DecompressParams::default()).unwrap();

        let src: Vec<u8> = (0..5000u32).flat_map(|i| i.to_le_bytes()).collect();
        let chunk = cctx.compress(&src).unwrap();
        let decoded = dctx.decompress(&chunk).unwrap();
        assert_eq!(decoded, src);
    }

    #[test]
    fn rejects_zero_nthreads() {
        let params = CompressParams {
            nthreads: 0,
            ..Default::default()
        };
        let err = CompressionContext::new(params).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Config);
    }
}
