//! An in-memory, block-parallel filter-then-compress engine for typed
//! numerical buffers. Buffers are split into blocks, each filtered (shuffle,
//! bitshuffle, delta, or lossy mantissa truncation) and compressed by a
//! pluggable byte codec, then framed into a self-describing chunk. Chunks
//! compose into super-chunks, which pack to and from a single contiguous
//! buffer.

pub mod block;
pub mod chunk;
pub mod codec;
pub mod constants;
pub mod context;
pub mod env;
pub mod error;
pub mod filter;
pub mod pack;
pub mod superchunk;

pub use chunk::Chunk;
pub use codec::{Codec, CodecRegistry};
pub use context::{CompressParams, CompressionContext, DecompressParams, DecompressionContext};
pub use error::{Error, ErrorKind, Result};
pub use filter::{Filter, FilterPipeline, FilterSpec};
pub use superchunk::SuperChunk;
