//! Codec Registry (§4.1): a name/id table mapping to pluggable byte-codec
//! backends. Backends are swappable without touching any other component —
//! the chunk encoder and decoder only ever see the `Codec` trait.

mod deflate;
mod lz4;
mod snappy;
mod zstd_backend;

use std::sync::Arc;

use crate::constants::MAX_CODEC_ID;
use crate::error::{Error, Result};

/// A general-purpose byte codec backend.
pub trait Codec: Send + Sync {
    /// Small integer identifying this codec in the chunk header (0..=7, see
    /// `MAX_CODEC_ID`).
    fn id(&self) -> u8;

    /// Registry name, e.g. `"lz4"`.
    fn name(&self) -> &'static str;

    /// Upper bound on the encoded length of a `src_len`-byte input.
    fn max_output_len(&self, src_len: usize) -> usize;

    /// Compress `src` into `dst`, returning the number of bytes written.
    fn encode(&self, clevel: i32, src: &[u8], dst: &mut [u8]) -> Result<usize>;

    /// Decompress `src` into `dst`, returning the number of bytes written.
    fn decode(&self, src: &[u8], dst: &mut [u8]) -> Result<usize>;
}

const REGISTRY_SLOTS: usize = MAX_CODEC_ID as usize + 1;

/// Name/id table mapping to codec backends. Read-only after construction
/// (§5: "The codec registry is read-only after initialization").
#[derive(Clone)]
pub struct CodecRegistry {
    slots: [Option<Arc<dyn Codec>>; REGISTRY_SLOTS],
}

impl CodecRegistry {
    /// An empty registry with no backends.
    pub fn empty() -> Self {
        CodecRegistry {
            slots: Default::default(),
        }
    }

    /// The default registry: lz4 (id 0), zstd (id 1), deflate (id 2), and
    /// snappy (id 3).
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(lz4::Lz4Codec));
        registry.register(Arc::new(zstd_backend::ZstdCodec));
        registry.register(Arc::new(deflate::DeflateCodec));
        registry.register(Arc::new(snappy::SnappyCodec));
        registry
    }

    /// Register (or replace) a backend at its own `id()`.
    ///
    /// # Panics
    /// Panics if `codec.id() > MAX_CODEC_ID`; that is a programming error in
    /// the backend, not a runtime condition callers need to handle.
    pub fn register(&mut self, codec: Arc<dyn Codec>) {
        let id = codec.id() as usize;
        assert!(id < REGISTRY_SLOTS, "codec id {id} exceeds MAX_CODEC_ID");
        self.slots[id] = Some(codec);
    }

    pub fn get(&self, id: u8) -> Result<Arc<dyn Codec>> {
        self.slots
            .get(id as usize)
            .and_then(|s| s.clone())
            .ok_or_else(|| Error::config(format!("no codec registered for id {id}")))
    }

    pub fn get_by_name(&self, name: &str) -> Result<Arc<dyn Codec>> {
        self.slots
            .iter()
            .flatten()
            .find(|c| c.name() == name)
            .cloned()
            .ok_or_else(|| Error::config(format!("no codec registered with name {name:?}")))
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_four_codecs() {
        let reg = CodecRegistry::with_defaults();
        for (id, name) in [(0u8, "lz4"), (1, "zstd"), (2, "deflate"), (3, "snappy")] {
            let codec = reg.get(id).unwrap();
            assert_eq!(codec.name(), name);
            assert_eq!(reg.get_by_name(name).unwrap().id(), id);
        }
    }

    #[test]
    fn unregistered_id_is_config_error() {
        let reg = CodecRegistry::empty();
        assert_eq!(reg.get(5).unwrap_err().kind, crate::error::ErrorKind::Config);
    }
}
