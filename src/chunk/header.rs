//! The chunk's 16-byte fixed header plus its filter id/meta arrays (§6).
//! Parsing returns a value object; writing fills fields by name, not by
//! hand-computed offsets (§9 redesign note).

use crate::constants::{CHUNK_HEADER_FIXED_LEN, CHUNK_HEADER_LEN, CHUNK_VERSION, MAX_FILTERS, VERSION_FORMAT};
use crate::error::{Error, Result};

const FLAG_SHUFFLE: u8 = 1 << 0;
const FLAG_BITSHUFFLE: u8 = 1 << 1;
const CODEC_ID_SHIFT: u8 = 5;
const CODEC_ID_MASK: u8 = 0b111;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkHeader {
    pub version: u8,
    pub version_format: u8,
    pub flags: u8,
    pub typesize: u8,
    pub nbytes: u32,
    pub blocksize: u32,
    pub cbytes: u32,
    pub filter_ids: [u8; MAX_FILTERS],
    pub filter_metas: [u8; MAX_FILTERS],
}

impl ChunkHeader {
    pub fn new(
        typesize: u8,
        nbytes: u32,
        blocksize: u32,
        cbytes: u32,
        has_shuffle: bool,
        has_bitshuffle: bool,
        codec_id: u8,
        filter_ids: [u8; MAX_FILTERS],
        filter_metas: [u8; MAX_FILTERS],
    ) -> Result<Self> {
        if codec_id > CODEC_ID_MASK {
            return Err(Error::config(format!(
                "codec id {codec_id} does not fit in the header's 3-bit field"
            )));
        }
        let mut flags = 0u8;
        if has_shuffle {
            flags |= FLAG_SHUFFLE;
        }
        if has_bitshuffle {
            flags |= FLAG_BITSHUFFLE;
        }
        flags |= codec_id << CODEC_ID_SHIFT;

        Ok(ChunkHeader {
            version: CHUNK_VERSION,
            version_format: VERSION_FORMAT,
            flags,
            typesize,
            nbytes,
            blocksize,
            cbytes,
            filter_ids,
            filter_metas,
        })
    }

    pub fn codec_id(&self) -> u8 {
        (self.flags >> CODEC_ID_SHIFT) & CODEC_ID_MASK
    }

    pub fn has_shuffle(&self) -> bool {
        self.flags & FLAG_SHUFFLE != 0
    }

    pub fn has_bitshuffle(&self) -> bool {
        self.flags & FLAG_BITSHUFFLE != 0
    }

    pub fn nblocks(&self) -> usize {
        if self.nbytes == 0 || self.blocksize == 0 {
            return if self.nbytes == 0 { 0 } else { 1 };
        }
        ((self.nbytes as u64 + self.blocksize as u64 - 1) / self.blocksize as u64) as usize
    }

    pub fn to_bytes(&self) -> [u8; CHUNK_HEADER_LEN] {
        let mut out = [0u8; CHUNK_HEADER_LEN];
        out[0] = self.version;
        out[1] = self.version_format;
        out[2] = self.flags;
        out[3] = self.typesize;
        out[4..8].copy_from_slice(&self.nbytes.to_le_bytes());
        out[8..12].copy_from_slice(&self.blocksize.to_le_bytes());
        out[12..16].copy_from_slice(&self.cbytes.to_le_bytes());
        out[CHUNK_HEADER_FIXED_LEN..CHUNK_HEADER_FIXED_LEN + MAX_FILTERS].copy_from_slice(&self.filter_ids);
        out[CHUNK_HEADER_FIXED_LEN + MAX_FILTERS..CHUNK_HEADER_LEN].copy_from_slice(&self.filter_metas);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < CHUNK_HEADER_LEN {
            return Err(Error::format(format!(
                "chunk header needs {CHUNK_HEADER_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let version = bytes[0];
        if version != CHUNK_VERSION {
            return Err(Error::format(format!(
                "unsupported chunk version {version}, expected {CHUNK_VERSION}"
            )));
        }
        let version_format = bytes[1];
        let flags = bytes[2];
        let typesize = bytes[3];
        if typesize == 0 {
            return Err(Error::format("typesize must be at least 1"));
        }
        let nbytes = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        let blocksize = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
        let cbytes = u32::from_le_bytes(bytes[12..16].try_into().unwrap());

        let mut filter_ids = [0u8; MAX_FILTERS];
        filter_ids.copy_from_slice(&bytes[CHUNK_HEADER_FIXED_LEN..CHUNK_HEADER_FIXED_LEN + MAX_FILTERS]);
        let mut filter_metas = [0u8; MAX_FILTERS];
        filter_metas.copy_from_slice(&bytes[CHUNK_HEADER_FIXED_LEN + MAX_FILTERS..CHUNK_HEADER_LEN]);

        Ok(ChunkHeader {
            version,
            version_format,
            flags,
            typesize,
            nbytes,
            blocksize,
            cbytes,
            filter_ids,
            filter_metas,
        })
    }
}
