//! Packed Serializer (§4.9): flattens a [`SuperChunk`] into one contiguous
//! buffer and back. Every chunk (ancillary or data) is already self-describing
//! (§3: "a chunk is immutable... self-describing"), so the packed format only
//! needs to record *where* each chunk starts — its own header gives its
//! length.

use crate::chunk::Chunk;
use crate::context::{CompressionContext, DecompressionContext};
use crate::error::{Error, Result};
use crate::superchunk::{SuperChunk, ANCILLARY_SLOTS};

const PACK_VERSION: u8 = 1;

/// Fixed prefix: version, flags, typesize, reserved, blocksize, nchunks,
/// nbytes, cbytes, four ancillary offsets, data-offsets-table offset.
const PREFIX_LEN: usize = 1 + 1 + 1 + 1 + 4 + 4 + 8 + 8 + 8 * ANCILLARY_SLOTS + 8;

impl SuperChunk {
    /// Total serialized length this super-chunk would pack to, without
    /// building the buffer.
    pub fn get_packed_length(&self) -> usize {
        let ancillary_len: usize = self.ancillary_chunks().iter().flatten().map(|c| c.as_bytes().len()).sum();
        let data_len: usize = self.chunks().iter().map(|c| c.as_bytes().len()).sum();
        let offsets_len = 8 * self.chunks().len();
        PREFIX_LEN + ancillary_len + data_len + offsets_len
    }

    fn ancillary_chunks(&self) -> [Option<&Chunk>; ANCILLARY_SLOTS] {
        std::array::from_fn(|i| self.ancillary(i))
    }

    /// Serialize this super-chunk to a single contiguous buffer.
    pub fn pack(&self) -> Vec<u8> {
        let total = self.get_packed_length();
        let mut out = vec![0u8; total];

        let ancillary = self.ancillary_chunks();
        let mut cursor = PREFIX_LEN;
        let mut ancillary_offsets = [0u64; ANCILLARY_SLOTS];
        for (i, chunk) in ancillary.iter().enumerate() {
            if let Some(chunk) = chunk {
                ancillary_offsets[i] = cursor as u64;
                let bytes = chunk.as_bytes();
                out[cursor..cursor + bytes.len()].copy_from_slice(bytes);
                cursor += bytes.len();
            }
        }

        let mut data_offsets = Vec::with_capacity(self.chunks().len());
        for chunk in self.chunks() {
            data_offsets.push(cursor as u64);
            let bytes = chunk.as_bytes();
            out[cursor..cursor + bytes.len()].copy_from_slice(bytes);
            cursor += bytes.len();
        }

        let offsets_table_offset = cursor as u64;
        for offset in &data_offsets {
            out[cursor..cursor + 8].copy_from_slice(&offset.to_le_bytes());
            cursor += 8;
        }
        debug_assert_eq!(cursor, total);

        let typesize = self.chunks().first().map(|c| c.typesize()).unwrap_or(0);
        let blocksize = self.chunks().first().map(|c| c.blocksize()).unwrap_or(0);

        out[0] = PACK_VERSION;
        out[1] = 0;
        out[2] = typesize;
        out[3] = 0;
        out[4..8].copy_from_slice(&blocksize.to_le_bytes());
        out[8..12].copy_from_slice(&(self.chunks().len() as u32).to_le_bytes());
        out[12..20].copy_from_slice(&self.nbytes().to_le_bytes());
        out[20..28].copy_from_slice(&self.cbytes().to_le_bytes());
        let mut off = 28;
        for ancillary_offset in &ancillary_offsets {
            out[off..off + 8].copy_from_slice(&ancillary_offset.to_le_bytes());
            off += 8;
        }
        out[off..off + 8].copy_from_slice(&offsets_table_offset.to_le_bytes());

        out
    }

    /// Parse a packed buffer back into an owned [`SuperChunk`], using fresh
    /// contexts built from `cctx`/`dctx` parameters reused across chunks.
    pub fn unpack(bytes: &[u8], cctx: CompressionContext, dctx: DecompressionContext) -> Result<SuperChunk> {
        if bytes.len() < PREFIX_LEN {
            return Err(Error::format(format!(
                "packed buffer needs at least {PREFIX_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let version = bytes[0];
        if version != PACK_VERSION {
            return Err(Error::format(format!(
                "unsupported packed version {version}, expected {PACK_VERSION}"
            )));
        }
        let nchunks = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
        let nbytes = u64::from_le_bytes(bytes[12..20].try_into().unwrap());
        let cbytes = u64::from_le_bytes(bytes[20..28].try_into().unwrap());

        let mut ancillary_offsets = [0u64; ANCILLARY_SLOTS];
        let mut off = 28;
        for slot in ancillary_offsets.iter_mut() {
            *slot = u64::from_le_bytes(bytes[off..off + 8].try_into().unwrap());
            off += 8;
        }
        let offsets_table_offset = u64::from_le_bytes(bytes[off..off + 8].try_into().unwrap()) as usize;

        let mut super_chunk = SuperChunk::new(cctx, dctx);

        for (slot, &offset) in ancillary_offsets.iter().enumerate() {
            if offset == 0 {
                continue;
            }
            let chunk = read_chunk_at(bytes, offset as usize)?;
            super_chunk.set_ancillary(slot, Some(chunk))?;
        }

        if offsets_table_offset + 8 * nchunks > bytes.len() {
            return Err(Error::format("data-offsets table runs past the end of the buffer"));
        }
        let mut data_offsets = Vec::with_capacity(nchunks);
        let mut cursor = offsets_table_offset;
        for _ in 0..nchunks {
            data_offsets.push(u64::from_le_bytes(bytes[cursor..cursor + 8].try_into().unwrap()));
            cursor += 8;
        }

        for offset in data_offsets {
            let chunk = read_chunk_at(bytes, offset as usize)?;
            super_chunk.append_chunk(chunk)?;
        }

        if super_chunk.nbytes() != nbytes || super_chunk.cbytes() != cbytes {
            return Err(Error::format("unpacked data-chunk totals do not match the packed prefix"));
        }

        Ok(super_chunk)
    }
}

/// Read one self-describing chunk starting at `offset`, trusting its own
/// `cbytes` field for its length.
fn read_chunk_at(bytes: &[u8], offset: usize) -> Result<Chunk> {
    if offset + 16 > bytes.len() {
        return Err(Error::format("chunk offset runs past the end of the buffer"));
    }
    let cbytes = u32::from_le_bytes(bytes[offset + 12..offset + 16].try_into().unwrap()) as usize;
    if offset + cbytes > bytes.len() {
        return Err(Error::format("chunk cbytes runs past the end of the buffer"));
    }
    Chunk::from_bytes(bytes[offset..offset + cbytes].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CompressParams, DecompressParams};

    fn new_contexts() -> (CompressionContext, DecompressionContext) {
        (
            CompressionContext::new(CompressParams::default()).unwrap(),
            DecompressionContext::new(DecompressParams::default()).unwrap(),
        )
    }

    #[test]
    fn pack_unpack_roundtrip_preserves_chunks_and_counters() {
        let (cctx, dctx) = new_contexts();
        let mut sc = SuperChunk::new(cctx, dctx);
        let mut originals = Vec::new();
        for i in 0..10u32 {
            let src: Vec<u8> = (0..500u32).map(|j| (i * 7 + j) as u32).flat_map(|v| v.to_le_bytes()).collect();
            sc.append_buffer(&src).unwrap();
            originals.push(src);
        }

        let packed = sc.pack();
        assert_eq!(packed.len(), sc.get_packed_length());

        let (cctx2, dctx2) = new_contexts();
        let unpacked = SuperChunk::unpack(&packed, cctx2, dctx2).unwrap();

        assert_eq!(unpacked.nchunks(), sc.nchunks());
        assert_eq!(unpacked.nbytes(), sc.nbytes());
        assert_eq!(unpacked.cbytes(), sc.cbytes());
        for (i, original) in originals.iter().enumerate() {
            let decoded = unpacked.decompress_chunk_owned(i).unwrap();
            assert_eq!(&decoded, original);
            assert_eq!(unpacked.chunk(i).unwrap().as_bytes(), sc.chunk(i).unwrap().as_bytes());
        }
    }

    #[test]
    fn pack_with_no_chunks_round_trips() {
        let (cctx, dctx) = new_contexts();
        let sc = SuperChunk::new(cctx, dctx);
        let packed = sc.pack();

        let (cctx2, dctx2) = new_contexts();
        let unpacked = SuperChunk::unpack(&packed, cctx2, dctx2).unwrap();
        assert_eq!(unpacked.nchunks(), 0);
        assert_eq!(unpacked.nbytes(), 0);
    }
}
