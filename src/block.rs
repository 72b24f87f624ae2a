//! Block Worker (§4.4): filters + codec on one block, producing a
//! self-tagged payload (`0` = codec-compressed, `1` = literal).

use crate::codec::Codec;
use crate::env::nocompress_from_env;
use crate::error::{Error, Result};
use crate::filter::FilterPipeline;

const TAG_COMPRESSED: u8 = 0;
const TAG_LITERAL: u8 = 1;

/// Filter + compress one block, returning its tagged payload bytes.
///
/// `delta_ref` is `Some` only when the pipeline has a Delta filter and this
/// is not the reference block (see [`FilterPipeline::state_before_delta`]).
pub fn encode_block(
    block: &[u8],
    pipeline: &FilterPipeline,
    typesize: u8,
    is_reference_block: bool,
    delta_ref: Option<&[u8]>,
    codec: &dyn Codec,
    clevel: i32,
    force_literal: bool,
) -> Result<Vec<u8>> {
    let filtered = pipeline.apply_forward(block, typesize, is_reference_block, delta_ref)?;

    if force_literal || nocompress_from_env() {
        return Ok(literal_payload(&filtered));
    }

    let max_out = codec.max_output_len(filtered.len());
    let mut compressed = vec![0u8; max_out];
    match codec.encode(clevel, &filtered, &mut compressed) {
        Ok(used) if used < filtered.len() => {
            compressed.truncate(used);
            let mut payload = Vec::with_capacity(used + 1);
            payload.push(TAG_COMPRESSED);
            payload.extend_from_slice(&compressed);
            Ok(payload)
        }
        Ok(_) => {
            #[cfg(feature = "diagnostics")]
            log::warn!("block of {} bytes did not compress, storing literal", filtered.len());
            Ok(literal_payload(&filtered))
        }
        Err(_e) => {
            #[cfg(feature = "diagnostics")]
            log::warn!("codec backend failed ({_e}), storing literal");
            Ok(literal_payload(&filtered))
        }
    }
}

fn literal_payload(filtered: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(filtered.len() + 1);
    payload.push(TAG_LITERAL);
    payload.extend_from_slice(filtered);
    payload
}

/// Decode one block payload back to its original bytes.
pub fn decode_block(
    payload: &[u8],
    block_len: usize,
    pipeline: &FilterPipeline,
    typesize: u8,
    is_reference_block: bool,
    delta_ref: Option<&[u8]>,
    codec: &dyn Codec,
) -> Result<Vec<u8>> {
    let (tag, body) = payload
        .split_first()
        .ok_or_else(|| Error::format("empty block payload"))?;

    let filtered = match *tag {
        TAG_COMPRESSED => {
            let mut dest = vec![0u8; block_len];
            let used = codec.decode(body, &mut dest)?;
            if used != block_len {
                return Err(Error::format(format!(
                    "codec decoded {used} bytes, expected {block_len}"
                )));
            }
            dest
        }
        TAG_LITERAL => {
            if body.len() != block_len {
                return Err(Error::format(format!(
                    "literal block has {} bytes, expected {block_len}",
                    body.len()
                )));
            }
            body.to_vec()
        }
        other => return Err(Error::format(format!("unrecognized block tag {other}"))),
    };

    pipeline.apply_reverse(&filtered, typesize, is_reference_block, delta_ref)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecRegistry;
    use crate::filter::{Filter, FilterSpec};

    #[test]
    fn roundtrip_compressible_block() {
        let registry = CodecRegistry::with_defaults();
        let codec = registry.get(0).unwrap();
        let pipeline = FilterPipeline::new(vec![FilterSpec::new(Filter::Shuffle, 0)], 4, 256).unwrap();
        let block: Vec<u8> = (0..256u32).map(|i| (i / 4) as u8).collect();

        let payload = encode_block(&block, &pipeline, 4, true, None, codec.as_ref(), 5, false).unwrap();
        let decoded = decode_block(&payload, block.len(), &pipeline, 4, true, None, codec.as_ref()).unwrap();
        assert_eq!(decoded, block);
    }

    #[test]
    fn falls_back_to_literal_for_incompressible_noise() {
        let registry = CodecRegistry::with_defaults();
        let codec = registry.get(0).unwrap();
        let pipeline = FilterPipeline::new(vec![], 1, 64).unwrap();
        // Force literal to exercise the tag-1 path deterministically.
        let block: Vec<u8> = (0..64u32).map(|i| (i * 97 % 251) as u8).collect();

        let payload = encode_block(&block, &pipeline, 1, true, None, codec.as_ref(), 5, true).unwrap();
        assert_eq!(payload[0], TAG_LITERAL);
        let decoded = decode_block(&payload, block.len(), &pipeline, 1, true, None, codec.as_ref()).unwrap();
        assert_eq!(decoded, block);
    }
}
