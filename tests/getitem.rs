//! Item-range extraction must match decoding the whole chunk then slicing
//! (§8's quantified invariant), including when Delta or Bitshuffle make a
//! requested range depend on block 0.

use chunkwise::context::{CompressParams, CompressionContext, DecompressParams, DecompressionContext};
use chunkwise::filter::{Filter, FilterSpec};

fn make_u32_buffer(n: u32) -> Vec<u8> {
    (0..n).flat_map(|i| i.to_le_bytes()).collect()
}

#[test]
fn extraction_matches_full_decode_slice_for_every_range() {
    let params = CompressParams {
        typesize: 4,
        clevel: 5,
        filters: vec![FilterSpec::new(Filter::Shuffle, 0)],
        codec_name: "lz4".to_string(),
        blocksize: Some(256), // 64 elements/block
        nthreads: 4,
    };
    let cctx = CompressionContext::new(params).unwrap();
    let dctx = DecompressionContext::new(DecompressParams::default()).unwrap();

    let src = make_u32_buffer(2000);
    let chunk = cctx.compress(&src).unwrap();
    let full = dctx.decompress(&chunk).unwrap();

    for &(start, count) in &[(0u64, 1u64), (63, 2), (64, 1), (500, 300), (1999, 1), (0, 2000)] {
        let extracted = dctx.extract_items(&chunk, start, count).unwrap();
        let want = &full[(start as usize * 4)..((start + count) as usize * 4)];
        assert_eq!(extracted, want, "mismatch for start={start} count={count}");
    }
}

#[test]
fn extraction_across_delta_reference_block() {
    let params = CompressParams {
        typesize: 4,
        clevel: 5,
        filters: vec![FilterSpec::new(Filter::Shuffle, 0), FilterSpec::new(Filter::Delta, 0)],
        codec_name: "zstd".to_string(),
        blocksize: Some(128), // 32 elements/block
        nthreads: 4,
    };
    let cctx = CompressionContext::new(params).unwrap();
    let dctx = DecompressionContext::new(DecompressParams::default()).unwrap();

    let src = make_u32_buffer(1000);
    let chunk = cctx.compress(&src).unwrap();
    let full = dctx.decompress(&chunk).unwrap();

    for &(start, count) in &[(0u64, 5u64), (31, 4), (100, 50), (32, 1)] {
        let extracted = dctx.extract_items(&chunk, start, count).unwrap();
        let want = &full[(start as usize * 4)..((start + count) as usize * 4)];
        assert_eq!(extracted, want, "mismatch for start={start} count={count}");
    }
}

#[test]
fn extraction_across_bitshuffle_groups() {
    let params = CompressParams {
        typesize: 4,
        clevel: 5,
        filters: vec![FilterSpec::new(Filter::BitShuffle, 0)],
        codec_name: "deflate".to_string(),
        blocksize: Some(256),
        nthreads: 2,
    };
    let cctx = CompressionContext::new(params).unwrap();
    let dctx = DecompressionContext::new(DecompressParams::default()).unwrap();

    let src = make_u32_buffer(600);
    let chunk = cctx.compress(&src).unwrap();
    let full = dctx.decompress(&chunk).unwrap();

    for &(start, count) in &[(0u64, 9u64), (5, 7), (60, 2)] {
        let extracted = dctx.extract_items(&chunk, start, count).unwrap();
        let want = &full[(start as usize * 4)..((start + count) as usize * 4)];
        assert_eq!(extracted, want, "mismatch for start={start} count={count}");
    }
}

#[test]
fn zero_items_returns_empty() {
    let params = CompressParams {
        typesize: 4,
        ..Default::default()
    };
    let cctx = CompressionContext::new(params).unwrap();
    let dctx = DecompressionContext::new(DecompressParams::default()).unwrap();
    let chunk = cctx.compress(&make_u32_buffer(100)).unwrap();
    assert_eq!(dctx.extract_items(&chunk, 0, 0).unwrap(), Vec::<u8>::new());
}

#[test]
fn start_beyond_end_is_range_error() {
    let params = CompressParams {
        typesize: 4,
        ..Default::default()
    };
    let cctx = CompressionContext::new(params).unwrap();
    let dctx = DecompressionContext::new(DecompressParams::default()).unwrap();
    let chunk = cctx.compress(&make_u32_buffer(100)).unwrap();
    let err = dctx.extract_items(&chunk, 100, 1).unwrap_err();
    assert_eq!(err.kind, chunkwise::ErrorKind::Range);
}
