//! Edge cases and error conditions enumerated across §4 and §7.

use chunkwise::context::{CompressParams, CompressionContext, DecompressParams, DecompressionContext};
use chunkwise::filter::{Filter, FilterSpec};

#[test]
fn shuffle_and_bitshuffle_together_is_config_error() {
    let params = CompressParams {
        typesize: 4,
        filters: vec![FilterSpec::new(Filter::Shuffle, 0), FilterSpec::new(Filter::BitShuffle, 0)],
        ..Default::default()
    };
    let err = CompressionContext::new(params).unwrap().compress(&[0u8; 64]).unwrap_err();
    assert_eq!(err.kind, chunkwise::ErrorKind::Config);
}

#[test]
fn delta_requires_blocksize_multiple_of_typesize() {
    let params = CompressParams {
        typesize: 7,
        filters: vec![FilterSpec::new(Filter::Delta, 0)],
        blocksize: Some(100),
        ..Default::default()
    };
    let err = CompressionContext::new(params).unwrap().compress(&[0u8; 140]).unwrap_err();
    assert_eq!(err.kind, chunkwise::ErrorKind::Config);
}

#[test]
fn zero_typesize_is_config_error() {
    let params = CompressParams {
        typesize: 0,
        ..Default::default()
    };
    let err = CompressionContext::new(params).unwrap_err();
    assert_eq!(err.kind, chunkwise::ErrorKind::Config);
}

#[test]
fn zero_nthreads_is_config_error() {
    let params = CompressParams {
        nthreads: 0,
        ..Default::default()
    };
    let err = CompressionContext::new(params).unwrap_err();
    assert_eq!(err.kind, chunkwise::ErrorKind::Config);
}

#[test]
fn last_block_shorter_than_blocksize_round_trips() {
    let params = CompressParams {
        typesize: 4,
        filters: vec![FilterSpec::new(Filter::Shuffle, 0)],
        blocksize: Some(256),
        ..Default::default()
    };
    let cctx = CompressionContext::new(params).unwrap();
    let dctx = DecompressionContext::new(DecompressParams::default()).unwrap();

    let src: Vec<u8> = (0..777u32).flat_map(|i| i.to_le_bytes()).collect();
    let chunk = cctx.compress(&src).unwrap();
    assert_ne!(src.len() % chunk.blocksize() as usize, 0, "test setup should leave a short final block");
    let decoded = dctx.decompress(&chunk).unwrap();
    assert_eq!(decoded, src);
}

// Both env-var checks run in one test function: `std::env::set_var` mutates
// process-global state, which would race against any other test reading the
// environment if split across parallel-running `#[test]` functions.
#[test]
fn env_overrides_affect_compression_behavior() {
    std::env::set_var("CHUNKWISE_NOCOMPRESS", "1");
    let params = CompressParams {
        typesize: 4,
        filters: vec![],
        blocksize: Some(256),
        ..Default::default()
    };
    let cctx = CompressionContext::new(params).unwrap();
    let src: Vec<u8> = (0..2000u32).flat_map(|i| i.to_le_bytes()).collect();
    let chunk = cctx.compress(&src);
    std::env::remove_var("CHUNKWISE_NOCOMPRESS");

    // Forcing literal blocks still round-trips; it may also trip the
    // whole-chunk incompressible threshold, which is an acceptable outcome.
    match chunk {
        Ok(chunk) => {
            let dctx = DecompressionContext::new(DecompressParams::default()).unwrap();
            assert_eq!(dctx.decompress(&chunk).unwrap(), src);
        }
        Err(e) => assert_eq!(e.kind, chunkwise::ErrorKind::Incompressible),
    }

    std::env::set_var("CHUNKWISE_CODEC", "zstd");
    let params = CompressParams::from_env();
    std::env::remove_var("CHUNKWISE_CODEC");
    assert_eq!(params.codec_name, "zstd");

    std::env::set_var("CHUNKWISE_CODEC", "bogus");
    let params = CompressParams::from_env();
    std::env::remove_var("CHUNKWISE_CODEC");
    assert_eq!(params.codec_name, "lz4", "unrecognized codec name should fall back to lz4");
}
