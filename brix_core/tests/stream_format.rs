//! Multi-frame streaming container tests against the real zstd engine.

use std::fs::File;
use std::io::Write as _;

use brix_codecs::{codec_by_name, DefaultRegistry, ZstdStreamEngine};
use brix_core::stream::{
    load_dictionary, BlockFormatHandler, CompressSession, DecompressSession, MAX_DICT_SIZE,
};
use brix_core::{Error, Writer};

fn compressible_bytes(len: usize) -> Vec<u8> {
    let pattern = b"streaming frames share one engine allocation per session. ";
    (0..len).map(|i| pattern[i % pattern.len()]).collect()
}

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("brix_test_{name}"))
}

fn compress_session() -> CompressSession {
    CompressSession::new(Box::new(ZstdStreamEngine), 3, Vec::new())
}

fn decompress_session() -> DecompressSession {
    DecompressSession::new(
        Box::new(ZstdStreamEngine),
        Vec::new(),
        Some(Box::new(BlockFormatHandler::new(DefaultRegistry))),
    )
}

#[test]
fn test_stream_roundtrip() {
    let data = compressible_bytes(1024 * 1024 + 321);
    let mut packed = Vec::new();
    let (raw, compressed) = compress_session()
        .compress(&mut &data[..], &mut packed, Some(data.len() as u64))
        .unwrap();
    assert_eq!(raw, data.len() as u64);
    assert_eq!(compressed, packed.len() as u64);
    assert!(packed.len() < data.len());

    let mut decoded = Vec::new();
    let total = decompress_session()
        .decompress(&mut &packed[..], &mut decoded)
        .unwrap();
    assert_eq!(total, data.len() as u64);
    assert_eq!(decoded, data);
}

#[test]
fn test_empty_stream_roundtrip() {
    let mut packed = Vec::new();
    compress_session()
        .compress(&mut &b""[..], &mut packed, Some(0))
        .unwrap();
    assert!(!packed.is_empty(), "even an empty frame has an envelope");

    let mut decoded = Vec::new();
    let total = decompress_session()
        .decompress(&mut &packed[..], &mut decoded)
        .unwrap();
    assert_eq!(total, 0);
    assert!(decoded.is_empty());
}

#[test]
fn test_concatenated_frames_decode_in_order() {
    // One session compresses two files back to back (the batch path); the
    // concatenated output decodes to the concatenated contents.
    let first = compressible_bytes(200_000);
    let second = compressible_bytes(77);
    let mut packed = Vec::new();

    let mut session = compress_session();
    session
        .compress(&mut &first[..], &mut packed, Some(first.len() as u64))
        .unwrap();
    session
        .compress(&mut &second[..], &mut packed, Some(second.len() as u64))
        .unwrap();

    let mut decoded = Vec::new();
    decompress_session()
        .decompress(&mut &packed[..], &mut decoded)
        .unwrap();

    let mut expected = first;
    expected.extend(second);
    assert_eq!(decoded, expected);
}

#[test]
fn test_block_frame_recognized_as_legacy() {
    // A block-container frame concatenated with an engine frame: the
    // decompress session dispatches each on its magic number.
    let block_content = compressible_bytes(50_000);
    let mut mixed = Vec::new();
    let mut writer = Writer::new(&mut mixed, codec_by_name("deflate").unwrap(), 5).unwrap();
    writer.write(&block_content).unwrap();
    writer.finish().unwrap();

    let stream_content = compressible_bytes(12_345);
    compress_session()
        .compress(
            &mut &stream_content[..],
            &mut mixed,
            Some(stream_content.len() as u64),
        )
        .unwrap();

    let mut decoded = Vec::new();
    decompress_session()
        .decompress(&mut &mixed[..], &mut decoded)
        .unwrap();

    let mut expected = block_content;
    expected.extend(stream_content);
    assert_eq!(decoded, expected);
}

#[test]
fn test_two_block_frames_concatenate() {
    let first = compressible_bytes(40_000);
    let second = compressible_bytes(999);
    let mut joined = Vec::new();

    for (content, codec) in [(&first, "zstd"), (&second, "lz4")] {
        let mut writer = Writer::new(&mut joined, codec_by_name(codec).unwrap(), 5).unwrap();
        writer.write(content).unwrap();
        writer.finish().unwrap();
    }

    let mut decoded = Vec::new();
    decompress_session()
        .decompress(&mut &joined[..], &mut decoded)
        .unwrap();

    let mut expected = first;
    expected.extend(second);
    assert_eq!(decoded, expected);
}

#[test]
fn test_dictionary_primed_roundtrip() {
    // A dictionary equal to the content gives the encoder plenty to
    // reference; the decoder must be primed with the same bytes.
    let dict: Vec<u8> = compressible_bytes(10_000);
    let data = compressible_bytes(10_000);

    let mut packed = Vec::new();
    CompressSession::new(Box::new(ZstdStreamEngine), 3, dict.clone())
        .compress(&mut &data[..], &mut packed, Some(data.len() as u64))
        .unwrap();

    let mut decoded = Vec::new();
    DecompressSession::new(Box::new(ZstdStreamEngine), dict, None)
        .decompress(&mut &packed[..], &mut decoded)
        .unwrap();
    assert_eq!(decoded, data);
}

#[test]
fn test_zero_bytes_is_clean_eof() {
    let mut decoded = Vec::new();
    let total = decompress_session()
        .decompress(&mut &b""[..], &mut decoded)
        .unwrap();
    assert_eq!(total, 0);
}

#[test]
fn test_short_magic_is_read_error() {
    let mut decoded = Vec::new();
    match decompress_session().decompress(&mut &[0x28u8, 0xB5][..], &mut decoded) {
        Err(Error::Read(_)) => {}
        other => panic!("expected read error, got {other:?}"),
    }
}

#[test]
fn test_unknown_magic_is_format_error() {
    let mut decoded = Vec::new();
    match decompress_session().decompress(&mut &[0xAAu8; 16][..], &mut decoded) {
        Err(Error::Format(_)) => {}
        other => panic!("expected format error, got {other:?}"),
    }
}

// ── dictionary loading ─────────────────────────────────────────────────────

#[test]
fn test_oversized_dictionary_keeps_last_512k() {
    let path = temp_path("dict_600k");
    let data: Vec<u8> = (0..600_000u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, &data).unwrap();

    let dict = load_dictionary(&path).unwrap();
    assert_eq!(dict.len() as u64, MAX_DICT_SIZE);
    assert_eq!(dict, data[600_000 - MAX_DICT_SIZE as usize..]);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_small_dictionary_loads_whole_file() {
    let path = temp_path("dict_small");
    let data = compressible_bytes(4096);
    std::fs::write(&path, &data).unwrap();

    let dict = load_dictionary(&path).unwrap();
    assert_eq!(dict, data);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_huge_dictionary_rejected_before_reading() {
    let path = temp_path("dict_2g");
    {
        let mut file = File::create(&path).unwrap();
        file.write_all(b"sparse").unwrap();
        // Sparse file: 2 GB of reported length, almost no disk behind it.
        file.set_len(2 * 1024 * 1024 * 1024).unwrap();
    }

    match load_dictionary(&path) {
        Err(Error::Allocation(_)) => {}
        other => panic!("expected allocation error, got {other:?}"),
    }

    let _ = std::fs::remove_file(&path);
}
