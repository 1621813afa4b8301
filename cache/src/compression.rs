//! Deflate/zlib payload compression (§4.4 Compression). Entries written
//! compressed and uncompressed coexist in the same cache; the zlib magic
//! byte `0x78` disambiguates them on read.

use std::io::{self, Read, Write};

use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};

const ZLIB_MAGIC_BYTE: u8 = 0x78;

pub fn should_compress(threshold: Option<u64>, payload_len: usize) -> bool {
    match threshold {
        None => false,
        Some(0) => true,
        Some(n) => payload_len as u64 >= n,
    }
}

pub fn compress(payload: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload)?;
    encoder.finish()
}

/// Inflates `bytes` if it looks like a zlib stream, otherwise returns it
/// unchanged. This is what lets compressed and plain entries coexist.
pub fn maybe_decompress(bytes: Vec<u8>) -> io::Result<Vec<u8>> {
    if bytes.first() != Some(&ZLIB_MAGIC_BYTE) {
        return Ok(bytes);
    }

    let mut decoder = ZlibDecoder::new(bytes.as_slice());
    let mut out = Vec::new();
    match decoder.read_to_end(&mut out) {
        Ok(_) => Ok(out),
        Err(_) => Ok(bytes),
    }
}
