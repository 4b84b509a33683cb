//! Container-framing probe. A schematic blob may be wrapped in gzip, wrapped
//! in raw zlib (RFC 1950), or be the tagged-binary tree itself. All three
//! show up in the wild depending on which tool produced the file.

use std::io::Read;

use flate2::read::{GzDecoder, ZlibDecoder};

/// Probe `bytes` for gzip then zlib framing and return the inner payload.
/// Never fails: if neither framing applies, the input is returned unchanged
/// under the assumption that it is already an unwrapped tag tree.
pub fn decompress(bytes: &[u8]) -> Vec<u8> {
    let mut gz_out = Vec::new();
    if GzDecoder::new(bytes).read_to_end(&mut gz_out).is_ok() && !gz_out.is_empty() {
        log::debug!("decompress: gzip framing detected ({} bytes)", gz_out.len());
        return gz_out;
    }

    let mut zlib_out = Vec::new();
    if ZlibDecoder::new(bytes).read_to_end(&mut zlib_out).is_ok() && !zlib_out.is_empty() {
        log::debug!("decompress: zlib framing detected ({} bytes)", zlib_out.len());
        return zlib_out;
    }

    log::debug!("decompress: no recognised framing, treating input as raw");
    bytes.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{GzEncoder, ZlibEncoder};
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn round_trips_gzip() {
        let original = b"hello tagged binary tree";
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(original).unwrap();
        let compressed = enc.finish().unwrap();
        assert_eq!(decompress(&compressed), original);
    }

    #[test]
    fn round_trips_zlib() {
        let original = b"another payload entirely";
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(original).unwrap();
        let compressed = enc.finish().unwrap();
        assert_eq!(decompress(&compressed), original);
    }

    #[test]
    fn passes_through_uncompressed() {
        let original = b"\x0a\x00\x00\x00";
        assert_eq!(decompress(original), original);
    }
}
