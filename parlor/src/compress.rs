use std::io::Read;

use flate2::read::{GzDecoder, GzEncoder, ZlibDecoder, ZlibEncoder};
use flate2::Compression;
use shared::{Error, Result};

/// Fixed allow-list of payload codecs. The wire carries the codec as a free
/// string; anything outside this set is rejected before a decoder runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Gzip,
    Zlib,
    Zstd,
    Lzma,
}

impl Algorithm {
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "gzip" => Ok(Algorithm::Gzip),
            "zlib" => Ok(Algorithm::Zlib),
            "zstd" => Ok(Algorithm::Zstd),
            "lzma" => Ok(Algorithm::Lzma),
            other => Err(Error::UnsupportedAlgorithm(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Gzip => "gzip",
            Algorithm::Zlib => "zlib",
            Algorithm::Zstd => "zstd",
            Algorithm::Lzma => "lzma",
        }
    }
}

pub fn decompress(algorithm: Algorithm, data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let result = match algorithm {
        Algorithm::Gzip => GzDecoder::new(data).read_to_end(&mut out).map(|_| ()),
        Algorithm::Zlib => ZlibDecoder::new(data).read_to_end(&mut out).map(|_| ()),
        Algorithm::Zstd => zstd::stream::decode_all(data).map(|v| {
            out = v;
        }),
        Algorithm::Lzma => xz2::read::XzDecoder::new(data)
            .read_to_end(&mut out)
            .map(|_| ()),
    };
    result.map_err(|_| Error::DecompressionFailure)?;
    Ok(out)
}

/// Client-side counterpart of [`decompress`]; used by tests and tooling.
pub fn compress(algorithm: Algorithm, data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let result = match algorithm {
        Algorithm::Gzip => GzEncoder::new(data, Compression::default())
            .read_to_end(&mut out)
            .map(|_| ()),
        Algorithm::Zlib => ZlibEncoder::new(data, Compression::default())
            .read_to_end(&mut out)
            .map(|_| ()),
        Algorithm::Zstd => zstd::stream::encode_all(data, 0).map(|v| {
            out = v;
        }),
        Algorithm::Lzma => xz2::read::XzEncoder::new(data, 6)
            .read_to_end(&mut out)
            .map(|_| ()),
    };
    result.map_err(|e| Error::Internal(format!("compress: {e}")))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_name_is_unsupported() {
        assert!(matches!(
            Algorithm::from_name("br"),
            Err(Error::UnsupportedAlgorithm(_))
        ));
        assert!(matches!(
            Algorithm::from_name("GZIP"),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn gzip_round_trip() {
        let packed = compress(Algorithm::Gzip, b"hello hello hello").unwrap();
        assert_eq!(
            decompress(Algorithm::Gzip, &packed).unwrap(),
            b"hello hello hello"
        );
    }

    #[test]
    fn zstd_round_trip() {
        let packed = compress(Algorithm::Zstd, b"payload bytes").unwrap();
        assert_eq!(decompress(Algorithm::Zstd, &packed).unwrap(), b"payload bytes");
    }

    #[test]
    fn corrupt_input_is_a_decompression_failure() {
        for algorithm in [
            Algorithm::Gzip,
            Algorithm::Zlib,
            Algorithm::Zstd,
            Algorithm::Lzma,
        ] {
            assert!(
                matches!(
                    decompress(algorithm, b"\x00\x01garbage"),
                    Err(Error::DecompressionFailure)
                ),
                "{} accepted garbage",
                algorithm.name()
            );
        }
    }
}
