//! Binary data decoding for imzML
//!
//! imzML keeps numerical arrays (m/z, intensity) outside the XML, in the companion
//! `.ibd` file. Each array is located by an external offset and encoded length and
//! described by CV parameters giving its element type and compression. Decoding is:
//!
//! 1. Decompress if needed (zlib)
//! 2. Interpret bytes as 32/64-bit floats or integers (little-endian)

use std::io::Read;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use flate2::read::ZlibDecoder;

use super::cv_params::{IMS_CV_ACCESSIONS, MS_CV_ACCESSIONS};

/// How an array is packed in the payload
///
/// Numpress schemes are recognised so that they can be reported, but only raw
/// and zlib arrays are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionType {
    /// Stored as-is (MS:1000576)
    #[default]
    None,
    /// zlib stream (MS:1000574)
    Zlib,
    /// Numpress linear (MS:1002312)
    NumpressLinear,
    /// Numpress pic (MS:1002313)
    NumpressPic,
    /// Numpress slof (MS:1002314)
    NumpressSlof,
}

impl CompressionType {
    /// Compression named by a term, if it is one
    pub fn from_cv_accession(accession: &str) -> Option<Self> {
        match accession {
            MS_CV_ACCESSIONS::ZLIB_COMPRESSION => Some(CompressionType::Zlib),
            MS_CV_ACCESSIONS::NO_COMPRESSION => Some(CompressionType::None),
            MS_CV_ACCESSIONS::NUMPRESS_LINEAR => Some(CompressionType::NumpressLinear),
            MS_CV_ACCESSIONS::NUMPRESS_PIC => Some(CompressionType::NumpressPic),
            MS_CV_ACCESSIONS::NUMPRESS_SLOF => Some(CompressionType::NumpressSlof),
            _ => None,
        }
    }
}

/// Element type of a binary array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinaryEncoding {
    /// IEEE-754 single (MS:1000521)
    Float32,
    /// IEEE-754 double (MS:1000523), assumed when no type term is present
    #[default]
    Float64,
    /// 32-bit signed integer (CV: MS:1000519, IMS:1000141)
    Int32,
    /// 64-bit signed integer (CV: MS:1000522, IMS:1000142)
    Int64,
}

impl BinaryEncoding {
    /// Element type named by a term; imaging and PSI-MS integer terms both map
    pub fn from_cv_accession(accession: &str) -> Option<Self> {
        match accession {
            MS_CV_ACCESSIONS::FLOAT_32_BIT => Some(BinaryEncoding::Float32),
            MS_CV_ACCESSIONS::FLOAT_64_BIT => Some(BinaryEncoding::Float64),
            MS_CV_ACCESSIONS::INTEGER_32_BIT | IMS_CV_ACCESSIONS::INTEGER_32_BIT => {
                Some(BinaryEncoding::Int32)
            }
            MS_CV_ACCESSIONS::INTEGER_64_BIT | IMS_CV_ACCESSIONS::INTEGER_64_BIT => {
                Some(BinaryEncoding::Int64)
            }
            _ => None,
        }
    }

    /// Width of one element in bytes
    pub fn byte_size(&self) -> usize {
        match self {
            BinaryEncoding::Float32 | BinaryEncoding::Int32 => 4,
            BinaryEncoding::Float64 | BinaryEncoding::Int64 => 8,
        }
    }
}

/// Failure to turn payload bytes into values
#[derive(Debug, thiserror::Error)]
pub enum BinaryDecodeError {
    /// zlib stream could not be inflated
    #[error("Decompression error: {0}")]
    DecompressionError(#[from] std::io::Error),

    /// Byte count does not fit the element type or the declared length
    #[error("Invalid data length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected size
        expected: usize,
        /// Actual size
        actual: usize,
    },

    /// Compression scheme not implemented
    #[error("Unsupported compression: {0:?}")]
    UnsupportedCompression(CompressionType),
}

/// Decoder for raw binary arrays read from the payload file
pub struct BinaryDecoder;

impl BinaryDecoder {
    /// Inflate (if needed) and widen a little-endian array to `f64`
    ///
    /// `expected_length` is the declared element count; a mismatch after
    /// decompression is an error rather than a silently short array.
    pub fn decode(
        bytes: &[u8],
        encoding: BinaryEncoding,
        compression: CompressionType,
        expected_length: Option<usize>,
    ) -> Result<Vec<f64>, BinaryDecodeError> {
        if bytes.is_empty() {
            return Ok(Vec::new());
        }

        let uncompressed;
        let raw = match compression {
            CompressionType::None => bytes,
            CompressionType::Zlib => {
                let mut decoder = ZlibDecoder::new(bytes);
                let mut buffer = Vec::new();
                decoder.read_to_end(&mut buffer)?;
                uncompressed = buffer;
                &uncompressed[..]
            }
            CompressionType::NumpressLinear
            | CompressionType::NumpressPic
            | CompressionType::NumpressSlof => {
                return Err(BinaryDecodeError::UnsupportedCompression(compression));
            }
        };

        let values = Self::bytes_to_values::<LittleEndian>(raw, encoding)?;

        if let Some(expected) = expected_length {
            if values.len() != expected {
                return Err(BinaryDecodeError::InvalidLength {
                    expected,
                    actual: values.len(),
                });
            }
        }

        Ok(values)
    }

    /// Decode consecutive big-endian IEEE-754 doubles
    ///
    /// The converter tool that records a full m/z axis writes it in network
    /// (big-endian) byte order. Trailing bytes short of a full value are
    /// ignored.
    pub fn decode_f64_big_endian(bytes: &[u8]) -> Vec<f64> {
        bytes.chunks_exact(8).map(BigEndian::read_f64).collect()
    }

    fn bytes_to_values<B: ByteOrder>(
        bytes: &[u8],
        encoding: BinaryEncoding,
    ) -> Result<Vec<f64>, BinaryDecodeError> {
        let byte_size = encoding.byte_size();

        if bytes.len() % byte_size != 0 {
            return Err(BinaryDecodeError::InvalidLength {
                expected: bytes.len() / byte_size * byte_size,
                actual: bytes.len(),
            });
        }

        let chunks = bytes.chunks_exact(byte_size);
        let values = match encoding {
            BinaryEncoding::Float32 => chunks.map(|c| f64::from(B::read_f32(c))).collect(),
            BinaryEncoding::Float64 => chunks.map(B::read_f64).collect(),
            BinaryEncoding::Int32 => chunks.map(|c| f64::from(B::read_i32(c))).collect(),
            BinaryEncoding::Int64 => chunks.map(|c| B::read_i64(c) as f64).collect(),
        };

        Ok(values)
    }
}
