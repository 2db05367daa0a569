use std::path::PathBuf;

use crate::mzml::{BinaryDecodeError, CvParamError};

/// Errors raised while computing a file checksum
#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    /// Algorithm name not recognized
    #[error("Unknown checksum algorithm: {0}")]
    UnknownAlgorithm(String),

    /// File could not be opened
    #[error("Could not open {path}: {source}")]
    Open {
        /// File being hashed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Reading failed part way through
    #[error("Failed generating {algorithm} hash of {path}: {source}")]
    Read {
        /// File being hashed
        path: PathBuf,
        /// Algorithm name
        algorithm: String,
        /// Underlying error
        source: std::io::Error,
    },
}

/// Errors raised by document-level operations
#[derive(Debug, thiserror::Error)]
pub enum ImzMLError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A byte range of the payload file could not be read
    #[error("Failed to read {length} bytes at offset {offset} from {path}: {source}")]
    PayloadRead {
        /// Payload file
        path: PathBuf,
        /// Requested offset
        offset: u64,
        /// Requested length
        length: u64,
        /// Underlying error
        source: std::io::Error,
    },

    /// The document has no payload file attached
    #[error("No binary payload file attached to the document")]
    NoPayload,

    /// Array bytes could not be decoded
    #[error("Binary decode error: {0}")]
    Decode(#[from] BinaryDecodeError),

    /// A CV parameter value could not be interpreted
    #[error("CV parameter error: {0}")]
    CvParam(#[from] CvParamError),

    /// Checksum computation failed
    #[error("Checksum error: {0}")]
    Checksum(#[from] ChecksumError),
}
