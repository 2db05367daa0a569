//! # imzML - Mass Spectrometry Imaging Data Access
//!
//! `imzml` reads imzML datasets and exposes them as images: every spectrum is
//! tied to a pixel, and the binary arrays are fetched from the `.ibd` payload
//! only when they are asked for.
//!
//! ## Key Features
//!
//! - **Ontology-backed parameters**: every cvParam is bound to a term of the
//!   bundled imaging MS ontology (with its PSI-MS and unit ontology imports); the
//!   term's value type decides how the value is parsed.
//!
//! - **Section rules**: each section declares which terms it requires or allows,
//!   checked through the ontology's is-a/part-of hierarchy.
//!
//! - **Lazy imaging view**: dimensions, the spatial index, the total ion current
//!   image and the m/z axes are computed on first use and cached, at most once
//!   even with concurrent callers.
//!
//! - **Payload integrity**: streamed MD5/SHA-1/SHA-256 digests of the payload
//!   compared against the checksum declared in the document.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imzml::reader::ImzMLReader;
//!
//! let imzml = ImzMLReader::open("sample.imzML")?.read()?;
//!
//! println!("{} x {} pixels", imzml.width()?, imzml.height()?);
//! let tic = imzml.generate_tic_image()?;
//! println!("TIC at (1, 1): {}", tic[0][0]);
//!
//! if imzml.verify_ibd_checksum()? == Some(false) {
//!     eprintln!("payload does not match its declared checksum");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`obo`]: OBO ontology loading, term hierarchy and inclusion rules
//! - [`mzml`]: typed CV parameters, parameter groups, section models and binary
//!   array decoding shared with mzML
//! - [`imzml`]: the imaging document, payload file access and checksums
//! - [`reader`]: streaming imzML metadata reader

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod imzml;
pub mod mzml;
pub mod obo;
pub mod reader;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::imzml::{
        checksum, ChecksumAlgorithm, ChecksumError, IbdFile, Image, ImzML, ImzMLError,
        PixelLocation,
    };
    pub use crate::mzml::{
        BinaryDataArray, BinaryEncoding, CompressionType, CvParam, CvParamError, CvValue,
        FileContent, ParamGroup, ReferenceableParamGroup, RuleViolation, Scan, ScanSettings,
        Section, Software, Spectrum, IMS_CV_ACCESSIONS, MS_CV_ACCESSIONS,
    };
    pub use crate::obo::{OboError, OboTerm, OboTermInclusion, Ontology, ValueType};
    pub use crate::reader::{read_imzml, ImzMLReader, ReaderConfig, ReaderError};
}
