//! # mzML Data Model
//!
//! imzML is mzML with imaging annotations: the metadata document uses mzML's
//! sections and CV parameters, and the numerical arrays move to an external
//! `.ibd` payload. This module holds the parts shared with mzML: typed CV
//! parameters, parameter groups, the section models and binary array decoding.
//!
//! ## Structure covered
//!
//! ```text
//! mzML
//! ├── fileDescription
//! │   └── fileContent
//! ├── referenceableParamGroupList
//! │   └── referenceableParamGroup*
//! ├── softwareList
//! │   └── software*
//! ├── scanSettingsList
//! │   └── scanSettings*
//! └── run
//!     └── spectrumList
//!         └── spectrum*
//!             ├── cvParam*
//!             ├── scanList
//!             │   └── scan* (pixel position)
//!             └── binaryDataArrayList
//!                 └── binaryDataArray* (external offset / length)
//! ```

mod binary;
mod cv_params;
mod error;
mod models;
mod param_group;

pub use binary::{BinaryDecodeError, BinaryDecoder, BinaryEncoding, CompressionType};
pub use cv_params::{CvParam, CvValue, IMS_CV_ACCESSIONS, MS_CV_ACCESSIONS};
pub use error::CvParamError;
pub use models::*;
pub use param_group::ParamGroup;
