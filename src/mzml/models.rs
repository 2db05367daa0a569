//! Data models for imzML sections
//!
//! Each section keeps its CV parameters in a [`ParamGroup`]. Spectra are the only
//! sections annotated after loading (TIC memoization), so their parameters sit
//! behind an `RwLock` and can be updated through a shared reference.
//!
//! [`Section`] is a closed tagged union over the section kinds, with a statically
//! known child list per kind and the CV parameter rules each kind is checked against.

use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use serde::Serialize;

use crate::imzml::PixelLocation;
use crate::obo::{OboTermInclusion, Ontology};

use super::binary::{BinaryEncoding, CompressionType};
use super::cv_params::{CvParam, IMS_CV_ACCESSIONS, MS_CV_ACCESSIONS};
use super::param_group::ParamGroup;
use super::CvParamError;

/// The `<fileContent>` section of the file description
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileContent {
    /// CV parameters
    pub params: ParamGroup,
}

/// A named parameter group that other sections pull in by reference
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceableParamGroup {
    id: String,
    params: ParamGroup,
}

impl ReferenceableParamGroup {
    /// Create a group
    pub fn new(id: impl Into<String>, params: ParamGroup) -> Self {
        Self {
            id: id.into(),
            params,
        }
    }

    /// Group identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Group parameters
    pub fn params(&self) -> &ParamGroup {
        &self.params
    }
}

/// A software entry of the `<softwareList>`
#[derive(Debug, Clone, Default, Serialize)]
pub struct Software {
    /// Software identifier, e.g. `imzMLConverter`
    pub id: String,
    /// Version string
    pub version: String,
    /// CV parameters
    pub params: ParamGroup,
}

/// A `<scanSettings>` section, where image dimensions are declared
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSettings {
    /// Settings identifier
    pub id: String,
    /// CV parameters
    pub params: ParamGroup,
}

/// One `<scan>` of a spectrum, carrying the pixel position
#[derive(Debug, Clone, Default, Serialize)]
pub struct Scan {
    /// CV parameters
    pub params: ParamGroup,
}

/// Location and layout of one array stored in the payload file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExternalArrayRef {
    /// Byte offset in the payload file
    pub offset: u64,
    /// Number of bytes stored (after compression)
    pub encoded_length: u64,
    /// Declared number of values, if any
    pub array_length: Option<usize>,
    /// Element type
    #[serde(skip)]
    pub encoding: BinaryEncoding,
    /// Compression applied to the stored bytes
    #[serde(skip)]
    pub compression: CompressionType,
}

/// A `<binaryDataArray>` describing one array of a spectrum
#[derive(Debug, Clone, Default, Serialize)]
pub struct BinaryDataArray {
    /// CV parameters (usually mostly pulled in from a referenceable group)
    pub params: ParamGroup,
}

impl BinaryDataArray {
    /// Whether this is the m/z array
    pub fn is_mz_array(&self) -> bool {
        self.params.contains(MS_CV_ACCESSIONS::MZ_ARRAY)
    }

    /// Whether this is the intensity array
    pub fn is_intensity_array(&self) -> bool {
        self.params.contains(MS_CV_ACCESSIONS::INTENSITY_ARRAY)
    }

    /// Declared element type; 64-bit float when none is declared
    pub fn encoding(&self) -> BinaryEncoding {
        self.params
            .all()
            .into_iter()
            .find_map(|p| BinaryEncoding::from_cv_accession(p.accession()))
            .unwrap_or_default()
    }

    /// Declared compression; none when not declared
    pub fn compression(&self) -> CompressionType {
        self.params
            .all()
            .into_iter()
            .find_map(|p| CompressionType::from_cv_accession(p.accession()))
            .unwrap_or_default()
    }

    /// Where the array lives in the payload file
    ///
    /// `None` when no external offset and encoded length are declared.
    pub fn external_ref(&self) -> Result<Option<ExternalArrayRef>, CvParamError> {
        let (Some(offset), Some(encoded_length)) = (
            self.params.get(IMS_CV_ACCESSIONS::EXTERNAL_OFFSET),
            self.params.get(IMS_CV_ACCESSIONS::EXTERNAL_ENCODED_LENGTH),
        ) else {
            return Ok(None);
        };

        let array_length = match self.params.get(IMS_CV_ACCESSIONS::EXTERNAL_ARRAY_LENGTH) {
            Some(param) if !param.is_empty() => Some(non_negative(param)? as usize),
            _ => None,
        };

        Ok(Some(ExternalArrayRef {
            offset: non_negative(offset)?,
            encoded_length: non_negative(encoded_length)?,
            array_length,
            encoding: self.encoding(),
            compression: self.compression(),
        }))
    }
}

fn non_negative(param: &CvParam) -> Result<u64, CvParamError> {
    let value = param.as_long()?;
    u64::try_from(value).map_err(|_| CvParamError::InvalidValue {
        accession: param.accession().to_string(),
        value: param.as_string(),
        target: "non-negative integer".to_string(),
    })
}

/// One spectrum: a pixel's annotations, scans and array references
#[derive(Debug)]
pub struct Spectrum {
    /// Position in the spectrum list (0-based)
    pub index: usize,
    /// Native spectrum ID
    pub id: String,
    /// Declared default array length
    pub default_array_length: usize,
    /// Scans; the first one carries the pixel position
    pub scans: Vec<Scan>,
    /// Binary data arrays (m/z and intensity)
    pub binary_data_arrays: Vec<BinaryDataArray>,
    params: RwLock<ParamGroup>,
}

impl Spectrum {
    /// Create a spectrum without scans or arrays
    pub fn new(
        index: usize,
        id: impl Into<String>,
        default_array_length: usize,
        params: ParamGroup,
    ) -> Self {
        Self {
            index,
            id: id.into(),
            default_array_length,
            scans: Vec::new(),
            binary_data_arrays: Vec::new(),
            params: RwLock::new(params),
        }
    }

    /// Read access to the spectrum's own parameters
    pub fn params(&self) -> RwLockReadGuard<'_, ParamGroup> {
        self.params.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the parameter for `accession`
    pub fn param(&self, accession: &str) -> Option<CvParam> {
        self.params().get(accession).cloned()
    }

    /// Add a parameter, replacing one with the same accession
    pub fn add_param(&self, param: CvParam) -> Option<CvParam> {
        self.params
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(param)
    }

    /// Remove the parameter for `accession`
    pub fn remove_param(&self, accession: &str) -> Option<CvParam> {
        self.params
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(accession)
    }

    /// Pixel position declared on the first scan
    ///
    /// `z` defaults to 1 when absent. `Ok(None)` when there is no scan, x or y is
    /// not declared, or a coordinate is below 1.
    pub fn pixel_location(&self) -> Result<Option<PixelLocation>, CvParamError> {
        let Some(scan) = self.scans.first() else {
            return Ok(None);
        };
        let (Some(x), Some(y)) = (
            scan.params.get(IMS_CV_ACCESSIONS::POSITION_X),
            scan.params.get(IMS_CV_ACCESSIONS::POSITION_Y),
        ) else {
            return Ok(None);
        };
        let z = match scan.params.get(IMS_CV_ACCESSIONS::POSITION_Z) {
            Some(z) => z.as_long()?,
            None => 1,
        };
        Ok(PixelLocation::from_declared(x.as_long()?, y.as_long()?, z))
    }

    /// The m/z array description
    pub fn mz_array(&self) -> Option<&BinaryDataArray> {
        self.binary_data_arrays.iter().find(|a| a.is_mz_array())
    }

    /// The intensity array description
    pub fn intensity_array(&self) -> Option<&BinaryDataArray> {
        self.binary_data_arrays
            .iter()
            .find(|a| a.is_intensity_array())
    }

    /// Payload location of the m/z array
    pub fn mz_array_ref(&self) -> Result<Option<ExternalArrayRef>, CvParamError> {
        self.mz_array().map_or(Ok(None), BinaryDataArray::external_ref)
    }

    /// Payload location of the intensity array
    pub fn intensity_array_ref(&self) -> Result<Option<ExternalArrayRef>, CvParamError> {
        self.intensity_array()
            .map_or(Ok(None), BinaryDataArray::external_ref)
    }
}

impl Clone for Spectrum {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            id: self.id.clone(),
            default_array_length: self.default_array_length,
            scans: self.scans.clone(),
            binary_data_arrays: self.binary_data_arrays.clone(),
            params: RwLock::new(self.params().clone()),
        }
    }
}

/// A broken CV parameter rule on a section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RuleViolation {
    /// No parameter satisfies a required rule
    Missing {
        /// Section tag
        section: &'static str,
        /// Rule accession
        accession: String,
    },
    /// More than one parameter satisfies a rule that allows only one
    Repeated {
        /// Section tag
        section: &'static str,
        /// Rule accession
        accession: String,
        /// Number of matching parameters
        count: usize,
    },
}

impl std::fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleViolation::Missing { section, accession } => {
                write!(f, "<{}> is missing a parameter for {}", section, accession)
            }
            RuleViolation::Repeated {
                section,
                accession,
                count,
            } => write!(
                f,
                "<{}> has {} parameters for {}, only one allowed",
                section, count, accession
            ),
        }
    }
}

/// Any section of an imzML document
#[derive(Debug, Clone, Copy)]
pub enum Section<'a> {
    /// `<fileContent>`
    FileContent(&'a FileContent),
    /// `<referenceableParamGroup>`
    ReferenceableParamGroup(&'a ReferenceableParamGroup),
    /// `<software>`
    Software(&'a Software),
    /// `<scanSettings>`
    ScanSettings(&'a ScanSettings),
    /// `<spectrum>`
    Spectrum(&'a Spectrum),
    /// `<scan>`
    Scan(&'a Scan),
    /// `<binaryDataArray>`
    BinaryDataArray(&'a BinaryDataArray),
}

impl<'a> Section<'a> {
    /// XML tag name of the section
    pub fn tag_name(&self) -> &'static str {
        match self {
            Section::FileContent(_) => "fileContent",
            Section::ReferenceableParamGroup(_) => "referenceableParamGroup",
            Section::Software(_) => "software",
            Section::ScanSettings(_) => "scanSettings",
            Section::Spectrum(_) => "spectrum",
            Section::Scan(_) => "scan",
            Section::BinaryDataArray(_) => "binaryDataArray",
        }
    }

    /// Direct child sections
    pub fn children(&self) -> Vec<Section<'a>> {
        match self {
            Section::Spectrum(spectrum) => spectrum
                .scans
                .iter()
                .map(Section::Scan)
                .chain(spectrum.binary_data_arrays.iter().map(Section::BinaryDataArray))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Rules every instance of this section kind must satisfy
    pub fn required_params(&self) -> Vec<OboTermInclusion> {
        match self {
            Section::FileContent(_) => vec![
                OboTermInclusion::new(MS_CV_ACCESSIONS::DATA_FILE_CONTENT, false, true, false),
                OboTermInclusion::new(IMS_CV_ACCESSIONS::BINARY_TYPE, true, true, false),
                OboTermInclusion::new(IMS_CV_ACCESSIONS::IBD_CHECKSUM, true, true, false),
                OboTermInclusion::new(IMS_CV_ACCESSIONS::IBD_IDENTIFICATION, true, true, false),
            ],
            Section::ScanSettings(_) => vec![
                OboTermInclusion::new(IMS_CV_ACCESSIONS::MAX_COUNT_PIXEL_X, true, false, false),
                OboTermInclusion::new(IMS_CV_ACCESSIONS::MAX_COUNT_PIXEL_Y, true, false, false),
            ],
            Section::Scan(_) => vec![
                OboTermInclusion::new(IMS_CV_ACCESSIONS::POSITION_X, true, false, false),
                OboTermInclusion::new(IMS_CV_ACCESSIONS::POSITION_Y, true, false, false),
            ],
            Section::BinaryDataArray(_) => vec![
                OboTermInclusion::new(MS_CV_ACCESSIONS::BINARY_DATA_TYPE, true, true, false),
                OboTermInclusion::new(IMS_CV_ACCESSIONS::EXTERNAL_OFFSET, true, false, false),
                OboTermInclusion::new(IMS_CV_ACCESSIONS::EXTERNAL_ENCODED_LENGTH, true, false, false),
                OboTermInclusion::new(IMS_CV_ACCESSIONS::EXTERNAL_ARRAY_LENGTH, true, false, false),
            ],
            Section::ReferenceableParamGroup(_) | Section::Software(_) | Section::Spectrum(_) => {
                Vec::new()
            }
        }
    }

    /// Rules for parameters a section may carry
    pub fn optional_params(&self) -> Vec<OboTermInclusion> {
        match self {
            Section::FileContent(_) => vec![
                OboTermInclusion::new(MS_CV_ACCESSIONS::SPECTRUM_REPRESENTATION, true, true, false),
                OboTermInclusion::new(IMS_CV_ACCESSIONS::IBD_FILE, true, true, false),
            ],
            Section::ReferenceableParamGroup(_) => vec![
                OboTermInclusion::new("IMS:0000000", false, true, true),
                OboTermInclusion::new("MS:0000000", false, true, true),
            ],
            Section::Software(_) => {
                vec![OboTermInclusion::new(MS_CV_ACCESSIONS::SOFTWARE, false, true, true)]
            }
            Section::Spectrum(_) => vec![
                OboTermInclusion::new(MS_CV_ACCESSIONS::SPECTRUM_REPRESENTATION, true, true, false),
                OboTermInclusion::new(MS_CV_ACCESSIONS::TOTAL_ION_CURRENT, true, false, false),
                OboTermInclusion::new(MS_CV_ACCESSIONS::LOWEST_OBSERVED_MZ, true, false, false),
                OboTermInclusion::new(MS_CV_ACCESSIONS::HIGHEST_OBSERVED_MZ, true, false, false),
            ],
            Section::Scan(_) => vec![OboTermInclusion::new(
                IMS_CV_ACCESSIONS::POSITION_Z,
                true,
                false,
                false,
            )],
            Section::BinaryDataArray(_) => vec![OboTermInclusion::new(
                MS_CV_ACCESSIONS::COMPRESSION_TYPE,
                true,
                true,
                false,
            )],
            Section::ScanSettings(_) => Vec::new(),
        }
    }

    /// Check this section (not its children) against its rules
    pub fn violations(&self, ontology: &Ontology) -> Vec<RuleViolation> {
        let section = self.tag_name();
        let check = |params: &ParamGroup| {
            let mut out = Vec::new();
            for rule in self.required_params() {
                let count = params.count_matching(ontology, &rule);
                if count == 0 {
                    out.push(RuleViolation::Missing {
                        section,
                        accession: rule.accession().to_string(),
                    });
                } else if !rule.accepts_count(count) {
                    out.push(RuleViolation::Repeated {
                        section,
                        accession: rule.accession().to_string(),
                        count,
                    });
                }
            }
            for rule in self.optional_params() {
                let count = params.count_matching(ontology, &rule);
                if !rule.accepts_count(count) {
                    out.push(RuleViolation::Repeated {
                        section,
                        accession: rule.accession().to_string(),
                        count,
                    });
                }
            }
            out
        };

        match self {
            Section::FileContent(s) => check(&s.params),
            Section::ReferenceableParamGroup(s) => check(s.params()),
            Section::Software(s) => check(&s.params),
            Section::ScanSettings(s) => check(&s.params),
            Section::Spectrum(s) => check(&*s.params()),
            Section::Scan(s) => check(&s.params),
            Section::BinaryDataArray(s) => check(&s.params),
        }
    }
}
