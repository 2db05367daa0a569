//! # imzML Document
//!
//! An imzML dataset is a metadata document plus a binary payload (`.ibd`). The
//! metadata declares the image size, one spectrum per acquired pixel, and for each
//! spectrum the offset and length of its m/z and intensity arrays in the payload.
//!
//! [`ImzML`] holds the parsed sections and derives the imaging view from them:
//!
//! - image dimensions and dimensionality
//! - a spatial index from pixel coordinate to spectrum
//! - the total ion current image
//! - the full and binned m/z axes
//! - payload checksums
//!
//! Every derived value is computed on first use and cached for the lifetime of the
//! document. Caches are built at most once even with concurrent callers; a build
//! that fails caches nothing.
//!
//! ## Example
//!
//! ```rust,no_run
//! use imzml::reader::ImzMLReader;
//!
//! let imzml = ImzMLReader::open("example.imzML")?.read()?;
//!
//! println!("{} x {} pixels", imzml.width()?, imzml.height()?);
//! if let Some(spectrum) = imzml.spectrum(1, 1)? {
//!     let intensities = imzml.intensity_array(spectrum)?;
//!     println!("{:?}", intensities.map(|v| v.len()));
//! }
//! let tic = imzml.generate_tic_image()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod checksum;
mod error;
mod ibd;
mod pixel;


use std::fmt;
use std::path::Path;
use std::sync::Arc;

use log::{debug, warn};
use once_cell::sync::OnceCell;
use serde::Serialize;

pub use checksum::{
    checksum, checksum_with, checksum_with_chunk_size, ChecksumAlgorithm, CHECKSUM_CHUNK_SIZE,
};
pub use error::{ChecksumError, ImzMLError};
pub use ibd::IbdFile;
pub use pixel::PixelLocation;

use crate::mzml::{
    BinaryDecoder, CvParam, ExternalArrayRef, FileContent, ReferenceableParamGroup,
    RuleViolation, ScanSettings, Section, Software, Spectrum, IMS_CV_ACCESSIONS,
    MS_CV_ACCESSIONS,
};
use crate::obo::Ontology;

/// Software id under which a converter records the shared m/z axis of a dataset
pub const IMZML_CONVERTER_ID: &str = "imzMLConverter";

/// A TIC image, indexed `[y - 1][x - 1]`
pub type Image = Vec<Vec<f64>>;

/// Dense width x height x depth index of spectrum positions
#[derive(Debug)]
struct SpectrumGrid {
    width: u32,
    height: u32,
    depth: u32,
    cells: Vec<Option<usize>>,
}

impl SpectrumGrid {
    fn cell(&self, location: &PixelLocation) -> Option<usize> {
        if !location.within(self.width, self.height, self.depth) {
            return None;
        }
        let (x, y, z) = (
            (location.x - 1) as usize,
            (location.y - 1) as usize,
            (location.z - 1) as usize,
        );
        let (width, height) = (self.width as usize, self.height as usize);
        Some(x + width * (y + height * z))
    }
}

/// Report-friendly overview of a document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    /// Number of spectra
    pub spectrum_count: usize,
    /// Declared image width (0 when undeclared)
    pub width: u32,
    /// Declared image height (0 when undeclared)
    pub height: u32,
    /// Inferred image depth
    pub depth: u32,
    /// Number of spatial dimensions larger than one pixel
    pub spatial_dimensionality: usize,
    /// m/z axis + spatial dimensions + stacked spectra
    pub dimensionality: usize,
    /// Spectra sharing the first spectrum's pixel
    pub spectra_per_pixel: usize,
    /// `continuous`, `processed` or `unknown`
    pub binary_type: String,
    /// Lowest declared m/z
    pub min_mz: Option<f64>,
    /// Highest declared m/z
    pub max_mz: Option<f64>,
    /// Payload file path
    pub ibd_path: Option<String>,
    /// Software identifiers
    pub software: Vec<String>,
}

/// An imzML document with its payload file
///
/// Built by [`ImzMLReader`](crate::reader::ImzMLReader) or assembled by hand.
/// Adding sections clears every derived cache.
pub struct ImzML {
    ontology: Arc<Ontology>,
    file_content: FileContent,
    referenceable_param_groups: Vec<Arc<ReferenceableParamGroup>>,
    software: Vec<Software>,
    scan_settings: Vec<ScanSettings>,
    spectra: Vec<Spectrum>,
    ibd: Option<IbdFile>,

    width: OnceCell<u32>,
    height: OnceCell<u32>,
    depth: OnceCell<u32>,
    pixel_locations: OnceCell<Vec<Option<PixelLocation>>>,
    grid: OnceCell<SpectrumGrid>,
    tic_image: OnceCell<Image>,
    full_mz_axis: OnceCell<Option<Vec<f64>>>,
    min_mz: OnceCell<Option<f64>>,
    max_mz: OnceCell<Option<f64>>,
}

impl ImzML {
    /// Empty document whose parameters come from `ontology`
    pub fn new(ontology: Arc<Ontology>) -> Self {
        Self {
            ontology,
            file_content: FileContent::default(),
            referenceable_param_groups: Vec::new(),
            software: Vec::new(),
            scan_settings: Vec::new(),
            spectra: Vec::new(),
            ibd: None,
            width: OnceCell::new(),
            height: OnceCell::new(),
            depth: OnceCell::new(),
            pixel_locations: OnceCell::new(),
            grid: OnceCell::new(),
            tic_image: OnceCell::new(),
            full_mz_axis: OnceCell::new(),
            min_mz: OnceCell::new(),
            max_mz: OnceCell::new(),
        }
    }

    fn invalidate(&mut self) {
        self.width.take();
        self.height.take();
        self.depth.take();
        self.pixel_locations.take();
        self.grid.take();
        self.tic_image.take();
        self.full_mz_axis.take();
        self.min_mz.take();
        self.max_mz.take();
    }

    // =========================================================================
    // Assembly
    // =========================================================================

    /// Replace the file content section
    pub fn set_file_content(&mut self, file_content: FileContent) {
        self.file_content = file_content;
        self.invalidate();
    }

    /// Register a referenceable parameter group
    pub fn add_referenceable_param_group(&mut self, group: Arc<ReferenceableParamGroup>) {
        self.referenceable_param_groups.push(group);
    }

    /// Add a software entry
    pub fn add_software(&mut self, software: Software) {
        self.software.push(software);
        self.invalidate();
    }

    /// Add a scan settings section
    pub fn add_scan_settings(&mut self, scan_settings: ScanSettings) {
        self.scan_settings.push(scan_settings);
        self.invalidate();
    }

    /// Append a spectrum; its index is set to its position in the list
    pub fn add_spectrum(&mut self, mut spectrum: Spectrum) {
        spectrum.index = self.spectra.len();
        self.spectra.push(spectrum);
        self.invalidate();
    }

    /// Attach an opened payload file
    pub fn set_ibd(&mut self, ibd: IbdFile) {
        self.ibd = Some(ibd);
        self.invalidate();
    }

    /// Open and attach the payload file at `path`
    pub fn open_ibd<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ImzMLError> {
        self.set_ibd(IbdFile::open(path)?);
        Ok(())
    }

    // =========================================================================
    // Sections
    // =========================================================================

    /// Ontology the document's parameters are bound to
    pub fn ontology(&self) -> &Arc<Ontology> {
        &self.ontology
    }

    /// File content section
    pub fn file_content(&self) -> &FileContent {
        &self.file_content
    }

    /// Referenceable parameter groups
    pub fn referenceable_param_groups(&self) -> &[Arc<ReferenceableParamGroup>] {
        &self.referenceable_param_groups
    }

    /// Software entries
    pub fn software_list(&self) -> &[Software] {
        &self.software
    }

    /// Software entry by id
    pub fn software(&self, id: &str) -> Option<&Software> {
        self.software.iter().find(|s| s.id == id)
    }

    /// Scan settings sections
    pub fn scan_settings(&self) -> &[ScanSettings] {
        &self.scan_settings
    }

    /// Spectra in document order
    pub fn spectra(&self) -> &[Spectrum] {
        &self.spectra
    }

    /// Attached payload file
    pub fn ibd(&self) -> Option<&IbdFile> {
        self.ibd.as_ref()
    }

    /// Path of the attached payload file
    pub fn ibd_path(&self) -> Option<&Path> {
        self.ibd.as_ref().map(IbdFile::path)
    }

    fn payload(&self) -> Result<&IbdFile, ImzMLError> {
        self.ibd.as_ref().ok_or(ImzMLError::NoPayload)
    }

    /// Top-level sections, in document order
    pub fn sections(&self) -> Vec<Section<'_>> {
        let mut sections = vec![Section::FileContent(&self.file_content)];
        sections.extend(
            self.referenceable_param_groups
                .iter()
                .map(|g| Section::ReferenceableParamGroup(g)),
        );
        sections.extend(self.software.iter().map(Section::Software));
        sections.extend(self.scan_settings.iter().map(Section::ScanSettings));
        sections.extend(self.spectra.iter().map(Section::Spectrum));
        sections
    }

    /// Check every section and its children against their CV parameter rules
    pub fn validate(&self) -> Vec<RuleViolation> {
        let mut violations = Vec::new();
        let mut stack = self.sections();
        stack.reverse();
        while let Some(section) = stack.pop() {
            violations.extend(section.violations(&self.ontology));
            stack.extend(section.children().into_iter().rev());
        }
        violations
    }

    /// Whether the payload stores one m/z array per spectrum
    pub fn is_processed(&self) -> bool {
        self.file_content
            .params
            .contains(IMS_CV_ACCESSIONS::BINARY_TYPE_PROCESSED)
    }

    /// Whether all spectra share one m/z array
    pub fn is_continuous(&self) -> bool {
        self.file_content
            .params
            .contains(IMS_CV_ACCESSIONS::BINARY_TYPE_CONTINUOUS)
    }

    // =========================================================================
    // Dimensions
    // =========================================================================

    fn declared_pixel_count(&self, accession: &str) -> Result<u32, ImzMLError> {
        let mut count = 0;
        for settings in &self.scan_settings {
            if let Some(param) = settings.params.get(accession) {
                let value = param.as_integer()?;
                count = u32::try_from(value).unwrap_or_else(|_| {
                    warn!("Ignoring negative {} = {}", param.name(), value);
                    0
                });
            }
        }
        Ok(count)
    }

    /// Image width from the scan settings; 0 when undeclared
    pub fn width(&self) -> Result<u32, ImzMLError> {
        self.width
            .get_or_try_init(|| self.declared_pixel_count(IMS_CV_ACCESSIONS::MAX_COUNT_PIXEL_X))
            .copied()
    }

    /// Image height from the scan settings; 0 when undeclared
    pub fn height(&self) -> Result<u32, ImzMLError> {
        self.height
            .get_or_try_init(|| self.declared_pixel_count(IMS_CV_ACCESSIONS::MAX_COUNT_PIXEL_Y))
            .copied()
    }

    /// Image depth: 1, or the largest z position declared by any spectrum
    pub fn depth(&self) -> Result<u32, ImzMLError> {
        self.depth.get_or_try_init(|| self.inferred_depth()).copied()
    }

    fn inferred_depth(&self) -> Result<u32, ImzMLError> {
        let mut depth = 1u32;
        for spectrum in &self.spectra {
            let z = spectrum
                .scans
                .first()
                .and_then(|scan| scan.params.get(IMS_CV_ACCESSIONS::POSITION_Z));
            if let Some(z) = z {
                let z = z.as_long()?;
                if z > i64::from(depth) {
                    depth = u32::try_from(z).unwrap_or(u32::MAX);
                }
            }
        }
        Ok(depth)
    }

    /// Number of width/height/depth larger than one
    pub fn spatial_dimensionality(&self) -> Result<usize, ImzMLError> {
        Ok([self.width()?, self.height()?, self.depth()?]
            .iter()
            .filter(|d| **d > 1)
            .count())
    }

    /// 1 (m/z) + spatial dimensionality, + 1 when the first two spectra share a pixel
    pub fn dimensionality(&self) -> Result<usize, ImzMLError> {
        let mut dimensionality = 1 + self.spatial_dimensionality()?;
        if let [Some(first), Some(second), ..] = self.pixel_locations()? {
            if first == second {
                dimensionality += 1;
            }
        }
        Ok(dimensionality)
    }

    /// Number of spectra at the first spectrum's pixel; 0 for an empty document
    pub fn number_of_spectra_per_pixel(&self) -> Result<usize, ImzMLError> {
        let locations = self.pixel_locations()?;
        Ok(match locations.first() {
            Some(first) => locations.iter().filter(|l| *l == first).count(),
            None => 0,
        })
    }

    /// Declared pixel location of every spectrum, in document order
    pub fn pixel_locations(&self) -> Result<&[Option<PixelLocation>], ImzMLError> {
        self.pixel_locations
            .get_or_try_init(|| {
                self.spectra
                    .iter()
                    .map(|s| s.pixel_location().map_err(ImzMLError::from))
                    .collect()
            })
            .map(Vec::as_slice)
    }

    // =========================================================================
    // Spatial lookup
    // =========================================================================

    fn grid(&self) -> Result<&SpectrumGrid, ImzMLError> {
        self.grid.get_or_try_init(|| self.build_grid())
    }

    fn build_grid(&self) -> Result<SpectrumGrid, ImzMLError> {
        let (width, height, depth) = (self.width()?, self.height()?, self.depth()?);
        let size = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(depth as usize))
            .ok_or_else(|| {
                ImzMLError::Io(std::io::Error::new(
                    std::io::ErrorKind::OutOfMemory,
                    format!("{width} x {height} x {depth} grid does not fit in memory"),
                ))
            })?;

        let mut grid = SpectrumGrid {
            width,
            height,
            depth,
            cells: vec![None; size],
        };
        for (index, location) in self.pixel_locations()?.iter().enumerate() {
            let id = &self.spectra[index].id;
            match location {
                Some(location) => match grid.cell(location) {
                    Some(cell) => grid.cells[cell] = Some(index),
                    None => warn!(
                        "Spectrum {} at {} lies outside the {} x {} x {} image, skipped",
                        id, location, width, height, depth
                    ),
                },
                None => warn!("Spectrum {} has no valid position, skipped", id),
            }
        }
        debug!("Built {} x {} x {} spectrum grid", width, height, depth);
        Ok(grid)
    }

    /// Spectrum at pixel (x, y) of the first slice
    pub fn spectrum(&self, x: u32, y: u32) -> Result<Option<&Spectrum>, ImzMLError> {
        self.spectrum_3d(x, y, 1)
    }

    /// Spectrum at pixel (x, y, z)
    ///
    /// Coordinates are 1-based and bounds inclusive. Anything outside the image,
    /// or a pixel without a spectrum, gives `Ok(None)`.
    pub fn spectrum_3d(&self, x: u32, y: u32, z: u32) -> Result<Option<&Spectrum>, ImzMLError> {
        let grid = self.grid()?;
        Ok(grid
            .cell(&PixelLocation::new(x, y, z))
            .and_then(|cell| grid.cells[cell])
            .map(|index| &self.spectra[index]))
    }

    // =========================================================================
    // Arrays
    // =========================================================================

    fn decode_array(
        &self,
        array: Option<ExternalArrayRef>,
    ) -> Result<Option<Vec<f64>>, ImzMLError> {
        let Some(array) = array else {
            return Ok(None);
        };
        let bytes = self.payload()?.read(array.offset, array.encoded_length)?;
        let values = BinaryDecoder::decode(
            &bytes,
            array.encoding,
            array.compression,
            array.array_length,
        )?;
        Ok(Some(values))
    }

    /// Decoded m/z array of `spectrum`; `None` when it has no payload reference
    pub fn mz_array(&self, spectrum: &Spectrum) -> Result<Option<Vec<f64>>, ImzMLError> {
        self.decode_array(spectrum.mz_array_ref()?)
    }

    /// Decoded intensity array of `spectrum`; `None` when it has no payload reference
    pub fn intensity_array(&self, spectrum: &Spectrum) -> Result<Option<Vec<f64>>, ImzMLError> {
        self.decode_array(spectrum.intensity_array_ref()?)
    }

    /// Shared m/z axis recorded by the converter tool
    ///
    /// Only available when a software entry `imzMLConverter` declares the external
    /// offset and encoded length of the axis. The axis is stored as big-endian
    /// doubles.
    pub fn full_mz_axis(&self) -> Result<Option<&[f64]>, ImzMLError> {
        self.full_mz_axis
            .get_or_try_init(|| self.load_full_mz_axis())
            .map(Option::as_deref)
    }

    fn load_full_mz_axis(&self) -> Result<Option<Vec<f64>>, ImzMLError> {
        let Some(converter) = self.software(IMZML_CONVERTER_ID) else {
            return Ok(None);
        };
        let (Some(offset), Some(length)) = (
            converter.params.get(IMS_CV_ACCESSIONS::EXTERNAL_OFFSET),
            converter
                .params
                .get(IMS_CV_ACCESSIONS::EXTERNAL_ENCODED_LENGTH),
        ) else {
            return Ok(None);
        };

        let offset = offset.as_long()?;
        let length = length.as_long()?;
        let (Ok(offset), Ok(length)) = (u64::try_from(offset), u64::try_from(length)) else {
            warn!(
                "Ignoring full m/z axis with offset {} and length {}",
                offset, length
            );
            return Ok(None);
        };

        let bytes = self.payload()?.read(offset, length)?;
        let axis = BinaryDecoder::decode_f64_big_endian(&bytes);
        debug!("Decoded full m/z axis of {} values", axis.len());
        Ok(Some(axis))
    }

    /// Bin left edges covering `[min_mz, max_mz]` in steps of `bin_size`
    ///
    /// `min_mz` snaps down and `max_mz` up to a multiple of `bin_size`; the snapped
    /// maximum is excluded. A non-positive bin size or an inverted range gives an
    /// empty axis.
    pub fn binned_mz_axis(min_mz: f64, max_mz: f64, bin_size: f64) -> Vec<f64> {
        let valid = bin_size > 0.0 && min_mz.is_finite() && max_mz.is_finite();
        if !valid || max_mz < min_mz {
            return Vec::new();
        }
        let first = snap_to_whole(min_mz / bin_size).floor();
        let last = snap_to_whole(max_mz / bin_size).ceil();
        let count = (last - first).max(0.0) as usize;
        (0..count)
            .map(|i| (first + i as f64) * bin_size)
            .collect()
    }

    // =========================================================================
    // Images and extrema
    // =========================================================================

    /// Total ion current image, `height` rows of `width` values
    ///
    /// A spectrum's declared total ion current is used when present; otherwise its
    /// intensity array is summed and the sum is recorded on the spectrum as a total
    /// ion current parameter. Spectra without either leave their pixel at zero.
    pub fn generate_tic_image(&self) -> Result<&Image, ImzMLError> {
        self.tic_image.get_or_try_init(|| self.build_tic_image())
    }

    fn build_tic_image(&self) -> Result<Image, ImzMLError> {
        let (width, height) = (self.width()?, self.height()?);
        let mut image = vec![vec![0.0; width as usize]; height as usize];

        for (spectrum, location) in self.spectra.iter().zip(self.pixel_locations()?) {
            let Some(location) = location else {
                warn!("Spectrum {} has no valid position, skipped", spectrum.id);
                continue;
            };
            if !location.within(width, height, u32::MAX) {
                warn!(
                    "Spectrum {} at {} lies outside the {} x {} image, skipped",
                    spectrum.id, location, width, height
                );
                continue;
            }

            // an empty declaration reads as NaN and counts as undeclared
            let declared = match spectrum.param(MS_CV_ACCESSIONS::TOTAL_ION_CURRENT) {
                Some(param) => Some(param.as_double()?).filter(|tic| !tic.is_nan()),
                None => None,
            };
            let tic = match declared {
                Some(tic) => tic,
                None => match self.intensity_array(spectrum)? {
                    Some(intensities) => {
                        let tic: f64 = intensities.iter().sum();
                        spectrum.add_param(CvParam::double(
                            self.ontology.term(MS_CV_ACCESSIONS::TOTAL_ION_CURRENT),
                            tic,
                        )?);
                        tic
                    }
                    None => continue,
                },
            };
            image[(location.y - 1) as usize][(location.x - 1) as usize] = tic;
        }

        debug!("Generated {} x {} TIC image", width, height);
        Ok(image)
    }

    fn declared_extremum(
        &self,
        accession: &str,
        pick: fn(f64, f64) -> f64,
    ) -> Result<Option<f64>, ImzMLError> {
        let mut extremum: Option<f64> = None;
        for spectrum in &self.spectra {
            if let Some(param) = spectrum.param(accession) {
                let value = param.as_double()?;
                if value.is_nan() {
                    continue;
                }
                extremum = Some(extremum.map_or(value, |e| pick(e, value)));
            }
        }
        Ok(extremum)
    }

    /// Lowest m/z declared (lowest observed m/z) by any spectrum
    pub fn minimum_detected_mz(&self) -> Result<Option<f64>, ImzMLError> {
        self.min_mz
            .get_or_try_init(|| {
                self.declared_extremum(MS_CV_ACCESSIONS::LOWEST_OBSERVED_MZ, f64::min)
            })
            .copied()
    }

    /// Highest m/z declared (highest observed m/z) by any spectrum
    pub fn maximum_detected_mz(&self) -> Result<Option<f64>, ImzMLError> {
        self.max_mz
            .get_or_try_init(|| {
                self.declared_extremum(MS_CV_ACCESSIONS::HIGHEST_OBSERVED_MZ, f64::max)
            })
            .copied()
    }

    // =========================================================================
    // Checksums
    // =========================================================================

    /// SHA-1 of the file at `path`, lowercase hex
    pub fn calculate_sha1<P: AsRef<Path>>(path: P) -> Result<String, ChecksumError> {
        checksum_with(path, ChecksumAlgorithm::Sha1)
    }

    /// MD5 of the file at `path`, lowercase hex
    pub fn calculate_md5<P: AsRef<Path>>(path: P) -> Result<String, ChecksumError> {
        checksum_with(path, ChecksumAlgorithm::Md5)
    }

    /// Compare the payload digest with the one declared in the file content
    ///
    /// SHA-1 is preferred over MD5 when both are declared. `None` when neither is.
    pub fn verify_ibd_checksum(&self) -> Result<Option<bool>, ImzMLError> {
        let declared = [
            (IMS_CV_ACCESSIONS::IBD_SHA1, ChecksumAlgorithm::Sha1),
            (IMS_CV_ACCESSIONS::IBD_MD5, ChecksumAlgorithm::Md5),
        ]
        .into_iter()
        .find_map(|(accession, algorithm)| {
            self.file_content
                .params
                .get(accession)
                .map(|p| (p.as_string(), algorithm))
        });

        let Some((expected, algorithm)) = declared else {
            return Ok(None);
        };
        let actual = checksum_with(self.payload()?.path(), algorithm)?;
        Ok(Some(actual.eq_ignore_ascii_case(expected.trim())))
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    /// Overview of the document for reports
    pub fn summary(&self) -> Result<DocumentSummary, ImzMLError> {
        let binary_type = if self.is_continuous() {
            "continuous"
        } else if self.is_processed() {
            "processed"
        } else {
            "unknown"
        };
        Ok(DocumentSummary {
            spectrum_count: self.spectra.len(),
            width: self.width()?,
            height: self.height()?,
            depth: self.depth()?,
            spatial_dimensionality: self.spatial_dimensionality()?,
            dimensionality: self.dimensionality()?,
            spectra_per_pixel: self.number_of_spectra_per_pixel()?,
            binary_type: binary_type.to_string(),
            min_mz: self.minimum_detected_mz()?,
            max_mz: self.maximum_detected_mz()?,
            ibd_path: self.ibd_path().map(|p| p.display().to_string()),
            software: self.software.iter().map(|s| s.id.clone()).collect(),
        })
    }
}

impl fmt::Debug for ImzML {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImzML")
            .field("ontology", &self.ontology.source())
            .field("spectra", &self.spectra.len())
            .field("software", &self.software.len())
            .field("scan_settings", &self.scan_settings.len())
            .field("ibd", &self.ibd)
            .finish()
    }
}

/// Relative distance from a whole number below which a quotient counts as whole
const SNAP_EPSILON: f64 = 1e-10;

/// Round quotients such as `0.3 / 0.1 = 2.9999999999999996` to the whole number
/// they stand for, so exact multiples are not pushed a bin down or up
fn snap_to_whole(quotient: f64) -> f64 {
    let nearest = quotient.round();
    if (quotient - nearest).abs() <= SNAP_EPSILON * nearest.abs().max(1.0) {
        nearest
    } else {
        quotient
    }
}
