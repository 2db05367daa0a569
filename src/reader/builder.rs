//! Assembles an [`ImzML`] from the elements the reader walks through

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};
use quick_xml::events::BytesStart;

use super::helpers::{get_attribute, required_attribute};
use super::ReaderError;
use crate::imzml::ImzML;
use crate::mzml::{
    BinaryDataArray, CvParam, CvParamError, FileContent, ParamGroup, ReferenceableParamGroup,
    Scan, ScanSettings, Software, Spectrum,
};
use crate::obo::Ontology;

/// Kind of an open element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    FileContent,
    ParamGroup,
    Software,
    ScanSettings,
    Spectrum,
    Scan,
    BinaryDataArray,
    /// Anything whose parameters are not kept
    Other,
}

impl Frame {
    fn for_tag(name: &[u8]) -> Self {
        match name {
            b"fileContent" => Frame::FileContent,
            b"referenceableParamGroup" => Frame::ParamGroup,
            b"software" => Frame::Software,
            b"scanSettings" => Frame::ScanSettings,
            b"spectrum" => Frame::Spectrum,
            b"scan" => Frame::Scan,
            b"binaryDataArray" => Frame::BinaryDataArray,
            _ => Frame::Other,
        }
    }
}

struct PendingSpectrum {
    id: String,
    default_array_length: usize,
    params: ParamGroup,
    scans: Vec<Scan>,
    arrays: Vec<BinaryDataArray>,
}

/// Collects sections while the XML is streamed
///
/// Every start tag pushes a [`Frame`] and every end tag pops one; a cvParam lands
/// in the section of the innermost open frame, or is dropped when that frame is
/// not a parameter section.
pub(super) struct DocumentBuilder {
    document: ImzML,
    strict_accessions: bool,
    groups: HashMap<String, Arc<ReferenceableParamGroup>>,
    stack: Vec<Frame>,
    file_content: FileContent,
    group: Option<(String, ParamGroup)>,
    software: Option<Software>,
    scan_settings: Option<ScanSettings>,
    spectrum: Option<PendingSpectrum>,
    scan: Option<Scan>,
    array: Option<BinaryDataArray>,
    skipped: usize,
}

impl DocumentBuilder {
    pub(super) fn new(ontology: Arc<Ontology>, strict_accessions: bool) -> Self {
        Self {
            document: ImzML::new(ontology),
            strict_accessions,
            groups: HashMap::new(),
            stack: Vec::new(),
            file_content: FileContent::default(),
            group: None,
            software: None,
            scan_settings: None,
            spectrum: None,
            scan: None,
            array: None,
            skipped: 0,
        }
    }

    /// Handle the content of an element: cvParams and group references
    pub(super) fn element(&mut self, e: &BytesStart) -> Result<(), ReaderError> {
        match e.name().as_ref() {
            b"cvParam" => self.cv_param(e),
            b"referenceableParamGroupRef" => self.param_group_ref(e),
            _ => Ok(()),
        }
    }

    /// An element was opened
    pub(super) fn open(&mut self, e: &BytesStart) -> Result<(), ReaderError> {
        let frame = Frame::for_tag(e.name().as_ref());
        match frame {
            Frame::ParamGroup => {
                let id = required_attribute(e, "id")?;
                self.group = Some((id, ParamGroup::new()));
            }
            Frame::Software => {
                self.software = Some(Software {
                    id: get_attribute(e, "id")?.unwrap_or_default(),
                    version: get_attribute(e, "version")?.unwrap_or_default(),
                    params: ParamGroup::new(),
                });
            }
            Frame::ScanSettings => {
                self.scan_settings = Some(ScanSettings {
                    id: get_attribute(e, "id")?.unwrap_or_default(),
                    params: ParamGroup::new(),
                });
            }
            Frame::Spectrum => {
                self.spectrum = Some(PendingSpectrum {
                    id: get_attribute(e, "id")?.unwrap_or_default(),
                    default_array_length: get_attribute(e, "defaultArrayLength")?
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(0),
                    params: ParamGroup::new(),
                    scans: Vec::new(),
                    arrays: Vec::new(),
                });
            }
            Frame::Scan => self.scan = Some(Scan::default()),
            Frame::BinaryDataArray => self.array = Some(BinaryDataArray::default()),
            Frame::FileContent | Frame::Other => {}
        }
        self.stack.push(frame);
        Ok(())
    }

    /// The innermost open element was closed
    pub(super) fn close(&mut self) -> Result<(), ReaderError> {
        let frame = self.stack.pop().ok_or_else(|| {
            ReaderError::InvalidStructure("End tag without an open element".to_string())
        })?;

        match frame {
            Frame::ParamGroup => {
                if let Some((id, params)) = self.group.take() {
                    let group = Arc::new(ReferenceableParamGroup::new(id.clone(), params));
                    self.groups.insert(id, Arc::clone(&group));
                    self.document.add_referenceable_param_group(group);
                }
            }
            Frame::Software => {
                if let Some(software) = self.software.take() {
                    self.document.add_software(software);
                }
            }
            Frame::ScanSettings => {
                if let Some(settings) = self.scan_settings.take() {
                    self.document.add_scan_settings(settings);
                }
            }
            Frame::Spectrum => {
                if let Some(pending) = self.spectrum.take() {
                    let mut spectrum = Spectrum::new(
                        0,
                        pending.id,
                        pending.default_array_length,
                        pending.params,
                    );
                    spectrum.scans = pending.scans;
                    spectrum.binary_data_arrays = pending.arrays;
                    self.document.add_spectrum(spectrum);
                }
            }
            Frame::Scan => {
                if let Some(scan) = self.scan.take() {
                    match self.spectrum.as_mut() {
                        Some(spectrum) => spectrum.scans.push(scan),
                        None => warn!("<scan> outside a spectrum ignored"),
                    }
                }
            }
            Frame::BinaryDataArray => {
                if let Some(array) = self.array.take() {
                    match self.spectrum.as_mut() {
                        Some(spectrum) => spectrum.arrays.push(array),
                        None => debug!("<binaryDataArray> outside a spectrum ignored"),
                    }
                }
            }
            Frame::FileContent | Frame::Other => {}
        }
        Ok(())
    }

    /// Parameters of the innermost open section
    fn target(&mut self) -> Option<&mut ParamGroup> {
        let frame = *self.stack.last()?;
        match frame {
            Frame::FileContent => Some(&mut self.file_content.params),
            Frame::ParamGroup => self.group.as_mut().map(|(_, params)| params),
            Frame::Software => self.software.as_mut().map(|s| &mut s.params),
            Frame::ScanSettings => self.scan_settings.as_mut().map(|s| &mut s.params),
            Frame::Spectrum => self.spectrum.as_mut().map(|s| &mut s.params),
            Frame::Scan => self.scan.as_mut().map(|s| &mut s.params),
            Frame::BinaryDataArray => self.array.as_mut().map(|a| &mut a.params),
            Frame::Other => None,
        }
    }

    fn collecting(&self) -> bool {
        matches!(self.stack.last(), Some(frame) if *frame != Frame::Other)
    }

    fn cv_param(&mut self, e: &BytesStart) -> Result<(), ReaderError> {
        if !self.collecting() {
            return Ok(());
        }
        let accession = required_attribute(e, "accession")?;
        let ontology = Arc::clone(self.document.ontology());

        let Some(term) = ontology.term(&accession) else {
            if self.strict_accessions {
                return Err(CvParamError::AccessionNotFound(accession).into());
            }
            warn!("Unknown accession {}, parameter skipped", accession);
            self.skipped += 1;
            return Ok(());
        };

        let unit = match get_attribute(e, "unitAccession")? {
            Some(unit_accession) => {
                let unit = ontology.term(&unit_accession);
                if unit.is_none() {
                    warn!("Unknown unit {} on {}, unit dropped", unit_accession, accession);
                }
                unit
            }
            None => None,
        };

        let value = get_attribute(e, "value")?;
        let param = CvParam::from_text(term, unit, value.as_deref().filter(|v| !v.is_empty()))?;
        if let Some(params) = self.target() {
            params.add(param);
        }
        Ok(())
    }

    fn param_group_ref(&mut self, e: &BytesStart) -> Result<(), ReaderError> {
        if !self.collecting() {
            return Ok(());
        }
        let id = required_attribute(e, "ref")?;
        let group = self.groups.get(&id).cloned().ok_or_else(|| {
            ReaderError::InvalidStructure(format!("Unknown referenceableParamGroup '{}'", id))
        })?;
        if let Some(params) = self.target() {
            params.add_reference(group);
        }
        Ok(())
    }

    /// The finished document, without payload
    pub(super) fn finish(self) -> Result<ImzML, ReaderError> {
        if !self.stack.is_empty() {
            return Err(ReaderError::InvalidStructure(format!(
                "Document ended with {} unclosed elements",
                self.stack.len()
            )));
        }
        if self.skipped > 0 {
            warn!("Skipped {} parameters with unknown accessions", self.skipped);
        }
        let mut document = self.document;
        document.set_file_content(self.file_content);
        Ok(document)
    }
}
