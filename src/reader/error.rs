use crate::imzml::ImzMLError;
use crate::mzml::CvParamError;
use crate::obo::OboError;

/// Errors that can occur while reading an imzML document
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// Error parsing XML
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 encoding error in an attribute value
    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Invalid imzML document structure
    #[error("Invalid imzML structure: {0}")]
    InvalidStructure(String),

    /// Required XML attribute is missing
    #[error("Missing required attribute: {0}")]
    MissingAttribute(String),

    /// A cvParam could not be bound to the ontology
    #[error("CV parameter error: {0}")]
    CvParam(#[from] CvParamError),

    /// The ontology could not be loaded
    #[error("Ontology error: {0}")]
    Ontology(#[from] OboError),

    /// The payload file could not be attached
    #[error("Document error: {0}")]
    Document(#[from] ImzMLError),
}
