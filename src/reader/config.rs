use std::path::PathBuf;
use std::sync::Arc;

use crate::obo::Ontology;

use super::ReaderError;

/// Configuration for reading imzML documents
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Ontology cvParams are bound to
    pub ontology: Arc<Ontology>,
    /// Payload file; derived from the metadata path when `None`
    pub ibd_path: Option<PathBuf>,
    /// Fail on accessions the ontology does not know instead of skipping them
    pub strict_accessions: bool,
}

impl ReaderConfig {
    /// Lenient configuration bound to the shared bundled ontology
    pub fn new() -> Result<Self, ReaderError> {
        Ok(Self::with_ontology(Ontology::shared()?))
    }

    /// Lenient configuration bound to `ontology`
    pub fn with_ontology(ontology: Arc<Ontology>) -> Self {
        Self {
            ontology,
            ibd_path: None,
            strict_accessions: false,
        }
    }

    /// Read the payload from `path`
    pub fn ibd_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ibd_path = Some(path.into());
        self
    }

    /// Reject unknown accessions
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_accessions = strict;
        self
    }
}
