//! Locating ontology sources by logical name
//!
//! OBO files refer to each other through `import:` header lines. An import value
//! may be a bare file name (`psi-ms.obo`) or a full URL; either way only the last
//! path segment is used to find the source.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::OboError;

/// Name of the default imaging ontology shipped with the crate
pub const DEFAULT_ONTOLOGY: &str = "imagingMS.obo";

const BUNDLED: &[(&str, &str)] = &[
    (
        "imagingMS.obo",
        include_str!("../../resources/obo/imagingMS.obo"),
    ),
    ("psi-ms.obo", include_str!("../../resources/obo/psi-ms.obo")),
    ("uo.obo", include_str!("../../resources/obo/uo.obo")),
];

/// Source of OBO text, keyed by logical name
pub trait OntologyResolver {
    /// Return the full text of the named source
    fn read_source(&self, name: &str) -> Result<String, OboError>;
}

/// Strip any directory or URL prefix from an import value
pub fn source_file_name(name: &str) -> &str {
    let trimmed = name.trim().trim_end_matches('/');
    trimmed
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(trimmed)
}

/// Resolver over the ontology files compiled into the crate
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledResolver;

impl BundledResolver {
    /// Names of all bundled sources
    pub fn names() -> impl Iterator<Item = &'static str> {
        BUNDLED.iter().map(|(name, _)| *name)
    }
}

impl OntologyResolver for BundledResolver {
    fn read_source(&self, name: &str) -> Result<String, OboError> {
        let file_name = source_file_name(name);
        BUNDLED
            .iter()
            .find(|(bundled, _)| *bundled == file_name)
            .map(|(_, content)| content.to_string())
            .ok_or_else(|| OboError::SourceNotFound {
                name: name.to_string(),
            })
    }
}

/// Resolver reading `.obo` files from a directory on disk
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    root: PathBuf,
}

impl DirectoryResolver {
    /// Resolve sources relative to `root`
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl OntologyResolver for DirectoryResolver {
    fn read_source(&self, name: &str) -> Result<String, OboError> {
        let path = self.root.join(source_file_name(name));
        std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                OboError::SourceNotFound {
                    name: name.to_string(),
                }
            } else {
                OboError::Io {
                    name: name.to_string(),
                    source,
                }
            }
        })
    }
}

/// In-memory resolver, handy for tests and for ontologies fetched elsewhere
#[derive(Debug, Clone, Default)]
pub struct MapResolver {
    sources: HashMap<String, String>,
}

impl MapResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source under its logical name
    pub fn with_source(mut self, name: &str, content: &str) -> Self {
        self.sources
            .insert(source_file_name(name).to_string(), content.to_string());
        self
    }
}

impl OntologyResolver for MapResolver {
    fn read_source(&self, name: &str) -> Result<String, OboError> {
        self.sources
            .get(source_file_name(name))
            .cloned()
            .ok_or_else(|| OboError::SourceNotFound {
                name: name.to_string(),
            })
    }
}
