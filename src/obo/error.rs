/// Errors that can occur while loading an ontology
#[derive(Debug, thiserror::Error)]
pub enum OboError {
    /// The named ontology source (or one of its imports) could not be located
    #[error("Ontology source not found: {name}")]
    SourceNotFound {
        /// Logical name of the missing source
        name: String,
    },

    /// The source exists but could not be read
    #[error("Failed to read ontology source {name}: {source}")]
    Io {
        /// Logical name of the source
        name: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },
}
