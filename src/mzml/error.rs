/// Errors raised by CV parameter construction and value access
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CvParamError {
    /// No ontology term could be found for the parameter
    #[error("CV parameter accession not found: {0}")]
    AccessionNotFound(String),

    /// Attempt to set a value on a parameter that carries none
    #[error("Cannot change the value of empty CV parameter {accession}")]
    ImmutableValue {
        /// Accession of the empty parameter
        accession: String,
    },

    /// Value text does not parse as the requested type
    #[error("Invalid value '{value}' for {accession}: expected {target}")]
    InvalidValue {
        /// Accession of the parameter
        accession: String,
        /// Offending text
        value: String,
        /// Type the text was parsed as
        target: String,
    },
}
