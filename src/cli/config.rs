//! TOML configuration file support.
//!
//! Settings that would otherwise be repeated on every invocation can live in a
//! config file; command-line flags take precedence:
//!
//! ```toml
//! # imzml.toml
//! [ontology]
//! directory = "/data/obo"
//!
//! [reader]
//! strict_accessions = true
//!
//! [tic]
//! format = "csv"
//!
//! [checksum]
//! algorithm = "SHA-256"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration structure for imzml.toml files.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Ontology source settings.
    #[serde(default)]
    pub ontology: OntologySection,

    /// Document reading settings.
    #[serde(default)]
    pub reader: ReaderSection,

    /// TIC export settings.
    #[serde(default)]
    pub tic: TicSection,

    /// Checksum settings.
    #[serde(default)]
    pub checksum: ChecksumSection,
}

/// `[ontology]` table.
#[derive(Debug, Default, Deserialize)]
pub struct OntologySection {
    /// Directory holding `imagingMS.obo` and the files it imports.
    pub directory: Option<PathBuf>,
}

/// `[reader]` table.
#[derive(Debug, Default, Deserialize)]
pub struct ReaderSection {
    /// Fail on unknown cvParam accessions.
    pub strict_accessions: Option<bool>,
}

/// `[tic]` table.
#[derive(Debug, Default, Deserialize)]
pub struct TicSection {
    /// Output format, `json` or `csv`.
    pub format: Option<String>,
}

/// `[checksum]` table.
#[derive(Debug, Default, Deserialize)]
pub struct ChecksumSection {
    /// Algorithm name, e.g. `SHA-1`.
    pub algorithm: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Load `path` if given, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [ontology]
            directory = "/data/obo"

            [reader]
            strict_accessions = true

            [tic]
            format = "csv"

            [checksum]
            algorithm = "MD5"
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.ontology.directory, Some(PathBuf::from("/data/obo")));
        assert_eq!(config.reader.strict_accessions, Some(true));
        assert_eq!(config.tic.format.as_deref(), Some("csv"));
        assert_eq!(config.checksum.algorithm.as_deref(), Some("MD5"));
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_str("[tic]\nformat = \"json\"\n").unwrap();
        assert_eq!(config.tic.format.as_deref(), Some("json"));
        assert_eq!(config.checksum.algorithm, None);
        assert_eq!(config.reader.strict_accessions, None);
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert!(config.tic.format.is_none());
        assert!(config.ontology.directory.is_none());
    }

    #[test]
    fn test_unknown_table_rejected() {
        assert!(Config::from_str("[conversion]\nbatch_size = 10\n").is_err());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imzml.toml");
        std::fs::write(&path, "[checksum]\nalgorithm = \"SHA-1\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.checksum.algorithm.as_deref(), Some("SHA-1"));
        assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
