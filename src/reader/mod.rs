//! # imzML Reader
//!
//! Streaming reader for imzML metadata documents, built on quick-xml.
//!
//! The reader walks the XML once and keeps the sections the imaging model
//! needs: file content, referenceable parameter groups, software, scan settings
//! and spectra with their scans and binary data arrays. Every cvParam is bound
//! to an ontology term; the term's declared value type decides how the value
//! text is parsed. The `.ibd` payload next to the metadata file is attached to
//! the resulting [`ImzML`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use imzml::reader::{ImzMLReader, ReaderConfig};
//!
//! let config = ReaderConfig::new()?.strict(true);
//! let imzml = ImzMLReader::open_with_config("example.imzML", config)?.read()?;
//! println!("{} spectra", imzml.spectra().len());
//! # Ok::<(), imzml::reader::ReaderError>(())
//! ```

mod builder;
mod config;
mod error;
mod helpers;


use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use quick_xml::events::Event;
use quick_xml::Reader;

pub use config::ReaderConfig;
pub use error::ReaderError;

use crate::imzml::ImzML;
use builder::DocumentBuilder;

/// Default buffer size for reading metadata files (64 KiB)
pub const DEFAULT_INPUT_BUFFER_SIZE: usize = 64 * 1024;

/// Streaming reader for imzML metadata
pub struct ImzMLReader<R: BufRead> {
    reader: Reader<R>,
    config: ReaderConfig,
}

impl ImzMLReader<BufReader<File>> {
    /// Open an imzML file with the default configuration
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ReaderError> {
        Self::open_with_config(path, ReaderConfig::new()?)
    }

    /// Open an imzML file
    ///
    /// Without an explicit payload path, the file of the same name with an
    /// `.ibd` extension is used when it exists.
    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        mut config: ReaderConfig,
    ) -> Result<Self, ReaderError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::with_capacity(DEFAULT_INPUT_BUFFER_SIZE, file);

        if config.ibd_path.is_none() {
            let derived = ibd_path_for(path);
            if derived.is_file() {
                debug!("Using payload file {}", derived.display());
                config.ibd_path = Some(derived);
            } else {
                warn!(
                    "No payload file {} next to {}",
                    derived.display(),
                    path.display()
                );
            }
        }
        Ok(Self::new(reader, config))
    }
}

impl<R: BufRead> ImzMLReader<R> {
    /// Create a reader over any buffered source
    pub fn new(reader: R, config: ReaderConfig) -> Self {
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.config_mut().trim_text(true);
        Self {
            reader: xml_reader,
            config,
        }
    }

    /// Payload file that will be attached
    pub fn ibd_path(&self) -> Option<&Path> {
        self.config.ibd_path.as_deref()
    }

    /// Read the whole document and attach its payload file
    pub fn read(mut self) -> Result<ImzML, ReaderError> {
        let mut builder = DocumentBuilder::new(
            Arc::clone(&self.config.ontology),
            self.config.strict_accessions,
        );

        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    builder.element(e)?;
                    builder.open(e)?;
                }
                Ok(Event::Empty(ref e)) => {
                    builder.element(e)?;
                    builder.open(e)?;
                    builder.close()?;
                }
                Ok(Event::End(_)) => builder.close()?,
                Ok(Event::Eof) => break,
                Err(e) => return Err(ReaderError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        let mut document = builder.finish()?;
        if let Some(path) = self.config.ibd_path.take() {
            document.open_ibd(&path)?;
        }
        info!(
            "Read imzML document with {} spectra",
            document.spectra().len()
        );
        Ok(document)
    }
}

/// Read the imzML file at `path` and its payload with the default configuration
pub fn read_imzml<P: AsRef<Path>>(path: P) -> Result<ImzML, ReaderError> {
    ImzMLReader::open(path)?.read()
}

/// Path of the payload file belonging to the metadata file at `path`
pub fn ibd_path_for<P: AsRef<Path>>(path: P) -> PathBuf {
    path.as_ref().with_extension("ibd")
}
