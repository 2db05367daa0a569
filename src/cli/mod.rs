use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use imzml::imzml::{ChecksumAlgorithm, ImzML};
use imzml::obo::{DirectoryResolver, Ontology, DEFAULT_ONTOLOGY};
use imzml::reader::{ImzMLReader, ReaderConfig};

mod checksum;
mod config;
mod info;
mod term;
mod tic;
mod validate;

pub use config::Config;

/// imzML - Mass Spectrometry Imaging Data Inspector
#[derive(Parser)]
#[command(name = "imzml")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Load the ontology from this directory instead of the bundled copy
    #[arg(long, value_name = "DIR", global = true)]
    ontology_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format of the TIC image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum TicFormat {
    /// JSON array of rows
    #[default]
    Json,
    /// One comma separated line per row
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Display information about an imzML document
    Info {
        /// Input imzML file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// Fail on cvParam accessions missing from the ontology
        #[arg(long)]
        strict: bool,
    },

    /// Check every section against its CV parameter rules
    Validate {
        /// Input imzML file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Fail on cvParam accessions missing from the ontology
        #[arg(long)]
        strict: bool,
    },

    /// Export the total ion current image
    Tic {
        /// Input imzML file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Output format (defaults to the config file, then json)
        #[arg(short, long, value_enum)]
        format: Option<TicFormat>,
    },

    /// Compute a file checksum, or verify the payload checksum of an imzML document
    Checksum {
        /// File to hash, or imzML document with --verify
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Algorithm: MD5, SHA-1 or SHA-256 (defaults to the config file, then SHA-1)
        #[arg(short, long)]
        algorithm: Option<String>,

        /// Compare the payload with the checksum declared in the document
        #[arg(long)]
        verify: bool,
    },

    /// Look up an ontology term
    Term {
        /// Term accession, e.g. IMS:1000042
        #[arg(value_name = "ACCESSION")]
        accession: String,

        /// List direct children as well
        #[arg(long)]
        children: bool,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

/// The bundled ontology, or the published files from `directory`
fn load_ontology(directory: Option<&Path>) -> Result<Arc<Ontology>> {
    match directory {
        Some(directory) => {
            let resolver = DirectoryResolver::new(directory);
            let ontology = Ontology::load(DEFAULT_ONTOLOGY, &resolver).with_context(|| {
                format!("Failed to load {} from {}", DEFAULT_ONTOLOGY, directory.display())
            })?;
            Ok(Arc::new(ontology))
        }
        None => Ok(Ontology::shared()?),
    }
}

/// Read `file` with the reader settings from `config`, `strict` overriding.
fn open_document(
    file: &Path,
    ontology: &Arc<Ontology>,
    config: &Config,
    strict: bool,
) -> Result<ImzML> {
    if !file.exists() {
        anyhow::bail!("Input file does not exist: {}", file.display());
    }
    let strict = strict || config.reader.strict_accessions.unwrap_or(false);
    let reader_config = ReaderConfig::with_ontology(Arc::clone(ontology)).strict(strict);
    debug!("Reading {} (strict accessions: {})", file.display(), strict);

    ImzMLReader::open_with_config(file, reader_config)
        .and_then(ImzMLReader::read)
        .with_context(|| format!("Failed to read {}", file.display()))
}

pub fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let directory = cli.ontology_dir.or_else(|| config.ontology.directory.clone());
    let ontology = load_ontology(directory.as_deref())?;

    match cli.command {
        Commands::Info { file, json, strict } => {
            info::run(&file, &open_document(&file, &ontology, &config, strict)?, json)
        }
        Commands::Validate { file, strict } => {
            validate::run(&file, &open_document(&file, &ontology, &config, strict)?)
        }
        Commands::Tic {
            file,
            output,
            format,
        } => {
            let format = match format {
                Some(format) => format,
                None => match config.tic.format.as_deref() {
                    Some(name) => TicFormat::from_str(name, true)
                        .map_err(|e| anyhow::anyhow!("Invalid [tic] format '{}': {}", name, e))?,
                    None => TicFormat::default(),
                },
            };
            tic::run(&open_document(&file, &ontology, &config, false)?, output, format)
        }
        Commands::Checksum {
            file,
            algorithm,
            verify,
        } => {
            let name = algorithm
                .or_else(|| config.checksum.algorithm.clone())
                .unwrap_or_else(|| ChecksumAlgorithm::Sha1.name().to_string());
            let algorithm: ChecksumAlgorithm = name.parse()?;
            if verify {
                checksum::verify(&file, &open_document(&file, &ontology, &config, false)?)
            } else {
                checksum::run(&file, algorithm)
            }
        }
        Commands::Term {
            accession,
            children,
        } => term::run(&ontology, &accession, children),
    }
}
