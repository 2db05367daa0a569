//! # imzML Tool
//!
//! A command-line tool for inspecting imzML mass spectrometry imaging datasets.
//!
//! ## Usage
//!
//! ```bash
//! # Image size, spectra and m/z range
//! imzml-tool info sample.imzML
//!
//! # Total ion current image as CSV
//! imzml-tool tic sample.imzML --format csv -o tic.csv
//!
//! # Verify the declared payload checksum
//! imzml-tool checksum --verify sample.imzML
//!
//! # Ontology lookup
//! imzml-tool term IMS:1000042
//! ```

mod cli;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
