use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use imzml::imzml::{Image, ImzML};

use super::TicFormat;

/// Export the TIC image of an imzML document
pub fn run(document: &ImzML, output: Option<PathBuf>, format: TicFormat) -> Result<()> {
    let image = document.generate_tic_image()?;

    let writer: Box<dyn Write> = match &output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    match format {
        TicFormat::Json => write_json(image, writer)?,
        TicFormat::Csv => write_csv(image, writer)?,
    }

    if let Some(path) = output {
        info!("Wrote {} TIC rows to {}", image.len(), path.display());
    }
    Ok(())
}

/// One JSON array per row
pub fn write_json<W: Write>(image: &Image, mut writer: W) -> Result<()> {
    serde_json::to_writer(&mut writer, image)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// One CSV line per row, no header
pub fn write_csv<W: Write>(image: &Image, writer: W) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    for row in image {
        csv.write_record(row.iter().map(|value| value.to_string()))?;
    }
    csv.flush()?;
    Ok(())
}
