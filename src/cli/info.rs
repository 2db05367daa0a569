use anyhow::Result;
use std::path::Path;

use imzml::imzml::ImzML;

/// Display information about an imzML document
pub fn run(file: &Path, document: &ImzML, json: bool) -> Result<()> {
    let summary = document.summary()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("imzML Document Information");
    println!("==========================");
    println!("File: {}", file.display());
    match &summary.ibd_path {
        Some(path) => println!("Payload: {}", path),
        None => println!("Payload: <none>"),
    }
    println!();

    println!("Image:");
    println!(
        "  Size: {} x {} x {} pixels",
        summary.width, summary.height, summary.depth
    );
    println!("  Spatial dimensions: {}", summary.spatial_dimensionality);
    println!("  Dimensionality: {}", summary.dimensionality);
    println!("  Spectra: {}", summary.spectrum_count);
    println!("  Spectra per pixel: {}", summary.spectra_per_pixel);
    println!("  Binary type: {}", summary.binary_type);
    println!();

    println!("m/z range:");
    match (summary.min_mz, summary.max_mz) {
        (Some(min), Some(max)) => println!("  {:.4} - {:.4}", min, max),
        _ => println!("  <not declared>"),
    }
    println!();

    if !summary.software.is_empty() {
        println!("Software:");
        for software in document.software_list() {
            println!("  {} {}", software.id, software.version);
        }
    }

    Ok(())
}
