use anyhow::Result;
use std::path::Path;

use imzml::imzml::{checksum_with, ChecksumAlgorithm, ImzML};

/// Print the digest of `file` in `sha1sum` style
pub fn run(file: &Path, algorithm: ChecksumAlgorithm) -> Result<()> {
    let digest = checksum_with(file, algorithm)?;
    println!("{}  {}", digest, file.display());
    Ok(())
}

/// Compare the payload of `document` with its declared checksum
pub fn verify(file: &Path, document: &ImzML) -> Result<()> {
    match document.verify_ibd_checksum()? {
        Some(true) => {
            println!("{}: payload checksum OK", file.display());
            Ok(())
        }
        Some(false) => {
            eprintln!("{}: payload checksum MISMATCH", file.display());
            std::process::exit(1);
        }
        None => {
            println!("{}: no payload checksum declared", file.display());
            Ok(())
        }
    }
}
