use anyhow::Result;
use log::info;
use std::path::Path;

use imzml::imzml::ImzML;
use imzml::mzml::RuleViolation;

/// Check an imzML document against its CV parameter rules
pub fn run(file: &Path, document: &ImzML) -> Result<()> {
    info!("imzML Validator");
    info!("File: {}", file.display());

    let violations = document.validate();
    print!("{}", report(file, &violations));

    // Exit with error code if validation failed
    if !violations.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(feature = "colorized_output")]
fn report(file: &Path, violations: &[RuleViolation]) -> String {
    use console::style;

    let mut output = String::new();
    output.push_str(&format!("{}\n", style("imzML Validation Report").bold().cyan()));
    output.push_str(&format!("{}: {}\n\n", style("File").bold(), file.display()));
    if violations.is_empty() {
        output.push_str(&format!("{}\n", style("All sections satisfy their rules").green()));
    }
    for violation in violations {
        output.push_str(&format!("{} {}\n", style("FAILED").red().bold(), violation));
    }
    output
}

#[cfg(not(feature = "colorized_output"))]
fn report(file: &Path, violations: &[RuleViolation]) -> String {
    let mut output = format!("imzML Validation Report\nFile: {}\n\n", file.display());
    if violations.is_empty() {
        output.push_str("All sections satisfy their rules\n");
    }
    for violation in violations {
        output.push_str(&format!("FAILED {}\n", violation));
    }
    output
}
