//! Validate command - check that manifest files are well-formed YAML

use bundlegen_core::validate_paths;
use console::style;
use std::path::PathBuf;

use crate::error::{CliError, Result};

pub fn run(paths: &[PathBuf], json_output: bool) -> Result<()> {
    let report = validate_paths(paths);

    if json_output {
        let output = serde_json::json!({
            "valid": report.is_valid(),
            "files": report.files,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for file in &report.files {
            match &file.error {
                None => println!(
                    "  {} {} {}",
                    style("✓").green(),
                    file.path.display(),
                    style(format!("({} documents)", file.documents)).dim()
                ),
                Some(error) => {
                    println!("  {} {}", style("✗").red().bold(), file.path.display());
                    println!("      {}", style(error).dim());
                }
            }
        }
        println!();
    }

    let failed = report.failures().count();
    if failed > 0 {
        return Err(CliError::Validation {
            failed,
            total: report.files.len(),
        });
    }

    if !json_output {
        println!("{} Validation passed!", style("✓").green().bold());
    }
    Ok(())
}
