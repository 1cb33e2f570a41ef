//! The `proficio validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(dataset_path: PathBuf) -> Result<()> {
    let dataset = proficio_core::parser::parse_dataset(&dataset_path)?;

    println!(
        "Dataset: {} ({} frameworks, {} competencies, {} courses)",
        dataset.dataset.name,
        dataset.frameworks.len(),
        dataset.competencies.len(),
        dataset.courses.len()
    );

    let warnings = proficio_core::parser::validate_dataset(&dataset);
    for w in &warnings {
        println!("  [{}] WARNING: {}", w.location, w.message);
    }

    if warnings.is_empty() {
        println!("Dataset valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
