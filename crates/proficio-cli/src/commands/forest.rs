//! The `proficio forest` command.

use std::path::PathBuf;

use anyhow::{bail, Result};

use proficio_core::model::{CourseId, UserId};
use proficio_core::parser::parse_dataset;

pub fn execute(
    dataset_path: PathBuf,
    course: CourseId,
    acting_user: UserId,
    format: String,
) -> Result<()> {
    let dataset = parse_dataset(&dataset_path)?;
    let (_, service) = super::open_service(&dataset);

    let session = service.login(acting_user)?;
    let bundles = service.forest(&session.context(), course)?;

    match format.as_str() {
        "markdown" | "md" => print!("{}", proficio_report::markdown::render_forest(&bundles)),
        "json" => println!("{}", serde_json::to_string_pretty(&bundles)?),
        other => bail!("unknown format '{other}' (expected markdown or json)"),
    }
    Ok(())
}
