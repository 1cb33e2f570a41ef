//! The `proficio report` command.

use std::path::PathBuf;

use anyhow::{bail, Result};

use proficio_core::model::{CompetencyId, CourseId, UserId};
use proficio_core::parser::parse_dataset;
use proficio_report::{html, markdown};

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    dataset_path: PathBuf,
    user: UserId,
    competency: CompetencyId,
    course: CourseId,
    acting_user: UserId,
    format: String,
    output: Option<PathBuf>,
) -> Result<()> {
    let dataset = parse_dataset(&dataset_path)?;
    let (_, service) = super::open_service(&dataset);

    let session = service.login(acting_user)?;
    let report = service
        .evidence_report(&session.context(), user, competency, course)
        .await?;

    match format.as_str() {
        "markdown" | "md" => {
            let md = markdown::render_report(&report);
            match output {
                Some(path) => std::fs::write(&path, md)?,
                None => print!("{md}"),
            }
        }
        "json" => match output {
            Some(path) => report.save_json(&path)?,
            None => println!("{}", serde_json::to_string_pretty(&report)?),
        },
        "html" => match output {
            Some(path) => html::write_html_report(&report, &path)?,
            None => println!("{}", html::generate_html(&report)),
        },
        other => bail!("unknown format '{other}' (expected markdown, json, or html)"),
    }

    Ok(())
}
