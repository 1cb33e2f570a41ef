//! The `proficio overview` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use proficio_core::model::{CourseId, UserId};
use proficio_core::parser::parse_dataset;

pub fn execute(dataset_path: PathBuf, course: CourseId, acting_user: UserId) -> Result<()> {
    let dataset = parse_dataset(&dataset_path)?;
    let (_, service) = super::open_service(&dataset);

    let session = service.login(acting_user)?;
    let overview = service.course_overview(&session.context(), course)?;

    println!(
        "Course {} ({} students, {} competencies)\n",
        overview.course.shortname,
        overview.rows.len(),
        overview.competencies.len()
    );

    let mut table = Table::new();
    let mut header = vec![Cell::new("Student")];
    header.extend(
        overview
            .competencies
            .iter()
            .map(|c| Cell::new(&c.shortname)),
    );
    table.set_header(header);

    for row in &overview.rows {
        let mut cells = vec![Cell::new(&row.student.name)];
        for status in &row.statuses {
            let text = match status.grade {
                Some(grade) => format!("{} ({grade})", status.label),
                None => status.label.clone(),
            };
            cells.push(Cell::new(text));
        }
        table.add_row(cells);
    }

    println!("{table}");
    Ok(())
}
