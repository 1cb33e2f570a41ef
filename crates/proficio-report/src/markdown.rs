//! Markdown rendering.
//!
//! Plain GitHub-flavored Markdown, suitable for terminals and paste-into-docs.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;

use proficio_core::evidence::EvidenceReport;
use proficio_core::forest::FrameworkBundle;
use proficio_core::model::StatusSource;

fn source_label(source: StatusSource) -> &'static str {
    match source {
        StatusSource::CourseScoped => "course-scoped",
        StatusSource::Global => "global",
        StatusSource::None => "no record",
    }
}

/// Render an evidence report as Markdown.
pub fn render_report(report: &EvidenceReport) -> String {
    let mut md = String::new();

    let _ = writeln!(
        md,
        "# Evidence report: user {} / competency {} / course {}",
        report.user, report.competency, report.course
    );
    let _ = writeln!(
        md,
        "\nGenerated {} (report {})",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.id
    );

    let status = &report.current_status;
    let _ = writeln!(md, "\n## Current status\n");
    let _ = writeln!(md, "- Label: **{}**", status.label);
    match status.grade {
        Some(grade) => {
            let _ = writeln!(md, "- Grade: {grade}");
        }
        None => {
            let _ = writeln!(md, "- Grade: none recorded");
        }
    }
    let _ = writeln!(
        md,
        "- Proficient: {}",
        if status.proficient { "yes" } else { "no" }
    );
    let _ = writeln!(md, "- Source: {}", source_label(status.source));

    let _ = writeln!(md, "\n## Linked activities\n");
    if report.activity_evidence.is_empty() {
        let _ = writeln!(md, "_No activities are linked to this competency._");
    } else {
        let _ = writeln!(md, "| Activity | Completion | Grade | Notes |");
        let _ = writeln!(md, "|----------|------------|-------|-------|");
        for entry in &report.activity_evidence {
            let grade = entry
                .grade
                .map(|g| format!("{:.1}/{:.1}", g.value, g.max))
                .unwrap_or_else(|| "-".into());
            let remark = entry
                .resolution_error
                .as_deref()
                .map(|e| format!("unavailable: {e}"))
                .unwrap_or_default();
            let _ = writeln!(
                md,
                "| {} | {} | {} | {} |",
                entry.activity.display_name, entry.completion, grade, remark
            );
        }
    }

    let _ = writeln!(md, "\n## Rating notes\n");
    if report.notes_log.is_empty() {
        let _ = writeln!(md, "_No rating notes on record._");
    } else {
        for note in &report.notes_log {
            let _ = writeln!(
                md,
                "- {} (rater {}): {}",
                note.timestamp.format("%Y-%m-%d %H:%M"),
                note.author,
                note.text
            );
        }
    }

    md
}

/// Render a course forest as nested Markdown lists, one section per
/// framework.
pub fn render_forest(bundles: &[FrameworkBundle]) -> String {
    let mut md = String::new();

    if bundles.is_empty() {
        let _ = writeln!(md, "_No competencies are linked to this course._");
        return md;
    }

    for bundle in bundles {
        let _ = writeln!(
            md,
            "## {} (framework {}, {}-step scale)\n",
            bundle.framework.shortname,
            bundle.framework.id,
            bundle.framework.scale.0.len()
        );
        for (depth, node) in bundle.walk() {
            let _ = writeln!(
                md,
                "{}- {} ({})",
                "  ".repeat(depth),
                node.shortname,
                node.id
            );
        }
        let _ = writeln!(md);
    }

    md
}

/// Write a Markdown report to a file.
pub fn write_markdown_report(report: &EvidenceReport, path: &Path) -> Result<()> {
    let md = render_report(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, md)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{sample_bundle, sample_report};

    #[test]
    fn report_markdown_contains_status_and_activities() {
        let md = render_report(&sample_report());

        assert!(md.contains("# Evidence report: user 5 / competency 10 / course 2"));
        assert!(md.contains("- Label: **Competent**"));
        assert!(md.contains("- Source: course-scoped"));
        assert!(md.contains("| Quiz: Fractions | complete | 8.0/10.0 |"));
        assert!(md.contains("unavailable: backend offline"));
        assert!(md.contains("Great work"));
    }

    #[test]
    fn forest_markdown_indents_children() {
        let md = render_forest(&[sample_bundle()]);

        assert!(md.contains("## literacy (framework 1, 3-step scale)"));
        assert!(md.contains("\n- reading (10)"));
        assert!(md.contains("\n  - analysis (11)"));
    }

    #[test]
    fn empty_forest_says_so() {
        let md = render_forest(&[]);
        assert!(md.contains("No competencies"));
    }

    #[test]
    fn markdown_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");

        write_markdown_report(&sample_report(), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Evidence report"));
    }
}
