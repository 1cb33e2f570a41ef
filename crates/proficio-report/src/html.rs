//! HTML report generator.
//!
//! Produces a self-contained HTML page with all CSS inlined.

use anyhow::Result;
use std::path::Path;

use proficio_core::evidence::EvidenceReport;
use proficio_core::model::StatusSource;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML page from an evidence report.
pub fn generate_html(report: &EvidenceReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>Evidence report — user {} / competency {}</title>\n",
        report.user, report.competency
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>Evidence report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">User <strong>{}</strong> | competency {} | course {} | {}</p>\n",
        report.user,
        report.competency,
        report.course,
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Status card
    let status = &report.current_status;
    let status_class = if status.proficient { "pass" } else { "fail" };
    let source = match status.source {
        StatusSource::CourseScoped => "course-scoped record",
        StatusSource::Global => "global record",
        StatusSource::None => "no record on file",
    };
    html.push_str("<section class=\"status\">\n");
    html.push_str("<h2>Current status</h2>\n");
    html.push_str(&format!(
        "<p class=\"badge {}\">{}</p>\n",
        status_class,
        html_escape(&status.label)
    ));
    html.push_str(&format!(
        "<p class=\"meta\">Grade: {} | proficient: {} | source: {}</p>\n",
        status
            .grade
            .map(|g| g.to_string())
            .unwrap_or_else(|| "-".into()),
        if status.proficient { "yes" } else { "no" },
        source
    ));
    html.push_str("</section>\n");

    // Activity table
    html.push_str("<section class=\"activities\">\n");
    html.push_str("<h2>Linked activities</h2>\n");
    html.push_str("<table>\n");
    html.push_str(
        "<thead><tr><th>Activity</th><th>Completion</th><th>Grade</th><th>Notes</th></tr></thead>\n",
    );
    html.push_str("<tbody>\n");
    for entry in &report.activity_evidence {
        let row_class = match (&entry.resolution_error, entry.completion) {
            (Some(_), _) => "fail",
            (None, proficio_core::model::CompletionState::Complete) => "pass",
            _ => "",
        };
        let grade = entry
            .grade
            .map(|g| format!("{:.1}/{:.1}", g.value, g.max))
            .unwrap_or_else(|| "-".into());
        let remark = entry
            .resolution_error
            .as_deref()
            .map(|e| format!("unavailable: {}", html_escape(e)))
            .unwrap_or_default();
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            row_class,
            html_escape(&entry.activity.display_name),
            entry.completion,
            grade,
            remark
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Notes log
    html.push_str("<section class=\"notes\">\n");
    html.push_str("<h2>Rating notes</h2>\n");
    if report.notes_log.is_empty() {
        html.push_str("<p class=\"meta\">No rating notes on record.</p>\n");
    } else {
        html.push_str("<ul>\n");
        for note in &report.notes_log {
            html.push_str(&format!(
                "<li><span class=\"meta\">{} (rater {})</span> {}</li>\n",
                note.timestamp.format("%Y-%m-%d %H:%M"),
                note.author,
                html_escape(&note.text)
            ));
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(report)
            .unwrap_or_default()
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &EvidenceReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.badge { display: inline-block; padding: 0.25rem 0.75rem; border-radius: 6px; font-weight: bold; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::sample_report;

    #[test]
    fn html_report_contains_required_elements() {
        let html = generate_html(&sample_report());

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Quiz: Fractions"));
        assert!(html.contains("Competent"));
        assert!(html.contains("Great work"));
        assert!(html.contains("unavailable: backend offline"));
    }

    #[test]
    fn html_escapes_note_text() {
        let mut report = sample_report();
        report.notes_log[0].text = "<script>alert(1)</script>".into();
        let html = generate_html(&report);
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn html_report_write_to_file() {
        let report = sample_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");

        write_html_report(&report, &path).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
