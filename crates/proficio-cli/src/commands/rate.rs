//! The `proficio rate` command.
//!
//! Submits the rating through the service (session plus anti-forgery token,
//! same path a web consumer would take) and persists the resulting status
//! and evidence rows back into the dataset file.

use std::path::PathBuf;

use anyhow::Result;

use proficio_core::model::{CompetencyId, CourseId, Evidence, StatusKey, StatusRecord, UserId};
use proficio_core::parser::{parse_dataset, save_dataset, EvidenceRow, Scope, StatusRow};
use proficio_core::service::RatingSubmission;

pub fn execute(
    dataset_path: PathBuf,
    user: UserId,
    competency: CompetencyId,
    course: CourseId,
    grade: u32,
    comment: Option<String>,
    acting_user: UserId,
) -> Result<()> {
    let mut dataset = parse_dataset(&dataset_path)?;
    let (store, service) = super::open_service(&dataset);

    let session = service.login(acting_user)?;
    let ack = service.submit_rating(
        &session.context(),
        &RatingSubmission {
            user,
            competency,
            course,
            grade,
            comment,
        },
    )?;

    println!(
        "Recorded grade {} for user {} on competency {} in course {} (proficient: {}).",
        ack.grade,
        ack.user,
        ack.competency,
        ack.course,
        if ack.proficient { "yes" } else { "no" }
    );

    dataset.statuses = store
        .snapshot_statuses()
        .into_iter()
        .map(|(key, record)| status_row(key, record))
        .collect();
    dataset.evidence = store
        .snapshot_evidence()
        .into_iter()
        .map(evidence_row)
        .collect();
    save_dataset(&dataset_path, &dataset)?;
    tracing::info!(
        "persisted {} status row(s) and {} evidence row(s) to {}",
        dataset.statuses.len(),
        dataset.evidence.len(),
        dataset_path.display()
    );
    println!("Updated {}.", dataset_path.display());

    Ok(())
}

fn scope_of(key: StatusKey) -> (Scope, Option<CourseId>) {
    match key {
        StatusKey::Course { course, .. } => (Scope::Course, Some(course)),
        StatusKey::Global { .. } => (Scope::Global, None),
    }
}

fn status_row(key: StatusKey, record: StatusRecord) -> StatusRow {
    let (scope, course) = scope_of(key);
    StatusRow {
        user: key.user(),
        competency: key.competency(),
        scope,
        course,
        grade: record.grade,
        proficient: record.proficient,
        updated_at: Some(record.updated_at),
    }
}

fn evidence_row(evidence: Evidence) -> EvidenceRow {
    let (scope, course) = scope_of(evidence.key);
    EvidenceRow {
        user: evidence.key.user(),
        competency: evidence.key.competency(),
        scope,
        course,
        note: evidence.note,
        rater: evidence.rater,
        created_at: Some(evidence.created_at),
    }
}
