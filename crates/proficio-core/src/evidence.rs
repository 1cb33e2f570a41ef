//! Evidence aggregator.
//!
//! Joins the activity link index with per-activity completion/grade signals
//! and the chosen status record's note log into one report. A single
//! activity failing to resolve flags that entry; it never aborts the whole
//! report.

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::index::ActivityIndex;
use crate::model::{
    ActivityRef, CompetencyId, CompletionState, CourseId, GradeSnapshot, Status, UserId,
};
use crate::status::{pick_status_record, status_from_record};
use crate::traits::{CompetencyCatalog, StatusStore};

/// One activity's contribution to an evidence report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvidence {
    pub activity: ActivityRef,
    pub completion: CompletionState,
    #[serde(default)]
    pub grade: Option<GradeSnapshot>,
    /// Set when this activity's signals could not be resolved. The entry is
    /// still present, with completion reported as not started.
    #[serde(default)]
    pub resolution_error: Option<String>,
}

/// A note from the evidence log, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteEntry {
    pub author: UserId,
    pub timestamp: DateTime<Utc>,
    pub text: String,
}

/// The full evidence report for a (student, competency, course) triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceReport {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub user: UserId,
    pub competency: CompetencyId,
    pub course: CourseId,
    pub current_status: Status,
    pub activity_evidence: Vec<ActivityEvidence>,
    /// Notes attached to the same status tier the current status came
    /// from, ordered by (timestamp desc, insertion order desc).
    pub notes_log: Vec<NoteEntry>,
}

impl EvidenceReport {
    /// Save the report as pretty JSON.
    pub fn save_json(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        serde_json::from_str(&content).context("failed to parse report JSON")
    }
}

/// Build the evidence report for a triple.
///
/// Reads only; calling it twice with no intervening rating returns the same
/// content (the report id and generation timestamp aside).
pub async fn build_evidence_report(
    store: &dyn StatusStore,
    catalog: &dyn CompetencyCatalog,
    index: &ActivityIndex,
    user: UserId,
    competency: CompetencyId,
    course: CourseId,
) -> Result<EvidenceReport, EngineError> {
    if !catalog.course_exists(course) {
        return Err(EngineError::course_not_found(course));
    }
    if !catalog.user_exists(user) {
        return Err(EngineError::user_not_found(user));
    }
    let node = catalog
        .competency(competency)
        .ok_or_else(|| EngineError::competency_not_found(competency))?;
    let framework = catalog
        .framework(node.framework)
        .ok_or_else(|| EngineError::framework_not_found(node.framework))?;

    // One tier pick drives both the displayed status and the notes log.
    let picked = pick_status_record(store, user, competency, course);
    let notes_log = picked
        .as_ref()
        .map(|(key, _, _)| {
            let mut rows = store.evidence_for(key);
            rows.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b.seq.cmp(&a.seq))
            });
            rows.into_iter()
                .map(|e| NoteEntry {
                    author: e.rater,
                    timestamp: e.created_at,
                    text: e.note,
                })
                .collect()
        })
        .unwrap_or_default();
    let current_status = status_from_record(&framework.scale, picked);

    let linked = index.linked_with_info(competency, course);
    let mut slots: Vec<Option<ActivityEvidence>> = vec![None; linked.len()];
    let mut futures = FuturesUnordered::new();

    for (position, (reference, info)) in linked.into_iter().enumerate() {
        let resolver = index.registry().resolver_for(&info.type_tag);
        futures.push(async move {
            let signals = async {
                let completion = resolver.completion_state(&info, user).await?;
                let grade = resolver.grade(&info, user).await?;
                anyhow::Ok((completion, grade))
            }
            .await;
            (position, reference, signals)
        });
    }

    while let Some((position, activity, signals)) = futures.next().await {
        let entry = match signals {
            Ok((completion, grade)) => ActivityEvidence {
                activity,
                completion,
                grade,
                resolution_error: None,
            },
            Err(e) => {
                // Partial-failure isolation: flag the entry, keep the report.
                tracing::warn!(
                    "signal resolution failed for activity {} (user {user}): {e:#}",
                    activity.id
                );
                ActivityEvidence {
                    activity,
                    completion: CompletionState::NotStarted,
                    grade: None,
                    resolution_error: Some(format!("{e:#}")),
                }
            }
        };
        slots[position] = Some(entry);
    }

    let activity_evidence = slots.into_iter().flatten().collect();

    Ok(EvidenceReport {
        id: Uuid::new_v4(),
        generated_at: Utc::now(),
        user,
        competency,
        course,
        current_status,
        activity_evidence,
        notes_log,
    })
}
