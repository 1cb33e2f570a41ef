//! Rating workflow: an instructor's authoritative rating reconciling the
//! automatic signals with manual judgment.
//!
//! Validation happens entirely before the store is touched; the store then
//! applies the status upsert and evidence append as one atomic unit.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::model::{CompetencyId, CourseId, UserId};
use crate::traits::{CompetencyCatalog, RatingAck, RatingUpdate, StatusStore};

/// An instructor's rating submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingRequest {
    pub user: UserId,
    pub competency: CompetencyId,
    pub course: CourseId,
    /// 1-based grade on the competency framework's scale.
    pub grade: u32,
    /// Optional comment; an empty or absent comment still leaves an
    /// evidence row so the audit trail records every rating change.
    #[serde(default)]
    pub comment: Option<String>,
    pub rater: UserId,
}

/// Validate and apply a rating.
///
/// Out-of-range grades fail with `Validation` and mutate nothing; missing
/// entities fail with `NotFound`. Concurrent submissions for the same
/// triple are last-write-wins, but each submission's upsert-plus-append
/// pair is atomic.
pub fn submit_rating(
    store: &dyn StatusStore,
    catalog: &dyn CompetencyCatalog,
    request: &RatingRequest,
) -> Result<RatingAck, EngineError> {
    if !catalog.course_exists(request.course) {
        return Err(EngineError::course_not_found(request.course));
    }
    if !catalog.user_exists(request.user) {
        return Err(EngineError::user_not_found(request.user));
    }
    if !catalog.user_exists(request.rater) {
        return Err(EngineError::user_not_found(request.rater));
    }
    let competency = catalog
        .competency(request.competency)
        .ok_or_else(|| EngineError::competency_not_found(request.competency))?;
    let framework = catalog
        .framework(competency.framework)
        .ok_or_else(|| EngineError::framework_not_found(competency.framework))?;

    let scale_len = framework.scale.len() as u32;
    if request.grade < 1 || request.grade > scale_len {
        return Err(EngineError::Validation(format!(
            "grade {} is out of range for scale '{}'; valid range is 1..={scale_len}",
            request.grade, framework.shortname
        )));
    }

    // Proficiency comes from the framework's configured threshold, not a
    // hardcoded magic grade.
    let proficient = framework.is_proficient(request.grade);

    let ack = store.apply_rating(RatingUpdate {
        user: request.user,
        competency: request.competency,
        course: request.course,
        grade: request.grade,
        proficient,
        note: request.comment.clone().unwrap_or_default(),
        rater: request.rater,
    })?;

    tracing::info!(
        "rating recorded: user {} competency {} course {} grade {} (proficient: {})",
        ack.user,
        ack.competency,
        ack.course,
        ack.grade,
        ack.proficient
    );

    Ok(ack)
}
