//! Collaborator trait definitions.
//!
//! The engine only ever talks to its surroundings through these traits:
//! the catalog and status store are implemented by `proficio-store`, and
//! per-activity-type resolvers by `proficio-activities`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::model::{
    ActivityInfo, ActivityInstanceId, ActivitySignal, Competency, CompetencyId, CompletionState,
    Course, CourseId, Framework, FrameworkId, GradeSnapshot, StatusKey, StatusRecord, User, UserId,
};

// ---------------------------------------------------------------------------
// Activity resolver trait
// ---------------------------------------------------------------------------

/// Per-activity-type resolution of display names and completion/grade
/// signals.
///
/// One implementation exists per supported activity type; the registry maps
/// type tags to resolvers so call sites never grow conditional chains, and
/// unregistered types fall back to a generic resolver.
#[async_trait]
pub trait ActivityResolver: Send + Sync {
    /// The type tag this resolver handles (e.g. "quiz").
    fn type_tag(&self) -> &str;

    /// Human-readable display name for an activity of this type.
    fn display_name(&self, activity: &ActivityInfo) -> String;

    /// Completion state for one (activity, user) pair.
    async fn completion_state(
        &self,
        activity: &ActivityInfo,
        user: UserId,
    ) -> anyhow::Result<CompletionState>;

    /// Grade value/max for one (activity, user) pair, if this activity
    /// type is graded and a grade exists.
    async fn grade(
        &self,
        activity: &ActivityInfo,
        user: UserId,
    ) -> anyhow::Result<Option<GradeSnapshot>>;
}

// ---------------------------------------------------------------------------
// Store traits
// ---------------------------------------------------------------------------

/// Read-only catalog of frameworks, competencies, courses, users, and the
/// links between them.
pub trait CompetencyCatalog: Send + Sync {
    fn course(&self, id: CourseId) -> Option<Course>;
    fn user(&self, id: UserId) -> Option<User>;
    fn framework(&self, id: FrameworkId) -> Option<Framework>;
    fn competency(&self, id: CompetencyId) -> Option<Competency>;

    /// Competencies linked to a course. Unknown courses yield an empty vec.
    fn linked_competencies(&self, course: CourseId) -> Vec<CompetencyId>;

    /// Activities linked to a competency within a course. Unknown
    /// competency or course yields an empty vec.
    fn linked_activities(&self, competency: CompetencyId, course: CourseId) -> Vec<ActivityInfo>;

    fn course_exists(&self, id: CourseId) -> bool {
        self.course(id).is_some()
    }

    fn user_exists(&self, id: UserId) -> bool {
        self.user(id).is_some()
    }
}

/// Raw completion/grade signal rows, keyed by activity instance and user.
pub trait SignalSource: Send + Sync {
    /// Fetch the stored signal for one (activity, user) pair. `Ok(None)`
    /// means no signal was ever recorded; `Err` means the source itself
    /// failed and the caller should degrade rather than abort.
    fn signal(
        &self,
        instance: ActivityInstanceId,
        user: UserId,
    ) -> anyhow::Result<Option<ActivitySignal>>;
}

/// Everything the rating workflow writes, bundled so the store can apply
/// it in one atomic unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingUpdate {
    pub user: UserId,
    pub competency: CompetencyId,
    pub course: CourseId,
    /// Already validated against the framework scale.
    pub grade: u32,
    /// Already computed from the framework's threshold.
    pub proficient: bool,
    /// Note text for the evidence row; may be empty.
    pub note: String,
    pub rater: UserId,
}

/// Acknowledgement of an applied rating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingAck {
    pub user: UserId,
    pub competency: CompetencyId,
    pub course: CourseId,
    pub grade: u32,
    pub proficient: bool,
    pub evidence_id: u64,
    pub recorded_at: DateTime<Utc>,
}

/// The status/evidence store: the only mutable shared state in the engine.
pub trait StatusStore: Send + Sync {
    /// Course-scoped record for (user, competency, course), if any.
    fn course_record(
        &self,
        user: UserId,
        competency: CompetencyId,
        course: CourseId,
    ) -> Option<StatusRecord>;

    /// Global record for (user, competency), if any.
    fn global_record(&self, user: UserId, competency: CompetencyId) -> Option<StatusRecord>;

    /// All evidence rows attached to a status record, in storage order.
    /// Callers must sort by (timestamp, seq); storage order carries no
    /// recency guarantee.
    fn evidence_for(&self, key: &StatusKey) -> Vec<Evidence>;

    /// Upsert the course-scoped status record and append an evidence row
    /// as one atomic unit: either both are visible to subsequent reads or
    /// neither is.
    fn apply_rating(&self, update: RatingUpdate) -> Result<RatingAck, EngineError>;
}

// Re-exported here so store implementors only need `traits::*`.
pub use crate::model::Evidence;

// ---------------------------------------------------------------------------
// Enrollment and authorization collaborators
// ---------------------------------------------------------------------------

/// Enrollment/roster collaborator.
pub trait EnrollmentProvider: Send + Sync {
    fn is_enrolled(&self, user: UserId, course: CourseId) -> bool;

    /// Enrolled users for a course, for multi-student views.
    fn roster(&self, course: CourseId) -> Vec<UserId>;
}

/// Capabilities gating engine operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Read competency reports for any student in the course.
    ViewReports,
    /// Submit authoritative ratings (course-management capability).
    RateCompetencies,
}

/// Authorization collaborator.
pub trait Authorizer: Send + Sync {
    fn allows(&self, user: UserId, capability: Capability, course: CourseId) -> bool;
}
