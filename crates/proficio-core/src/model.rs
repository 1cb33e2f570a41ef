//! Core data model types for proficio.
//!
//! These are the fundamental types the entire proficio system uses to
//! represent frameworks, competencies, scales, activities, and the
//! status/evidence records that track a student's progress.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier aliases. All entities are keyed by positive integers; `0` is
/// reserved as the "no parent" marker in imported data and never names a
/// real entity.
pub type FrameworkId = u64;
pub type CompetencyId = u64;
pub type CourseId = u64;
pub type UserId = u64;
pub type ActivityInstanceId = u64;

/// Canonical bucket key for root competencies in a forest.
pub const ROOT_PARENT_KEY: CompetencyId = 0;

/// An ordered list of grade labels attached to a framework.
///
/// Grades are 1-based indexes into the label list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scale(pub Vec<String>);

impl Scale {
    /// Label shown when a status record carries a grade outside the scale.
    pub const UNKNOWN_LABEL: &'static str = "Unknown";

    /// Label shown when no graded status record exists at all.
    pub const NOT_YET_COMPETENT: &'static str = "Not Yet Competent";

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolve a 1-based grade to its label.
    ///
    /// Grades outside `[1, len]` resolve to [`Scale::UNKNOWN_LABEL`] rather
    /// than faulting; stored grades can outlive a shrunk scale.
    pub fn label_for(&self, grade: u32) -> &str {
        if grade == 0 {
            return Self::UNKNOWN_LABEL;
        }
        self.0
            .get(grade as usize - 1)
            .map(String::as_str)
            .unwrap_or(Self::UNKNOWN_LABEL)
    }
}

/// A named collection of competencies organized into one or more trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Framework {
    pub id: FrameworkId,
    pub shortname: String,
    #[serde(default)]
    pub idnumber: String,
    /// Grade labels used by every competency in this framework.
    pub scale: Scale,
    /// 1-based minimum grade considered proficient. Configured per
    /// framework; there is no global magic threshold.
    pub proficiency_threshold: u32,
}

impl Framework {
    /// Whether a grade on this framework's scale counts as proficient.
    pub fn is_proficient(&self, grade: u32) -> bool {
        grade >= self.proficiency_threshold
    }
}

/// A gradable skill/outcome node, optionally nested under a parent within
/// the same framework.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competency {
    pub id: CompetencyId,
    pub shortname: String,
    #[serde(default)]
    pub idnumber: String,
    #[serde(default)]
    pub description: String,
    /// `None` for root competencies. Imported data encodes "no parent" as
    /// either an absent field or an explicit `0`; both are normalized to
    /// `None` at ingestion via [`Competency::normalize_parent`].
    #[serde(default)]
    pub parent: Option<CompetencyId>,
    pub framework: FrameworkId,
}

impl Competency {
    /// Collapse the two "no parent" encodings (absent and explicit zero)
    /// into one canonical `None`.
    pub fn normalize_parent(raw: Option<CompetencyId>) -> Option<CompetencyId> {
        match raw {
            None | Some(0) => None,
            some => some,
        }
    }

    /// The canonical bucket key this node files under in a forest:
    /// its parent id, or [`ROOT_PARENT_KEY`] for roots.
    pub fn parent_key(&self) -> CompetencyId {
        self.parent.unwrap_or(ROOT_PARENT_KEY)
    }
}

/// A course known to the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub shortname: String,
}

/// A user known to the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

/// Completion state reported by the activity subsystem for one
/// (activity, user) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionState {
    NotStarted,
    InProgress,
    Complete,
}

impl fmt::Display for CompletionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionState::NotStarted => write!(f, "not started"),
            CompletionState::InProgress => write!(f, "in progress"),
            CompletionState::Complete => write!(f, "complete"),
        }
    }
}

impl FromStr for CompletionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace([' ', '-'], "_").as_str() {
            "not_started" | "notstarted" => Ok(CompletionState::NotStarted),
            "in_progress" | "inprogress" => Ok(CompletionState::InProgress),
            "complete" | "completed" => Ok(CompletionState::Complete),
            other => Err(format!("unknown completion state: {other}")),
        }
    }
}

/// A raw grade value captured from a graded activity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeSnapshot {
    pub value: f64,
    pub max: f64,
}

/// Read-only signal obtained from the activity subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivitySignal {
    pub completion: CompletionState,
    #[serde(default)]
    pub grade: Option<GradeSnapshot>,
}

/// An activity instance as the catalog knows it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityInfo {
    pub id: ActivityInstanceId,
    /// Type tag, e.g. `"quiz"` or `"assignment"`. Unregistered tags are
    /// handled by a generic fallback resolver rather than erroring.
    #[serde(rename = "type")]
    pub type_tag: String,
    pub name: String,
    pub course: CourseId,
    #[serde(default)]
    pub ordering: u32,
}

/// A resolved reference to an evidence-source activity, ready for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRef {
    pub id: ActivityInstanceId,
    pub type_tag: String,
    pub display_name: String,
    pub ordering_hint: u32,
}

/// Key of a status record. Course-scoped records are authoritative over
/// global ones for that course's views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum StatusKey {
    Course {
        user: UserId,
        competency: CompetencyId,
        course: CourseId,
    },
    Global {
        user: UserId,
        competency: CompetencyId,
    },
}

impl StatusKey {
    pub fn user(&self) -> UserId {
        match self {
            StatusKey::Course { user, .. } | StatusKey::Global { user, .. } => *user,
        }
    }

    pub fn competency(&self) -> CompetencyId {
        match self {
            StatusKey::Course { competency, .. } | StatusKey::Global { competency, .. } => {
                *competency
            }
        }
    }
}

/// A student's recorded status for one competency, in one tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// 1-based index into the framework scale, if graded.
    #[serde(default)]
    pub grade: Option<u32>,
    /// Independent flag set by the rating workflow from the framework's
    /// configured threshold; never recomputed from the grade on read.
    #[serde(default)]
    pub proficient: bool,
    pub updated_at: DateTime<Utc>,
}

/// An immutable, timestamped note supporting a status record.
///
/// Evidence is append-only: rows are never edited or deleted, so the full
/// history of rating changes stays auditable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub id: u64,
    pub key: StatusKey,
    /// Note text; may be empty (a rating with no comment still leaves a row).
    pub note: String,
    pub rater: UserId,
    pub created_at: DateTime<Utc>,
    /// Insertion sequence, the tiebreaker when timestamps collide.
    pub seq: u64,
}

/// Which tier a resolved status came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusSource {
    CourseScoped,
    Global,
    None,
}

/// Derived display state. These are labels, not enforced transitions:
/// a later rating with a lower grade simply overwrites the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayState {
    Competent,
    InProgress,
    NotYetCompetent,
}

impl fmt::Display for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayState::Competent => write!(f, "competent"),
            DisplayState::InProgress => write!(f, "in progress"),
            DisplayState::NotYetCompetent => write!(f, "not yet competent"),
        }
    }
}

/// The authoritative status for a (student, competency, course) triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub grade: Option<u32>,
    pub label: String,
    pub proficient: bool,
    pub source: StatusSource,
    pub display: DisplayState,
}
