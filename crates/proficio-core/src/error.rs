//! Engine error taxonomy.
//!
//! These errors cross the API boundary with actionable messages. Per-activity
//! signal failures are deliberately absent: the evidence aggregator absorbs
//! them into flagged report entries instead of failing the whole report.

use thiserror::Error;

use crate::model::{CompetencyId, CourseId, FrameworkId, UserId};

/// The kind of entity a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Course,
    Competency,
    Framework,
    User,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Course => write!(f, "course"),
            EntityKind::Competency => write!(f, "competency"),
            EntityKind::Framework => write!(f, "framework"),
            EntityKind::User => write!(f, "user"),
        }
    }
}

/// Errors returned by the competency progress engine.
///
/// There is intentionally no conflict variant: concurrent ratings on the
/// same triple are last-write-wins.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A submitted value failed validation; no state was mutated.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: u64 },

    /// The caller lacks the capability (or a valid session/token) for the
    /// requested operation; no state was mutated.
    #[error("not authorized: {0}")]
    Authorization(String),
}

impl EngineError {
    pub fn course_not_found(id: CourseId) -> Self {
        EngineError::NotFound {
            kind: EntityKind::Course,
            id,
        }
    }

    pub fn competency_not_found(id: CompetencyId) -> Self {
        EngineError::NotFound {
            kind: EntityKind::Competency,
            id,
        }
    }

    pub fn framework_not_found(id: FrameworkId) -> Self {
        EngineError::NotFound {
            kind: EntityKind::Framework,
            id,
        }
    }

    pub fn user_not_found(id: UserId) -> Self {
        EngineError::NotFound {
            kind: EntityKind::User,
            id,
        }
    }

    /// Returns `true` for errors that should map to a 4xx-style rejection
    /// rather than an internal fault.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            EngineError::Validation(_) | EngineError::Authorization(_)
        )
    }
}
