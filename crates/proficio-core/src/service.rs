//! Exposed service facade.
//!
//! Bundles the stores, registry, and collaborator traits behind the three
//! consumer-facing operations (forest, evidence report, rating submission)
//! plus the roster overview. The rating path requires an authenticated
//! session and a matching anti-forgery token before any state is touched.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::evidence::{build_evidence_report, EvidenceReport};
use crate::forest::{build_course_forest, FrameworkBundle};
use crate::index::ActivityIndex;
use crate::model::{Competency, CompetencyId, Course, CourseId, Status, User, UserId};
use crate::rating::{submit_rating, RatingRequest};
use crate::registry::ActivityRegistry;
use crate::status::resolve_status;
use crate::traits::{
    Authorizer, Capability, CompetencyCatalog, EnrollmentProvider, RatingAck, StatusStore,
};

/// An authenticated session with its anti-forgery token.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub session: Uuid,
    pub csrf: Uuid,
    pub user: UserId,
}

impl SessionHandle {
    pub fn context(&self) -> RequestContext {
        RequestContext {
            session: self.session,
            csrf: Some(self.csrf),
        }
    }

    /// A context with the anti-forgery token stripped, as a forged or
    /// stale request would present.
    pub fn context_without_csrf(&self) -> RequestContext {
        RequestContext {
            session: self.session,
            csrf: None,
        }
    }
}

/// What a caller presents with each request.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    pub session: Uuid,
    /// Anti-forgery token; only checked on mutating operations.
    pub csrf: Option<Uuid>,
}

/// Issues and checks sessions. Tokens are per-session v4 UUIDs.
#[derive(Default)]
pub struct SessionManager {
    sessions: Mutex<HashMap<Uuid, SessionHandle>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login(&self, user: UserId) -> SessionHandle {
        let handle = SessionHandle {
            session: Uuid::new_v4(),
            csrf: Uuid::new_v4(),
            user,
        };
        self.sessions
            .lock()
            .expect("session map poisoned")
            .insert(handle.session, handle.clone());
        handle
    }

    /// Resolve the calling user; the anti-forgery token is not consulted.
    pub fn authenticate(&self, ctx: &RequestContext) -> Result<UserId, EngineError> {
        self.sessions
            .lock()
            .expect("session map poisoned")
            .get(&ctx.session)
            .map(|h| h.user)
            .ok_or_else(|| EngineError::Authorization("no authenticated session".into()))
    }

    /// Resolve the calling user and require a matching anti-forgery token.
    pub fn verify(&self, ctx: &RequestContext) -> Result<UserId, EngineError> {
        let sessions = self.sessions.lock().expect("session map poisoned");
        let handle = sessions
            .get(&ctx.session)
            .ok_or_else(|| EngineError::Authorization("no authenticated session".into()))?;
        match ctx.csrf {
            Some(token) if token == handle.csrf => Ok(handle.user),
            Some(_) => Err(EngineError::Authorization(
                "invalid anti-forgery token".into(),
            )),
            None => Err(EngineError::Authorization(
                "missing anti-forgery token".into(),
            )),
        }
    }
}

/// A rating submission as received from the consumer; the rater identity
/// comes from the session, never from the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingSubmission {
    pub user: UserId,
    pub competency: CompetencyId,
    pub course: CourseId,
    pub grade: u32,
    #[serde(default)]
    pub comment: Option<String>,
}

/// One student's row in a course overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewRow {
    pub student: User,
    /// One status per overview competency, same order.
    pub statuses: Vec<Status>,
}

/// The multi-student view: every enrolled student against every linked
/// competency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseOverview {
    pub course: Course,
    pub competencies: Vec<Competency>,
    pub rows: Vec<OverviewRow>,
}

/// The competency progress engine's consumer-facing surface.
pub struct CompetencyService {
    catalog: Arc<dyn CompetencyCatalog>,
    statuses: Arc<dyn StatusStore>,
    index: ActivityIndex,
    enrollment: Arc<dyn EnrollmentProvider>,
    authorizer: Arc<dyn Authorizer>,
    sessions: SessionManager,
}

impl CompetencyService {
    pub fn new(
        catalog: Arc<dyn CompetencyCatalog>,
        statuses: Arc<dyn StatusStore>,
        registry: Arc<ActivityRegistry>,
        enrollment: Arc<dyn EnrollmentProvider>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        let index = ActivityIndex::new(Arc::clone(&catalog), registry);
        Self {
            catalog,
            statuses,
            index,
            enrollment,
            authorizer,
            sessions: SessionManager::new(),
        }
    }

    /// Open a session for a known user.
    pub fn login(&self, user: UserId) -> Result<SessionHandle, EngineError> {
        if !self.catalog.user_exists(user) {
            return Err(EngineError::user_not_found(user));
        }
        Ok(self.sessions.login(user))
    }

    /// Whether a caller may read reports in a course: holders of the
    /// view capability, or anyone enrolled (for their own data).
    fn check_read(
        &self,
        caller: UserId,
        subject: UserId,
        course: CourseId,
    ) -> Result<(), EngineError> {
        if self.authorizer.allows(caller, Capability::ViewReports, course) {
            return Ok(());
        }
        if caller == subject && self.enrollment.is_enrolled(caller, course) {
            return Ok(());
        }
        Err(EngineError::Authorization(format!(
            "user {caller} may not view reports for user {subject} in course {course}"
        )))
    }

    /// `GET forest(courseId)`.
    pub fn forest(
        &self,
        ctx: &RequestContext,
        course: CourseId,
    ) -> Result<Vec<FrameworkBundle>, EngineError> {
        let caller = self.sessions.authenticate(ctx)?;
        self.check_read(caller, caller, course)?;
        build_course_forest(self.catalog.as_ref(), course)
    }

    /// `GET evidenceReport(userId, competencyId, courseId)`.
    pub async fn evidence_report(
        &self,
        ctx: &RequestContext,
        user: UserId,
        competency: CompetencyId,
        course: CourseId,
    ) -> Result<EvidenceReport, EngineError> {
        let caller = self.sessions.authenticate(ctx)?;
        self.check_read(caller, user, course)?;
        build_evidence_report(
            self.statuses.as_ref(),
            self.catalog.as_ref(),
            &self.index,
            user,
            competency,
            course,
        )
        .await
    }

    /// `POST rating(...)`.
    ///
    /// The anti-forgery token is checked before anything else; a rejected
    /// submission leaves all state unchanged.
    pub fn submit_rating(
        &self,
        ctx: &RequestContext,
        submission: &RatingSubmission,
    ) -> Result<RatingAck, EngineError> {
        let rater = self.sessions.verify(ctx)?;
        if !self
            .authorizer
            .allows(rater, Capability::RateCompetencies, submission.course)
        {
            return Err(EngineError::Authorization(format!(
                "user {rater} may not rate competencies in course {}",
                submission.course
            )));
        }

        submit_rating(
            self.statuses.as_ref(),
            self.catalog.as_ref(),
            &RatingRequest {
                user: submission.user,
                competency: submission.competency,
                course: submission.course,
                grade: submission.grade,
                comment: submission.comment.clone(),
                rater,
            },
        )
    }

    /// Roster-wide status table for a course. Requires the view capability;
    /// this is never a self-service view.
    pub fn course_overview(
        &self,
        ctx: &RequestContext,
        course: CourseId,
    ) -> Result<CourseOverview, EngineError> {
        let caller = self.sessions.authenticate(ctx)?;
        if !self
            .authorizer
            .allows(caller, Capability::ViewReports, course)
        {
            return Err(EngineError::Authorization(format!(
                "user {caller} may not view the course {course} overview"
            )));
        }

        let course_info = self
            .catalog
            .course(course)
            .ok_or_else(|| EngineError::course_not_found(course))?;

        let mut competencies: Vec<Competency> = self
            .catalog
            .linked_competencies(course)
            .into_iter()
            .filter_map(|id| self.catalog.competency(id))
            .collect();
        competencies.sort_by_key(|c| c.id);

        let mut rows = Vec::new();
        for user_id in self.enrollment.roster(course) {
            let Some(student) = self.catalog.user(user_id) else {
                tracing::warn!("roster of course {course} names unknown user {user_id}");
                continue;
            };
            let mut statuses = Vec::with_capacity(competencies.len());
            for competency in &competencies {
                statuses.push(resolve_status(
                    self.statuses.as_ref(),
                    self.catalog.as_ref(),
                    user_id,
                    competency.id,
                    course,
                )?);
            }
            rows.push(OverviewRow { student, statuses });
        }

        Ok(CourseOverview {
            course: course_info,
            competencies,
            rows,
        })
    }
}
