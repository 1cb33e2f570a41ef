//! proficio-store — In-memory catalog and status/evidence store.
//!
//! `MemoryStore` backs every collaborator trait the engine consumes:
//! catalog, status store, signal source, enrollment, and authorization.
//! All mutable state sits behind one mutex, so the rating workflow's
//! upsert-plus-append lands as a single atomic unit.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;

use proficio_core::error::EngineError;
use proficio_core::model::{
    ActivityInfo, ActivityInstanceId, ActivitySignal, Competency, CompetencyId, Course, CourseId,
    Evidence, Framework, FrameworkId, StatusKey, StatusRecord, User, UserId,
};
use proficio_core::parser::{Dataset, Role};
use proficio_core::traits::{
    Authorizer, Capability, CompetencyCatalog, EnrollmentProvider, RatingAck, RatingUpdate,
    SignalSource, StatusStore,
};

#[derive(Default)]
struct StoreState {
    frameworks: HashMap<FrameworkId, Framework>,
    competencies: HashMap<CompetencyId, Competency>,
    courses: HashMap<CourseId, Course>,
    users: HashMap<UserId, User>,
    course_links: HashMap<CourseId, Vec<CompetencyId>>,
    activities: HashMap<ActivityInstanceId, ActivityInfo>,
    activity_links: HashMap<CompetencyId, Vec<ActivityInstanceId>>,
    enrollments: HashMap<CourseId, Vec<UserId>>,
    roles: Vec<(UserId, CourseId, Role)>,
    signals: HashMap<(ActivityInstanceId, UserId), ActivitySignal>,
    statuses: HashMap<StatusKey, StatusRecord>,
    evidence: Vec<Evidence>,
    next_evidence_id: u64,
    next_seq: u64,
}

/// The status/evidence store plus the read-only catalog around it.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from a parsed dataset. Rows with dangling references
    /// are skipped with a warning; `validate_dataset` reports them.
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let mut state = StoreState::default();

        for f in &dataset.frameworks {
            state.frameworks.insert(f.id, f.to_model());
        }
        for c in &dataset.competencies {
            state.competencies.insert(c.id, c.to_model());
        }
        for course in &dataset.courses {
            state.courses.insert(course.id, course.clone());
        }
        for user in &dataset.users {
            state.users.insert(user.id, user.clone());
        }
        for link in &dataset.course_links {
            state
                .course_links
                .entry(link.course)
                .or_default()
                .extend(link.competencies.iter().copied());
        }
        for activity in &dataset.activities {
            state.activities.insert(activity.id, activity.clone());
        }
        for link in &dataset.activity_links {
            state
                .activity_links
                .entry(link.competency)
                .or_default()
                .extend(link.activities.iter().copied());
        }
        for enrollment in &dataset.enrollments {
            state
                .enrollments
                .entry(enrollment.course)
                .or_default()
                .extend(enrollment.users.iter().copied());
        }
        for role in &dataset.roles {
            state.roles.push((role.user, role.course, role.role));
        }
        for signal in &dataset.signals {
            state
                .signals
                .insert((signal.activity, signal.user), ActivitySignal {
                    completion: signal.state,
                    grade: signal.grade,
                });
        }
        for status in &dataset.statuses {
            match status.key() {
                Some(key) => {
                    state.statuses.insert(key, status.record());
                }
                None => tracing::warn!(
                    "course-scoped status for user {} competency {} has no course, skipping",
                    status.user,
                    status.competency
                ),
            }
        }
        for row in &dataset.evidence {
            let Some(key) = row.key() else {
                tracing::warn!(
                    "course-scoped evidence for user {} competency {} has no course, skipping",
                    row.user,
                    row.competency
                );
                continue;
            };
            let id = state.next_evidence_id;
            state.evidence.push(Evidence {
                id,
                key,
                note: row.note.clone(),
                rater: row.rater,
                created_at: row.created_at.unwrap_or_else(Utc::now),
                seq: state.next_seq,
            });
            state.next_evidence_id += 1;
            state.next_seq += 1;
        }

        Self {
            inner: Mutex::new(state),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.inner.lock().expect("store mutex poisoned")
    }

    /// Current status records, for dataset write-back.
    pub fn snapshot_statuses(&self) -> Vec<(StatusKey, StatusRecord)> {
        let state = self.lock();
        let mut rows: Vec<_> = state
            .statuses
            .iter()
            .map(|(key, record)| (*key, *record))
            .collect();
        rows.sort_by_key(|(key, _)| (key.user(), key.competency()));
        rows
    }

    /// Current evidence rows in insertion order, for dataset write-back.
    pub fn snapshot_evidence(&self) -> Vec<Evidence> {
        self.lock().evidence.clone()
    }
}

impl CompetencyCatalog for MemoryStore {
    fn course(&self, id: CourseId) -> Option<Course> {
        self.lock().courses.get(&id).cloned()
    }

    fn user(&self, id: UserId) -> Option<User> {
        self.lock().users.get(&id).cloned()
    }

    fn framework(&self, id: FrameworkId) -> Option<Framework> {
        self.lock().frameworks.get(&id).cloned()
    }

    fn competency(&self, id: CompetencyId) -> Option<Competency> {
        self.lock().competencies.get(&id).cloned()
    }

    fn linked_competencies(&self, course: CourseId) -> Vec<CompetencyId> {
        self.lock()
            .course_links
            .get(&course)
            .cloned()
            .unwrap_or_default()
    }

    fn linked_activities(&self, competency: CompetencyId, course: CourseId) -> Vec<ActivityInfo> {
        let state = self.lock();
        state
            .activity_links
            .get(&competency)
            .into_iter()
            .flatten()
            .filter_map(|id| state.activities.get(id))
            .filter(|activity| activity.course == course)
            .cloned()
            .collect()
    }
}

impl SignalSource for MemoryStore {
    fn signal(
        &self,
        instance: ActivityInstanceId,
        user: UserId,
    ) -> anyhow::Result<Option<ActivitySignal>> {
        Ok(self.lock().signals.get(&(instance, user)).copied())
    }
}

impl StatusStore for MemoryStore {
    fn course_record(
        &self,
        user: UserId,
        competency: CompetencyId,
        course: CourseId,
    ) -> Option<StatusRecord> {
        self.lock()
            .statuses
            .get(&StatusKey::Course {
                user,
                competency,
                course,
            })
            .copied()
    }

    fn global_record(&self, user: UserId, competency: CompetencyId) -> Option<StatusRecord> {
        self.lock()
            .statuses
            .get(&StatusKey::Global { user, competency })
            .copied()
    }

    fn evidence_for(&self, key: &StatusKey) -> Vec<Evidence> {
        self.lock()
            .evidence
            .iter()
            .filter(|e| e.key == *key)
            .cloned()
            .collect()
    }

    fn apply_rating(&self, update: RatingUpdate) -> Result<RatingAck, EngineError> {
        // One critical section covers every check and both writes: a
        // failed submission mutates nothing, a successful one lands the
        // upsert and the evidence append together.
        let mut state = self.lock();

        if !state.courses.contains_key(&update.course) {
            return Err(EngineError::course_not_found(update.course));
        }
        if !state.users.contains_key(&update.user) {
            return Err(EngineError::user_not_found(update.user));
        }
        if !state.competencies.contains_key(&update.competency) {
            return Err(EngineError::competency_not_found(update.competency));
        }

        let key = StatusKey::Course {
            user: update.user,
            competency: update.competency,
            course: update.course,
        };
        let now = Utc::now();

        state.statuses.insert(key, StatusRecord {
            grade: Some(update.grade),
            proficient: update.proficient,
            updated_at: now,
        });

        let evidence_id = state.next_evidence_id;
        let seq = state.next_seq;
        state.evidence.push(Evidence {
            id: evidence_id,
            key,
            note: update.note,
            rater: update.rater,
            created_at: now,
            seq,
        });
        state.next_evidence_id += 1;
        state.next_seq += 1;

        Ok(RatingAck {
            user: update.user,
            competency: update.competency,
            course: update.course,
            grade: update.grade,
            proficient: update.proficient,
            evidence_id,
            recorded_at: now,
        })
    }
}

impl EnrollmentProvider for MemoryStore {
    fn is_enrolled(&self, user: UserId, course: CourseId) -> bool {
        self.lock()
            .enrollments
            .get(&course)
            .is_some_and(|users| users.contains(&user))
    }

    fn roster(&self, course: CourseId) -> Vec<UserId> {
        self.lock()
            .enrollments
            .get(&course)
            .cloned()
            .unwrap_or_default()
    }
}

impl Authorizer for MemoryStore {
    fn allows(&self, user: UserId, capability: Capability, course: CourseId) -> bool {
        self.lock()
            .roles
            .iter()
            .any(|(u, c, role)| {
                *u == user
                    && *c == course
                    && match capability {
                        Capability::ViewReports => true,
                        Capability::RateCompetencies => *role == Role::Teacher,
                    }
            })
    }
}
