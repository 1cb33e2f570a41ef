//! Status resolver: the authoritative status for a (student, competency,
//! course) triple, with course-scoped records taking precedence over
//! global ones.

use crate::error::EngineError;
use crate::model::{
    CompetencyId, CourseId, DisplayState, Scale, Status, StatusKey, StatusRecord, StatusSource,
    UserId,
};
use crate::traits::{CompetencyCatalog, StatusStore};

/// The shared prioritized lookup behind both the status resolver and the
/// evidence aggregator's notes log. Keeping tier selection in one place
/// guarantees a displayed note can never contradict the displayed grade.
///
/// Returns the chosen tier, or `None` when neither tier holds a grade.
pub fn pick_status_record(
    store: &dyn StatusStore,
    user: UserId,
    competency: CompetencyId,
    course: CourseId,
) -> Option<(StatusKey, StatusRecord, StatusSource)> {
    if let Some(record) = store.course_record(user, competency, course) {
        if record.grade.is_some() {
            let key = StatusKey::Course {
                user,
                competency,
                course,
            };
            return Some((key, record, StatusSource::CourseScoped));
        }
    }

    if let Some(record) = store.global_record(user, competency) {
        if record.grade.is_some() {
            let key = StatusKey::Global { user, competency };
            return Some((key, record, StatusSource::Global));
        }
    }

    None
}

/// Resolve the authoritative status for a triple.
///
/// Fails with `NotFound` only when the competency (or its framework) is
/// missing from the catalog; absent status records are a normal outcome and
/// resolve to the ungraded default.
pub fn resolve_status(
    store: &dyn StatusStore,
    catalog: &dyn CompetencyCatalog,
    user: UserId,
    competency: CompetencyId,
    course: CourseId,
) -> Result<Status, EngineError> {
    let node = catalog
        .competency(competency)
        .ok_or_else(|| EngineError::competency_not_found(competency))?;
    let framework = catalog
        .framework(node.framework)
        .ok_or_else(|| EngineError::framework_not_found(node.framework))?;

    Ok(status_from_record(
        &framework.scale,
        pick_status_record(store, user, competency, course),
    ))
}

/// Interpret a picked record (or its absence) against a scale.
pub fn status_from_record(
    scale: &Scale,
    picked: Option<(StatusKey, StatusRecord, StatusSource)>,
) -> Status {
    match picked {
        Some((_, record, source)) => {
            // pick_status_record only returns graded records.
            let grade = record.grade;
            let label = grade
                .map(|g| scale.label_for(g).to_string())
                .unwrap_or_else(|| Scale::NOT_YET_COMPETENT.to_string());
            let display = if record.proficient {
                DisplayState::Competent
            } else if grade.is_some_and(|g| g > 1) {
                DisplayState::InProgress
            } else {
                DisplayState::NotYetCompetent
            };
            Status {
                grade,
                label,
                proficient: record.proficient,
                source,
                display,
            }
        }
        None => Status {
            grade: None,
            label: Scale::NOT_YET_COMPETENT.to_string(),
            proficient: false,
            source: StatusSource::None,
            display: DisplayState::NotYetCompetent,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ActivityInfo, Competency, Course, Evidence, Framework, User,
    };
    use crate::traits::{RatingAck, RatingUpdate};
    use chrono::Utc;

    struct FixtureStore {
        course: Option<StatusRecord>,
        global: Option<StatusRecord>,
    }

    impl StatusStore for FixtureStore {
        fn course_record(
            &self,
            _user: UserId,
            _competency: CompetencyId,
            _course: CourseId,
        ) -> Option<StatusRecord> {
            self.course
        }
        fn global_record(&self, _user: UserId, _competency: CompetencyId) -> Option<StatusRecord> {
            self.global
        }
        fn evidence_for(&self, _key: &StatusKey) -> Vec<Evidence> {
            vec![]
        }
        fn apply_rating(&self, _update: RatingUpdate) -> Result<RatingAck, EngineError> {
            unimplemented!("read-only fixture")
        }
    }

    struct OneCompetencyCatalog;

    impl CompetencyCatalog for OneCompetencyCatalog {
        fn course(&self, id: CourseId) -> Option<Course> {
            Some(Course {
                id,
                shortname: "c".into(),
            })
        }
        fn user(&self, id: UserId) -> Option<User> {
            Some(User {
                id,
                name: "u".into(),
            })
        }
        fn framework(&self, id: u64) -> Option<Framework> {
            (id == 1).then(|| Framework {
                id,
                shortname: "f".into(),
                idnumber: String::new(),
                scale: Scale(vec![
                    "Not Yet Competent".into(),
                    "Working On It".into(),
                    "Competent".into(),
                ]),
                proficiency_threshold: 3,
            })
        }
        fn competency(&self, id: CompetencyId) -> Option<Competency> {
            (id == 10).then(|| Competency {
                id,
                shortname: "c10".into(),
                idnumber: String::new(),
                description: String::new(),
                parent: None,
                framework: 1,
            })
        }
        fn linked_competencies(&self, _course: CourseId) -> Vec<CompetencyId> {
            vec![10]
        }
        fn linked_activities(&self, _c: CompetencyId, _course: CourseId) -> Vec<ActivityInfo> {
            vec![]
        }
    }

    fn record(grade: Option<u32>, proficient: bool) -> StatusRecord {
        StatusRecord {
            grade,
            proficient,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn course_record_wins_over_global() {
        let store = FixtureStore {
            course: Some(record(Some(2), false)),
            global: Some(record(Some(3), true)),
        };
        let status = resolve_status(&store, &OneCompetencyCatalog, 5, 10, 2).unwrap();
        assert_eq!(status.grade, Some(2));
        assert_eq!(status.source, StatusSource::CourseScoped);
        assert_eq!(status.label, "Working On It");
        assert!(!status.proficient);
    }

    #[test]
    fn ungraded_course_record_falls_through_to_global() {
        let store = FixtureStore {
            course: Some(record(None, false)),
            global: Some(record(Some(3), true)),
        };
        let status = resolve_status(&store, &OneCompetencyCatalog, 5, 10, 2).unwrap();
        assert_eq!(status.grade, Some(3));
        assert_eq!(status.source, StatusSource::Global);
        assert_eq!(status.label, "Competent");
        assert!(status.proficient);
        assert_eq!(status.display, DisplayState::Competent);
    }

    #[test]
    fn no_records_resolves_to_default() {
        let store = FixtureStore {
            course: None,
            global: None,
        };
        let status = resolve_status(&store, &OneCompetencyCatalog, 5, 10, 2).unwrap();
        assert_eq!(status.grade, None);
        assert!(!status.proficient);
        assert_eq!(status.label, "Not Yet Competent");
        assert_eq!(status.source, StatusSource::None);
        assert_eq!(status.display, DisplayState::NotYetCompetent);
    }

    #[test]
    fn out_of_range_grade_labels_unknown_without_fault() {
        let store = FixtureStore {
            course: Some(record(Some(9), false)),
            global: None,
        };
        let status = resolve_status(&store, &OneCompetencyCatalog, 5, 10, 2).unwrap();
        assert_eq!(status.label, "Unknown");
        assert_eq!(status.grade, Some(9));
    }

    #[test]
    fn proficiency_is_read_not_recomputed() {
        // Grade 1 with the flag set still displays as competent: the flag
        // is authoritative, set by the rating workflow.
        let store = FixtureStore {
            course: Some(record(Some(1), true)),
            global: None,
        };
        let status = resolve_status(&store, &OneCompetencyCatalog, 5, 10, 2).unwrap();
        assert!(status.proficient);
        assert_eq!(status.display, DisplayState::Competent);
    }

    #[test]
    fn grade_one_not_proficient_is_not_yet_competent() {
        let store = FixtureStore {
            course: Some(record(Some(1), false)),
            global: None,
        };
        let status = resolve_status(&store, &OneCompetencyCatalog, 5, 10, 2).unwrap();
        assert_eq!(status.display, DisplayState::NotYetCompetent);
    }

    #[test]
    fn unknown_competency_is_not_found() {
        let store = FixtureStore {
            course: None,
            global: None,
        };
        let err = resolve_status(&store, &OneCompetencyCatalog, 5, 999, 2).unwrap_err();
        assert_eq!(err.to_string(), "competency 999 not found");
    }
}
