//! End-to-end engine flow: dataset -> store -> service -> reports.

use std::sync::Arc;

use proficio_core::model::{CompletionState, DisplayState, StatusSource};
use proficio_core::parser::load_dataset_str;
use proficio_core::registry::ActivityRegistry;
use proficio_core::service::{CompetencyService, RatingSubmission, RequestContext};
use proficio_core::traits::{
    Authorizer, CompetencyCatalog, EnrollmentProvider, SignalSource, StatusStore,
};
use proficio_activities::mock::MockResolver;
use proficio_activities::standard_registry;
use proficio_store::MemoryStore;

const DATASET: &str = r#"
[dataset]
name = "Engine flow"

[[frameworks]]
id = 1
shortname = "literacy"
scale = ["Not Yet Competent", "Working On It", "Competent"]
proficiency_threshold = 3

[[competencies]]
id = 10
shortname = "reading"
framework = 1

[[competencies]]
id = 11
shortname = "analysis"
parent = 10
framework = 1

[[courses]]
id = 2
shortname = "ENG-101"

[[users]]
id = 5
name = "Alice"

[[users]]
id = 6
name = "Bob"

[[users]]
id = 7
name = "Ms. Finch"

[[course_links]]
course = 2
competencies = [10, 11]

[[activities]]
id = 100
type = "quiz"
name = "Reading check"
course = 2
ordering = 1

[[activities]]
id = 101
type = "flaky"
name = "External tool"
course = 2
ordering = 2

[[activities]]
id = 102
type = "assignment"
name = "Book report"
course = 2
ordering = 3

[[activity_links]]
competency = 10
activities = [100, 101, 102]

[[enrollments]]
course = 2
users = [5, 6]

[[roles]]
user = 7
course = 2
role = "teacher"

[[signals]]
activity = 100
user = 5
state = "complete"
grade = { value = 8.0, max = 10.0 }

[[signals]]
activity = 102
user = 5
state = "in_progress"
"#;

fn build_service(registry: ActivityRegistry) -> (Arc<MemoryStore>, CompetencyService) {
    let dataset = load_dataset_str(DATASET).unwrap();
    let store = Arc::new(MemoryStore::from_dataset(&dataset));
    let catalog: Arc<dyn CompetencyCatalog> = store.clone();
    let statuses: Arc<dyn StatusStore> = store.clone();
    let enrollment: Arc<dyn EnrollmentProvider> = store.clone();
    let authorizer: Arc<dyn Authorizer> = store.clone();
    let service = CompetencyService::new(
        catalog,
        statuses,
        Arc::new(registry),
        enrollment,
        authorizer,
    );
    (store, service)
}

fn service_with_standard_registry() -> (Arc<MemoryStore>, CompetencyService) {
    let dataset = load_dataset_str(DATASET).unwrap();
    let store = Arc::new(MemoryStore::from_dataset(&dataset));
    let signals: Arc<dyn SignalSource> = store.clone();
    let registry = standard_registry(signals);
    let catalog: Arc<dyn CompetencyCatalog> = store.clone();
    let statuses: Arc<dyn StatusStore> = store.clone();
    let enrollment: Arc<dyn EnrollmentProvider> = store.clone();
    let authorizer: Arc<dyn Authorizer> = store.clone();
    let service = CompetencyService::new(
        catalog,
        statuses,
        Arc::new(registry),
        enrollment,
        authorizer,
    );
    (store, service)
}

fn submission(grade: u32, comment: &str) -> RatingSubmission {
    RatingSubmission {
        user: 5,
        competency: 10,
        course: 2,
        grade,
        comment: Some(comment.to_string()),
    }
}

#[tokio::test]
async fn rate_then_report_shows_the_new_grade_and_note() {
    let (_, service) = service_with_standard_registry();
    let teacher = service.login(7).unwrap();

    let ack = service
        .submit_rating(&teacher.context(), &submission(3, "Great work"))
        .unwrap();
    assert_eq!(ack.grade, 3);
    assert!(ack.proficient);

    let report = service
        .evidence_report(&teacher.context(), 5, 10, 2)
        .await
        .unwrap();
    assert_eq!(report.current_status.grade, Some(3));
    assert_eq!(report.current_status.source, StatusSource::CourseScoped);
    assert_eq!(report.current_status.label, "Competent");
    assert_eq!(report.current_status.display, DisplayState::Competent);
    assert_eq!(report.notes_log[0].text, "Great work");
    assert_eq!(report.notes_log[0].author, 7);
}

#[tokio::test]
async fn unknown_activity_type_uses_generic_fallback() {
    let (_, service) = service_with_standard_registry();
    let teacher = service.login(7).unwrap();

    let report = service
        .evidence_report(&teacher.context(), 5, 10, 2)
        .await
        .unwrap();

    // quiz (100), unknown type (101) via generic fallback, assignment (102).
    assert_eq!(report.activity_evidence.len(), 3);
    assert_eq!(report.activity_evidence[0].activity.display_name, "Quiz: Reading check");
    assert_eq!(report.activity_evidence[0].completion, CompletionState::Complete);
    assert_eq!(report.activity_evidence[1].activity.display_name, "Activity 101");
    assert_eq!(
        report.activity_evidence[2].activity.display_name,
        "Assignment: Book report"
    );
    // Unsubmitted assignment: completion visible, no grade yet.
    assert_eq!(report.activity_evidence[2].completion, CompletionState::InProgress);
    assert!(report.activity_evidence[2].grade.is_none());
}

#[tokio::test]
async fn broken_resolver_yields_flagged_entries_not_errors() {
    let mut registry = ActivityRegistry::new();
    registry.register(MockResolver::failing("quiz", "gradebook offline").shared());
    registry.register(
        MockResolver::new("assignment")
            .with_completion(CompletionState::Complete)
            .with_grade(9.0, 10.0)
            .shared(),
    );
    let (_, service) = build_service(registry);
    let teacher = service.login(7).unwrap();

    let report = service
        .evidence_report(&teacher.context(), 5, 10, 2)
        .await
        .unwrap();

    assert_eq!(report.activity_evidence.len(), 3);
    let quiz = &report.activity_evidence[0];
    assert!(quiz
        .resolution_error
        .as_deref()
        .unwrap()
        .contains("gradebook offline"));
    assert_eq!(quiz.completion, CompletionState::NotStarted);
    let assignment = &report.activity_evidence[2];
    assert!(assignment.resolution_error.is_none());
    assert_eq!(assignment.grade.unwrap().value, 9.0);
}

#[test]
fn out_of_range_grades_leave_prior_state_untouched() {
    let (store, service) = service_with_standard_registry();
    let teacher = service.login(7).unwrap();

    service
        .submit_rating(&teacher.context(), &submission(2, "baseline"))
        .unwrap();
    let statuses_before = store.snapshot_statuses();
    let evidence_before = store.snapshot_evidence().len();

    for bad in [0u32, 4] {
        let err = service
            .submit_rating(&teacher.context(), &submission(bad, "no"))
            .unwrap_err();
        assert!(err.to_string().contains("valid range is 1..=3"));
    }

    assert_eq!(store.snapshot_statuses(), statuses_before);
    assert_eq!(store.snapshot_evidence().len(), evidence_before);
}

#[test]
fn missing_or_forged_csrf_token_rejects_before_any_state_change() {
    let (store, service) = service_with_standard_registry();
    let teacher = service.login(7).unwrap();

    let err = service
        .submit_rating(&teacher.context_without_csrf(), &submission(3, "forged"))
        .unwrap_err();
    assert!(err.to_string().contains("anti-forgery"));

    let forged = RequestContext {
        session: teacher.session,
        csrf: Some(uuid::Uuid::new_v4()),
    };
    let err = service
        .submit_rating(&forged, &submission(3, "forged"))
        .unwrap_err();
    assert!(err.to_string().contains("anti-forgery"));

    assert!(store.snapshot_statuses().is_empty());
    assert!(store.snapshot_evidence().is_empty());
}

#[test]
fn students_cannot_rate_but_can_read_their_own_report() {
    let (store, service) = service_with_standard_registry();
    let student = service.login(5).unwrap();

    let err = service
        .submit_rating(&student.context(), &submission(3, "self-serve"))
        .unwrap_err();
    assert!(err.to_string().contains("not authorized"));
    assert!(store.snapshot_statuses().is_empty());

    // Their own forest is readable through enrollment.
    let forest = service.forest(&student.context(), 2).unwrap();
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].framework.shortname, "literacy");
}

#[tokio::test]
async fn students_cannot_read_peer_reports() {
    let (_, service) = service_with_standard_registry();
    let student = service.login(5).unwrap();

    let err = service
        .evidence_report(&student.context(), 6, 10, 2)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not authorized"));
}

#[test]
fn course_overview_lists_roster_against_linked_competencies() {
    let (_, service) = service_with_standard_registry();
    let teacher = service.login(7).unwrap();

    service
        .submit_rating(&teacher.context(), &submission(3, "solid"))
        .unwrap();

    let overview = service.course_overview(&teacher.context(), 2).unwrap();
    assert_eq!(overview.course.shortname, "ENG-101");
    assert_eq!(overview.competencies.len(), 2);
    assert_eq!(overview.rows.len(), 2);

    let alice = &overview.rows[0];
    assert_eq!(alice.student.name, "Alice");
    assert_eq!(alice.statuses[0].grade, Some(3));
    assert_eq!(alice.statuses[1].grade, None);

    let bob = &overview.rows[1];
    assert_eq!(bob.statuses[0].label, "Not Yet Competent");
}

#[test]
fn lower_regrade_overwrites_without_monotonicity() {
    let (_, service) = service_with_standard_registry();
    let teacher = service.login(7).unwrap();

    service
        .submit_rating(&teacher.context(), &submission(3, "peak"))
        .unwrap();
    let ack = service
        .submit_rating(&teacher.context(), &submission(1, "regression"))
        .unwrap();
    assert_eq!(ack.grade, 1);
    assert!(!ack.proficient);
}
