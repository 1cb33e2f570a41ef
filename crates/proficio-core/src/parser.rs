//! TOML course-dataset parser.
//!
//! Loads a complete course dataset (frameworks, competencies, links,
//! activities, signals, statuses, evidence) from a TOML file and validates
//! its cross-references. Datasets serialize back out so the CLI can persist
//! rating mutations.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    ActivityInfo, ActivityInstanceId, Competency, CompetencyId, CompletionState, Course, CourseId,
    Framework, FrameworkId, GradeSnapshot, Scale, StatusKey, StatusRecord, User, UserId,
};

/// Header block of a dataset file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetHeader {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Framework row as stored on disk; the proficiency threshold may be
/// omitted and defaults to the top of the scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetFramework {
    pub id: FrameworkId,
    pub shortname: String,
    #[serde(default)]
    pub idnumber: String,
    pub scale: Vec<String>,
    #[serde(default)]
    pub proficiency_threshold: Option<u32>,
}

impl DatasetFramework {
    pub fn to_model(&self) -> Framework {
        Framework {
            id: self.id,
            shortname: self.shortname.clone(),
            idnumber: self.idnumber.clone(),
            scale: Scale(self.scale.clone()),
            proficiency_threshold: self
                .proficiency_threshold
                .unwrap_or(self.scale.len() as u32),
        }
    }
}

/// Competency row as stored on disk. `parent` keeps the raw encoding
/// (absent or explicit `0` both mean "no parent"); normalization happens
/// in [`DatasetCompetency::to_model`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetCompetency {
    pub id: CompetencyId,
    pub shortname: String,
    #[serde(default)]
    pub idnumber: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent: Option<CompetencyId>,
    pub framework: FrameworkId,
}

impl DatasetCompetency {
    pub fn to_model(&self) -> Competency {
        Competency {
            id: self.id,
            shortname: self.shortname.clone(),
            idnumber: self.idnumber.clone(),
            description: self.description.clone(),
            parent: Competency::normalize_parent(self.parent),
            framework: self.framework,
        }
    }
}

/// Competencies linked to one course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseLinkRow {
    pub course: CourseId,
    pub competencies: Vec<CompetencyId>,
}

/// Activities serving as evidence sources for one competency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLinkRow {
    pub competency: CompetencyId,
    pub activities: Vec<ActivityInstanceId>,
}

/// Enrollment of users into one course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentRow {
    pub course: CourseId,
    pub users: Vec<UserId>,
}

/// Course-level roles granting capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May view reports and submit ratings.
    Teacher,
    /// May view reports for the whole roster.
    Manager,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRow {
    pub user: UserId,
    pub course: CourseId,
    pub role: Role,
}

/// One recorded completion/grade signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRow {
    pub activity: ActivityInstanceId,
    pub user: UserId,
    pub state: CompletionState,
    #[serde(default)]
    pub grade: Option<GradeSnapshot>,
}

/// Status-record tier on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Course,
    Global,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRow {
    pub user: UserId,
    pub competency: CompetencyId,
    pub scope: Scope,
    /// Required when `scope = "course"`.
    #[serde(default)]
    pub course: Option<CourseId>,
    #[serde(default)]
    pub grade: Option<u32>,
    #[serde(default)]
    pub proficient: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StatusRow {
    pub fn key(&self) -> Option<StatusKey> {
        match self.scope {
            Scope::Course => self.course.map(|course| StatusKey::Course {
                user: self.user,
                competency: self.competency,
                course,
            }),
            Scope::Global => Some(StatusKey::Global {
                user: self.user,
                competency: self.competency,
            }),
        }
    }

    pub fn record(&self) -> StatusRecord {
        StatusRecord {
            grade: self.grade,
            proficient: self.proficient,
            updated_at: self.updated_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRow {
    pub user: UserId,
    pub competency: CompetencyId,
    pub scope: Scope,
    #[serde(default)]
    pub course: Option<CourseId>,
    #[serde(default)]
    pub note: String,
    pub rater: UserId,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl EvidenceRow {
    pub fn key(&self) -> Option<StatusKey> {
        match self.scope {
            Scope::Course => self.course.map(|course| StatusKey::Course {
                user: self.user,
                competency: self.competency,
                course,
            }),
            Scope::Global => Some(StatusKey::Global {
                user: self.user,
                competency: self.competency,
            }),
        }
    }
}

/// A complete course dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub dataset: DatasetHeader,
    #[serde(default)]
    pub frameworks: Vec<DatasetFramework>,
    #[serde(default)]
    pub competencies: Vec<DatasetCompetency>,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub course_links: Vec<CourseLinkRow>,
    #[serde(default)]
    pub activities: Vec<ActivityInfo>,
    #[serde(default)]
    pub activity_links: Vec<ActivityLinkRow>,
    #[serde(default)]
    pub enrollments: Vec<EnrollmentRow>,
    #[serde(default)]
    pub roles: Vec<RoleRow>,
    #[serde(default)]
    pub signals: Vec<SignalRow>,
    #[serde(default)]
    pub statuses: Vec<StatusRow>,
    #[serde(default)]
    pub evidence: Vec<EvidenceRow>,
}

/// A validation finding. Warnings never block loading; the store skips
/// rows it cannot resolve.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// Which row the warning is about, e.g. `competency 12`.
    pub location: String,
    pub message: String,
}

/// Parse a dataset from a TOML file.
pub fn parse_dataset(path: &Path) -> Result<Dataset> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset: {}", path.display()))?;
    load_dataset_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

/// Parse a dataset from a TOML string.
pub fn load_dataset_str(content: &str) -> Result<Dataset> {
    toml::from_str(content).context("invalid dataset TOML")
}

/// Serialize a dataset back to its TOML file.
pub fn save_dataset(path: &Path, dataset: &Dataset) -> Result<()> {
    let content = toml::to_string_pretty(dataset).context("failed to serialize dataset")?;
    std::fs::write(path, content)
        .with_context(|| format!("failed to write dataset: {}", path.display()))?;
    Ok(())
}

/// Check a dataset's cross-references and invariants.
pub fn validate_dataset(dataset: &Dataset) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut warn = |location: String, message: String| {
        warnings.push(ValidationWarning { location, message });
    };

    let framework_ids: Vec<FrameworkId> = dataset.frameworks.iter().map(|f| f.id).collect();
    let competency_ids: Vec<CompetencyId> = dataset.competencies.iter().map(|c| c.id).collect();
    let course_ids: Vec<CourseId> = dataset.courses.iter().map(|c| c.id).collect();
    let user_ids: Vec<UserId> = dataset.users.iter().map(|u| u.id).collect();
    let activity_ids: Vec<ActivityInstanceId> = dataset.activities.iter().map(|a| a.id).collect();

    for f in &dataset.frameworks {
        let loc = format!("framework {}", f.id);
        if f.scale.is_empty() {
            warn(loc.clone(), "scale has no labels".into());
        }
        if let Some(threshold) = f.proficiency_threshold {
            if threshold == 0 || threshold as usize > f.scale.len() {
                warn(
                    loc.clone(),
                    format!(
                        "proficiency threshold {threshold} outside scale range 1..={}",
                        f.scale.len()
                    ),
                );
            }
        }
        if framework_ids.iter().filter(|id| **id == f.id).count() > 1 {
            warn(loc, "duplicate framework id".into());
        }
    }

    for c in &dataset.competencies {
        let loc = format!("competency {}", c.id);
        if !framework_ids.contains(&c.framework) {
            warn(loc.clone(), format!("unknown framework {}", c.framework));
        }
        if let Some(parent) = Competency::normalize_parent(c.parent) {
            match dataset.competencies.iter().find(|p| p.id == parent) {
                None => warn(loc.clone(), format!("unknown parent {parent}")),
                Some(p) if p.framework != c.framework => warn(
                    loc.clone(),
                    format!("parent {parent} belongs to a different framework"),
                ),
                Some(_) => {}
            }
        }
        if competency_ids.iter().filter(|id| **id == c.id).count() > 1 {
            warn(loc, "duplicate competency id".into());
        }
    }

    for link in &dataset.course_links {
        let loc = format!("course link for course {}", link.course);
        if !course_ids.contains(&link.course) {
            warn(loc.clone(), "unknown course".into());
        }
        for competency in &link.competencies {
            if !competency_ids.contains(competency) {
                warn(loc.clone(), format!("unknown competency {competency}"));
            }
        }
    }

    for a in &dataset.activities {
        if !course_ids.contains(&a.course) {
            warn(
                format!("activity {}", a.id),
                format!("unknown course {}", a.course),
            );
        }
    }

    for link in &dataset.activity_links {
        let loc = format!("activity link for competency {}", link.competency);
        if !competency_ids.contains(&link.competency) {
            warn(loc.clone(), "unknown competency".into());
        }
        for activity in &link.activities {
            if !activity_ids.contains(activity) {
                warn(loc.clone(), format!("unknown activity {activity}"));
            }
        }
    }

    for e in &dataset.enrollments {
        let loc = format!("enrollment for course {}", e.course);
        if !course_ids.contains(&e.course) {
            warn(loc.clone(), "unknown course".into());
        }
        for user in &e.users {
            if !user_ids.contains(user) {
                warn(loc.clone(), format!("unknown user {user}"));
            }
        }
    }

    for r in &dataset.roles {
        let loc = format!("role for user {} in course {}", r.user, r.course);
        if !user_ids.contains(&r.user) {
            warn(loc.clone(), "unknown user".into());
        }
        if !course_ids.contains(&r.course) {
            warn(loc, "unknown course".into());
        }
    }

    for s in &dataset.signals {
        let loc = format!("signal for activity {} user {}", s.activity, s.user);
        if !activity_ids.contains(&s.activity) {
            warn(loc.clone(), "unknown activity".into());
        }
        if !user_ids.contains(&s.user) {
            warn(loc, "unknown user".into());
        }
    }

    for s in &dataset.statuses {
        let loc = format!("status for user {} competency {}", s.user, s.competency);
        if !user_ids.contains(&s.user) {
            warn(loc.clone(), "unknown user".into());
        }
        if !competency_ids.contains(&s.competency) {
            warn(loc.clone(), "unknown competency".into());
        }
        if s.scope == Scope::Course && s.course.is_none() {
            warn(loc.clone(), "course-scoped status without a course".into());
        }
        if let (Some(grade), Some(c)) = (
            s.grade,
            dataset.competencies.iter().find(|c| c.id == s.competency),
        ) {
            if let Some(f) = dataset.frameworks.iter().find(|f| f.id == c.framework) {
                if grade == 0 || grade as usize > f.scale.len() {
                    warn(
                        loc.clone(),
                        format!("grade {grade} outside scale range 1..={}", f.scale.len()),
                    );
                }
            }
        }
    }

    for e in &dataset.evidence {
        let loc = format!("evidence for user {} competency {}", e.user, e.competency);
        if !user_ids.contains(&e.user) {
            warn(loc.clone(), "unknown user".into());
        }
        if !user_ids.contains(&e.rater) {
            warn(loc.clone(), format!("unknown rater {}", e.rater));
        }
        if e.scope == Scope::Course && e.course.is_none() {
            warn(loc, "course-scoped evidence without a course".into());
        }
    }

    warnings
}
